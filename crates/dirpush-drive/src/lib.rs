//! dirpush Drive - Google Drive v2 adapter
//!
//! Provides the async client and the [`IRemoteHierarchy`] implementation
//! used by the reconciler:
//! - Paginated folder listing
//! - Folder creation
//! - Resumable file upload with retry and cancellation
//! - Parent add/remove for relocating files
//!
//! ## Modules
//!
//! - [`client`] - Authenticated HTTP client and status mapping
//! - [`listing`] - `files.list` with continuation tokens
//! - [`files`] - Folder insert and parent add/remove
//! - [`upload`] - Resumable uploads
//! - [`mime`] - Content type inference from file names
//! - [`provider`] - [`DriveHierarchy`], the port implementation
//!
//! [`IRemoteHierarchy`]: dirpush_core::ports::IRemoteHierarchy
//! [`DriveHierarchy`]: provider::DriveHierarchy

pub mod client;
pub mod files;
pub mod listing;
pub mod mime;
pub mod provider;
pub mod upload;

use std::time::Duration;
use thiserror::Error;

pub use client::DriveClient;
pub use provider::DriveHierarchy;
pub use upload::RetryPolicy;

/// Errors that can occur when communicating with the Drive API
#[derive(Debug, Error)]
pub enum DriveError {
    /// Authentication credentials are invalid or expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Insufficient permissions for the requested operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded; retry after the given duration if the server sent one
    #[error("Too many requests, retry after {retry_after:?}")]
    TooManyRequests {
        /// Duration to wait before retrying
        retry_after: Option<Duration>,
    },

    /// A server-side error occurred (5xx)
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Any other non-success status
    #[error("Request failed ({status}): {message}")]
    Api { status: u16, message: String },

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The API response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Reading the local file failed
    #[error("Local I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The run was cancelled while the request was in flight or backing off
    #[error("Cancelled")]
    Cancelled,
}

impl DriveError {
    /// Whether retrying the same request may succeed
    ///
    /// Transient errors are transport failures, HTTP 429 and HTTP 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            DriveError::TooManyRequests { .. } | DriveError::ServerError { .. } => true,
            DriveError::NetworkError(e) => !(e.is_builder() || e.is_decode() || e.is_redirect()),
            _ => false,
        }
    }

    /// Server-requested delay, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            DriveError::TooManyRequests { retry_after } => *retry_after,
            _ => None,
        }
    }
}

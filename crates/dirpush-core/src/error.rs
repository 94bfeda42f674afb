//! Run-level error taxonomy
//!
//! Every failure that ends a push run surfaces as a [`PushError`]. The
//! reconciler never retries and never continues after an error; the only
//! retry loop lives in the upload primitive of the remote adapter.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ValidationError;
use crate::domain::errors::DomainError;
use crate::governor::GovernorError;

/// Remote operation that failed, used to label [`PushError::Remote`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOp {
    /// Listing a folder's children
    List,
    /// Creating a folder
    CreateFolder,
    /// Uploading a file
    CreateFile,
    /// Moving a file into the quarantine folder
    Relocate,
}

impl fmt::Display for RemoteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RemoteOp::List => "listing",
            RemoteOp::CreateFolder => "folder creation",
            RemoteOp::CreateFile => "upload",
            RemoteOp::Relocate => "relocation",
        };
        f.write_str(name)
    }
}

/// Errors that abort a push run
#[derive(Debug, Error)]
pub enum PushError {
    /// Missing or invalid inputs; raised before any remote call
    #[error("invalid configuration: {}", join_validation(.0))]
    Config(Vec<ValidationError>),

    /// The local tree could not be built
    #[error("failed to scan {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// A remote call failed while reconciling `path`
    #[error("{op} failed for /{path}: {source}")]
    Remote {
        op: RemoteOp,
        /// Path relative to the local root
        path: String,
        #[source]
        source: anyhow::Error,
    },

    /// The operation ceiling was exceeded
    #[error(transparent)]
    CeilingExceeded(#[from] GovernorError),

    /// A tree invariant was violated
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The run was interrupted
    #[error("run cancelled")]
    Cancelled,
}

impl PushError {
    /// Wraps an adapter error, keeping governor aborts in their own class.
    pub fn remote(op: RemoteOp, path: impl Into<String>, source: anyhow::Error) -> Self {
        match source.downcast::<GovernorError>() {
            Ok(governor) => PushError::CeilingExceeded(governor),
            Err(source) => PushError::Remote {
                op,
                path: path.into(),
                source,
            },
        }
    }

    /// Whether this error belongs to the abort class (never retried)
    pub fn is_abort(&self) -> bool {
        matches!(self, PushError::CeilingExceeded(_) | PushError::Cancelled)
    }
}

fn join_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

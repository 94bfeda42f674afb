//! Domain error types
//!
//! Validation failures for identifiers and violations of the local tree
//! invariants.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid remote ID format
    #[error("Invalid remote ID: {0}")]
    InvalidRemoteId(String),

    /// A node's remote ID may only be assigned once
    #[error("Remote ID already assigned for {path}")]
    RemoteIdAlreadyAssigned {
        /// Absolute path of the node
        path: PathBuf,
    },

    /// The scanned entries did not contain exactly one root
    #[error("Local tree has no single root: {0}")]
    NoSingleRoot(String),
}

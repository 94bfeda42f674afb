//! dirpush Sync - One-way push of a local directory
//!
//! Provides:
//! - Local tree scanning
//! - Reconciliation of the local tree into a remote folder
//!
//! ## Modules
//!
//! - [`scanner`] - Builds a `LocalTree` from the filesystem
//! - [`reconciler`] - Depth-first push through an `IRemoteHierarchy`

pub mod reconciler;
pub mod scanner;

pub use reconciler::{ReconcileSummary, Reconciler};
pub use scanner::{scan_tree, ScanError};

//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are interfaces that the reconciler depends on, but whose
//! implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteHierarchy`] - Remote folder/file operations (Google Drive)
//! - [`IStatusReporter`] - Per-entry run output

pub mod remote_hierarchy;
pub mod status_reporter;

pub use remote_hierarchy::{IRemoteHierarchy, RemoteEntry, FOLDER_MIME_TYPE};
pub use status_reporter::{EntryKind, IStatusReporter, StatusLine, StatusMarker};

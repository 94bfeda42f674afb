//! Domain entities and business logic
//!
//! This module contains the core domain types for dirpush:
//! - Newtypes for remote identifiers
//! - The arena-backed local directory tree
//! - Human-readable byte sizes
//! - Domain-specific error types

pub mod byte_size;
pub mod errors;
pub mod local_tree;
pub mod newtypes;

// Re-export commonly used types
pub use byte_size::format_bytes;
pub use errors::DomainError;
pub use local_tree::{FileInfo, LocalNode, LocalTree, NodeId};
pub use newtypes::RemoteId;

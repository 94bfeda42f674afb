//! Remote hierarchy port (driven/secondary port)
//!
//! The minimal capability surface the reconciler needs from a hierarchical
//! remote store: list a folder, create a folder, upload a file, and relocate
//! a file between parents. The production adapter targets Google Drive; the
//! reconciler's tests use an in-memory fake implementing the same contract.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are
//!   adapter-specific. A [`GovernorError`](crate::governor::GovernorError)
//!   raised by a mutating call must be propagated unchanged so callers can
//!   recognise it with `downcast_ref`.
//! - Mutating methods take an [`OpContext`] and must call
//!   [`OpContext::tally`] before every remote mutation they send.

use serde::{Deserialize, Serialize};

use crate::domain::local_tree::LocalNode;
use crate::domain::newtypes::RemoteId;
use crate::governor::OpContext;

/// MIME type marking an entry as a folder
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// A remote store's view of one direct child of a folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    /// Provider-specific identifier
    pub id: RemoteId,
    /// Entry title (matched against local names)
    pub title: String,
    /// MIME type as reported by the store
    pub mime_type: Option<String>,
}

impl RemoteEntry {
    /// Creates an entry
    pub fn new(id: RemoteId, title: impl Into<String>, mime_type: Option<String>) -> Self {
        Self {
            id,
            title: title.into(),
            mime_type,
        }
    }

    /// Whether the entry carries the folder MIME type
    pub fn is_folder(&self) -> bool {
        self.mime_type.as_deref() == Some(FOLDER_MIME_TYPE)
    }
}

/// Port trait for hierarchical remote store operations
///
/// Every call is a remote round trip. Listing may be paginated internally;
/// the other three methods are mutating and are tallied by the governor.
#[async_trait::async_trait]
pub trait IRemoteHierarchy: Send + Sync {
    /// Returns all non-trashed direct children of `folder_id`, following
    /// continuation tokens until exhausted
    async fn list_children(&self, folder_id: &RemoteId) -> anyhow::Result<Vec<RemoteEntry>>;

    /// Creates a folder named `title` under `parent_id`
    ///
    /// # Returns
    /// The identifier of the new folder
    async fn create_folder(
        &self,
        title: &str,
        parent_id: &RemoteId,
        ctx: &OpContext,
    ) -> anyhow::Result<RemoteId>;

    /// Uploads the bytes of `local` as a new file under `parent_id`
    ///
    /// The content type is inferred from the file name. Transient transport
    /// failures are retried until `ctx`'s cancellation token fires.
    ///
    /// # Returns
    /// The identifier of the new file
    async fn create_file(
        &self,
        local: &LocalNode,
        parent_id: &RemoteId,
        ctx: &OpContext,
    ) -> anyhow::Result<RemoteId>;

    /// Links `file_id` under `new_parent_id`, then unlinks it from
    /// `old_parent_id`
    ///
    /// Two sequential mutations, each tallied; not atomic. A failure between
    /// them leaves the file under both parents.
    async fn relocate_file(
        &self,
        file_id: &RemoteId,
        old_parent_id: &RemoteId,
        new_parent_id: &RemoteId,
        ctx: &OpContext,
    ) -> anyhow::Result<()>;
}

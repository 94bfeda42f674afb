//! DriveHierarchy - IRemoteHierarchy implementation for Google Drive
//!
//! Wraps the [`DriveClient`] and delegates to the listing, files, and upload
//! modules to fulfil the [`IRemoteHierarchy`] port contract.
//!
//! ## Design Notes
//!
//! - Every mutating request is tallied through the [`OpContext`] before it is
//!   sent; relocation tallies once per leg. A [`GovernorError`] is returned
//!   unwrapped so the reconciler can recognise it.
//! - Only uploads retry. Listing, folder creation and parent changes fail on
//!   the first error.
//!
//! [`GovernorError`]: dirpush_core::governor::GovernorError

use anyhow::{Context, Result};
use tracing::debug;

use dirpush_core::domain::local_tree::LocalNode;
use dirpush_core::domain::newtypes::RemoteId;
use dirpush_core::governor::OpContext;
use dirpush_core::ports::{IRemoteHierarchy, RemoteEntry};

use crate::client::DriveClient;
use crate::upload::RetryPolicy;
use crate::{files, listing, upload};

/// Remote hierarchy backed by the Drive v2 API
#[derive(Debug, Clone)]
pub struct DriveHierarchy {
    client: DriveClient,
    retry: RetryPolicy,
}

impl DriveHierarchy {
    /// Creates a hierarchy with the default upload retry policy
    pub fn new(client: DriveClient) -> Self {
        Self::with_retry_policy(client, RetryPolicy::default())
    }

    /// Creates a hierarchy with a custom upload retry policy
    pub fn with_retry_policy(client: DriveClient, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// The underlying client
    pub fn client(&self) -> &DriveClient {
        &self.client
    }
}

#[async_trait::async_trait]
impl IRemoteHierarchy for DriveHierarchy {
    async fn list_children(&self, folder_id: &RemoteId) -> Result<Vec<RemoteEntry>> {
        debug!(folder_id = %folder_id, "DriveHierarchy::list_children");
        let entries = listing::list_children(&self.client, folder_id)
            .await
            .with_context(|| format!("Failed to list folder {folder_id}"))?;
        Ok(entries)
    }

    async fn create_folder(
        &self,
        title: &str,
        parent_id: &RemoteId,
        ctx: &OpContext,
    ) -> Result<RemoteId> {
        ctx.tally("create_folder")?;
        debug!(title, parent_id = %parent_id, "DriveHierarchy::create_folder");
        let id = files::insert_folder(&self.client, title, parent_id)
            .await
            .with_context(|| format!("Failed to create folder '{title}'"))?;
        Ok(id)
    }

    async fn create_file(
        &self,
        local: &LocalNode,
        parent_id: &RemoteId,
        ctx: &OpContext,
    ) -> Result<RemoteId> {
        ctx.tally("create_file")?;
        debug!(
            path = %local.path().display(),
            size = local.size(),
            parent_id = %parent_id,
            "DriveHierarchy::create_file"
        );
        let id = upload::upload_file(
            &self.client,
            local.path(),
            local.name(),
            parent_id,
            ctx.cancellation(),
            &self.retry,
        )
        .await
        .with_context(|| format!("Failed to upload {}", local.path().display()))?;
        Ok(id)
    }

    async fn relocate_file(
        &self,
        file_id: &RemoteId,
        old_parent_id: &RemoteId,
        new_parent_id: &RemoteId,
        ctx: &OpContext,
    ) -> Result<()> {
        debug!(
            file_id = %file_id,
            from = %old_parent_id,
            to = %new_parent_id,
            "DriveHierarchy::relocate_file"
        );

        ctx.tally("relocate_file.add_parent")?;
        files::add_parent(&self.client, file_id, new_parent_id)
            .await
            .with_context(|| format!("Failed to add parent {new_parent_id} to {file_id}"))?;

        ctx.tally("relocate_file.remove_parent")?;
        files::remove_parent(&self.client, file_id, old_parent_id)
            .await
            .with_context(|| format!("Failed to remove parent {old_parent_id} from {file_id}"))?;
        Ok(())
    }
}

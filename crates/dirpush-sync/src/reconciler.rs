//! Reconciler: makes the remote folder mirror the local tree
//!
//! Depth-first, pre-order, one remote call at a time. For every directory
//! the remote folder is listed once, then each local child is matched by
//! exact title against that listing:
//!
//! | local     | remote match | action                                   | marker |
//! |-----------|--------------|------------------------------------------|--------|
//! | directory | none         | create folder                            | `+`    |
//! | directory | found        | adopt its id                             | blank  |
//! | file      | none         | upload                                   | `+`    |
//! | file      | found        | move old file to quarantine, then upload | `M`    |
//!
//! A directory child is recursed into right after its status line, before
//! its later siblings. The first error ends the run; nothing is rolled back.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, info};

use dirpush_core::domain::local_tree::{LocalTree, NodeId};
use dirpush_core::domain::newtypes::RemoteId;
use dirpush_core::governor::OpContext;
use dirpush_core::ports::{IRemoteHierarchy, IStatusReporter, RemoteEntry, StatusLine, StatusMarker};
use dirpush_core::{PushError, RemoteOp};

/// Counts of what a completed run did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub folders_created: u64,
    pub folders_unchanged: u64,
    pub files_created: u64,
    pub files_replaced: u64,
}

/// Drives one push run against an [`IRemoteHierarchy`]
pub struct Reconciler {
    remote: Arc<dyn IRemoteHierarchy>,
    quarantine_id: RemoteId,
    ctx: OpContext,
    reporter: Arc<dyn IStatusReporter>,
}

impl Reconciler {
    pub fn new(
        remote: Arc<dyn IRemoteHierarchy>,
        quarantine_id: RemoteId,
        ctx: OpContext,
        reporter: Arc<dyn IStatusReporter>,
    ) -> Self {
        Self {
            remote,
            quarantine_id,
            ctx,
            reporter,
        }
    }

    /// Reconciles `tree` into the remote folder `root_id`.
    ///
    /// Assigns `root_id` to the tree root and a remote id to every other node
    /// it reaches.
    ///
    /// # Errors
    /// The first remote failure, wrapped with the relative path and the
    /// failing operation. Governor aborts surface as
    /// [`PushError::CeilingExceeded`].
    pub async fn run(
        &self,
        tree: &mut LocalTree,
        root_id: RemoteId,
    ) -> Result<ReconcileSummary, PushError> {
        let root = tree.root();
        tree.assign_remote_id(root, root_id)?;

        let mut summary = ReconcileSummary::default();
        self.process_directory(tree, root, &mut summary).await?;

        info!(
            folders_created = summary.folders_created,
            folders_unchanged = summary.folders_unchanged,
            files_created = summary.files_created,
            files_replaced = summary.files_replaced,
            operations = self.ctx.governor().executed(),
            "Reconciliation finished"
        );
        Ok(summary)
    }

    fn process_directory<'a>(
        &'a self,
        tree: &'a mut LocalTree,
        dir: NodeId,
        summary: &'a mut ReconcileSummary,
    ) -> Pin<Box<dyn Future<Output = Result<(), PushError>> + Send + 'a>> {
        Box::pin(async move {
            let dir_path = tree.relative_path(dir);
            let folder_id = match tree.node(dir).remote_id() {
                Some(id) => id.clone(),
                None => {
                    return Err(PushError::remote(
                        RemoteOp::List,
                        dir_path,
                        anyhow::anyhow!("directory has no remote id"),
                    ))
                }
            };

            debug!(path = %dir_path, folder_id = %folder_id, "Listing remote folder");
            let listing = self
                .remote
                .list_children(&folder_id)
                .await
                .map_err(|e| self.wrap(RemoteOp::List, &dir_path, e))?;

            let children = tree.children(dir).to_vec();
            for child in children {
                if self.ctx.is_cancelled() {
                    return Err(PushError::Cancelled);
                }

                let node = tree.node(child);
                let name = node.name().to_string();
                let is_dir = node.is_dir();
                let size = node.size();
                let rel = tree.relative_path(child);
                let matched = find_match(&listing, &name);

                if is_dir {
                    let line = match matched {
                        None => {
                            let id = self
                                .remote
                                .create_folder(&name, &folder_id, &self.ctx)
                                .await
                                .map_err(|e| self.wrap(RemoteOp::CreateFolder, &rel, e))?;
                            tree.assign_remote_id(child, id)?;
                            summary.folders_created += 1;
                            StatusLine::directory(StatusMarker::Created, rel)
                        }
                        Some(entry) => {
                            if !entry.is_folder() {
                                debug!(path = %rel, mime_type = ?entry.mime_type, "Local directory matched a non-folder entry");
                            }
                            tree.assign_remote_id(child, entry.id.clone())?;
                            summary.folders_unchanged += 1;
                            StatusLine::directory(StatusMarker::Unchanged, rel)
                        }
                    };
                    self.reporter.report(&line);
                    self.process_directory(tree, child, summary).await?;
                } else {
                    let marker = match matched {
                        None => StatusMarker::Created,
                        Some(entry) => {
                            if entry.is_folder() {
                                debug!(path = %rel, "Local file matched a remote folder");
                            }
                            self.remote
                                .relocate_file(&entry.id, &folder_id, &self.quarantine_id, &self.ctx)
                                .await
                                .map_err(|e| self.wrap(RemoteOp::Relocate, &rel, e))?;
                            StatusMarker::Modified
                        }
                    };

                    let id = self
                        .remote
                        .create_file(tree.node(child), &folder_id, &self.ctx)
                        .await
                        .map_err(|e| self.wrap(RemoteOp::CreateFile, &rel, e))?;
                    tree.assign_remote_id(child, id)?;
                    match marker {
                        StatusMarker::Modified => summary.files_replaced += 1,
                        _ => summary.files_created += 1,
                    }
                    self.reporter.report(&StatusLine::file(marker, rel, size));
                }
            }
            Ok(())
        })
    }

    fn wrap(&self, op: RemoteOp, rel: &str, err: anyhow::Error) -> PushError {
        let err = PushError::remote(op, rel, err);
        if self.ctx.is_cancelled() && !err.is_abort() {
            return PushError::Cancelled;
        }
        err
    }
}

/// First listing entry whose title equals `name`
fn find_match<'a>(listing: &'a [RemoteEntry], name: &str) -> Option<&'a RemoteEntry> {
    listing.iter().find(|entry| entry.title == name)
}

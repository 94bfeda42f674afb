//! In-memory model of a scanned local directory subtree
//!
//! The tree is an arena: every [`LocalNode`] lives in a single `Vec` owned by
//! [`LocalTree`] and is addressed by a [`NodeId`]. Parent links are plain
//! `NodeId`s, so ownership flows strictly from the arena and the structure
//! cannot form cycles.
//!
//! Apart from [`LocalNode::remote_id`], which is assigned exactly once while
//! reconciling, the tree is read-only after [`LocalTree::assemble`].

use std::collections::HashMap;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::errors::DomainError;
use super::newtypes::RemoteId;

/// Index of a node inside its [`LocalTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Filesystem metadata captured for one entry at scan time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    /// Final path component
    pub name: String,
    /// Size in bytes as reported by `lstat`
    pub size: u64,
    /// Permission/mode bits
    pub mode: u32,
    /// Last modification time, if the platform reports one
    pub modified: Option<DateTime<Utc>>,
    /// Whether the entry is a directory
    pub is_dir: bool,
}

impl FileInfo {
    /// Builds a `FileInfo` from an entry name and its (non-followed) metadata
    pub fn from_metadata(name: impl Into<String>, metadata: &Metadata) -> Self {
        Self {
            name: name.into(),
            size: metadata.len(),
            mode: mode_bits(metadata),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            is_dir: metadata.is_dir(),
        }
    }
}

#[cfg(unix)]
fn mode_bits(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn mode_bits(metadata: &Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}

/// One filesystem entry in the tree
#[derive(Debug, Clone)]
pub struct LocalNode {
    path: PathBuf,
    info: FileInfo,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    remote_id: Option<RemoteId>,
}

impl LocalNode {
    /// Absolute path of the entry
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Scan-time metadata
    pub fn info(&self) -> &FileInfo {
        &self.info
    }

    /// Entry name (final path component)
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Whether the entry is a directory
    pub fn is_dir(&self) -> bool {
        self.info.is_dir
    }

    /// Size in bytes
    pub fn size(&self) -> u64 {
        self.info.size
    }

    /// Parent node, `None` for the root
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Identifier of the remote counterpart, once resolved
    pub fn remote_id(&self) -> Option<&RemoteId> {
        self.remote_id.as_ref()
    }
}

/// Arena-backed tree of [`LocalNode`]s with a single root
#[derive(Debug, Clone)]
pub struct LocalTree {
    nodes: Vec<LocalNode>,
    root: NodeId,
}

impl LocalTree {
    /// Assembles a tree from scanned `(absolute path, metadata)` entries.
    ///
    /// Entries may arrive in any order. Each entry is linked to the entry
    /// whose path equals its parent directory; the single entry whose parent
    /// was not seen becomes the root. Children keep the order in which their
    /// entries were supplied.
    ///
    /// # Errors
    /// Returns [`DomainError::NoSingleRoot`] if the entries are empty or more
    /// than one entry lacks a parent.
    pub fn assemble<I>(entries: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = (PathBuf, FileInfo)>,
    {
        let mut nodes: Vec<LocalNode> = entries
            .into_iter()
            .map(|(path, info)| LocalNode {
                path,
                info,
                parent: None,
                children: Vec::new(),
                remote_id: None,
            })
            .collect();

        let by_path: HashMap<PathBuf, NodeId> = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.path.clone(), NodeId(i)))
            .collect();

        let mut roots = Vec::new();
        for i in 0..nodes.len() {
            let parent = nodes[i]
                .path
                .parent()
                .and_then(|p| by_path.get(p))
                .copied();
            match parent {
                Some(parent) => {
                    nodes[i].parent = Some(parent);
                    nodes[parent.0].children.push(NodeId(i));
                }
                None => roots.push(NodeId(i)),
            }
        }

        match roots.as_slice() {
            [root] => Ok(Self { nodes, root: *root }),
            [] => Err(DomainError::NoSingleRoot("no entries scanned".to_string())),
            many => Err(DomainError::NoSingleRoot(format!(
                "{} entries without a parent",
                many.len()
            ))),
        }
    }

    /// The scan root
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the node with the given id
    ///
    /// # Panics
    /// Panics if `id` was not handed out by this tree.
    pub fn node(&self, id: NodeId) -> &LocalNode {
        &self.nodes[id.0]
    }

    /// Children of `id` in insertion order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false for an assembled tree; provided for API symmetry
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over all nodes in arena order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &LocalNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Records the remote counterpart of a node.
    ///
    /// # Errors
    /// Returns [`DomainError::RemoteIdAlreadyAssigned`] on a second assignment.
    pub fn assign_remote_id(&mut self, id: NodeId, remote_id: RemoteId) -> Result<(), DomainError> {
        let node = &mut self.nodes[id.0];
        if node.remote_id.is_some() {
            return Err(DomainError::RemoteIdAlreadyAssigned {
                path: node.path.clone(),
            });
        }
        node.remote_id = Some(remote_id);
        Ok(())
    }

    /// Path of `id` relative to the root, `/`-separated; empty for the root
    pub fn relative_path(&self, id: NodeId) -> String {
        let root = &self.nodes[self.root.0].path;
        let path = &self.nodes[id.0].path;
        path.strip_prefix(root)
            .map(|rel| {
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .unwrap_or_else(|_| path.to_string_lossy().into_owned())
    }
}

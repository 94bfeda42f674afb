//! Local tree builder
//!
//! Walks a directory with `walkdir` (links are not followed, siblings in
//! file-name order) and assembles the entries into a [`LocalTree`]. Any
//! error aborts the scan; no partial tree is ever returned.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use dirpush_core::domain::errors::DomainError;
use dirpush_core::domain::local_tree::{FileInfo, LocalTree};
use dirpush_core::PushError;

/// Errors raised while scanning the local directory
#[derive(Debug, Error)]
pub enum ScanError {
    /// The current directory could not be determined for a relative root
    #[error("cannot resolve {}: {source}", path.display())]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading an entry or its metadata failed
    #[error("cannot read {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// The scan root exists but is not a directory
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// The scanned entries did not form a single tree
    #[error(transparent)]
    Tree(#[from] DomainError),
}

impl ScanError {
    /// Path the error refers to, when there is one
    pub fn path(&self) -> Option<&Path> {
        match self {
            ScanError::Resolve { path, .. }
            | ScanError::Walk { path, .. }
            | ScanError::NotADirectory(path) => Some(path),
            ScanError::Tree(_) => None,
        }
    }
}

impl From<ScanError> for PushError {
    fn from(err: ScanError) -> Self {
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        PushError::Scan {
            path,
            source: anyhow::Error::new(err),
        }
    }
}

/// Makes `root` absolute against the current directory and drops `.`
/// components. Symlinks in the root path itself are kept as given.
pub fn absolute_root(root: &Path) -> Result<PathBuf, ScanError> {
    let joined = if root.is_absolute() {
        root.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|source| ScanError::Resolve {
                path: root.to_path_buf(),
                source,
            })?
            .join(root)
    };
    Ok(joined.components().collect())
}

/// Scans `root` recursively and returns the assembled tree.
///
/// Symlinks, special files and empty files are ordinary entries carrying
/// their own (`lstat`) metadata. Nothing is filtered out.
///
/// # Errors
/// Fails on the first unreadable entry, or if `root` is missing or is not a
/// directory.
pub fn scan_tree(root: &Path) -> Result<LocalTree, ScanError> {
    let root = absolute_root(root)?;
    debug!(root = %root.display(), "Scanning local tree");

    let mut entries: Vec<(PathBuf, FileInfo)> = Vec::new();
    for entry in WalkDir::new(&root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| ScanError::Walk {
            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone()),
            source: e,
        })?;
        let metadata = entry.metadata().map_err(|e| ScanError::Walk {
            path: entry.path().to_path_buf(),
            source: e,
        })?;

        if entry.depth() == 0 && !metadata.is_dir() {
            return Err(ScanError::NotADirectory(root));
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        entries.push((entry.into_path(), FileInfo::from_metadata(name, &metadata)));
    }

    let tree = LocalTree::assemble(entries)?;
    info!(root = %root.display(), entries = tree.len(), "Local tree scanned");
    Ok(tree)
}

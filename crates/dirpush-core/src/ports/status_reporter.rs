//! Status reporter port
//!
//! The reconciler emits one [`StatusLine`] per reconciled entry, in visit
//! order, as soon as the entry is settled. The CLI prints them to stdout;
//! tests record them.

use std::fmt;

use crate::domain::byte_size::format_bytes;

/// Outcome marker printed at the start of a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMarker {
    /// The remote counterpart was created (`+`)
    Created,
    /// A remote file was quarantined and replaced (`M`)
    Modified,
    /// A remote folder already existed (blank)
    Unchanged,
}

impl StatusMarker {
    /// Single-character marker
    pub fn symbol(self) -> char {
        match self {
            StatusMarker::Created => '+',
            StatusMarker::Modified => 'M',
            StatusMarker::Unchanged => ' ',
        }
    }
}

/// Kind of the reported entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A directory; rendered with a trailing `/`
    Directory,
    /// A file; rendered with its size
    File {
        /// Size in bytes
        size: u64,
    },
}

/// One line of run output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Outcome
    pub marker: StatusMarker,
    /// `/`-separated path relative to the local root
    pub relative_path: String,
    /// Directory or file
    pub kind: EntryKind,
}

impl StatusLine {
    /// Line for a directory
    pub fn directory(marker: StatusMarker, relative_path: impl Into<String>) -> Self {
        Self {
            marker,
            relative_path: relative_path.into(),
            kind: EntryKind::Directory,
        }
    }

    /// Line for a file
    pub fn file(marker: StatusMarker, relative_path: impl Into<String>, size: u64) -> Self {
        Self {
            marker,
            relative_path: relative_path.into(),
            kind: EntryKind::File { size },
        }
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EntryKind::Directory => {
                write!(f, "{} /{}/", self.marker.symbol(), self.relative_path)
            }
            EntryKind::File { size } => write!(
                f,
                "{} /{} ({})",
                self.marker.symbol(),
                self.relative_path,
                format_bytes(size)
            ),
        }
    }
}

/// Port trait receiving status lines as the run progresses
pub trait IStatusReporter: Send + Sync {
    /// Called once per reconciled entry
    fn report(&self, line: &StatusLine);
}

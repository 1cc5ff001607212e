//! The entry abstraction shared by every backend
//!
//! An [`Entry`] is one node of a tree (local repository or remote server):
//! either a directory with children or a leaf with opaque byte content.
//! Algorithms that list, diff or copy trees only ever talk to this trait.

use std::fmt;

use crate::{EntryPath, Result};

/// A boxed entry of either backend.
pub type BoxEntry = Box<dyn Entry>;

/// Capability interface for tree nodes.
///
/// Entries are cheap handles created on demand during traversal. They hold
/// their path plus a handle to the root that owns the backend; the parent is
/// re-derived from the path instead of being stored.
pub trait Entry: fmt::Debug {
    /// Absolute path of this entry inside its tree.
    fn path(&self) -> &EntryPath;

    /// Last path segment; empty for the root.
    fn name(&self) -> &str {
        self.path().name()
    }

    /// Path used in messages.
    fn display_path(&self) -> String {
        self.path().to_string()
    }

    /// Whether the entry exists. May cost a backend round trip but must give
    /// the same answer for the rest of the traversal.
    fn exists(&self) -> bool;

    /// Like [`Entry::exists`], but fails when the backend cannot tell, for
    /// example because the parent listing failed. Callers that delete on
    /// absence must use this.
    fn try_exists(&self) -> Result<bool> {
        Ok(self.exists())
    }

    /// Whether the entry is an existing directory. Absent entries are not
    /// directories.
    fn is_dir(&self) -> bool;

    /// Look up any absolute path through the root that owns this entry.
    /// Never fails: the resulting entry may not exist.
    fn resolve(&self, path: &EntryPath) -> BoxEntry;

    /// Look up a child by name.
    fn child(&self, name: &str) -> BoxEntry {
        self.resolve(&self.path().join(name))
    }

    /// The parent entry; `None` for the root.
    fn parent(&self) -> Option<BoxEntry> {
        self.path().parent().map(|parent| self.resolve(&parent))
    }

    /// Enumerate children in backend order.
    ///
    /// Fails with `NotFound` when the directory is absent and with
    /// `NotADirectory` on a leaf.
    fn children(&self) -> Result<Vec<BoxEntry>>;

    /// Read leaf content.
    ///
    /// Fails with `NotFound` when absent and `OperationNotAllowed` for
    /// directories or object kinds that refuse raw reads.
    fn read(&self) -> Result<Vec<u8>>;

    /// Create or replace leaf content. Missing parent directories are the
    /// backend's responsibility.
    fn write(&self, content: &[u8]) -> Result<()>;

    /// Create this entry as an (empty) directory.
    fn create_dir(&self) -> Result<()>;

    /// Delete the entry.
    ///
    /// Fails with `NotFound` when absent and `MustDeleteRecursively` for a
    /// non-empty directory when `recursive` is false.
    fn delete(&self, recursive: bool) -> Result<()>;
}

//! The remote server collaborator

use std::fmt;

use knife_fs::EntryPath;

use crate::Result;

/// One name in a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteChild {
    pub name: String,
    pub is_dir: bool,
}

impl RemoteChild {
    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }

    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }
}

/// A server exposing an object hierarchy.
///
/// Every call is one blocking round trip. Stores are addressed with the same
/// [`EntryPath`]s as the local repository; how a path maps onto endpoints is
/// up to the store.
pub trait RemoteStore: fmt::Debug {
    /// Human readable location, used in logs.
    fn location(&self) -> String;

    /// List the children of a directory.
    fn list(&self, path: &EntryPath) -> Result<Vec<RemoteChild>>;

    /// Read one object.
    fn read(&self, path: &EntryPath) -> Result<Vec<u8>>;

    /// Create or replace one object.
    fn write(&self, path: &EntryPath, content: &[u8]) -> Result<()>;

    /// Create a directory. Succeeds if it already exists.
    fn mkdir(&self, path: &EntryPath) -> Result<()>;

    /// Delete an object or directory.
    fn delete(&self, path: &EntryPath, recursive: bool) -> Result<()>;
}

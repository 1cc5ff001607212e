//! A directory on disk served as a remote server (`file://` URLs)

use std::path::{Path, PathBuf};

use knife_fs::{Entry, EntryPath, LocalEntry};

use crate::store::{RemoteChild, RemoteStore};
use crate::{Result, StoreError};

/// Serves the tree under a local directory with remote semantics.
///
/// Useful for offline mirrors and tests: the layout on disk is exactly the
/// layout of the repository it mirrors.
#[derive(Debug)]
pub struct DirectoryStore {
    root: LocalEntry,
}

impl DirectoryStore {
    pub fn new(base: impl AsRef<Path>) -> Self {
        Self {
            root: LocalEntry::open_root(base),
        }
    }

    /// Build from a `file://` URL.
    pub fn from_url(url: &str) -> Result<Self> {
        let path = url
            .strip_prefix("file://")
            .ok_or_else(|| StoreError::UnsupportedUrl {
                url: url.to_string(),
            })?;
        Ok(Self::new(PathBuf::from(path)))
    }

    pub fn base(&self) -> &Path {
        self.root.base()
    }
}

impl RemoteStore for DirectoryStore {
    fn location(&self) -> String {
        format!("file://{}", self.root.base().display())
    }

    fn list(&self, path: &EntryPath) -> Result<Vec<RemoteChild>> {
        let children = self.root.resolve(path).children()?;
        Ok(children
            .iter()
            .map(|child| RemoteChild {
                name: child.name().to_string(),
                is_dir: child.is_dir(),
            })
            .collect())
    }

    fn read(&self, path: &EntryPath) -> Result<Vec<u8>> {
        Ok(self.root.resolve(path).read()?)
    }

    fn write(&self, path: &EntryPath, content: &[u8]) -> Result<()> {
        Ok(self.root.resolve(path).write(content)?)
    }

    fn mkdir(&self, path: &EntryPath) -> Result<()> {
        Ok(self.root.resolve(path).create_dir()?)
    }

    fn delete(&self, path: &EntryPath, recursive: bool) -> Result<()> {
        Ok(self.root.resolve(path).delete(recursive)?)
    }
}

//! [`FaultyStore`], a [`MemoryStore`] that fails chosen calls.

use std::collections::HashMap;

use knife_fs::EntryPath;
use knife_remote::{MemoryStore, RemoteChild, RemoteStore, Result, StoreError};

/// A failure to inject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// The server answers with this status and body.
    Http(u16, String),
    /// The server refuses the operation.
    NotAllowed(String),
}

impl Fault {
    pub fn server_error() -> Self {
        Self::Http(500, "boom".to_string())
    }

    fn raise(&self, path: &EntryPath) -> StoreError {
        match self {
            Self::Http(status, body) => StoreError::Http {
                path: path.to_string(),
                status: *status,
                body: body.clone(),
            },
            Self::NotAllowed(reason) => StoreError::not_allowed(path, reason.clone()),
        }
    }
}

/// Wraps a [`MemoryStore`] and fails `list` or `read` on chosen paths.
///
/// Writes go straight through, so the inner store can be inspected after a
/// run.
///
/// # Example
///
/// ```rust,no_run
/// use knife_remote::{MemoryStore, RemoteEntry};
/// use knife_test_utils::{Fault, FaultyStore};
///
/// let store = FaultyStore::new(MemoryStore::new().with_file("/roles/a.json", "{}"))
///     .failing_list("/roles", Fault::server_error());
/// let root = RemoteEntry::open_root(store);
/// ```
#[derive(Debug, Clone)]
pub struct FaultyStore {
    inner: MemoryStore,
    list_faults: HashMap<EntryPath, Fault>,
    read_faults: HashMap<EntryPath, Fault>,
}

impl FaultyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            list_faults: HashMap::new(),
            read_faults: HashMap::new(),
        }
    }

    /// Fail every listing of `path`.
    pub fn failing_list(mut self, path: impl Into<EntryPath>, fault: Fault) -> Self {
        self.list_faults.insert(path.into(), fault);
        self
    }

    /// Fail every read of `path`.
    pub fn failing_read(mut self, path: impl Into<EntryPath>, fault: Fault) -> Self {
        self.read_faults.insert(path.into(), fault);
        self
    }

    /// The wrapped store.
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

impl RemoteStore for FaultyStore {
    fn location(&self) -> String {
        "faulty memory".to_string()
    }

    fn list(&self, path: &EntryPath) -> Result<Vec<RemoteChild>> {
        match self.list_faults.get(path) {
            Some(fault) => Err(fault.raise(path)),
            None => self.inner.list(path),
        }
    }

    fn read(&self, path: &EntryPath) -> Result<Vec<u8>> {
        match self.read_faults.get(path) {
            Some(fault) => Err(fault.raise(path)),
            None => self.inner.read(path),
        }
    }

    fn write(&self, path: &EntryPath, content: &[u8]) -> Result<()> {
        self.inner.write(path, content)
    }

    fn mkdir(&self, path: &EntryPath) -> Result<()> {
        self.inner.mkdir(path)
    }

    fn delete(&self, path: &EntryPath, recursive: bool) -> Result<()> {
        self.inner.delete(path, recursive)
    }
}

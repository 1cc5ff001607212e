//! In-memory remote store

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use knife_fs::EntryPath;

use crate::store::{RemoteChild, RemoteStore};
use crate::{Result, StoreError};

#[derive(Debug, Clone)]
enum Node {
    Dir(BTreeMap<String, Node>),
    File(Vec<u8>),
}

#[derive(Debug, Default)]
struct MemoryTree {
    root: BTreeMap<String, Node>,
    read_only: HashSet<EntryPath>,
    list_calls: usize,
}

impl MemoryTree {
    fn node(&self, path: &EntryPath) -> Option<&Node> {
        let mut segments = path.segments();
        let first = segments.next()?;
        let mut node = self.root.get(first)?;
        for segment in segments {
            match node {
                Node::Dir(children) => node = children.get(segment)?,
                Node::File(_) => return None,
            }
        }
        Some(node)
    }

    /// Children map of the directory at `path`, creating missing directories.
    fn dir_mut(&mut self, path: &EntryPath) -> Result<&mut BTreeMap<String, Node>> {
        let mut dir = &mut self.root;
        for segment in path.segments() {
            let node = dir
                .entry(segment.to_string())
                .or_insert_with(|| Node::Dir(BTreeMap::new()));
            dir = match node {
                Node::Dir(children) => children,
                Node::File(_) => {
                    return Err(StoreError::NotADirectory {
                        path: path.to_string(),
                    });
                }
            };
        }
        Ok(dir)
    }

    fn check_writable(&self, path: &EntryPath) -> Result<()> {
        if self.read_only.iter().any(|ro| path.starts_with(ro)) {
            return Err(StoreError::not_allowed(path, "is read-only"));
        }
        Ok(())
    }
}

/// A remote tree held in memory.
///
/// Clones share the same tree, so a test can keep a handle for inspection
/// after passing the store to [`RemoteEntry::open_root`](crate::RemoteEntry::open_root).
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tree: Rc<RefCell<MemoryTree>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, creating its parent directories.
    pub fn with_file(self, path: impl Into<EntryPath>, content: impl AsRef<[u8]>) -> Self {
        let path = path.into();
        if let Some(parent) = path.parent() {
            let mut tree = self.tree.borrow_mut();
            if let Ok(dir) = tree.dir_mut(&parent) {
                dir.insert(path.name().to_string(), Node::File(content.as_ref().to_vec()));
            }
        }
        self
    }

    /// Add an empty directory.
    pub fn with_dir(self, path: impl Into<EntryPath>) -> Self {
        let _ = self.tree.borrow_mut().dir_mut(&path.into());
        self
    }

    /// Refuse writes and deletes at `path` and below.
    pub fn with_read_only(self, path: impl Into<EntryPath>) -> Self {
        self.tree.borrow_mut().read_only.insert(path.into());
        self
    }

    /// Content of a file, if present.
    pub fn contents(&self, path: impl Into<EntryPath>) -> Option<Vec<u8>> {
        match self.tree.borrow().node(&path.into()) {
            Some(Node::File(content)) => Some(content.clone()),
            _ => None,
        }
    }

    /// Whether anything exists at `path`.
    pub fn contains(&self, path: impl Into<EntryPath>) -> bool {
        let path = path.into();
        path.is_root() || self.tree.borrow().node(&path).is_some()
    }

    /// Number of `list` calls served so far.
    pub fn list_calls(&self) -> usize {
        self.tree.borrow().list_calls
    }
}

impl RemoteStore for MemoryStore {
    fn location(&self) -> String {
        "memory".to_string()
    }

    fn list(&self, path: &EntryPath) -> Result<Vec<RemoteChild>> {
        let mut tree = self.tree.borrow_mut();
        tree.list_calls += 1;
        let children = if path.is_root() {
            &tree.root
        } else {
            match tree.node(path) {
                Some(Node::Dir(children)) => children,
                Some(Node::File(_)) => {
                    return Err(StoreError::NotADirectory {
                        path: path.to_string(),
                    });
                }
                None => return Err(StoreError::not_found(path)),
            }
        };
        Ok(children
            .iter()
            .map(|(name, node)| RemoteChild {
                name: name.clone(),
                is_dir: matches!(node, Node::Dir(_)),
            })
            .collect())
    }

    fn read(&self, path: &EntryPath) -> Result<Vec<u8>> {
        match self.tree.borrow().node(path) {
            Some(Node::File(content)) => Ok(content.clone()),
            Some(Node::Dir(_)) => Err(StoreError::not_allowed(path, "is a directory")),
            None if path.is_root() => Err(StoreError::not_allowed(path, "is a directory")),
            None => Err(StoreError::not_found(path)),
        }
    }

    fn write(&self, path: &EntryPath, content: &[u8]) -> Result<()> {
        let mut tree = self.tree.borrow_mut();
        tree.check_writable(path)?;
        let parent = path
            .parent()
            .ok_or_else(|| StoreError::not_allowed(path, "is a directory"))?;
        let dir = tree.dir_mut(&parent)?;
        if let Some(Node::Dir(_)) = dir.get(path.name()) {
            return Err(StoreError::not_allowed(path, "is a directory"));
        }
        dir.insert(path.name().to_string(), Node::File(content.to_vec()));
        Ok(())
    }

    fn mkdir(&self, path: &EntryPath) -> Result<()> {
        let mut tree = self.tree.borrow_mut();
        tree.check_writable(path)?;
        tree.dir_mut(path).map(|_| ())
    }

    fn delete(&self, path: &EntryPath, recursive: bool) -> Result<()> {
        let mut tree = self.tree.borrow_mut();
        tree.check_writable(path)?;
        let parent = path
            .parent()
            .ok_or_else(|| StoreError::not_allowed(path, "cannot be deleted"))?;
        match tree.node(path) {
            None => return Err(StoreError::not_found(path)),
            Some(Node::Dir(children)) if !children.is_empty() && !recursive => {
                return Err(StoreError::MustDeleteRecursively {
                    path: path.to_string(),
                });
            }
            Some(_) => {}
        }
        tree.dir_mut(&parent)?.remove(path.name());
        Ok(())
    }
}

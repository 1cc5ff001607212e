//! Entries backed by a remote store
//!
//! All entries of one tree share a root that owns the store and a cache of
//! directory listings. The cache lives as long as the root, which is one
//! command run, so recursive traversals list each directory once.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use knife_fs::{BoxEntry, Entry, EntryPath, Error, Operation, Result};
use tracing::{debug, warn};

use crate::store::{RemoteChild, RemoteStore};

#[derive(Debug)]
struct RemoteRoot {
    store: Box<dyn RemoteStore>,
    listings: RefCell<HashMap<EntryPath, Rc<Vec<RemoteChild>>>>,
}

impl RemoteRoot {
    fn listing(&self, path: &EntryPath) -> Result<Rc<Vec<RemoteChild>>> {
        if let Some(cached) = self.listings.borrow().get(path) {
            debug!(%path, "remote listing cache hit");
            return Ok(Rc::clone(cached));
        }
        let children = self
            .store
            .list(path)
            .map_err(|e| e.into_entry_error(path, Operation::List))?;
        let children = Rc::new(children);
        self.listings
            .borrow_mut()
            .insert(path.clone(), Rc::clone(&children));
        Ok(children)
    }

    /// Forget listings a mutation of `path` may have changed: every ancestor
    /// (stores create missing parents) and everything at or below `path`.
    fn invalidate(&self, path: &EntryPath) {
        let mut listings = self.listings.borrow_mut();
        let before = listings.len();
        listings.retain(|cached, _| !cached.starts_with(path) && !path.starts_with(cached));
        debug!(%path, dropped = before - listings.len(), "invalidated remote listings");
    }
}

/// An entry on the remote server.
#[derive(Debug, Clone)]
pub struct RemoteEntry {
    root: Rc<RemoteRoot>,
    path: EntryPath,
}

impl RemoteEntry {
    /// Open the root entry of a remote tree served by `store`.
    pub fn open_root(store: impl RemoteStore + 'static) -> Self {
        Self::from_store(Box::new(store))
    }

    pub fn from_store(store: Box<dyn RemoteStore>) -> Self {
        debug!(location = %store.location(), "opened remote root");
        Self {
            root: Rc::new(RemoteRoot {
                store,
                listings: RefCell::new(HashMap::new()),
            }),
            path: EntryPath::root(),
        }
    }

    /// Location of the backing store.
    pub fn location(&self) -> String {
        self.root.store.location()
    }

    fn at(&self, path: EntryPath) -> Self {
        Self {
            root: Rc::clone(&self.root),
            path,
        }
    }

    /// This entry as it appears in its parent's listing.
    ///
    /// A missing parent (or a leaf parent) means the entry is absent; any
    /// other listing failure is returned.
    fn try_lookup(&self) -> Result<Option<RemoteChild>> {
        let Some(parent) = self.path.parent() else {
            return Ok(None);
        };
        let siblings = match self.root.listing(&parent) {
            Ok(siblings) => siblings,
            Err(Error::NotFound { .. } | Error::NotADirectory { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(siblings.iter().find(|c| c.name == self.path.name()).cloned())
    }

    fn lookup(&self) -> Option<RemoteChild> {
        self.try_lookup().ok().flatten()
    }
}

impl Entry for RemoteEntry {
    fn path(&self) -> &EntryPath {
        &self.path
    }

    fn exists(&self) -> bool {
        self.path.is_root() || self.lookup().is_some()
    }

    fn try_exists(&self) -> Result<bool> {
        Ok(self.path.is_root() || self.try_lookup()?.is_some())
    }

    fn is_dir(&self) -> bool {
        self.path.is_root() || self.lookup().is_some_and(|c| c.is_dir)
    }

    fn resolve(&self, path: &EntryPath) -> BoxEntry {
        Box::new(self.at(path.clone()))
    }

    fn children(&self) -> Result<Vec<BoxEntry>> {
        let listing = self.root.listing(&self.path)?;
        Ok(listing
            .iter()
            .filter(|child| {
                let valid = EntryPath::is_valid_name(&child.name);
                if !valid {
                    warn!(path = %self.path, name = %child.name, "skipping unaddressable child name");
                }
                valid
            })
            .map(|child| Box::new(self.at(self.path.join(&child.name))) as BoxEntry)
            .collect())
    }

    fn read(&self) -> Result<Vec<u8>> {
        self.root
            .store
            .read(&self.path)
            .map_err(|e| e.into_entry_error(&self.path, Operation::Read))
    }

    fn write(&self, content: &[u8]) -> Result<()> {
        let result = self.root.store.write(&self.path, content);
        self.root.invalidate(&self.path);
        result.map_err(|e| e.into_entry_error(&self.path, Operation::Write))?;
        debug!(path = %self.path, bytes = content.len(), "wrote remote entry");
        Ok(())
    }

    fn create_dir(&self) -> Result<()> {
        let result = self.root.store.mkdir(&self.path);
        self.root.invalidate(&self.path);
        result.map_err(|e| e.into_entry_error(&self.path, Operation::CreateDir))?;
        debug!(path = %self.path, "created remote directory");
        Ok(())
    }

    fn delete(&self, recursive: bool) -> Result<()> {
        if self.path.is_root() {
            return Err(Error::not_allowed(&self.path, Operation::Delete, "cannot be deleted"));
        }
        let result = self.root.store.delete(&self.path, recursive);
        self.root.invalidate(&self.path);
        result.map_err(|e| e.into_entry_error(&self.path, Operation::Delete))?;
        debug!(path = %self.path, recursive, "deleted remote entry");
        Ok(())
    }
}

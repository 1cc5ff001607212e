//! Local repository backend
//!
//! Maps entry paths onto a directory tree on disk: `/roles/base.json` under a
//! repository rooted at `/home/me/chef-repo` is the file
//! `/home/me/chef-repo/roles/base.json`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, warn};

use crate::io::{self, TEMP_PREFIX};
use crate::{BoxEntry, Entry, EntryPath, Error, Operation, Result};

#[derive(Debug)]
struct LocalRepo {
    base: PathBuf,
}

/// An entry in the local repository.
#[derive(Debug, Clone)]
pub struct LocalEntry {
    repo: Rc<LocalRepo>,
    path: EntryPath,
}

impl LocalEntry {
    /// Open the root entry of a repository directory.
    ///
    /// The directory does not have to exist yet; writes create it.
    pub fn open_root(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        let base = dunce::canonicalize(base).unwrap_or_else(|_| base.to_path_buf());
        debug!(base = %base.display(), "opened local repository root");
        Self {
            repo: Rc::new(LocalRepo { base }),
            path: EntryPath::root(),
        }
    }

    /// Repository directory this tree is rooted at.
    pub fn base(&self) -> &Path {
        &self.repo.base
    }

    /// On-disk location of this entry.
    pub fn native_path(&self) -> PathBuf {
        self.path
            .segments()
            .fold(self.repo.base.clone(), |acc, segment| acc.join(segment))
    }

    /// Map a directory on disk back to an entry path, if it lies inside the
    /// repository.
    pub fn entry_path_for(&self, native: &Path) -> Option<EntryPath> {
        let native = dunce::canonicalize(native).unwrap_or_else(|_| native.to_path_buf());
        let relative = native.strip_prefix(&self.repo.base).ok()?;
        Some(EntryPath::new(relative.to_string_lossy()))
    }

    fn at(&self, path: EntryPath) -> Self {
        Self {
            repo: Rc::clone(&self.repo),
            path,
        }
    }

    fn map_io(&self, operation: Operation, native: &Path, e: std::io::Error) -> Error {
        match e.kind() {
            ErrorKind::NotFound => Error::not_found(&self.path),
            ErrorKind::PermissionDenied => {
                Error::not_allowed(&self.path, operation, "permission denied")
            }
            _ => Error::io(native, e),
        }
    }
}

impl Entry for LocalEntry {
    fn path(&self) -> &EntryPath {
        &self.path
    }

    fn exists(&self) -> bool {
        self.native_path().exists()
    }

    fn try_exists(&self) -> Result<bool> {
        let native = self.native_path();
        match fs::metadata(&native) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) if e.kind() == ErrorKind::NotADirectory => Ok(false),
            Err(e) => Err(self.map_io(Operation::List, &native, e)),
        }
    }

    fn is_dir(&self) -> bool {
        self.native_path().is_dir()
    }

    fn resolve(&self, path: &EntryPath) -> BoxEntry {
        Box::new(self.at(path.clone()))
    }

    fn children(&self) -> Result<Vec<BoxEntry>> {
        let native = self.native_path();
        if native.is_file() {
            return Err(Error::NotADirectory {
                path: self.path.to_string(),
            });
        }
        let read_dir = fs::read_dir(&native).map_err(|e| self.map_io(Operation::List, &native, e))?;

        let mut names = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = dir_entry.map_err(|e| Error::io(&native, e))?;
            let file_name = dir_entry.file_name();
            let Some(name) = file_name.to_str() else {
                warn!(path = %dir_entry.path().display(), "skipping non UTF-8 file name");
                continue;
            };
            if name.starts_with(TEMP_PREFIX) {
                continue;
            }
            if !EntryPath::is_valid_name(name) {
                warn!(path = %dir_entry.path().display(), "skipping unaddressable file name");
                continue;
            }
            names.push(name.to_string());
        }
        names.sort();

        Ok(names
            .into_iter()
            .map(|name| Box::new(self.at(self.path.join(&name))) as BoxEntry)
            .collect())
    }

    fn read(&self) -> Result<Vec<u8>> {
        let native = self.native_path();
        if native.is_dir() {
            return Err(Error::not_allowed(&self.path, Operation::Read, "is a directory"));
        }
        fs::read(&native).map_err(|e| self.map_io(Operation::Read, &native, e))
    }

    fn write(&self, content: &[u8]) -> Result<()> {
        if self.path.is_root() {
            return Err(Error::not_allowed(&self.path, Operation::Write, "is a directory"));
        }
        let native = self.native_path();
        if native.is_dir() {
            return Err(Error::not_allowed(&self.path, Operation::Write, "is a directory"));
        }
        io::write_atomic(&native, content)?;
        debug!(path = %self.path, bytes = content.len(), "wrote local entry");
        Ok(())
    }

    fn create_dir(&self) -> Result<()> {
        let native = self.native_path();
        if native.is_file() {
            return Err(Error::failed(
                &self.path,
                Operation::CreateDir,
                "a regular file is in the way",
            ));
        }
        fs::create_dir_all(&native).map_err(|e| self.map_io(Operation::CreateDir, &native, e))?;
        debug!(path = %self.path, "created local directory");
        Ok(())
    }

    fn delete(&self, recursive: bool) -> Result<()> {
        if self.path.is_root() {
            return Err(Error::not_allowed(&self.path, Operation::Delete, "cannot be deleted"));
        }
        let native = self.native_path();
        let metadata = fs::symlink_metadata(&native)
            .map_err(|e| self.map_io(Operation::Delete, &native, e))?;

        if metadata.is_dir() {
            let non_empty = fs::read_dir(&native)
                .map_err(|e| self.map_io(Operation::Delete, &native, e))?
                .next()
                .is_some();
            if non_empty && !recursive {
                return Err(Error::MustDeleteRecursively {
                    path: self.path.to_string(),
                });
            }
            fs::remove_dir_all(&native).map_err(|e| self.map_io(Operation::Delete, &native, e))?;
        } else {
            fs::remove_file(&native).map_err(|e| self.map_io(Operation::Delete, &native, e))?;
        }
        debug!(path = %self.path, recursive, "deleted local entry");
        Ok(())
    }
}

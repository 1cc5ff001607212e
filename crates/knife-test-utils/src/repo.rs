//! [`TestRepo`] fixture for sync and diff scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use knife_fs::LocalEntry;
use knife_remote::{DirectoryStore, RemoteEntry};
use tempfile::TempDir;

/// A local repository and a server, each in its own temporary directory.
///
/// The server is a plain directory served through [`DirectoryStore`], so its
/// URL is `file://<dir>` and its content can be inspected on disk.
///
/// # Example
///
/// ```rust,no_run
/// use knife_test_utils::TestRepo;
///
/// let repo = TestRepo::new()
///     .local_file("roles/base.json", "{\"a\":1}")
///     .remote_file("roles/web.json", "{}");
/// repo.assert_remote_exists("roles/web.json");
/// ```
pub struct TestRepo {
    local: TempDir,
    server: TempDir,
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRepo {
    /// Create an empty repository and an empty server.
    pub fn new() -> Self {
        Self {
            local: TempDir::new().unwrap(),
            server: TempDir::new().unwrap(),
        }
    }

    /// Directory of the local repository.
    pub fn local_dir(&self) -> &Path {
        self.local.path()
    }

    /// Directory backing the server.
    pub fn server_dir(&self) -> &Path {
        self.server.path()
    }

    pub fn server_url(&self) -> String {
        format!("file://{}", self.server_dir().display())
    }

    /// Write a file into the local repository, creating parents.
    pub fn local_file(self, path: &str, content: &str) -> Self {
        write(self.local_dir(), path, content);
        self
    }

    /// Write a file onto the server, creating parents.
    pub fn remote_file(self, path: &str, content: &str) -> Self {
        write(self.server_dir(), path, content);
        self
    }

    pub fn local_subdir(self, path: &str) -> Self {
        fs::create_dir_all(resolve(self.local_dir(), path)).unwrap();
        self
    }

    pub fn remote_subdir(self, path: &str) -> Self {
        fs::create_dir_all(resolve(self.server_dir(), path)).unwrap();
        self
    }

    /// A fresh root over the local repository.
    pub fn local_root(&self) -> LocalEntry {
        LocalEntry::open_root(self.local_dir())
    }

    /// A fresh root over the server, with an empty listing cache.
    pub fn remote_root(&self) -> RemoteEntry {
        RemoteEntry::open_root(DirectoryStore::new(self.server_dir()))
    }

    pub fn read_local(&self, path: &str) -> Option<String> {
        fs::read_to_string(resolve(self.local_dir(), path)).ok()
    }

    pub fn read_remote(&self, path: &str) -> Option<String> {
        fs::read_to_string(resolve(self.server_dir(), path)).ok()
    }

    /// # Panics
    /// Panics if `path` does not exist on the server.
    pub fn assert_remote_exists(&self, path: &str) {
        let full = resolve(self.server_dir(), path);
        assert!(full.exists(), "Expected remote path to exist: {}", full.display());
    }

    /// # Panics
    /// Panics if `path` exists on the server.
    pub fn assert_remote_missing(&self, path: &str) {
        let full = resolve(self.server_dir(), path);
        assert!(!full.exists(), "Expected remote path NOT to exist: {}", full.display());
    }

    /// # Panics
    /// Panics if `path` does not exist locally.
    pub fn assert_local_exists(&self, path: &str) {
        let full = resolve(self.local_dir(), path);
        assert!(full.exists(), "Expected local path to exist: {}", full.display());
    }

    /// # Panics
    /// Panics if `path` exists locally.
    pub fn assert_local_missing(&self, path: &str) {
        let full = resolve(self.local_dir(), path);
        assert!(!full.exists(), "Expected local path NOT to exist: {}", full.display());
    }
}

fn resolve(base: &Path, path: &str) -> PathBuf {
    base.join(path.trim_start_matches('/'))
}

fn write(base: &Path, path: &str, content: &str) {
    let full = resolve(base, path);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(full, content).unwrap();
}

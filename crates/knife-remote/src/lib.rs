//! Remote server backends for knife
//!
//! A [`RemoteEntry`] tree sits on top of any [`RemoteStore`]:
//!
//! - [`MemoryStore`] keeps the tree in memory
//! - [`DirectoryStore`] serves a local directory (`file://` URLs)
//! - [`RestStore`] talks to a Chef-style REST API (`http(s)://` URLs)

pub mod directory;
pub mod entry;
pub mod error;
pub mod memory;
pub mod rest;
pub mod store;

pub use directory::DirectoryStore;
pub use entry::RemoteEntry;
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use rest::{RestOptions, RestStore};
pub use store::{RemoteChild, RemoteStore};

/// Open the remote tree behind a server URL.
pub fn open_remote(url: &str, options: &RestOptions) -> Result<RemoteEntry> {
    if url.starts_with("file://") {
        Ok(RemoteEntry::open_root(DirectoryStore::from_url(url)?))
    } else if url.starts_with("http://") || url.starts_with("https://") {
        Ok(RemoteEntry::open_root(RestStore::new(url, options.clone())?))
    } else {
        Err(StoreError::UnsupportedUrl {
            url: url.to_string(),
        })
    }
}

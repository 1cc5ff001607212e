//! Entry trees for knife
//!
//! Provides the [`Entry`] abstraction shared by the local repository and the
//! remote server, glob [`FilePattern`]s over [`EntryPath`]s, and the local
//! on-disk backend.

pub mod entry;
pub mod error;
pub mod io;
pub mod local;
pub mod path;
pub mod pattern;

pub use entry::{BoxEntry, Entry};
pub use error::{Error, Operation, Result};
pub use local::LocalEntry;
pub use path::EntryPath;
pub use pattern::FilePattern;

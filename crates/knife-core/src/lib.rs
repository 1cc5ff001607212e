//! Core algorithms for knife
//!
//! Everything here works on [`Entry`](knife_fs::Entry) trees and does not
//! care whether an entry lives in the local repository or on the server:
//!
//! - [`lister`] walks one tree for the entries a pattern matches
//! - [`pairs`] matches two trees up by path
//! - [`diff`] classifies each path as added, deleted, modified, etc.
//! - [`sync`] copies from one tree to the other (`upload`, `download`)
//! - [`delete`] removes matched entries
//!
//! Per-path failures are collected into reports rather than returned as
//! errors, so one bad entry never stops a run.

pub mod config;
pub mod delete;
pub mod diff;
pub mod error;
pub mod lister;
pub mod pairs;
pub mod sync;

pub use config::KnifeConfig;
pub use delete::{DeleteReport, delete_matching};
pub use diff::{
    DiffFilter, DiffItem, DiffOptions, DiffReport, DiffResult, DiffStatus, OutputMode, diff,
};
pub use error::{Error, Result};
pub use lister::{Lister, list};
pub use pairs::{EntryPair, PairLister, child_pairs, list_pairs, resolve_path};
pub use sync::{
    SyncAction, SyncEngine, SyncOptions, SyncOutcome, SyncRecord, SyncReport, copy_to,
};

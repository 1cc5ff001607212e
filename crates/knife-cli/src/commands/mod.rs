//! Command implementations for knife-cli

pub mod delete;
pub mod diff;
pub mod edit;
pub mod list;
pub mod show;
pub mod sync;
pub mod xargs;

pub use delete::run_delete;
pub use diff::run_diff;
pub use edit::run_edit;
pub use list::run_list;
pub use show::run_show;
pub use sync::{Direction, run_sync};
pub use xargs::run_xargs;

use knife_core::Lister;
use knife_fs::{BoxEntry, Entry, FilePattern};

use crate::context::{KnifeContext, Side};
use crate::error::{CliError, Result};
use crate::logging;

/// Open the tree a command works on.
fn open_side(ctx: &KnifeContext, side: Side) -> Result<BoxEntry> {
    Ok(match side {
        Side::Local => Box::new(ctx.local()),
        Side::Remote => Box::new(ctx.remote()?),
    })
}

/// Existing entries matching `pattern`, reporting listing errors and exact
/// patterns that match nothing. The flag is true when anything was reported.
fn matching_entries(ctx: &KnifeContext, root: &dyn Entry, pattern: &FilePattern) -> (Vec<BoxEntry>, bool) {
    let mut failed = false;
    let mut entries = Vec::new();
    for item in Lister::new(root, pattern.clone()) {
        match item {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                logging::error(e.to_string());
                failed = true;
            }
        }
    }
    if entries.is_empty() {
        if let Some(path) = pattern.exact_path() {
            logging::error(format!("{}: No such file or directory", ctx.format_path(&path)));
            failed = true;
        }
    }
    (entries, failed)
}

/// Map a failure flag to the command result.
fn finish(failed: bool) -> Result<()> {
    if failed { Err(CliError::PathsFailed) } else { Ok(()) }
}

//! `knife upload` and `knife download`

use knife_core::{SyncEngine, SyncOptions};
use knife_fs::Entry;
use tracing::debug;

use super::finish;
use crate::cli::SyncArgs;
use crate::context::{KnifeContext, require_patterns};
use crate::error::Result;
use crate::logging;

/// Which way objects flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Local repository to server
    Upload,
    /// Server to local repository
    Download,
}

impl Direction {
    fn command(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Download => "download",
        }
    }
}

pub fn run_sync(ctx: &KnifeContext, args: &SyncArgs, direction: Direction) -> Result<()> {
    require_patterns(&args.patterns, direction.command())?;
    let options = SyncOptions {
        recurse_depth: args.no_recurse.then_some(0),
        purge: args.purge,
        force: args.force,
        dry_run: args.dry_run,
        diff: !args.no_diff,
    };
    options.validate()?;

    let (patterns, mut failed) = ctx.patterns(&args.patterns);
    let remote = ctx.remote()?;
    let local = ctx.local();
    let (src, dest): (&dyn Entry, &dyn Entry) = match direction {
        Direction::Upload => (&local, &remote),
        Direction::Download => (&remote, &local),
    };
    let engine = SyncEngine::new(src, dest, options)?;

    for pattern in &patterns {
        debug!(%pattern, command = direction.command(), "copying");
        let report = engine.copy(pattern);
        for record in &report.records {
            let Some(message) = record.describe(&ctx.format_path(&record.path)) else {
                continue;
            };
            if record.is_failure() {
                logging::error(message);
            } else {
                println!("{message}");
            }
        }
        if report.pattern_missing {
            logging::error(format!("{pattern}: No such file or directory on remote or local"));
        }
        failed |= !report.success();
    }

    finish(failed)
}

//! `knife diff`

use knife_core::diff::render_with;
use knife_core::{DiffFilter, DiffItem, DiffOptions, OutputMode, diff};
use knife_fs::EntryPath;

use super::finish;
use crate::cli::DiffArgs;
use crate::context::KnifeContext;
use crate::error::Result;
use crate::logging;

pub fn run_diff(ctx: &KnifeContext, args: &DiffArgs) -> Result<()> {
    let filter = match &args.diff_filter {
        Some(letters) => DiffFilter::parse(letters)?,
        None => DiffFilter::default(),
    };
    let mode = if args.name_only {
        OutputMode::NameOnly
    } else if args.name_status {
        OutputMode::NameStatus
    } else {
        OutputMode::Full
    };
    let options = DiffOptions {
        recurse_depth: args.no_recurse.then_some(0),
        get_content: mode.needs_content(),
        filter,
    };

    let (patterns, mut failed) = ctx.patterns_or_cwd(&args.patterns);
    let remote = ctx.remote()?;
    let local = ctx.local();
    let format_path = |path: &EntryPath| ctx.format_path(path);

    for pattern in &patterns {
        let report = diff(pattern, &remote, &local, &options);
        for item in &report.items {
            match item {
                DiffItem::Change(result) => {
                    if let Some(text) = render_with(result, mode, &format_path) {
                        print!("{text}");
                    }
                }
                DiffItem::Failure { error, .. } => logging::error(error.to_string()),
            }
        }
        if report.pattern_missing {
            logging::error(format!("{pattern}: No such file or directory on remote or local"));
        }
        failed |= report.had_errors();
    }

    finish(failed)
}

//! `knife delete`

use knife_core::delete_matching;
use knife_fs::{EntryPath, Error as FsError};

use super::{finish, open_side};
use crate::cli::DeleteArgs;
use crate::context::{KnifeContext, Side, require_patterns};
use crate::error::Result;
use crate::logging;

pub fn run_delete(ctx: &KnifeContext, args: &DeleteArgs) -> Result<()> {
    require_patterns(&args.patterns, "delete")?;
    let sides: &[Side] = if args.both {
        &[Side::Remote, Side::Local]
    } else if args.local {
        &[Side::Local]
    } else {
        &[Side::Remote]
    };

    let (patterns, mut failed) = ctx.patterns(&args.patterns);
    let roots = sides
        .iter()
        .map(|&side| Ok((side, open_side(ctx, side)?)))
        .collect::<Result<Vec<_>>>()?;

    for pattern in &patterns {
        let mut deleted: Vec<EntryPath> = Vec::new();
        let mut found = false;
        for (side, root) in &roots {
            let report = delete_matching(pattern, root.as_ref(), args.recurse);
            found |= report.found_match;
            for path in report.deleted {
                if !deleted.contains(&path) {
                    deleted.push(path);
                }
            }
            for (path, error) in &report.failures {
                failed = true;
                match error {
                    FsError::MustDeleteRecursively { .. } => logging::error(format!(
                        "{} ({}) must be deleted recursively!  Pass -r to knife delete.",
                        ctx.format_path(path),
                        side.label()
                    )),
                    other => logging::error(other.to_string()),
                }
            }
        }
        for path in &deleted {
            println!("Deleted {}", ctx.format_path(path));
        }
        if !found {
            if let Some(path) = pattern.exact_path() {
                logging::error(format!("{}: No such file or directory", ctx.format_path(&path)));
                failed = true;
            }
        }
    }

    finish(failed)
}

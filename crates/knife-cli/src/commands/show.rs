//! `knife show`

use std::io::Write;

use knife_fs::Entry;

use super::{finish, matching_entries, open_side};
use crate::cli::ShowArgs;
use crate::context::{KnifeContext, Side, require_patterns};
use crate::error::Result;
use crate::logging;

pub fn run_show(ctx: &KnifeContext, args: &ShowArgs) -> Result<()> {
    require_patterns(&args.patterns, "show")?;
    let (patterns, mut failed) = ctx.patterns(&args.patterns);
    let root = open_side(ctx, Side::from_local_flag(args.local))?;
    let mut stdout = std::io::stdout().lock();

    for pattern in &patterns {
        let (entries, pattern_failed) = matching_entries(ctx, root.as_ref(), pattern);
        failed |= pattern_failed;
        for entry in entries {
            match entry.read() {
                Ok(content) => {
                    writeln!(stdout, "{}:", ctx.format_path(entry.path()))?;
                    stdout.write_all(&content)?;
                    if !content.ends_with(b"\n") {
                        writeln!(stdout)?;
                    }
                }
                Err(e) => {
                    logging::error(e.to_string());
                    failed = true;
                }
            }
        }
    }

    finish(failed)
}

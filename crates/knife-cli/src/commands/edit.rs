//! `knife edit`
//!
//! Each matched object is copied to a temporary file, the editor runs on it,
//! and the result is written back when it changed.

use std::path::Path;
use std::process::Command;

use knife_fs::Entry;
use tracing::debug;

use super::{finish, matching_entries, open_side};
use crate::cli::EditArgs;
use crate::context::{KnifeContext, Side, require_patterns};
use crate::error::{CliError, Result};
use crate::logging;

pub fn run_edit(ctx: &KnifeContext, args: &EditArgs) -> Result<()> {
    require_patterns(&args.patterns, "edit")?;
    let editor = resolve_editor(ctx)?;
    let (patterns, mut failed) = ctx.patterns(&args.patterns);
    let root = open_side(ctx, Side::from_local_flag(args.local))?;

    for pattern in &patterns {
        let (entries, pattern_failed) = matching_entries(ctx, root.as_ref(), pattern);
        failed |= pattern_failed;
        for entry in entries {
            if let Err(e) = edit_entry(ctx, entry.as_ref(), &editor) {
                logging::error(e.to_string());
                failed = true;
            }
        }
    }

    finish(failed)
}

fn edit_entry(ctx: &KnifeContext, entry: &dyn Entry, editor: &[String]) -> Result<()> {
    let original = entry.read()?;
    let temp = tempfile::Builder::new()
        .prefix("knife-edit-")
        .suffix(&format!("-{}", entry.name()))
        .tempfile()?;
    std::fs::write(temp.path(), &original)?;

    run_editor(editor, temp.path())?;

    let edited = std::fs::read(temp.path())?;
    if edited == original {
        println!("Object unchanged");
    } else {
        entry.write(&edited)?;
        println!("Updated {}", ctx.format_path(entry.path()));
    }
    Ok(())
}

/// Editor command line from `VISUAL`, `EDITOR` or the configuration.
fn resolve_editor(ctx: &KnifeContext) -> Result<Vec<String>> {
    let command = ["VISUAL", "EDITOR"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .chain(ctx.config.editor.clone())
        .find(|value| !value.trim().is_empty())
        .ok_or_else(|| {
            CliError::user("No editor configured. Set VISUAL or EDITOR, or editor in knife.toml")
        })?;
    Ok(command.split_whitespace().map(str::to_string).collect())
}

fn run_editor(editor: &[String], path: &Path) -> Result<()> {
    let (program, args) = editor
        .split_first()
        .ok_or_else(|| CliError::user("Editor command is empty"))?;
    debug!(%program, path = %path.display(), "running editor");
    let status = Command::new(program).args(args).arg(path).status()?;
    if !status.success() {
        return Err(CliError::user(format!("Editor {program} exited with {status}")));
    }
    Ok(())
}

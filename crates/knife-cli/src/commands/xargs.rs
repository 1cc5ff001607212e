//! `knife xargs`
//!
//! Matched files are copied to temporary files and a local command runs once
//! over all of them. `{}` in the command line stands for the temporary paths;
//! without it the paths are appended. Files the command changed are written
//! back, or shown as a diff with `--dry-run`.

use std::io::Read;
use std::path::PathBuf;
use std::process::Command;

use knife_core::diff::unified_diff;
use knife_fs::{BoxEntry, Entry};
use tempfile::NamedTempFile;
use tracing::debug;

use super::{finish, matching_entries, open_side};
use crate::cli::XargsArgs;
use crate::context::{KnifeContext, Side};
use crate::error::{CliError, Result};
use crate::logging;

const PLACEHOLDER: &str = "{}";

/// A matched object checked out to a temporary file.
struct Checkout {
    entry: BoxEntry,
    original: Vec<u8>,
    file: NamedTempFile,
}

impl Checkout {
    fn path(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }
}

pub fn run_xargs(ctx: &KnifeContext, args: &XargsArgs) -> Result<()> {
    if args.command.is_empty() {
        return Err(CliError::user("Must specify a command to run after --"));
    }
    let raw_patterns = if args.patterns.is_empty() {
        read_stdin_patterns()?
    } else {
        args.patterns.clone()
    };
    let (patterns, mut failed) = ctx.patterns(&raw_patterns);
    let root = open_side(ctx, Side::from_local_flag(args.local))?;

    let mut checkouts = Vec::new();
    for pattern in &patterns {
        let (entries, pattern_failed) = matching_entries(ctx, root.as_ref(), pattern);
        failed |= pattern_failed;
        for entry in entries {
            if entry.is_dir() {
                continue;
            }
            match checkout(entry) {
                Ok(checkout) => checkouts.push(checkout),
                Err(e) => {
                    logging::error(e.to_string());
                    failed = true;
                }
            }
        }
    }
    if checkouts.is_empty() {
        return finish(failed);
    }

    let paths: Vec<String> = checkouts
        .iter()
        .map(|c| c.path().display().to_string())
        .collect();
    let command_line = expand_command(&args.command, &paths);
    run_command(&command_line)?;

    for checkout in &checkouts {
        if let Err(e) = write_back(ctx, checkout, args) {
            logging::error(e.to_string());
            failed = true;
        }
    }

    finish(failed)
}

fn read_stdin_patterns() -> Result<Vec<String>> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    Ok(input.split_whitespace().map(str::to_string).collect())
}

fn checkout(entry: BoxEntry) -> Result<Checkout> {
    let original = entry.read()?;
    let file = tempfile::Builder::new()
        .prefix("knife-xargs-")
        .suffix(&format!("-{}", entry.name()))
        .tempfile()?;
    std::fs::write(file.path(), &original)?;
    Ok(Checkout {
        entry,
        original,
        file,
    })
}

/// Substitute the temporary paths into the command line.
fn expand_command(command: &[String], paths: &[String]) -> Vec<String> {
    if !command.iter().any(|arg| arg.contains(PLACEHOLDER)) {
        return command.iter().cloned().chain(paths.iter().cloned()).collect();
    }
    let joined = paths.join(" ");
    let mut expanded = Vec::with_capacity(command.len() + paths.len());
    for arg in command {
        if arg == PLACEHOLDER {
            expanded.extend(paths.iter().cloned());
        } else {
            expanded.push(arg.replace(PLACEHOLDER, &joined));
        }
    }
    expanded
}

fn run_command(command_line: &[String]) -> Result<()> {
    let Some((program, args)) = command_line.split_first() else {
        return Err(CliError::user("Must specify a command to run after --"));
    };
    debug!(%program, ?args, "running xargs command");
    let status = Command::new(program).args(args).status()?;
    if !status.success() {
        logging::warning(format!("{program} exited with {status}"));
    }
    Ok(())
}

fn write_back(ctx: &KnifeContext, checkout: &Checkout, args: &XargsArgs) -> Result<()> {
    let edited = std::fs::read(checkout.file.path())?;
    if edited == checkout.original {
        return Ok(());
    }
    let display = ctx.format_path(checkout.entry.path());
    if args.diff || args.dry_run {
        print!("{}", unified_diff(&display, &display, &checkout.original, &edited));
    }
    if args.dry_run {
        println!("Would update {display}");
    } else {
        checkout.entry.write(&edited)?;
        println!("Updated {display}");
    }
    Ok(())
}

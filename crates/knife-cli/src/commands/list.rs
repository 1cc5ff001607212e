//! `knife list`
//!
//! Matched files are printed first, then each matched directory with its
//! children under a `<dir>:` header. A single matched directory and nothing
//! else prints its children directly.

use knife_fs::{BoxEntry, Entry};

use super::{finish, matching_entries, open_side};
use crate::cli::ListArgs;
use crate::context::{KnifeContext, Side};
use crate::error::Result;
use crate::logging;

pub fn run_list(ctx: &KnifeContext, args: &ListArgs) -> Result<()> {
    let (patterns, mut failed) = ctx.patterns_or_cwd(&args.patterns);
    let root = open_side(ctx, Side::from_local_flag(args.local))?;

    let mut matches: Vec<BoxEntry> = Vec::new();
    for pattern in &patterns {
        let (entries, pattern_failed) = matching_entries(ctx, root.as_ref(), pattern);
        failed |= pattern_failed;
        matches.extend(entries);
    }

    let (dirs, mut results): (Vec<BoxEntry>, Vec<BoxEntry>) = if args.bare_directories {
        (Vec::new(), matches)
    } else {
        matches.into_iter().partition(|entry| entry.is_dir())
    };

    let mut dir_results: Vec<(BoxEntry, Vec<BoxEntry>)> = Vec::new();
    for dir in dirs {
        failed |= collect_dir(dir, args.recursive, &mut dir_results);
    }

    if args.flat {
        for (_, children) in dir_results.drain(..) {
            results.extend(children);
        }
    }
    results.sort_by(|a, b| a.path().cmp(b.path()));
    dir_results.sort_by(|a, b| a.0.path().cmp(b.0.path()));

    if results.is_empty() && dir_results.len() == 1 {
        if let Some((_, children)) = dir_results.pop() {
            results = children;
        }
    }

    for entry in &results {
        println!("{}", with_slash(ctx.format_path(entry.path()), entry.as_ref(), args));
    }
    let mut printed_something = !results.is_empty();
    for (dir, children) in &dir_results {
        if printed_something {
            println!();
        }
        printed_something = true;
        println!("{}:", ctx.format_path(dir.path()));
        for child in children {
            println!("{}", with_slash(child.name().to_string(), child.as_ref(), args));
        }
    }

    finish(failed)
}

/// Add `dir` and its sorted children, then its subdirectories when
/// recursing. True when a listing failed.
fn collect_dir(dir: BoxEntry, recursive: bool, out: &mut Vec<(BoxEntry, Vec<BoxEntry>)>) -> bool {
    let mut children = match dir.children() {
        Ok(children) => children,
        Err(e) => {
            logging::error(e.to_string());
            return true;
        }
    };
    children.sort_by(|a, b| a.name().cmp(b.name()));

    let subdirs: Vec<BoxEntry> = if recursive {
        children
            .iter()
            .filter(|child| child.is_dir())
            .map(|child| child.resolve(child.path()))
            .collect()
    } else {
        Vec::new()
    };
    out.push((dir, children));

    let mut failed = false;
    for subdir in subdirs {
        failed |= collect_dir(subdir, recursive, out);
    }
    failed
}

fn with_slash(mut text: String, entry: &dyn Entry, args: &ListArgs) -> String {
    if args.trailing_slashes && entry.is_dir() {
        text.push('/');
    }
    text
}

//! Pattern-driven depth-first listing

use knife_fs::{BoxEntry, Entry, Error, FilePattern, Result};
use tracing::debug;

/// List every existing entry under `root` that matches `pattern`.
///
/// Entries are yielded lazily in pre-order (a directory before its
/// children), children in the order the backend reports them.
pub fn list(root: &dyn Entry, pattern: &FilePattern) -> Lister {
    Lister::new(root, pattern.clone())
}

/// Lazy depth-first walk.
///
/// Only directories whose path could still lead to a match are listed, and
/// where the pattern continues with a literal name the child is looked up
/// directly instead of listing the directory. Listing failures, and matches
/// whose existence cannot be determined, are yielded as `Err` items and the
/// walk continues with the next entry.
#[derive(Debug)]
pub struct Lister {
    pattern: FilePattern,
    stack: Vec<(BoxEntry, usize)>,
    max_depth: Option<usize>,
    stop_at_matches: bool,
    pending: Option<Error>,
}

impl Lister {
    pub fn new(root: &dyn Entry, pattern: FilePattern) -> Self {
        Self {
            pattern,
            stack: vec![(root.resolve(root.path()), 0)],
            max_depth: None,
            stop_at_matches: false,
            pending: None,
        }
    }

    /// Do not descend more than `depth` levels below the starting entry.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Yield matched directories without walking into them.
    pub fn stop_at_matches(mut self) -> Self {
        self.stop_at_matches = true;
        self
    }

    /// Push the children of `entry` that could lead to a match.
    fn expand(&mut self, entry: &dyn Entry, depth: usize) -> Result<()> {
        if self.max_depth.is_some_and(|max| depth >= max) {
            return Ok(());
        }
        if !self.pattern.could_match_children(entry.path()) {
            return Ok(());
        }
        if let Some(name) = self.pattern.exact_child_name_under(entry.path()) {
            self.stack.push((entry.child(name), depth + 1));
            return Ok(());
        }
        if !entry.is_dir() {
            return Ok(());
        }
        debug!(path = %entry.path(), pattern = %self.pattern, "listing children");
        let children = entry.children()?;
        self.stack
            .extend(children.into_iter().rev().map(|child| (child, depth + 1)));
        Ok(())
    }
}

impl Iterator for Lister {
    type Item = Result<BoxEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(e) = self.pending.take() {
            return Some(Err(e));
        }
        while let Some((entry, depth)) = self.stack.pop() {
            let matched = if self.pattern.matches(entry.path()) {
                match entry.try_exists() {
                    Ok(exists) => exists,
                    Err(e) => return Some(Err(e)),
                }
            } else {
                false
            };
            if matched && self.stop_at_matches {
                return Some(Ok(entry));
            }
            let expanded = self.expand(entry.as_ref(), depth);
            match (matched, expanded) {
                (true, Ok(())) => return Some(Ok(entry)),
                (true, Err(e)) => {
                    self.pending = Some(e);
                    return Some(Ok(entry));
                }
                (false, Err(e)) => return Some(Err(e)),
                (false, Ok(())) => {}
            }
        }
        None
    }
}

//! Copying entries from one tree to another
//!
//! One algorithm drives both directions: `upload` copies local to remote and
//! `download` copies remote to local. Failures are recorded per path and the
//! walk continues.

use std::collections::HashSet;
use std::fmt;

use knife_fs::{BoxEntry, Entry, EntryPath, FilePattern};
use tracing::{debug, warn};

use crate::pairs::{child_pairs, list_pairs};
use crate::{Error, Result};

/// Options for a copy.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// How many directory levels to descend; `None` is unlimited
    pub recurse_depth: Option<usize>,
    /// Delete destination entries the source does not have
    pub purge: bool,
    /// Update destination files even when their content is identical
    pub force: bool,
    /// Report actions without applying them
    pub dry_run: bool,
    /// Update existing destination files at all
    pub diff: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            recurse_depth: None,
            purge: false,
            force: false,
            dry_run: false,
            diff: true,
        }
    }
}

impl SyncOptions {
    /// Reject option combinations that make a copy meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.purge && self.recurse_depth == Some(0) {
            return Err(Error::InvalidOptions {
                message: "purge cannot be combined with --no-recurse".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncAction {
    Create,
    Update,
    Delete,
    Skip,
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Skip => "skip",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Applied,
    /// Would have been applied without `dry_run`
    DryRun,
    Failed(String),
}

/// What happened to one destination path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRecord {
    pub path: EntryPath,
    pub action: SyncAction,
    pub outcome: SyncOutcome,
}

impl SyncRecord {
    fn new(path: &EntryPath, action: SyncAction, outcome: SyncOutcome) -> Self {
        Self {
            path: path.clone(),
            action,
            outcome,
        }
    }

    /// Line printed for this record, if any.
    pub fn message(&self) -> Option<String> {
        self.describe(self.path.as_str())
    }

    /// Like [`message`](Self::message), naming the path as `path`.
    pub fn describe(&self, path: &str) -> Option<String> {
        match (&self.outcome, self.action) {
            (SyncOutcome::Failed(message), _) => Some(message.clone()),
            (_, SyncAction::Skip) => None,
            (SyncOutcome::Applied, SyncAction::Create) => Some(format!("Created {path}")),
            (SyncOutcome::Applied, SyncAction::Update) => Some(format!("Updated {path}")),
            (SyncOutcome::Applied, SyncAction::Delete) => {
                Some(format!("Deleted extra entry {path} (purge is on)"))
            }
            (SyncOutcome::DryRun, action) => Some(format!("Would {action} {path}")),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, SyncOutcome::Failed(_))
    }
}

/// Outcome of a copy over one pattern.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub records: Vec<SyncRecord>,
    /// Whether any path matched on either side
    pub found_match: bool,
    /// The pattern was exact and matched nothing
    pub pattern_missing: bool,
}

impl SyncReport {
    pub fn any_failures(&self) -> bool {
        self.records.iter().any(SyncRecord::is_failure)
    }

    pub fn success(&self) -> bool {
        !self.any_failures() && !self.pattern_missing
    }

    /// Number of records with `action`.
    pub fn count(&self, action: SyncAction) -> usize {
        self.records.iter().filter(|r| r.action == action).count()
    }

    /// `(action, path)` for every record, in traversal order.
    pub fn actions(&self) -> Vec<(SyncAction, String)> {
        self.records
            .iter()
            .map(|r| (r.action, r.path.to_string()))
            .collect()
    }
}

/// Copies matched entries from a source tree into a destination tree.
#[derive(Debug)]
pub struct SyncEngine<'a> {
    src_root: &'a dyn Entry,
    dest_root: &'a dyn Entry,
    options: SyncOptions,
}

impl<'a> SyncEngine<'a> {
    pub fn new(src_root: &'a dyn Entry, dest_root: &'a dyn Entry, options: SyncOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            src_root,
            dest_root,
            options,
        })
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Copy everything matching `pattern`.
    pub fn copy(&self, pattern: &FilePattern) -> SyncReport {
        let mut run = Run {
            options: &self.options,
            report: SyncReport::default(),
            planned_dirs: HashSet::new(),
        };

        let mut pairs = list_pairs(pattern, self.src_root, self.dest_root);
        if self.options.recurse_depth.is_none() {
            pairs = pairs.collapse_descendants();
        }
        for pair in pairs {
            match pair {
                Ok((src, dest)) => {
                    run.report.found_match = true;
                    let Some(src_exists) = run.check_exists(src.as_ref(), dest.path()) else {
                        continue;
                    };
                    if src_exists && !run.ensure_parent(dest.as_ref()) {
                        continue;
                    }
                    run.copy_entries(src.as_ref(), dest.as_ref(), self.options.recurse_depth);
                }
                Err(e) => {
                    warn!(pattern = %pattern, error = %e, "listing failed during copy");
                    let path = EntryPath::new(pattern.normalized());
                    run.fail(&path, SyncAction::Skip, &e);
                }
            }
        }

        run.report.pattern_missing = !run.report.found_match && pattern.is_exact();
        run.report
    }
}

/// Copy everything matching `pattern` from `src_root` to `dest_root`.
pub fn copy_to(
    pattern: &FilePattern,
    src_root: &dyn Entry,
    dest_root: &dyn Entry,
    options: SyncOptions,
) -> Result<SyncReport> {
    Ok(SyncEngine::new(src_root, dest_root, options)?.copy(pattern))
}

struct Run<'o> {
    options: &'o SyncOptions,
    report: SyncReport,
    /// Directories a dry run has already reported as created
    planned_dirs: HashSet<EntryPath>,
}

impl Run<'_> {
    fn record(&mut self, path: &EntryPath, action: SyncAction, outcome: SyncOutcome) {
        let record = SyncRecord::new(path, action, outcome);
        if let Some(message) = record.message() {
            debug!(%path, %action, "{message}");
        }
        self.report.records.push(record);
    }

    fn fail(&mut self, path: &EntryPath, action: SyncAction, error: &knife_fs::Error) {
        warn!(%path, %action, error = %error, "sync action failed");
        self.record(path, action, SyncOutcome::Failed(error.to_string()));
    }

    /// Existence of `entry`, or `None` after recording a failure against
    /// `path` when the backend cannot tell.
    fn check_exists(&mut self, entry: &dyn Entry, path: &EntryPath) -> Option<bool> {
        match entry.try_exists() {
            Ok(exists) => Some(exists),
            Err(e) => {
                self.fail(path, SyncAction::Skip, &e);
                None
            }
        }
    }

    /// Create missing ancestors of `dest`, outermost first. False when one
    /// of them could not be created.
    fn ensure_parent(&mut self, dest: &dyn Entry) -> bool {
        let Some(parent) = dest.parent() else {
            return true;
        };
        if self.planned_dirs.contains(parent.path()) {
            return true;
        }
        match self.check_exists(parent.as_ref(), dest.path()) {
            Some(true) => return true,
            Some(false) => {}
            None => return false,
        }
        if !self.ensure_parent(parent.as_ref()) {
            return false;
        }
        self.create_dir(parent.as_ref())
    }

    fn create_dir(&mut self, dest: &dyn Entry) -> bool {
        if self.options.dry_run {
            self.planned_dirs.insert(dest.path().clone());
            self.record(dest.path(), SyncAction::Create, SyncOutcome::DryRun);
            return true;
        }
        match dest.create_dir() {
            Ok(()) => {
                self.record(dest.path(), SyncAction::Create, SyncOutcome::Applied);
                true
            }
            Err(e) => {
                self.fail(dest.path(), SyncAction::Create, &e);
                false
            }
        }
    }

    fn copy_entries(&mut self, src: &dyn Entry, dest: &dyn Entry, depth: Option<usize>) {
        let Some(src_exists) = self.check_exists(src, dest.path()) else {
            return;
        };
        let Some(dest_exists) = self.check_exists(dest, dest.path()) else {
            return;
        };

        if !src_exists {
            if self.options.purge && dest_exists {
                self.purge(dest);
            }
            return;
        }

        if !dest_exists {
            if src.is_dir() {
                if !self.create_dir(dest) {
                    return;
                }
                if depth != Some(0) {
                    self.copy_children(src, dest, depth);
                }
            } else {
                self.write(src, dest, SyncAction::Create);
            }
            return;
        }

        match (src.is_dir(), dest.is_dir()) {
            (true, true) => {
                if depth != Some(0) {
                    self.copy_children(src, dest, depth);
                }
            }
            (true, false) | (false, true) => {
                let (dir, file) = if src.is_dir() { (src, dest) } else { (dest, src) };
                let message = format!(
                    "File {} is a directory while file {} is a regular file",
                    dir.display_path(),
                    file.display_path()
                );
                warn!(path = %dest.path(), "{message}");
                self.record(dest.path(), SyncAction::Update, SyncOutcome::Failed(message));
            }
            (false, false) => self.update_file(src, dest),
        }
    }

    fn copy_children(&mut self, src: &dyn Entry, dest: &dyn Entry, depth: Option<usize>) {
        let Some(dest_exists) = self.check_exists(dest, dest.path()) else {
            return;
        };
        let children: Vec<(BoxEntry, BoxEntry)> = if dest_exists {
            match child_pairs(src, dest) {
                Ok(children) => children,
                Err(e) => return self.fail(src.path(), SyncAction::Update, &e),
            }
        } else {
            match src.children() {
                Ok(children) => children
                    .into_iter()
                    .map(|child| {
                        let dest_child = dest.child(child.name());
                        (child, dest_child)
                    })
                    .collect(),
                Err(e) => return self.fail(src.path(), SyncAction::Create, &e),
            }
        };
        debug!(path = %dest.path(), count = children.len(), "copying children");
        for (src_child, dest_child) in children {
            self.copy_entries(src_child.as_ref(), dest_child.as_ref(), depth.map(|d| d - 1));
        }
    }

    fn purge(&mut self, dest: &dyn Entry) {
        if self.options.dry_run {
            self.record(dest.path(), SyncAction::Delete, SyncOutcome::DryRun);
            return;
        }
        match dest.delete(true) {
            Ok(()) => self.record(dest.path(), SyncAction::Delete, SyncOutcome::Applied),
            Err(e) if e.is_not_found() => {
                self.record(dest.path(), SyncAction::Delete, SyncOutcome::Applied)
            }
            Err(e) => self.fail(dest.path(), SyncAction::Delete, &e),
        }
    }

    fn update_file(&mut self, src: &dyn Entry, dest: &dyn Entry) {
        if !self.options.diff {
            self.record(dest.path(), SyncAction::Skip, SyncOutcome::Applied);
            return;
        }
        if !self.options.force {
            let src_value = match src.read() {
                Ok(value) => value,
                Err(e) => return self.fail(dest.path(), SyncAction::Update, &e),
            };
            match dest.read() {
                Ok(dest_value) if dest_value == src_value => {
                    self.record(dest.path(), SyncAction::Skip, SyncOutcome::Applied);
                    return;
                }
                Ok(_) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => return self.fail(dest.path(), SyncAction::Update, &e),
            }
            return self.apply_write(dest, &src_value, SyncAction::Update);
        }
        self.write(src, dest, SyncAction::Update);
    }

    /// Read `src` and write it to `dest`.
    fn write(&mut self, src: &dyn Entry, dest: &dyn Entry, action: SyncAction) {
        if self.options.dry_run {
            self.record(dest.path(), action, SyncOutcome::DryRun);
            return;
        }
        match src.read() {
            Ok(content) => self.apply_write(dest, &content, action),
            Err(e) => self.fail(dest.path(), action, &e),
        }
    }

    fn apply_write(&mut self, dest: &dyn Entry, content: &[u8], action: SyncAction) {
        if self.options.dry_run {
            self.record(dest.path(), action, SyncOutcome::DryRun);
            return;
        }
        match dest.write(content) {
            Ok(()) => self.record(dest.path(), action, SyncOutcome::Applied),
            Err(e) => self.fail(dest.path(), action, &e),
        }
    }
}

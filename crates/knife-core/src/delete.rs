//! Deleting every entry a pattern matches

use knife_fs::{BoxEntry, Entry, EntryPath, Error as FsError, FilePattern, Operation};
use tracing::{debug, warn};

use crate::lister::list;

#[derive(Debug, Default)]
pub struct DeleteReport {
    pub deleted: Vec<EntryPath>,
    pub failures: Vec<(EntryPath, FsError)>,
    pub found_match: bool,
    /// The pattern was exact and matched nothing
    pub pattern_missing: bool,
}

impl DeleteReport {
    pub fn success(&self) -> bool {
        self.failures.is_empty() && !self.pattern_missing
    }
}

/// Delete every entry under `root` matching `pattern`.
///
/// Matches are collected before anything is deleted, and entries below an
/// already deleted directory are skipped.
pub fn delete_matching(pattern: &FilePattern, root: &dyn Entry, recursive: bool) -> DeleteReport {
    let mut report = DeleteReport::default();
    let mut matches: Vec<BoxEntry> = Vec::new();
    for item in list(root, pattern) {
        match item {
            Ok(entry) => matches.push(entry),
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "listing failed during delete");
                report
                    .failures
                    .push((EntryPath::new(pattern.normalized()), e));
            }
        }
    }
    report.found_match = !matches.is_empty();

    for entry in matches {
        let path = entry.path().clone();
        if report.deleted.iter().any(|done| path.starts_with(done)) {
            continue;
        }
        let result = if path.is_root() {
            Err(FsError::not_allowed(&path, Operation::Delete, "cannot be deleted"))
        } else {
            entry.delete(recursive)
        };
        match result {
            Ok(()) => {
                debug!(%path, "deleted");
                report.deleted.push(path);
            }
            Err(e) => report.failures.push((path, e)),
        }
    }

    report.pattern_missing = !report.found_match && pattern.is_exact();
    report
}

//! Comparing the remote tree with the local repository
//!
//! Orientation is fixed: `old` is the remote side, `new` the local side. A
//! path only the local repository has is `Added`, one only the server has is
//! `Deleted`.

mod text;

use std::collections::BTreeSet;
use std::fmt;

use knife_fs::{Entry, EntryPath, FilePattern};
use tracing::{debug, warn};

use crate::pairs::{child_pairs, list_pairs};
use crate::{Error, Result};

pub use text::{OutputMode, render, render_with, unified_diff};

/// Classification of one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiffStatus {
    /// Only on the new side
    Added,
    /// Only on the old side
    Deleted,
    /// Both files, different bytes
    Modified,
    /// Both files, identical bytes
    Unchanged,
    /// One side a directory, the other a file
    TypeChanged,
    /// Both directories, recursion budget exhausted
    CommonSubdirectories,
}

impl DiffStatus {
    /// Letter used by `--name-status` and `--diff-filter`.
    pub fn letter(self) -> Option<char> {
        match self {
            Self::Added => Some('A'),
            Self::Deleted => Some('D'),
            Self::Modified => Some('M'),
            Self::TypeChanged => Some('T'),
            Self::Unchanged | Self::CommonSubdirectories => None,
        }
    }
}

impl fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Added => "added",
            Self::Deleted => "deleted",
            Self::Modified => "modified",
            Self::Unchanged => "unchanged",
            Self::TypeChanged => "type-changed",
            Self::CommonSubdirectories => "common-subdirectories",
        };
        f.write_str(name)
    }
}

/// Restricts which statuses a diff reports.
///
/// Parsed from letters as in `--diff-filter=AM`: uppercase letters select,
/// lowercase letters exclude.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffFilter {
    include: BTreeSet<char>,
    exclude: BTreeSet<char>,
}

impl DiffFilter {
    pub fn parse(filter: &str) -> Result<Self> {
        let mut parsed = Self::default();
        for letter in filter.chars() {
            let upper = letter.to_ascii_uppercase();
            if !matches!(upper, 'A' | 'D' | 'M' | 'T') {
                return Err(Error::InvalidDiffFilter {
                    filter: filter.to_string(),
                    letter,
                });
            }
            if letter.is_ascii_uppercase() {
                parsed.include.insert(upper);
            } else {
                parsed.exclude.insert(upper);
            }
        }
        Ok(parsed)
    }

    pub fn allows(&self, status: DiffStatus) -> bool {
        match status.letter() {
            Some(letter) => {
                (self.include.is_empty() || self.include.contains(&letter))
                    && !self.exclude.contains(&letter)
            }
            None => self.include.is_empty(),
        }
    }
}

/// Options for [`diff`].
#[derive(Debug, Clone, Default)]
pub struct DiffOptions {
    /// How many directory levels to descend; `None` is unlimited
    pub recurse_depth: Option<usize>,
    /// Keep file contents in the results for textual payloads
    pub get_content: bool,
    pub filter: DiffFilter,
}

/// One classified path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffResult {
    pub path: EntryPath,
    pub status: DiffStatus,
    /// Whether the old side is the directory, for `TypeChanged`
    pub old_is_dir: bool,
    pub old_value: Option<Vec<u8>>,
    pub new_value: Option<Vec<u8>>,
}

impl DiffResult {
    fn new(path: &EntryPath, status: DiffStatus) -> Self {
        Self {
            path: path.clone(),
            status,
            old_is_dir: false,
            old_value: None,
            new_value: None,
        }
    }
}

/// A classified path or a per-path failure, in traversal order.
#[derive(Debug)]
pub enum DiffItem {
    Change(DiffResult),
    Failure {
        path: EntryPath,
        error: knife_fs::Error,
    },
}

/// Outcome of a diff over one pattern.
#[derive(Debug, Default)]
pub struct DiffReport {
    pub items: Vec<DiffItem>,
    /// Whether any path matched on either side
    pub found_match: bool,
    /// The pattern was exact and matched nothing
    pub pattern_missing: bool,
}

impl DiffReport {
    pub fn results(&self) -> impl Iterator<Item = &DiffResult> {
        self.items.iter().filter_map(|item| match item {
            DiffItem::Change(result) => Some(result),
            DiffItem::Failure { .. } => None,
        })
    }

    /// Paths with their status, in traversal order.
    pub fn statuses(&self) -> Vec<(String, DiffStatus)> {
        self.results()
            .map(|r| (r.path.to_string(), r.status))
            .collect()
    }

    pub fn had_errors(&self) -> bool {
        self.pattern_missing
            || self
                .items
                .iter()
                .any(|item| matches!(item, DiffItem::Failure { .. }))
    }
}

/// Diff everything matching `pattern` between `old_root` and `new_root`.
pub fn diff(
    pattern: &FilePattern,
    old_root: &dyn Entry,
    new_root: &dyn Entry,
    options: &DiffOptions,
) -> DiffReport {
    let mut report = DiffReport::default();
    let mut pairs = list_pairs(pattern, old_root, new_root);
    if options.recurse_depth.is_none() {
        pairs = pairs.collapse_descendants();
    }

    for pair in pairs {
        match pair {
            Ok((old, new)) => {
                report.found_match = true;
                diff_entries(
                    old.as_ref(),
                    new.as_ref(),
                    options.recurse_depth,
                    options,
                    &mut report,
                );
            }
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "listing failed during diff");
                report.items.push(DiffItem::Failure {
                    path: EntryPath::new(pattern.normalized()),
                    error: e,
                });
            }
        }
    }

    report.pattern_missing = !report.found_match && pattern.is_exact();
    report
}

fn diff_entries(
    old: &dyn Entry,
    new: &dyn Entry,
    depth: Option<usize>,
    options: &DiffOptions,
    report: &mut DiffReport,
) {
    let path = new.path();
    let push = |report: &mut DiffReport, result: DiffResult| {
        if options.filter.allows(result.status) {
            report.items.push(DiffItem::Change(result));
        }
    };

    if let Err(error) = old.try_exists().and_then(|_| new.try_exists()) {
        warn!(%path, error = %error, "cannot tell whether entry exists");
        report.items.push(DiffItem::Failure {
            path: path.clone(),
            error,
        });
        return;
    }

    if old.is_dir() {
        if new.is_dir() {
            if depth == Some(0) {
                push(report, DiffResult::new(path, DiffStatus::CommonSubdirectories));
                return;
            }
            debug!(%path, "descending into common directory");
            match child_pairs(old, new) {
                Ok(children) => {
                    for (old_child, new_child) in children {
                        diff_entries(
                            old_child.as_ref(),
                            new_child.as_ref(),
                            depth.map(|d| d - 1),
                            options,
                            report,
                        );
                    }
                }
                Err(error) => report.items.push(DiffItem::Failure {
                    path: path.clone(),
                    error,
                }),
            }
        } else if new.exists() {
            push(
                report,
                DiffResult {
                    old_is_dir: true,
                    ..DiffResult::new(path, DiffStatus::TypeChanged)
                },
            );
        } else {
            push(
                report,
                DiffResult {
                    old_is_dir: true,
                    ..DiffResult::new(path, DiffStatus::Deleted)
                },
            );
        }
        return;
    }

    if new.is_dir() {
        let status = if old.exists() {
            DiffStatus::TypeChanged
        } else {
            DiffStatus::Added
        };
        push(report, DiffResult::new(path, status));
        return;
    }

    let old_value = match read_optional(old) {
        Ok(value) => value,
        Err(error) => {
            report.items.push(DiffItem::Failure {
                path: path.clone(),
                error,
            });
            return;
        }
    };
    let new_value = match read_optional(new) {
        Ok(value) => value,
        Err(error) => {
            report.items.push(DiffItem::Failure {
                path: path.clone(),
                error,
            });
            return;
        }
    };

    let status = match (&old_value, &new_value) {
        (None, None) => return,
        (None, Some(_)) => DiffStatus::Added,
        (Some(_), None) => DiffStatus::Deleted,
        (Some(a), Some(b)) if a == b => DiffStatus::Unchanged,
        (Some(_), Some(_)) => DiffStatus::Modified,
    };
    let (old_value, new_value) = if options.get_content {
        (old_value, new_value)
    } else {
        (None, None)
    };
    push(
        report,
        DiffResult {
            old_value,
            new_value,
            ..DiffResult::new(path, status)
        },
    );
}

/// Read a file, treating absence as `None`.
fn read_optional(entry: &dyn Entry) -> knife_fs::Result<Option<Vec<u8>>> {
    match entry.read() {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

//! Textual rendering of diff results

use knife_fs::EntryPath;
use similar::TextDiff;

use super::{DiffResult, DiffStatus};

const DEV_NULL: &str = "/dev/null";

/// How a diff is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Unified diffs with headers
    #[default]
    Full,
    /// One path per line
    NameOnly,
    /// Status letter, tab, path
    NameStatus,
}

impl OutputMode {
    /// Whether results need file contents to be rendered.
    pub fn needs_content(self) -> bool {
        self == Self::Full
    }
}

/// Line-oriented unified diff of two contents.
///
/// Content that is not valid UTF-8 on either side yields a one-line
/// `Binary files ... differ` notice instead.
pub fn unified_diff(old_label: &str, new_label: &str, old: &[u8], new: &[u8]) -> String {
    let (Ok(old_text), Ok(new_text)) = (std::str::from_utf8(old), std::str::from_utf8(new)) else {
        return format!("Binary files {old_label} and {new_label} differ\n");
    };
    TextDiff::from_lines(old_text, new_text)
        .unified_diff()
        .context_radius(3)
        .header(old_label, new_label)
        .to_string()
}

/// Render one result with absolute paths. `None` when the mode prints
/// nothing for it.
pub fn render(result: &DiffResult, mode: OutputMode) -> Option<String> {
    render_with(result, mode, &|path: &EntryPath| path.to_string())
}

/// Render one result, printing paths through `format_path`.
pub fn render_with(
    result: &DiffResult,
    mode: OutputMode,
    format_path: &dyn Fn(&EntryPath) -> String,
) -> Option<String> {
    let formatted = format_path(&result.path);
    let path = formatted.as_str();

    match (result.status, mode) {
        (DiffStatus::Unchanged, _) => None,
        (DiffStatus::CommonSubdirectories, OutputMode::Full) => {
            Some(format!("Common subdirectories: {path}\n"))
        }
        (DiffStatus::CommonSubdirectories, _) => None,
        (_, OutputMode::NameOnly) => Some(format!("{path}\n")),
        (status, OutputMode::NameStatus) => {
            status.letter().map(|letter| format!("{letter}\t{path}\n"))
        }
        (DiffStatus::TypeChanged, OutputMode::Full) => Some(if result.old_is_dir {
            format!("File {path} is a directory while file {path} is a regular file\n")
        } else {
            format!("File {path} is a regular file while file {path} is a directory\n")
        }),
        (DiffStatus::Added, OutputMode::Full) => Some(match &result.new_value {
            Some(new) => format!(
                "diff --knife {path} {path}\nnew file\n{}",
                unified_diff(DEV_NULL, path, b"", new)
            ),
            None => only_in(result, format_path),
        }),
        (DiffStatus::Deleted, OutputMode::Full) => Some(match &result.old_value {
            Some(old) => format!(
                "diff --knife {path} {path}\ndeleted file\n{}",
                unified_diff(path, DEV_NULL, old, b"")
            ),
            None => only_in(result, format_path),
        }),
        (DiffStatus::Modified, OutputMode::Full) => {
            let old = result.old_value.as_deref().unwrap_or_default();
            let new = result.new_value.as_deref().unwrap_or_default();
            Some(format!(
                "diff --knife {path} {path}\n{}",
                unified_diff(path, path, old, new)
            ))
        }
    }
}

fn only_in(result: &DiffResult, format_path: &dyn Fn(&EntryPath) -> String) -> String {
    let parent = format_path(&result.path.parent().unwrap_or_default());
    format!("Only in {parent}: {}\n", result.path.name())
}

//! Glob patterns over entry paths
//!
//! A [`FilePattern`] matches absolute [`EntryPath`]s and can also answer the
//! questions a tree walker needs: could anything below this directory match,
//! and is the next segment a literal name that can be looked up directly.
//!
//! Special characters:
//! - `*` any run of characters except `/`
//! - `**` any run of characters including `/`; as a whole segment it matches
//!   zero or more segments
//! - `?` exactly one character except `/`
//! - `[abc]`, `[a-z]`, `[!abc]`/`[^abc]` character classes
//! - `\x` the literal character `x`

use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::{EntryPath, Error, Result};

/// A compiled glob pattern.
#[derive(Debug, Clone)]
pub struct FilePattern {
    pattern: String,
    normalized: String,
    regex: Regex,
    /// Per-segment matchers up to (not including) the first `**`
    segment_regexes: Vec<Regex>,
    /// Literal text of the same segments, `None` where a wildcard appears
    exact_segments: Vec<Option<String>>,
    has_double_star: bool,
    /// Every segment is a whole `**`, so the pattern can match zero segments
    matches_root: bool,
}

/// One segment of the pattern after tokenizing.
#[derive(Debug)]
struct CompiledSegment {
    raw: String,
    regex: String,
    exact: Option<String>,
    has_double_star: bool,
    is_globstar: bool,
}

impl FilePattern {
    /// Compile a pattern. Relative patterns are anchored at the root.
    pub fn new(pattern: &str) -> Result<Self> {
        let mut segments: Vec<CompiledSegment> = Vec::new();
        let mut has_double_star = false;
        let mut segment_regexes = Vec::new();
        let mut exact_segments = Vec::new();

        for raw in pattern.split('/') {
            let segment = compile_segment(pattern, raw)?;

            if matches!(segment.exact.as_deref(), Some("") | Some(".")) {
                continue;
            }

            if segment.exact.as_deref() == Some("..") {
                match segments.last() {
                    None => continue,
                    Some(prev) if prev.has_double_star => {
                        return Err(Error::invalid_pattern(
                            pattern,
                            ".. overlapping a ** is unsupported",
                        ));
                    }
                    Some(_) => {
                        segments.pop();
                        if !has_double_star {
                            segment_regexes.pop();
                            exact_segments.pop();
                        }
                        continue;
                    }
                }
            }

            if segment.has_double_star {
                has_double_star = true;
            }
            if !has_double_star {
                segment_regexes.push(anchored(pattern, &segment.regex)?);
                exact_segments.push(segment.exact.clone());
            }
            segments.push(segment);
        }

        let regex = anchored(pattern, &join_segments(&segments))?;
        let matches_root = segments.iter().all(|s| s.is_globstar);
        let normalized = format!(
            "/{}",
            segments
                .iter()
                .map(|s| s.raw.as_str())
                .collect::<Vec<_>>()
                .join("/")
        );

        Ok(Self {
            pattern: pattern.to_string(),
            normalized,
            regex,
            segment_regexes,
            exact_segments,
            has_double_star,
            matches_root,
        })
    }

    /// Resolve a possibly relative pattern against a base directory, then
    /// compile it.
    pub fn relative_to(base: &EntryPath, pattern: &str) -> Result<Self> {
        if pattern.starts_with('/') {
            Self::new(pattern)
        } else if base.is_root() {
            Self::new(&format!("/{pattern}"))
        } else {
            Self::new(&format!("{base}/{pattern}"))
        }
    }

    /// The pattern text as given.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// The pattern with `.`, `..` and duplicate separators removed.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Whether `path` matches the whole pattern.
    pub fn matches(&self, path: &EntryPath) -> bool {
        if path.is_root() {
            return self.matches_root;
        }
        self.regex.is_match(path.as_str().trim_start_matches('/'))
    }

    /// Whether some descendant of `path` could match.
    ///
    /// `/abc/def` could match children of `/abc`; `/abc` could not match
    /// children of `/abc`; `/a**z` could match children of `/ab/cd`.
    pub fn could_match_children(&self, path: &EntryPath) -> bool {
        let depth = path.depth();
        if self.segment_regexes.len() <= depth && !self.has_double_star {
            return false;
        }
        path.segments()
            .zip(self.segment_regexes.iter())
            .all(|(segment, regex)| regex.is_match(segment))
    }

    /// The literal name of the child of `path` the pattern continues with,
    /// or `None` when that segment is a wildcard (or the pattern ends).
    ///
    /// Assumes [`could_match_children`](Self::could_match_children) holds.
    pub fn exact_child_name_under(&self, path: &EntryPath) -> Option<&str> {
        self.exact_segments.get(path.depth())?.as_deref()
    }

    /// The single path this pattern matches, if it has no wildcards.
    pub fn exact_path(&self) -> Option<EntryPath> {
        if self.has_double_star || self.exact_segments.iter().any(Option::is_none) {
            return None;
        }
        let segments: Vec<&str> = self.exact_segments.iter().flatten().map(String::as_str).collect();
        Some(EntryPath::new(format!("/{}", segments.join("/"))))
    }

    /// True iff the pattern contains no wildcard. Callers treat "no match"
    /// as an error for exact patterns and as an empty result otherwise.
    pub fn is_exact(&self) -> bool {
        self.exact_path().is_some()
    }
}

impl fmt::Display for FilePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

impl FromStr for FilePattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

fn anchored(pattern: &str, body: &str) -> Result<Regex> {
    Regex::new(&format!("^{body}$")).map_err(|e| Error::invalid_pattern(pattern, e.to_string()))
}

/// Join segment regexes; a whole-segment `**` may stand for zero segments.
fn join_segments(segments: &[CompiledSegment]) -> String {
    let mut out = String::new();
    let mut need_separator = false;
    let last = segments.len().saturating_sub(1);
    for (i, segment) in segments.iter().enumerate() {
        if segment.is_globstar {
            if !need_separator && i == last {
                out.push_str(".*");
            } else if !need_separator {
                out.push_str("(?:.*/)?");
                continue;
            } else {
                out.push_str("(?:/.*)?");
            }
            need_separator = true;
            continue;
        }
        if need_separator {
            out.push('/');
        }
        out.push_str(&segment.regex);
        need_separator = true;
    }
    out
}

fn compile_segment(pattern: &str, raw: &str) -> Result<CompiledSegment> {
    let chars: Vec<char> = raw.chars().collect();
    let mut regex = String::new();
    let mut exact = Some(String::new());
    let mut has_double_star = false;
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                regex.push_str(".*");
                exact = None;
                has_double_star = true;
                i += 2;
            }
            '*' => {
                regex.push_str("[^/]*");
                exact = None;
                i += 1;
            }
            '?' => {
                regex.push_str("[^/]");
                exact = None;
                i += 1;
            }
            '\\' => {
                let Some(&escaped) = chars.get(i + 1) else {
                    return Err(Error::invalid_pattern(pattern, "trailing backslash"));
                };
                regex.push_str(&regex::escape(&escaped.to_string()));
                if let Some(e) = exact.as_mut() {
                    e.push(escaped);
                }
                i += 2;
            }
            '[' => {
                let (class, consumed) = compile_class(pattern, &chars[i + 1..])?;
                regex.push_str(&class);
                exact = None;
                i += consumed + 1;
            }
            c => {
                regex.push_str(&regex::escape(&c.to_string()));
                if let Some(e) = exact.as_mut() {
                    e.push(c);
                }
                i += 1;
            }
        }
    }

    Ok(CompiledSegment {
        raw: raw.to_string(),
        is_globstar: raw == "**",
        regex,
        exact,
        has_double_star,
    })
}

/// Compile the body of a `[...]` class. Returns the regex and the number of
/// characters consumed, including the closing `]`.
fn compile_class(pattern: &str, rest: &[char]) -> Result<(String, usize)> {
    let mut i = 0;
    let negated = matches!(rest.first(), Some('!') | Some('^'));
    if negated {
        i += 1;
    }
    let body_start = i;
    while i < rest.len() && rest[i] != ']' {
        i += 1;
    }
    if i >= rest.len() {
        return Err(Error::invalid_pattern(pattern, "unterminated character class"));
    }
    if i == body_start {
        return Err(Error::invalid_pattern(pattern, "empty character class"));
    }

    let mut class = String::from(if negated { "[^/" } else { "[" });
    for &c in &rest[body_start..i] {
        if c.is_ascii_punctuation() && c != '-' {
            class.push('\\');
        }
        class.push(c);
    }
    class.push(']');
    Ok((class, i + 1))
}

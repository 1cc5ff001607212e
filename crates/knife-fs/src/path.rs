//! Normalized tree paths
//!
//! Every entry in either tree is addressed by an [`EntryPath`]: an absolute,
//! `/`-separated string with `/` as the root. Two entries in different trees
//! with equal paths are the same object for diff and sync purposes.

use std::fmt;

/// An absolute, normalized path inside an entry tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryPath {
    /// Always starts with `/`, never ends with `/` unless it is the root
    inner: String,
}

impl EntryPath {
    /// The root path `/`.
    pub fn root() -> Self {
        Self {
            inner: "/".to_string(),
        }
    }

    /// Normalize any path-like string into an absolute entry path.
    ///
    /// Backslashes become forward slashes, empty and `.` segments are dropped,
    /// and `..` pops the previous segment (it is ignored at the root).
    pub fn new(path: impl AsRef<str>) -> Self {
        let normalized = path.as_ref().replace('\\', "/");
        let mut parts: Vec<&str> = Vec::new();
        for part in normalized.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                other => parts.push(other),
            }
        }
        Self::from_segments(parts)
    }

    /// Resolve user input against a base directory.
    ///
    /// Absolute input ignores the base.
    pub fn resolve(base: &EntryPath, input: &str) -> Self {
        if input.starts_with('/') || input.starts_with('\\') {
            Self::new(input)
        } else {
            Self::new(format!("{}/{}", base.inner, input))
        }
    }

    fn from_segments<S: AsRef<str>>(parts: impl IntoIterator<Item = S>) -> Self {
        let mut inner = String::new();
        for part in parts {
            inner.push('/');
            inner.push_str(part.as_ref());
        }
        if inner.is_empty() {
            inner.push('/');
        }
        Self { inner }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn is_root(&self) -> bool {
        self.inner == "/"
    }

    /// Append one child name as is. The name must be a single segment (see
    /// [`EntryPath::is_valid_name`]); backslashes and dots are kept verbatim.
    pub fn join(&self, name: &str) -> Self {
        let mut inner = self.inner.clone();
        if !self.is_root() {
            inner.push('/');
        }
        inner.push_str(name);
        Self { inner }
    }

    /// Whether `name` can be a single path segment: non-empty, not `.` or
    /// `..`, and free of `/`.
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty() && name != "." && name != ".." && !name.contains('/')
    }

    /// The parent path, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.inner.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self {
                inner: self.inner[..idx].to_string(),
            }),
            None => None,
        }
    }

    /// The last segment; empty for the root.
    pub fn name(&self) -> &str {
        if self.is_root() {
            return "";
        }
        self.inner.rsplit('/').next().unwrap_or_default()
    }

    /// Segments after the root, in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.inner.split('/').filter(|s| !s.is_empty())
    }

    /// Number of segments below the root.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Segment-wise prefix test; `/a/b` starts with `/a` but not with `/a/b`x.
    pub fn starts_with(&self, prefix: &EntryPath) -> bool {
        if prefix.is_root() {
            return true;
        }
        self.inner == prefix.inner
            || (self.inner.starts_with(&prefix.inner)
                && self.inner.as_bytes().get(prefix.inner.len()) == Some(&b'/'))
    }

    /// The path of `self` relative to `base`, without a leading slash.
    pub fn relative_to(&self, base: &EntryPath) -> Option<String> {
        if !self.starts_with(base) {
            return None;
        }
        let skip = base.depth();
        Some(self.segments().skip(skip).collect::<Vec<_>>().join("/"))
    }
}

impl Default for EntryPath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for EntryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

impl AsRef<str> for EntryPath {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl From<&str> for EntryPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EntryPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_slashes_and_dots() {
        assert_eq!(EntryPath::new("roles//base.json/").as_str(), "/roles/base.json");
        assert_eq!(EntryPath::new("/a/./b/../c").as_str(), "/a/c");
        assert_eq!(EntryPath::new("/../..").as_str(), "/");
        assert_eq!(EntryPath::new("").as_str(), "/");
        assert_eq!(EntryPath::new("a\\b").as_str(), "/a/b");
    }

    #[test]
    fn parent_and_name() {
        let p = EntryPath::new("/data_bags/secrets/item1.json");
        assert_eq!(p.name(), "item1.json");
        assert_eq!(p.parent().unwrap().as_str(), "/data_bags/secrets");
        assert_eq!(EntryPath::new("/roles").parent(), Some(EntryPath::root()));
        assert_eq!(EntryPath::root().parent(), None);
        assert_eq!(EntryPath::root().name(), "");
    }

    #[test]
    fn join_from_root_and_nested() {
        assert_eq!(EntryPath::root().join("roles").as_str(), "/roles");
        assert_eq!(EntryPath::new("/roles").join("x.json").as_str(), "/roles/x.json");
    }

    #[test]
    fn join_keeps_names_verbatim() {
        let path = EntryPath::new("/roles").join("a\\b.json");
        assert_eq!(path.as_str(), "/roles/a\\b.json");
        assert_eq!(path.name(), "a\\b.json");
        assert_eq!(path.parent(), Some(EntryPath::new("/roles")));
    }

    #[test]
    fn dot_names_and_slashes_are_not_valid_names() {
        assert!(EntryPath::is_valid_name("base.json"));
        assert!(EntryPath::is_valid_name("a\\b.json"));
        assert!(!EntryPath::is_valid_name(""));
        assert!(!EntryPath::is_valid_name("."));
        assert!(!EntryPath::is_valid_name(".."));
        assert!(!EntryPath::is_valid_name("a/b"));
    }

    #[test]
    fn resolve_relative_input() {
        let base = EntryPath::new("/roles");
        assert_eq!(EntryPath::resolve(&base, "x.json").as_str(), "/roles/x.json");
        assert_eq!(EntryPath::resolve(&base, "..").as_str(), "/");
        assert_eq!(EntryPath::resolve(&base, "/nodes").as_str(), "/nodes");
        assert_eq!(EntryPath::resolve(&base, ".").as_str(), "/roles");
    }

    #[test]
    fn starts_with_is_segment_wise() {
        let p = EntryPath::new("/roles/base.json");
        assert!(p.starts_with(&EntryPath::root()));
        assert!(p.starts_with(&EntryPath::new("/roles")));
        assert!(p.starts_with(&p));
        assert!(!p.starts_with(&EntryPath::new("/rol")));
        assert_eq!(p.relative_to(&EntryPath::new("/roles")).as_deref(), Some("base.json"));
        assert_eq!(p.depth(), 2);
    }
}

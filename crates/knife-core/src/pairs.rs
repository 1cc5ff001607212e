//! Matching entries of two trees up by path

use std::collections::HashSet;

use knife_fs::{BoxEntry, Entry, EntryPath, FilePattern, Result};

use crate::lister::Lister;

/// An entry and its counterpart at the same path in the other tree. Either
/// side may not exist.
pub type EntryPair = (BoxEntry, BoxEntry);

/// Resolve a path against the tree `entry` belongs to. Relative paths start
/// at `entry`, absolute ones at the root.
pub fn resolve_path(entry: &dyn Entry, path: &str) -> BoxEntry {
    entry.resolve(&EntryPath::resolve(entry.path(), path))
}

/// Pair up every entry matching `pattern` in either tree.
pub fn list_pairs(pattern: &FilePattern, a_root: &dyn Entry, b_root: &dyn Entry) -> PairLister {
    PairLister::new(pattern, a_root, b_root)
}

/// Lazy pair listing.
///
/// Walks the `a` tree first, pairing each match with the entry at the same
/// path in `b`; then walks `b` and pairs what `a` did not have.
#[derive(Debug)]
pub struct PairLister {
    a_root: BoxEntry,
    b_root: BoxEntry,
    a_list: Option<Lister>,
    b_list: Lister,
    seen: HashSet<EntryPath>,
    yielded: HashSet<EntryPath>,
    collapse: bool,
}

impl PairLister {
    pub fn new(pattern: &FilePattern, a_root: &dyn Entry, b_root: &dyn Entry) -> Self {
        Self {
            a_root: a_root.resolve(&EntryPath::root()),
            b_root: b_root.resolve(&EntryPath::root()),
            a_list: Some(Lister::new(a_root, pattern.clone())),
            b_list: Lister::new(b_root, pattern.clone()),
            seen: HashSet::new(),
            yielded: HashSet::new(),
            collapse: false,
        }
    }

    /// Skip pairs below a pair already yielded. Used when every pair is
    /// processed recursively, so a `**` pattern does not visit subtrees twice.
    /// Neither tree is listed below a matched directory.
    pub fn collapse_descendants(mut self) -> Self {
        self.collapse = true;
        self.a_list = self.a_list.take().map(Lister::stop_at_matches);
        self.b_list = self.b_list.stop_at_matches();
        self
    }

    fn covered(&self, path: &EntryPath) -> bool {
        if !self.collapse {
            return false;
        }
        let mut current = Some(path.clone());
        while let Some(p) = current {
            if self.yielded.contains(&p) {
                return true;
            }
            current = p.parent();
        }
        false
    }

    fn accept(&mut self, path: &EntryPath) -> bool {
        if self.covered(path) {
            return false;
        }
        if self.collapse {
            self.yielded.insert(path.clone());
        }
        true
    }
}

impl Iterator for PairLister {
    type Item = Result<EntryPair>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(mut a_list) = self.a_list.take() {
            while let Some(item) = a_list.next() {
                let a = match item {
                    Ok(a) => a,
                    Err(e) => {
                        self.a_list = Some(a_list);
                        return Some(Err(e));
                    }
                };
                self.seen.insert(a.path().clone());
                if !self.accept(a.path()) {
                    continue;
                }
                let b = self.b_root.resolve(a.path());
                self.a_list = Some(a_list);
                return Some(Ok((a, b)));
            }
        }

        while let Some(item) = self.b_list.next() {
            let b = match item {
                Ok(b) => b,
                Err(e) => return Some(Err(e)),
            };
            if self.seen.contains(b.path()) || !self.accept(b.path()) {
                continue;
            }
            let a = self.a_root.resolve(b.path());
            return Some(Ok((a, b)));
        }
        None
    }
}

/// Pair the children of two directories by name: all of `a`'s children in
/// order, then those only `b` has. A side that does not exist contributes no
/// children.
pub fn child_pairs(a: &dyn Entry, b: &dyn Entry) -> Result<Vec<EntryPair>> {
    let a_children = if a.try_exists()? { a.children()? } else { Vec::new() };
    let b_children = if b.try_exists()? { b.children()? } else { Vec::new() };

    let a_names: HashSet<String> = a_children.iter().map(|c| c.name().to_string()).collect();
    let mut pairs: Vec<EntryPair> = a_children
        .into_iter()
        .map(|a_child| {
            let b_child = b.child(a_child.name());
            (a_child, b_child)
        })
        .collect();
    pairs.extend(
        b_children
            .into_iter()
            .filter(|b_child| !a_names.contains(b_child.name()))
            .map(|b_child| (a.child(b_child.name()), b_child)),
    );
    Ok(pairs)
}

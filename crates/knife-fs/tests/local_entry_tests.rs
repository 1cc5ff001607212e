//! Local backend behaviour against a real directory tree

use assert_fs::TempDir;
use assert_fs::prelude::*;
use knife_fs::{Entry, EntryPath, Error, LocalEntry};
use predicates::prelude::*;
use pretty_assertions::assert_eq;

fn repo() -> (TempDir, LocalEntry) {
    let temp = TempDir::new().unwrap();
    temp.child("roles/base.json").write_str("{\"a\":1}").unwrap();
    temp.child("roles/web.json").write_str("{}").unwrap();
    temp.child("data_bags/secrets/item1.json").write_str("{\"id\":\"item1\"}").unwrap();
    temp.child(".hidden").write_str("x").unwrap();
    let root = LocalEntry::open_root(temp.path());
    (temp, root)
}

fn names(entries: &[knife_fs::BoxEntry]) -> Vec<String> {
    entries.iter().map(|e| e.name().to_string()).collect()
}

#[test]
fn root_lists_sorted_children_without_dot_files() {
    let (_temp, root) = repo();

    assert!(root.exists());
    assert!(root.is_dir());
    assert_eq!(root.path(), &EntryPath::root());

    let children = root.children().unwrap();
    assert_eq!(names(&children), vec!["data_bags", "roles"]);
    assert_eq!(children[1].path().as_str(), "/roles");
}

#[test]
fn child_and_parent_navigate_by_lookup() {
    let (_temp, root) = repo();

    let base = root.child("roles").child("base.json");
    assert_eq!(base.path().as_str(), "/roles/base.json");
    assert!(base.exists());
    assert!(!base.is_dir());

    let parent = base.parent().unwrap();
    assert_eq!(parent.path().as_str(), "/roles");
    assert!(root.parent().is_none());
}

#[test]
fn read_returns_bytes_and_reports_missing() {
    let (_temp, root) = repo();

    assert_eq!(root.child("roles").child("base.json").read().unwrap(), b"{\"a\":1}");

    let missing = root.child("roles").child("nope.json");
    assert!(!missing.exists());
    assert!(!missing.is_dir());
    let err = missing.read().unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "/roles/nope.json: No such file or directory");
}

#[test]
fn read_of_directory_is_not_allowed() {
    let (_temp, root) = repo();
    let err = root.child("roles").read().unwrap_err();
    assert!(matches!(err, Error::OperationNotAllowed { .. }));
}

#[test]
fn children_of_leaf_or_missing_dir_fail() {
    let (_temp, root) = repo();

    let leaf = root.child("roles").child("base.json");
    assert!(matches!(leaf.children(), Err(Error::NotADirectory { .. })));

    let missing = root.child("environments");
    assert!(missing.children().unwrap_err().is_not_found());
}

#[test]
fn write_creates_missing_parents() {
    let (temp, root) = repo();

    let entry = root.resolve(&EntryPath::new("/environments/prod.json"));
    entry.write(b"{\"name\":\"prod\"}").unwrap();

    temp.child("environments/prod.json")
        .assert(predicate::str::diff("{\"name\":\"prod\"}"));
    assert!(entry.exists());
}

#[test]
fn write_replaces_existing_content() {
    let (temp, root) = repo();

    root.child("roles").child("base.json").write(b"{\"a\":2}").unwrap();

    temp.child("roles/base.json").assert("{\"a\":2}");
}

#[test]
fn create_dir_makes_empty_directory() {
    let (temp, root) = repo();

    let dir = root.child("nodes");
    dir.create_dir().unwrap();

    temp.child("nodes").assert(predicate::path::is_dir());
    assert!(dir.children().unwrap().is_empty());
}

#[test]
fn non_recursive_delete_of_non_empty_dir_is_refused() {
    let (temp, root) = repo();

    let err = root.child("data_bags").delete(false).unwrap_err();

    assert!(matches!(err, Error::MustDeleteRecursively { .. }));
    temp.child("data_bags/secrets/item1.json").assert(predicate::path::exists());
}

#[test]
fn recursive_delete_removes_descendants() {
    let (temp, root) = repo();

    root.child("data_bags").delete(true).unwrap();

    temp.child("data_bags").assert(predicate::path::missing());
}

#[test]
fn delete_of_file_and_empty_dir_needs_no_recursion() {
    let (temp, root) = repo();
    temp.child("clients").create_dir_all().unwrap();

    root.child("roles").child("web.json").delete(false).unwrap();
    root.child("clients").delete(false).unwrap();

    temp.child("roles/web.json").assert(predicate::path::missing());
    temp.child("clients").assert(predicate::path::missing());
}

#[test]
fn delete_of_missing_entry_is_not_found() {
    let (_temp, root) = repo();
    assert!(root.child("nope").delete(true).unwrap_err().is_not_found());
}

#[test]
fn root_cannot_be_deleted() {
    let (temp, root) = repo();

    let err = root.delete(true).unwrap_err();

    assert!(matches!(err, Error::OperationNotAllowed { .. }));
    temp.child("roles").assert(predicate::path::is_dir());
}

#[test]
fn entry_path_for_maps_native_directories() {
    let (temp, root) = repo();

    assert_eq!(
        root.entry_path_for(&temp.path().join("data_bags/secrets")),
        Some(EntryPath::new("/data_bags/secrets"))
    );
    assert_eq!(root.entry_path_for(temp.path()), Some(EntryPath::root()));

    let outside = TempDir::new().unwrap();
    assert_eq!(root.entry_path_for(outside.path()), None);
}

#[test]
fn root_of_missing_directory_is_absent_until_written() {
    let temp = TempDir::new().unwrap();
    let root = LocalEntry::open_root(temp.path().join("repo"));

    assert!(!root.exists());
    root.child("roles").child("x.json").write(b"{}").unwrap();
    assert!(root.exists());
}

#[cfg(unix)]
#[test]
fn backslash_names_are_ordinary_children() {
    let (temp, root) = repo();
    temp.child("roles/a\\b.json").write_str("{\"b\":1}").unwrap();

    let roles = root.child("roles");
    let children = roles.children().unwrap();
    assert_eq!(names(&children), vec!["a\\b.json", "base.json", "web.json"]);
    assert_eq!(children[0].path().as_str(), "/roles/a\\b.json");
    assert_eq!(children[0].read().unwrap(), b"{\"b\":1}");
    assert!(roles.child("a\\b.json").exists());
}

#[test]
fn try_exists_treats_missing_and_leaf_parents_as_absent() {
    let (_temp, root) = repo();

    assert!(root.child("roles").child("base.json").try_exists().unwrap());
    assert!(!root.child("roles").child("nope.json").try_exists().unwrap());
    assert!(!root.child("roles").child("base.json").child("x").try_exists().unwrap());
    assert!(root.try_exists().unwrap());
}

//! Cross-crate properties of sync, diff and delete
//!
//! The local side is a real directory and the server is an in-memory store,
//! so every property runs through both entry backends.

use knife_core::{
    DiffOptions, DiffStatus, SyncAction, SyncOptions, SyncReport, copy_to, delete_matching, diff,
    list,
};
use knife_fs::{Error as FsError, FilePattern, LocalEntry};
use knife_remote::{MemoryStore, RemoteEntry};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tempfile::TempDir;

fn pattern(text: &str) -> FilePattern {
    FilePattern::new(text).unwrap()
}

fn server() -> MemoryStore {
    MemoryStore::new()
        .with_file("/roles/base.json", "{\"a\":0}")
        .with_file("/roles/web.json", "{\"w\":1}")
        .with_file("/data_bags/bag/item.json", "{}")
}

fn local_repo(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (path, content) in files {
        let full = dir.path().join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    }
    dir
}

fn upload(local: &TempDir, store: &MemoryStore, text: &str, options: SyncOptions) -> SyncReport {
    let remote = RemoteEntry::open_root(store.clone());
    copy_to(&pattern(text), &LocalEntry::open_root(local.path()), &remote, options).unwrap()
}

fn download(store: &MemoryStore, local: &TempDir, text: &str, options: SyncOptions) -> SyncReport {
    let remote = RemoteEntry::open_root(store.clone());
    copy_to(&pattern(text), &remote, &LocalEntry::open_root(local.path()), options).unwrap()
}

/// Actions other than skips, in report order.
fn changes(report: &SyncReport) -> Vec<(SyncAction, String)> {
    report
        .actions()
        .into_iter()
        .filter(|(action, _)| *action != SyncAction::Skip)
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn upload_then_download_round_trips_bytes(
        name in "[a-z]{1,8}\\.json",
        content in proptest::collection::vec(any::<u8>(), 0..256),
    ) {
        let source = TempDir::new().unwrap();
        std::fs::create_dir_all(source.path().join("roles")).unwrap();
        std::fs::write(source.path().join("roles").join(&name), &content).unwrap();
        let store = MemoryStore::new();
        let target = TempDir::new().unwrap();
        let path = format!("/roles/{name}");

        prop_assert!(upload(&source, &store, &path, SyncOptions::default()).success());
        prop_assert!(download(&store, &target, &path, SyncOptions::default()).success());

        let copied = std::fs::read(target.path().join("roles").join(&name)).unwrap();
        prop_assert_eq!(&copied, &content);

        let report = diff(
            &pattern(&path),
            &RemoteEntry::open_root(store.clone()),
            &LocalEntry::open_root(target.path()),
            &DiffOptions::default(),
        );
        prop_assert_eq!(report.statuses(), vec![(path.clone(), DiffStatus::Unchanged)]);
    }
}

#[test]
fn repeated_download_only_skips() {
    let store = server();
    let local = TempDir::new().unwrap();

    let first = download(&store, &local, "/**", SyncOptions::default());
    let second = download(&store, &local, "/**", SyncOptions::default());

    assert_eq!(first.count(SyncAction::Create), 6);
    assert!(changes(&second).is_empty());
    assert_eq!(second.count(SyncAction::Skip), 3);
    assert!(second.records.iter().all(|r| r.message().is_none()));
}

#[test]
fn purge_stays_inside_the_pattern() {
    let store = server();
    let local = local_repo(&[
        ("roles/base.json", "{\"a\":0}"),
        ("roles/extra.json", "{}"),
        ("nodes/n1.json", "{}"),
    ]);
    let purge = SyncOptions {
        purge: true,
        ..SyncOptions::default()
    };

    let kept = download(&store, &local, "/roles", SyncOptions::default());
    assert_eq!(
        changes(&kept),
        vec![(SyncAction::Create, "/roles/web.json".to_string())]
    );
    assert!(local.path().join("roles/extra.json").exists());

    let purged = download(&store, &local, "/roles", purge);
    assert_eq!(
        changes(&purged),
        vec![(SyncAction::Delete, "/roles/extra.json".to_string())]
    );
    assert!(!local.path().join("roles/extra.json").exists());
    assert!(local.path().join("nodes/n1.json").exists());
}

#[test]
fn dry_run_reports_the_real_plan_without_writing() {
    let local = local_repo(&[
        ("roles/base.json", "{\"a\":1}"),
        ("cookbooks/apache2/recipes/default.rb", "package 'httpd'\n"),
    ]);
    let dry_store = server();
    let real_store = server();
    let dry = SyncOptions {
        dry_run: true,
        purge: true,
        ..SyncOptions::default()
    };
    let real = SyncOptions {
        purge: true,
        ..SyncOptions::default()
    };

    let planned = upload(&local, &dry_store, "/**", dry);
    let applied = upload(&local, &real_store, "/**", real);

    assert_eq!(planned.actions(), applied.actions());
    assert_eq!(dry_store.contents("/roles/base.json"), Some(b"{\"a\":0}".to_vec()));
    assert!(dry_store.contains("/roles/web.json"));
    assert!(!dry_store.contains("/cookbooks"));
    assert_eq!(real_store.contents("/roles/base.json"), Some(b"{\"a\":1}".to_vec()));
    assert!(!real_store.contains("/roles/web.json"));
    assert!(real_store.contains("/cookbooks/apache2/recipes/default.rb"));
}

#[test]
fn exact_patterns_that_match_nothing_are_reported() {
    let store = server();
    let local = TempDir::new().unwrap();
    let remote = RemoteEntry::open_root(store.clone());
    let local_root = LocalEntry::open_root(local.path());
    let missing = pattern("/roles/missing.json");

    assert_eq!(list(&remote, &missing).count(), 0);

    let diffed = diff(&missing, &remote, &local_root, &DiffOptions::default());
    assert!(diffed.pattern_missing);
    assert!(diffed.had_errors());

    let deleted = delete_matching(&missing, &remote, false);
    assert!(deleted.pattern_missing);
    assert!(!deleted.success());

    let wildcard = diff(&pattern("/roles/*.rb"), &remote, &local_root, &DiffOptions::default());
    assert!(!wildcard.pattern_missing);
    assert!(!wildcard.had_errors());
}

#[test]
fn non_empty_directories_need_recursive_delete() {
    let store = server();
    let remote = RemoteEntry::open_root(store.clone());

    let refused = delete_matching(&pattern("/data_bags/bag"), &remote, false);
    assert!(refused.deleted.is_empty());
    assert!(matches!(
        refused.failures.as_slice(),
        [(_, FsError::MustDeleteRecursively { .. })]
    ));
    assert!(store.contains("/data_bags/bag/item.json"));

    let remote = RemoteEntry::open_root(store.clone());
    let removed = delete_matching(&pattern("/data_bags/bag"), &remote, true);
    assert!(removed.success());
    assert!(!store.contains("/data_bags/bag"));
    assert!(store.contains("/data_bags"));
}

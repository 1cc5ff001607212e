//! End-to-end scenarios across the local repository and a `file://` server

use knife_core::{DiffOptions, DiffReport, SyncOptions, SyncReport, copy_to, diff};
use knife_fs::FilePattern;
use knife_remote::{RestOptions, open_remote};
use knife_test_utils::TestRepo;
use pretty_assertions::assert_eq;

fn pattern(text: &str) -> FilePattern {
    FilePattern::new(text).unwrap()
}

fn diff_repo(repo: &TestRepo, text: &str) -> DiffReport {
    diff(
        &pattern(text),
        &repo.remote_root(),
        &repo.local_root(),
        &DiffOptions::default(),
    )
}

fn summary(report: &DiffReport) -> String {
    report
        .statuses()
        .iter()
        .map(|(path, status)| format!("{status} {path}"))
        .collect::<Vec<_>>()
        .join("; ")
}

fn messages(report: &SyncReport) -> String {
    report
        .records
        .iter()
        .filter_map(|r| r.message())
        .collect::<Vec<_>>()
        .join("; ")
}

#[test]
fn new_local_role_is_added_then_uploaded() {
    let repo = TestRepo::new().local_file("roles/base.json", "{\"a\":1}");

    insta::assert_snapshot!(summary(&diff_repo(&repo, "/roles/base.json")), @"added /roles/base.json");

    let report = copy_to(
        &pattern("/roles/base.json"),
        &repo.local_root(),
        &repo.remote_root(),
        SyncOptions::default(),
    )
    .unwrap();
    assert!(report.success());
    assert_eq!(repo.read_remote("roles/base.json").as_deref(), Some("{\"a\":1}"));

    insta::assert_snapshot!(summary(&diff_repo(&repo, "/roles/base.json")), @"unchanged /roles/base.json");
}

#[test]
fn download_purge_replaces_stray_data_bag_items() {
    let repo = TestRepo::new()
        .remote_file("data_bags/secrets/item1.json", "{\"id\":\"item1\"}")
        .local_file("data_bags/secrets/item2.json", "{\"id\":\"item2\"}");
    let options = SyncOptions {
        purge: true,
        ..SyncOptions::default()
    };

    let report = copy_to(
        &pattern("/data_bags"),
        &repo.remote_root(),
        &repo.local_root(),
        options,
    )
    .unwrap();

    insta::assert_snapshot!(messages(&report), @"Created /data_bags/secrets/item1.json; Deleted extra entry /data_bags/secrets/item2.json (purge is on)");
    assert_eq!(
        repo.read_local("data_bags/secrets/item1.json").as_deref(),
        Some("{\"id\":\"item1\"}")
    );
    repo.assert_local_missing("data_bags/secrets/item2.json");
}

#[test]
fn file_urls_open_the_same_server() {
    let repo = TestRepo::new()
        .local_file("nodes/n1.json", "{}")
        .remote_file("nodes/n1.json", "{}");
    let remote = open_remote(&repo.server_url(), &RestOptions::default()).unwrap();

    let report = diff(
        &pattern("/nodes/n1.json"),
        &remote,
        &repo.local_root(),
        &DiffOptions::default(),
    );

    assert_eq!(summary(&report), "unchanged /nodes/n1.json");
}

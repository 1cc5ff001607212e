//! Upload and download between a local repository and a file:// server

use knife_core::{SyncAction, SyncOptions, SyncOutcome, SyncReport, copy_to};
use knife_fs::FilePattern;
use knife_remote::{MemoryStore, RemoteEntry};
use knife_test_utils::{Fault, FaultyStore, TestRepo};
use pretty_assertions::assert_eq;

fn upload(repo: &TestRepo, pattern: &str, options: SyncOptions) -> SyncReport {
    let pattern = FilePattern::new(pattern).unwrap();
    copy_to(&pattern, &repo.local_root(), &repo.remote_root(), options).unwrap()
}

fn download(repo: &TestRepo, pattern: &str, options: SyncOptions) -> SyncReport {
    let pattern = FilePattern::new(pattern).unwrap();
    copy_to(&pattern, &repo.remote_root(), &repo.local_root(), options).unwrap()
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
fn upload_creates_and_updates() {
    let repo = TestRepo::new()
        .local_file("roles/base.json", "{\"a\":1}")
        .local_file("roles/web.json", "{\"b\":1}")
        .remote_file("roles/web.json", "{\"b\":0}");

    let report = upload(&repo, "/roles", SyncOptions::default());

    insta::assert_snapshot!(messages(&report), @"Created /roles/base.json; Updated /roles/web.json");
    assert!(report.success());
    assert_eq!(repo.read_remote("roles/base.json").unwrap(), "{\"a\":1}");
    assert_eq!(repo.read_remote("roles/web.json").unwrap(), "{\"b\":1}");
}

#[test]
fn second_run_skips_everything() {
    let repo = TestRepo::new()
        .local_file("roles/base.json", "{\"a\":1}")
        .local_file("nodes/n1.json", "{}");

    let first = upload(&repo, "/**", SyncOptions::default());
    let second = upload(&repo, "/**", SyncOptions::default());

    assert_eq!(first.count(SyncAction::Create), 4);
    assert_eq!(second.count(SyncAction::Create), 0);
    assert_eq!(second.count(SyncAction::Update), 0);
    assert_eq!(second.count(SyncAction::Skip), 2);
    assert_eq!(messages(&second), "");
}

#[test]
fn force_updates_identical_files() {
    let repo = TestRepo::new()
        .local_file("roles/base.json", "{}")
        .remote_file("roles/base.json", "{}");
    let options = SyncOptions {
        force: true,
        ..SyncOptions::default()
    };

    let report = upload(&repo, "/roles/base.json", options);

    assert_eq!(messages(&report), "Updated /roles/base.json");
}

#[test]
fn download_with_purge_removes_strays() {
    let repo = TestRepo::new()
        .remote_file("data_bags/secrets/item1.json", "{\"id\":\"item1\"}")
        .local_file("data_bags/secrets/item2.json", "{\"id\":\"item2\"}");
    let options = SyncOptions {
        purge: true,
        ..SyncOptions::default()
    };

    let report = download(&repo, "/data_bags", options);

    insta::assert_snapshot!(messages(&report), @"Created /data_bags/secrets/item1.json; Deleted extra entry /data_bags/secrets/item2.json (purge is on)");
    repo.assert_local_exists("data_bags/secrets/item1.json");
    repo.assert_local_missing("data_bags/secrets/item2.json");
}

#[test]
fn without_purge_strays_stay() {
    let repo = TestRepo::new()
        .remote_file("data_bags/secrets/item1.json", "{}")
        .local_file("data_bags/secrets/item2.json", "{}");

    let report = download(&repo, "/data_bags", SyncOptions::default());

    assert_eq!(report.count(SyncAction::Delete), 0);
    repo.assert_local_exists("data_bags/secrets/item2.json");
}

#[test]
fn dry_run_reports_the_same_actions_without_mutating() {
    let setup = || {
        TestRepo::new()
            .local_file("roles/base.json", "{\"a\":1}")
            .local_file("cookbooks/apache2/recipes/default.rb", "package 'apache2'\n")
            .remote_file("roles/base.json", "{\"a\":0}")
            .remote_file("roles/stray.json", "{}")
    };
    let dry_repo = setup();
    let real_repo = setup();
    let dry = SyncOptions {
        dry_run: true,
        purge: true,
        ..SyncOptions::default()
    };
    let real = SyncOptions {
        purge: true,
        ..SyncOptions::default()
    };

    let dry_report = upload(&dry_repo, "/", dry);
    let real_report = upload(&real_repo, "/", real);

    assert_eq!(dry_report.actions(), real_report.actions());
    insta::assert_snapshot!(messages(&dry_report), @"Would create /cookbooks; Would create /cookbooks/apache2; Would create /cookbooks/apache2/recipes; Would create /cookbooks/apache2/recipes/default.rb; Would update /roles/base.json; Would delete /roles/stray.json");
    dry_repo.assert_remote_missing("cookbooks");
    dry_repo.assert_remote_exists("roles/stray.json");
    assert_eq!(dry_repo.read_remote("roles/base.json").unwrap(), "{\"a\":0}");
    real_repo.assert_remote_missing("roles/stray.json");
}

#[test]
fn no_recurse_stops_at_the_matched_directory() {
    let repo = TestRepo::new().local_file("cookbooks/apache2/metadata.rb", "name 'apache2'\n");
    let options = SyncOptions {
        recurse_depth: Some(0),
        ..SyncOptions::default()
    };

    let report = upload(&repo, "/cookbooks/apache2", options);

    assert_eq!(
        report.actions(),
        vec![
            (SyncAction::Create, "/cookbooks".to_string()),
            (SyncAction::Create, "/cookbooks/apache2".to_string()),
        ]
    );
    repo.assert_remote_missing("cookbooks/apache2/metadata.rb");
}

#[test]
fn exact_pattern_missing_everywhere_is_not_a_success() {
    let repo = TestRepo::new();

    let report = upload(&repo, "/roles/ghost.json", SyncOptions::default());

    assert!(report.pattern_missing);
    assert!(!report.success());
}

fn failed_paths(report: &SyncReport) -> Vec<String> {
    report
        .records
        .iter()
        .filter(|r| matches!(r.outcome, SyncOutcome::Failed(_)))
        .map(|r| r.path.to_string())
        .collect()
}

#[test]
fn source_listing_failure_never_purges_the_destination() {
    let source = RemoteEntry::open_root(
        FaultyStore::new(MemoryStore::new().with_file("/roles/web.json", "{}"))
            .failing_list("/roles", Fault::server_error()),
    );
    let dest_store = MemoryStore::new().with_file("/roles/base.json", "{\"a\":1}");
    let dest = RemoteEntry::open_root(dest_store.clone());
    let options = SyncOptions {
        purge: true,
        ..SyncOptions::default()
    };

    let report = copy_to(&FilePattern::new("/roles/*").unwrap(), &source, &dest, options).unwrap();

    assert!(report.any_failures());
    assert_eq!(report.count(SyncAction::Delete), 0);
    assert_eq!(failed_paths(&report), vec!["/roles/*", "/roles/base.json"]);
    assert_eq!(
        report.records[1].outcome,
        SyncOutcome::Failed("/roles failed to list: HTTP 500: boom".to_string())
    );
    assert_eq!(dest_store.contents("/roles/base.json"), Some(b"{\"a\":1}".to_vec()));
}

#[test]
fn one_refused_write_does_not_stop_the_rest() {
    let source = RemoteEntry::open_root(
        MemoryStore::new()
            .with_file("/roles/a.json", "{\"a\":1}")
            .with_file("/roles/locked.json", "{\"new\":1}")
            .with_file("/roles/z.json", "{\"z\":1}"),
    );
    let dest_store = MemoryStore::new()
        .with_file("/roles/locked.json", "{\"old\":1}")
        .with_read_only("/roles/locked.json");
    let dest = RemoteEntry::open_root(dest_store.clone());

    let report = copy_to(
        &FilePattern::new("/roles").unwrap(),
        &source,
        &dest,
        SyncOptions::default(),
    )
    .unwrap();

    assert!(report.any_failures());
    assert!(!report.success());
    assert_eq!(failed_paths(&report), vec!["/roles/locked.json"]);
    assert_eq!(
        report.actions(),
        vec![
            (SyncAction::Create, "/roles/a.json".to_string()),
            (SyncAction::Update, "/roles/locked.json".to_string()),
            (SyncAction::Create, "/roles/z.json".to_string()),
        ]
    );
    assert!(
        report
            .records
            .iter()
            .filter(|r| r.path.as_str() != "/roles/locked.json")
            .all(|r| r.outcome == SyncOutcome::Applied)
    );
    assert_eq!(dest_store.contents("/roles/locked.json"), Some(b"{\"old\":1}".to_vec()));
    assert_eq!(dest_store.contents("/roles/z.json"), Some(b"{\"z\":1}".to_vec()));
}

//! End-to-end deployments against a `file://` target
//!
//! Drives the reconciliation loop and the one-shot path through the same
//! settings file and session selection the binary uses.

use std::fs;
use std::path::Path;

use filetime::FileTime;
use ftpwatch_core::{Job, Settings};
use ftpwatch_transport::{Reconciler, SyncClient, run_once, session_for};
use tempfile::TempDir;

/// Write an `ftpwatch.toml` next to a `site/` directory and load it
fn settings_file(workspace: &Path, remote: &Path, extra: &str) -> Settings {
    let toml = format!(
        r#"
endpoint = "file://{}"
exclude = ["*.log", ".#*"]
{extra}

[[directories]]
local = "site"
remote = "/"
"#,
        remote.display()
    );
    let path = workspace.join("ftpwatch.toml");
    fs::write(&path, toml).unwrap();
    Settings::load(&path).unwrap()
}

fn reconciler(settings: &Settings) -> Reconciler<Box<dyn ftpwatch_transport::RemoteSession>> {
    let endpoint = settings.endpoint().unwrap();
    let client = SyncClient::new(session_for(&endpoint), endpoint);
    Reconciler::new(settings, client).unwrap()
}

#[test]
fn test_watch_cycles_upload_then_delete() {
    let workspace = TempDir::new().unwrap();
    let remote = TempDir::new().unwrap();
    let site = workspace.path().join("site");
    fs::create_dir(&site).unwrap();
    fs::write(site.join("a.txt"), "hello").unwrap();

    let settings = settings_file(workspace.path(), remote.path(), "");
    let mut reconciler = reconciler(&settings);
    let remote_a = format!("{}/a.txt", remote.path().display());

    let report = reconciler.run_cycle(&mut ());
    assert_eq!(report.jobs, vec![Job::upload(site.join("a.txt"), remote_a.clone())]);
    assert_eq!(fs::read_to_string(remote.path().join("a.txt")).unwrap(), "hello");

    fs::remove_file(site.join("a.txt")).unwrap();
    let report = reconciler.run_cycle(&mut ());
    assert_eq!(report.jobs, vec![Job::delete(remote_a)]);
    assert!(report.is_clean());
    assert!(!remote.path().join("a.txt").exists());
}

#[test]
fn test_excluded_files_never_reach_the_remote() {
    let workspace = TempDir::new().unwrap();
    let remote = TempDir::new().unwrap();
    let site = workspace.path().join("site");
    fs::create_dir_all(site.join("logs")).unwrap();
    fs::write(site.join("index.html"), "<html>").unwrap();
    fs::write(site.join("logs/debug.log"), "noise").unwrap();
    fs::write(site.join(".#index.html"), "lock").unwrap();

    let settings = settings_file(workspace.path(), remote.path(), "");
    let endpoint = settings.endpoint().unwrap();
    let mut client = SyncClient::new(session_for(&endpoint), endpoint);

    let report = run_once(&settings, &mut client, &mut ()).unwrap();
    assert_eq!(report.uploaded, 1);
    assert!(remote.path().join("index.html").is_file());
    assert!(!remote.path().join("logs/debug.log").exists());
    assert!(!remote.path().join(".#index.html").exists());
}

#[test]
fn test_removed_directory_is_cleaned_up_file_by_file() {
    let workspace = TempDir::new().unwrap();
    let remote = TempDir::new().unwrap();
    let site = workspace.path().join("site");
    fs::create_dir_all(site.join("img")).unwrap();
    fs::write(site.join("img/logo.png"), [0u8, 1, 2]).unwrap();
    let old = FileTime::from_unix_time(1_000_000, 0);
    filetime::set_file_mtime(site.join("img/logo.png"), old).unwrap();

    let settings = settings_file(workspace.path(), remote.path(), "interval_ms = 50");
    let mut reconciler = reconciler(&settings);

    reconciler.run_cycle(&mut ());
    assert_eq!(fs::read(remote.path().join("img/logo.png")).unwrap(), [0u8, 1, 2]);

    fs::remove_dir_all(site.join("img")).unwrap();
    let report = reconciler.run_cycle(&mut ());
    assert_eq!(report.deleted, 1);
    assert!(!remote.path().join("img/logo.png").exists());
    // Directories are not inventory entries, so the empty directory stays
    assert!(remote.path().join("img").is_dir());
}

#[test]
fn test_restart_is_a_cold_start() {
    let workspace = TempDir::new().unwrap();
    let remote = TempDir::new().unwrap();
    let site = workspace.path().join("site");
    fs::create_dir(&site).unwrap();
    fs::write(site.join("a.txt"), "a").unwrap();
    filetime::set_file_mtime(site.join("a.txt"), FileTime::from_unix_time(1_000_000, 0)).unwrap();

    let settings = settings_file(workspace.path(), remote.path(), "");
    reconciler(&settings).run_cycle(&mut ());

    let mut again = reconciler(&settings);
    let report = again.run_cycle(&mut ());
    assert_eq!(report.uploaded, 1);
    assert!(again.run_cycle(&mut ()).is_idle());
}

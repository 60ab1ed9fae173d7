mod support;

use std::fs;

use cask_publish::cask::{CaskUpdate, CaskUpdater};
use cask_publish::digest::{sha256_file, Sha256Digest};
use cask_publish::error::PublishError;
use cask_publish::metadata::ReleaseVersion;
use support::CASK_FIXTURE;
use tempfile::TempDir;

fn fixture(content: &str) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.rb");
    fs::write(&path, content).unwrap();
    (dir, path)
}

fn digest_of(bytes: &[u8]) -> Sha256Digest {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("App.dmg");
    fs::write(&path, bytes).unwrap();
    sha256_file(&path).unwrap()
}

#[test]
fn test_update_is_idempotent() {
    let (_dir, path) = fixture(CASK_FIXTURE);
    let version = ReleaseVersion::parse("2.3.1").unwrap();
    let digest = digest_of(b"release");
    let updater = CaskUpdater::new(&path, "universal");

    let first = updater.update(&version, &digest, false).unwrap();
    let after_first = fs::read(&path).unwrap();
    match first {
        CaskUpdate::Written {
            version_line,
            sha256_line,
        } => {
            assert_eq!(version_line, "version \"2.3.1\"");
            assert_eq!(sha256_line, format!("sha256 \"{digest}\""));
        }
        other => panic!("unexpected update: {other:?}"),
    }

    let second = updater.update(&version, &digest, false).unwrap();
    assert_eq!(second, CaskUpdate::UpToDate);
    assert_eq!(fs::read(&path).unwrap(), after_first);
}

#[test]
fn test_mismatched_url_leaves_file_unmodified() {
    let content = CASK_FIXTURE.replace("App_universal.dmg", "App_x64.dmg");
    let (_dir, path) = fixture(&content);
    let updater = CaskUpdater::new(&path, "universal");

    let err = updater
        .update(
            &ReleaseVersion::parse("2.3.1").unwrap(),
            &digest_of(b"release"),
            false,
        )
        .unwrap_err();

    match err {
        PublishError::ManifestMismatch { url, qualifier, .. } => {
            assert!(url.ends_with("App_x64.dmg"));
            assert_eq!(qualifier, "universal");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fs::read_to_string(&path).unwrap(), content);
}

#[test]
fn test_missing_url_is_format_error() {
    let content: String = CASK_FIXTURE
        .lines()
        .filter(|line| !line.trim_start().starts_with("url "))
        .map(|line| format!("{line}\n"))
        .collect();
    let (_dir, path) = fixture(&content);
    let updater = CaskUpdater::new(&path, "universal");

    let err = updater
        .update(
            &ReleaseVersion::parse("2.3.1").unwrap(),
            &digest_of(b"release"),
            false,
        )
        .unwrap_err();

    assert!(matches!(err, PublishError::ManifestFormat { field: "url", .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), content);
}

#[test]
fn test_dry_run_does_not_write() {
    let (_dir, path) = fixture(CASK_FIXTURE);
    let updater = CaskUpdater::new(&path, "universal");

    let update = updater
        .update(
            &ReleaseVersion::parse("2.3.1").unwrap(),
            &digest_of(b"release"),
            true,
        )
        .unwrap();

    assert!(matches!(update, CaskUpdate::Previewed { .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), CASK_FIXTURE);
}

#[test]
fn test_missing_cask_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let updater = CaskUpdater::new(dir.path().join("absent.rb"), "universal");

    let err = updater
        .update(
            &ReleaseVersion::parse("2.3.1").unwrap(),
            &digest_of(b"release"),
            false,
        )
        .unwrap_err();
    assert!(matches!(err, PublishError::Io { .. }));
}

//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use cask_publish::cli::{PublishOptions, ReleaseNotes};
use cask_publish::config::Config;
use cask_publish::error::{PublishError, Result};
use cask_publish::metadata::{ProjectMetadata, ReleaseVersion};
use cask_publish::runner::{CommandResult, CommandRunner, Invocation};
use tempfile::TempDir;

pub const CASK_FIXTURE: &str = r#"cask "desk-app" do
  version "2.3.0"
  sha256 "deadbeef"

  url "https://github.com/acme/desk-app/releases/download/v#{version}/App_universal.dmg"
  name "Desk App"
  homepage "https://github.com/acme/desk-app"

  app "Desk App.app"
end
"#;

pub const BUNDLE_PATH: &str =
    "src-tauri/target/universal-apple-darwin/release/bundle/dmg/App_2.3.1_universal.dmg";

/// Records every invocation and answers with scripted exit codes.
pub struct FakeRunner {
    calls: RefCell<Vec<Invocation>>,
    respond: Box<dyn Fn(&Invocation) -> i32>,
}

impl FakeRunner {
    /// `gh release view` exits 1 (absent); everything else succeeds.
    pub fn new() -> Self {
        Self::with(|i| if is_release(i, "view") { 1 } else { 0 })
    }

    pub fn with(respond: impl Fn(&Invocation) -> i32 + 'static) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            respond: Box::new(respond),
        }
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    /// Invocations that would have started a real process.
    pub fn spawned(&self) -> Vec<Invocation> {
        self.calls().into_iter().filter(|i| !i.dry_run).collect()
    }

    pub fn count(&self, predicate: impl Fn(&Invocation) -> bool) -> usize {
        self.calls.borrow().iter().filter(|i| predicate(i)).count()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandResult> {
        self.calls.borrow_mut().push(invocation.clone());
        if invocation.dry_run {
            return Ok(CommandResult::synthetic_success());
        }

        let result = CommandResult::from_code((self.respond)(invocation));
        if !result.success && !invocation.allow_failure {
            return Err(PublishError::CommandFailed {
                command: invocation.to_string(),
                status: format!("exit code {}", result.code.unwrap_or(-1)),
            });
        }
        Ok(result)
    }
}

pub fn is_release(invocation: &Invocation, sub: &str) -> bool {
    invocation.program == "gh" && invocation.arg_at(0) == "release" && invocation.arg_at(1) == sub
}

pub fn is_build(invocation: &Invocation) -> bool {
    invocation.program == "npm" && invocation.args.iter().any(|a| a == "build")
}

/// A project directory with a bundle output for 2.3.1 and a stale cask.
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let bundle = dir.path().join(BUNDLE_PATH);
        fs::create_dir_all(bundle.parent().unwrap()).unwrap();
        fs::write(&bundle, b"universal dmg bytes for 2.3.1").unwrap();

        fs::create_dir_all(dir.path().join("Casks")).unwrap();
        fs::write(dir.path().join("Casks/app.rb"), CASK_FIXTURE).unwrap();

        fs::write(
            dir.path().join("package.json"),
            r#"{ "name": "desk-app", "version": "2.3.1" }"#,
        )
        .unwrap();

        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn cask(&self) -> String {
        fs::read_to_string(self.path("Casks/app.rb")).unwrap()
    }

    pub fn metadata(&self) -> ProjectMetadata {
        ProjectMetadata {
            version: ReleaseVersion::parse("2.3.1").unwrap(),
            repository: Some("acme/desk-app".to_string()),
        }
    }
}

pub fn options() -> PublishOptions {
    PublishOptions {
        skip_build: false,
        skip_publish: false,
        skip_cask: false,
        dry_run: false,
        draft: false,
        notes: ReleaseNotes::Default,
        tag: None,
        repo: "acme/desk-app".to_string(),
        cask: PathBuf::from("Casks/app.rb"),
        asset_path: None,
    }
}

pub fn config() -> Config {
    Config::default()
}

/// Relative path -> bytes for every file under `root`, for before/after comparisons.
pub fn snapshot(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                pending.push(path);
            } else {
                let relative = path.strip_prefix(root).unwrap().to_path_buf();
                files.push((relative, fs::read(&path).unwrap()));
            }
        }
    }
    files.sort();
    files
}

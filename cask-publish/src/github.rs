use std::fmt;
use std::path::Path;

use crate::cli::{PublishOptions, ReleaseNotes};
use crate::error::{PublishError, Result};
use crate::pipeline::StepOutcome;
use crate::runner::{CommandRunner, Invocation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseState {
    Absent,
    Present,
}

/// What the publisher did to the remote release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishAction {
    Created,
    Uploaded,
}

impl fmt::Display for PublishAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishAction::Created => write!(f, "created release"),
            PublishAction::Uploaded => write!(f, "uploaded asset"),
        }
    }
}

/// GitHub release operations through the `gh` command line client.
pub struct ReleasePublisher<'a, R: CommandRunner> {
    runner: &'a R,
    cli: String,
    repo: String,
    dry_run: bool,
}

impl<'a, R: CommandRunner> ReleasePublisher<'a, R> {
    pub fn new(
        runner: &'a R,
        cli: impl Into<String>,
        repo: impl Into<String>,
        dry_run: bool,
    ) -> Self {
        Self {
            runner,
            cli: cli.into(),
            repo: repo.into(),
            dry_run,
        }
    }

    fn invocation(&self) -> Invocation {
        Invocation::new(self.cli.as_str()).dry_run(self.dry_run)
    }

    /// Make sure `gh` is installed and logged in.
    pub fn check_prerequisites(&self) -> Result<()> {
        let version = self.runner.run(
            &self.invocation().arg("--version").capture().allow_failure(),
        )?;
        if !version.success {
            return Err(PublishError::Prerequisite(format!(
                "`{}` is not available: {}",
                self.cli,
                version.stderr.trim()
            )));
        }

        let auth = self.runner.run(
            &self
                .invocation()
                .args(["auth", "status"])
                .capture()
                .allow_failure(),
        )?;
        if !auth.success {
            return Err(PublishError::Prerequisite(format!(
                "`{}` is not authenticated; run `{} auth login`",
                self.cli, self.cli
            )));
        }

        tracing::debug!("{} is available and authenticated", self.cli);
        Ok(())
    }

    /// Look the release up fresh; any non-zero `release view` means absent.
    pub fn release_state(&self, tag: &str) -> Result<ReleaseState> {
        let result = self.runner.run(
            &self
                .invocation()
                .args(["release", "view", tag, "--repo", self.repo.as_str()])
                .capture()
                .allow_failure(),
        )?;

        if result.success {
            tracing::info!("Release {} already exists, will upload the asset", tag);
            return Ok(ReleaseState::Present);
        }

        let stderr = result.stderr.trim();
        if !stderr.is_empty() && !stderr.to_ascii_lowercase().contains("not found") {
            tracing::warn!(
                "`{} release view {}` failed without reporting a missing release: {}",
                self.cli,
                tag,
                stderr
            );
        }
        tracing::info!("Release {} does not exist yet, will create it", tag);
        Ok(ReleaseState::Absent)
    }

    pub fn create(
        &self,
        tag: &str,
        asset: &Path,
        notes: &ReleaseNotes,
        default_notes: &str,
        draft: bool,
    ) -> Result<()> {
        tracing::info!("Creating new release: {}", tag);

        let asset = asset.display().to_string();
        let mut invocation = self.invocation().args([
            "release",
            "create",
            tag,
            asset.as_str(),
            "--repo",
            self.repo.as_str(),
            "--title",
            tag,
        ]);
        if draft {
            invocation = invocation.arg("--draft");
        }
        invocation = match notes {
            ReleaseNotes::Text(text) => invocation.arg("--notes").arg(text.as_str()),
            ReleaseNotes::File(path) => invocation
                .arg("--notes-file")
                .arg(path.display().to_string()),
            ReleaseNotes::Generated => invocation.arg("--generate-notes"),
            ReleaseNotes::Default => invocation
                .arg("--notes")
                .arg(default_notes.replace("{tag}", tag)),
        };

        self.run_remote(invocation, "release creation")
    }

    pub fn upload(&self, tag: &str, asset: &Path) -> Result<()> {
        tracing::info!("Uploading asset {} to {}", asset.display(), tag);

        let asset = asset.display().to_string();
        let invocation = self.invocation().args([
            "release",
            "upload",
            tag,
            asset.as_str(),
            "--repo",
            self.repo.as_str(),
            "--clobber",
        ]);

        self.run_remote(invocation, "asset upload")
    }

    fn run_remote(&self, invocation: Invocation, what: &str) -> Result<()> {
        let result = self.runner.run(&invocation.allow_failure())?;
        if !result.success {
            let status = result
                .code
                .map(|code| format!("exit code {code}"))
                .unwrap_or_else(|| "no exit code".to_string());
            return Err(PublishError::Publish(format!(
                "{what} for {} failed ({status})",
                self.repo
            )));
        }
        Ok(())
    }

    /// Create the release with the asset, or replace the asset on an existing one.
    pub fn publish(
        &self,
        tag: &str,
        asset: &Path,
        options: &PublishOptions,
        default_notes: &str,
    ) -> Result<StepOutcome<PublishAction>> {
        if options.skip_publish {
            tracing::info!("Skipping GitHub release (--skip-gh)");
            return Ok(StepOutcome::skipped("--skip-gh"));
        }

        let action = match self.release_state(tag)? {
            ReleaseState::Absent => {
                self.create(tag, asset, &options.notes, default_notes, options.draft)?;
                PublishAction::Created
            }
            ReleaseState::Present => {
                self.upload(tag, asset)?;
                PublishAction::Uploaded
            }
        };

        tracing::info!("GitHub release {}: {}", tag, action);
        Ok(StepOutcome::Executed(action))
    }
}

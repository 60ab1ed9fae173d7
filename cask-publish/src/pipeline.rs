use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::artifact::{ArtifactLayout, StagedArtifact};
use crate::builder;
use crate::cask::{CaskUpdate, CaskUpdater};
use crate::cli::{PublishCli, PublishOptions};
use crate::config::Config;
use crate::digest::{self, Sha256Digest};
use crate::github::{PublishAction, ReleasePublisher};
use crate::metadata::{ProjectMetadata, ReleaseVersion};
use crate::runner::CommandRunner;

/// Result of a stage that can be switched off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome<T> {
    Skipped { reason: String },
    Executed(T),
}

impl<T> StepOutcome<T> {
    pub fn skipped(reason: impl Into<String>) -> Self {
        StepOutcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, StepOutcome::Skipped { .. })
    }

    pub fn executed(&self) -> Option<&T> {
        match self {
            StepOutcome::Executed(value) => Some(value),
            StepOutcome::Skipped { .. } => None,
        }
    }

    fn describe(&self, executed: impl FnOnce(&T) -> String) -> String {
        match self {
            StepOutcome::Skipped { reason } => format!("skipped ({reason})"),
            StepOutcome::Executed(value) => executed(value),
        }
    }
}

/// Everything one run did, step by step.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub version: ReleaseVersion,
    pub tag: String,
    pub dry_run: bool,
    pub build: StepOutcome<()>,
    pub artifact: StagedArtifact,
    pub digest: Sha256Digest,
    pub release: StepOutcome<PublishAction>,
    pub cask: StepOutcome<CaskUpdate>,
}

impl RunSummary {
    pub fn log(&self) {
        let mode = if self.dry_run { " (dry-run)" } else { "" };
        tracing::info!("Release {} summary{}:", self.tag, mode);
        tracing::info!("  version:  {}", self.version);
        tracing::info!("  build:    {}", self.build.describe(|_| "done".to_string()));
        tracing::info!(
            "  artifact: {}{}",
            self.artifact.reference.path.display(),
            if self.artifact.copied { "" } else { " (not copied)" }
        );
        tracing::info!("  sha256:   {}", self.digest);
        tracing::info!("  release:  {}", self.release.describe(ToString::to_string));
        tracing::info!("  cask:     {}", self.cask.describe(ToString::to_string));
    }
}

/// Load config, project metadata and options for a run rooted at `root`.
pub fn prepare(cli: PublishCli, root: &Path) -> Result<(PublishOptions, Config, ProjectMetadata)> {
    let config = Config::discover(root, cli.config.as_deref())?;
    let metadata = ProjectMetadata::load(&root.join(&config.project.metadata))?;
    let options = PublishOptions::resolve(cli, &config, &metadata)?;
    Ok((options, config, metadata))
}

pub struct ReleasePipeline<R: CommandRunner> {
    options: PublishOptions,
    config: Config,
    metadata: ProjectMetadata,
    runner: R,
    root: PathBuf,
}

impl<R: CommandRunner> ReleasePipeline<R> {
    pub fn new(
        options: PublishOptions,
        config: Config,
        metadata: ProjectMetadata,
        runner: R,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            options,
            config,
            metadata,
            runner,
            root: root.into(),
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn run(&self) -> Result<RunSummary> {
        let options = &self.options;
        let version = &self.metadata.version;
        let tag = options.release_tag(&self.metadata);
        tracing::info!("Publishing version {} as {}", version, tag);
        if options.dry_run {
            tracing::info!("[dry-run] no files, processes or releases will be touched");
        }

        let publisher = ReleasePublisher::new(
            &self.runner,
            self.config.release.cli.as_str(),
            options.repo.as_str(),
            options.dry_run,
        );
        if !options.skip_publish {
            publisher
                .check_prerequisites()
                .context("GitHub CLI check failed")?;
        }

        let build = builder::build(options, &self.config.build, &self.root, &self.runner)
            .context("Build step failed")?;

        let layout = ArtifactLayout::new(&self.root, &self.config);
        let source = layout
            .resolve_source(options, version)
            .context("Locating the installer failed")?;
        let artifact = layout
            .stage(&source, version, options.dry_run)
            .context("Staging the installer failed")?;

        // Under dry-run there is no fresh staged copy; the source has the same bytes.
        let hashed = if options.dry_run {
            &source.path
        } else {
            &artifact.reference.path
        };
        let digest = digest::sha256_file(hashed).context("Computing the digest failed")?;
        tracing::info!("sha256: {}", digest);

        let release = publisher
            .publish(
                &tag,
                &artifact.reference.path,
                options,
                &self.config.release.default_notes,
            )
            .context("GitHub release step failed")?;

        let cask = if options.skip_cask {
            tracing::info!("Skipping cask update (--skip-cask)");
            StepOutcome::skipped("--skip-cask")
        } else {
            let updater =
                CaskUpdater::new(self.root.join(&options.cask), layout.qualifier());
            StepOutcome::Executed(
                updater
                    .update(version, &digest, options.dry_run)
                    .context("Cask update failed")?,
            )
        };

        let summary = RunSummary {
            version: version.clone(),
            tag,
            dry_run: options.dry_run,
            build,
            artifact,
            digest,
            release,
            cask,
        };
        summary.log();
        Ok(summary)
    }
}

use clap::error::ErrorKind;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::{PublishError, Result};
use crate::metadata::ProjectMetadata;

#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "cask-publish",
    version,
    about = "Stage a desktop installer, publish it to GitHub Releases and sync its Homebrew cask",
    long_about = None
)]
pub struct PublishCli {
    /// Skip the platform build and use the existing bundle
    #[arg(long)]
    pub skip_build: bool,

    /// Skip creating the GitHub release / uploading the asset
    #[arg(long = "skip-gh")]
    pub skip_gh: bool,

    /// Skip updating the cask file
    #[arg(long)]
    pub skip_cask: bool,

    /// Print what would happen without touching files, processes or GitHub
    #[arg(long)]
    pub dry_run: bool,

    /// Create the release as a draft
    #[arg(long)]
    pub draft: bool,

    /// Let GitHub generate the release notes
    #[arg(long, conflicts_with_all = ["notes", "notes_file"])]
    pub generate_notes: bool,

    /// Release notes text
    #[arg(long, value_name = "TEXT", conflicts_with = "notes_file")]
    pub notes: Option<String>,

    /// Read release notes from a file
    #[arg(long, value_name = "PATH")]
    pub notes_file: Option<PathBuf>,

    /// Release tag (defaults to v<version>)
    #[arg(long)]
    pub tag: Option<String>,

    /// GitHub repository (owner/repo)
    /// If not specified, uses the config file or the project metadata
    #[arg(long, value_name = "OWNER/REPO")]
    pub repo: Option<String>,

    /// Cask file to update
    #[arg(long, value_name = "PATH")]
    pub cask: Option<PathBuf>,

    /// Use this installer instead of the default bundle output
    #[arg(long, value_name = "PATH")]
    pub asset_path: Option<PathBuf>,

    /// Configuration file path (defaults to .config/cask-publish.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,
}

/// Result of argument parsing before any configuration is consulted.
#[derive(Debug)]
pub enum CliOutcome {
    Run(PublishCli),
    /// Rendered help or version text; print it and exit 0.
    Info(String),
}

/// Parse raw arguments (including the program name).
pub fn parse_args<I, T>(args: I) -> Result<CliOutcome>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match PublishCli::try_parse_from(args) {
        Ok(cli) => Ok(CliOutcome::Run(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                Ok(CliOutcome::Info(err.render().to_string()))
            }
            _ => Err(PublishError::Configuration(first_error_line(&err))),
        },
    }
}

fn first_error_line(err: &clap::Error) -> String {
    let rendered = err.render().to_string();
    rendered
        .lines()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.trim_start_matches("error:").trim().to_string())
        .unwrap_or(rendered)
}

/// How the release notes are supplied to `gh release create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseNotes {
    Text(String),
    File(PathBuf),
    Generated,
    /// Nothing requested; the configured default text is used.
    Default,
}

/// Fully resolved, immutable options for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOptions {
    pub skip_build: bool,
    pub skip_publish: bool,
    pub skip_cask: bool,
    pub dry_run: bool,
    pub draft: bool,
    pub notes: ReleaseNotes,
    pub tag: Option<String>,
    pub repo: String,
    pub cask: PathBuf,
    pub asset_path: Option<PathBuf>,
}

impl PublishOptions {
    /// Merge command line over config over project metadata.
    pub fn resolve(cli: PublishCli, config: &Config, metadata: &ProjectMetadata) -> Result<Self> {
        let notes = match (cli.notes, cli.notes_file, cli.generate_notes) {
            (Some(_), Some(_), _) | (Some(_), _, true) | (_, Some(_), true) => {
                return Err(PublishError::Configuration(
                    "--notes, --notes-file and --generate-notes are mutually exclusive".to_string(),
                ))
            }
            (Some(text), None, false) => ReleaseNotes::Text(text),
            (None, Some(path), false) => ReleaseNotes::File(path),
            (None, None, true) => ReleaseNotes::Generated,
            (None, None, false) if config.release.generate_notes => ReleaseNotes::Generated,
            (None, None, false) => ReleaseNotes::Default,
        };

        let repo = cli
            .repo
            .or_else(|| config.release.repository.clone())
            .or_else(|| metadata.repository.clone())
            .ok_or_else(|| {
                PublishError::Configuration(
                    "no repository given; pass --repo owner/repo or set [release].repository"
                        .to_string(),
                )
            })?;
        parse_repository(&repo)?;

        if let Some(tag) = &cli.tag {
            if tag.trim().is_empty() {
                return Err(PublishError::Configuration("--tag must not be empty".to_string()));
            }
        }

        Ok(Self {
            skip_build: cli.skip_build,
            skip_publish: cli.skip_gh,
            skip_cask: cli.skip_cask,
            dry_run: cli.dry_run,
            draft: cli.draft || config.release.draft,
            notes,
            tag: cli.tag,
            repo,
            cask: cli.cask.unwrap_or_else(|| config.cask.path.clone()),
            asset_path: cli.asset_path,
        })
    }

    /// The tag override, or `v<version>`.
    pub fn release_tag(&self, metadata: &ProjectMetadata) -> String {
        self.tag.clone().unwrap_or_else(|| metadata.version.tag())
    }
}

/// Split `owner/repo`, rejecting anything else.
pub fn parse_repository(repo: &str) -> Result<(String, String)> {
    let parts: Vec<&str> = repo.split('/').collect();
    if parts.len() != 2 || parts.iter().any(|p| p.trim().is_empty()) {
        return Err(PublishError::Configuration(format!(
            "invalid repository '{repo}'. Expected: owner/repo"
        )));
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}

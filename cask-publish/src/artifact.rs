//! Locating the built installer and staging it under its release name.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::PublishOptions;
use crate::config::Config;
use crate::error::{PublishError, Result};
use crate::metadata::ReleaseVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactRole {
    /// Default bundle output of the platform build.
    BuildOutput,
    /// Given with `--asset-path`.
    Explicit,
    /// Copy under `release-artifacts/`.
    Staged,
}

impl fmt::Display for ArtifactRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactRole::BuildOutput => write!(f, "build output"),
            ArtifactRole::Explicit => write!(f, "explicit"),
            ArtifactRole::Staged => write!(f, "staged"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactReference {
    pub path: PathBuf,
    pub role: ArtifactRole,
}

impl ArtifactReference {
    /// Fails with [`PublishError::MissingArtifact`] unless the file exists.
    pub fn ensure_exists(&self) -> Result<()> {
        if self.path.is_file() {
            Ok(())
        } else {
            Err(PublishError::MissingArtifact {
                role: self.role.to_string(),
                path: self.path.clone(),
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedArtifact {
    pub reference: ArtifactReference,
    pub name: String,
    /// Whether a copy actually happened on this run.
    pub copied: bool,
}

/// Where the build leaves the installer and where it gets staged.
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    root: PathBuf,
    product_prefix: String,
    target: String,
    qualifier: String,
    extension: String,
    bundle_path: String,
    staging_dir: PathBuf,
}

impl ArtifactLayout {
    pub fn new(root: impl Into<PathBuf>, config: &Config) -> Self {
        Self {
            root: root.into(),
            product_prefix: config.project.product_prefix.clone(),
            target: config.build.target.clone(),
            qualifier: config.artifact.qualifier.clone(),
            extension: config.artifact.extension.clone(),
            bundle_path: config.artifact.bundle_path.clone(),
            staging_dir: config.artifact.staging_dir.clone(),
        }
    }

    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }

    pub fn staging_path(&self) -> PathBuf {
        self.root.join(&self.staging_dir)
    }

    /// `<Prefix>_<version>_<qualifier>.<ext>`
    pub fn staged_filename(&self, version: &ReleaseVersion) -> String {
        format!(
            "{}_{}_{}.{}",
            self.product_prefix, version, self.qualifier, self.extension
        )
    }

    /// Bundle output path with the layout placeholders filled in.
    pub fn default_source_path(&self, version: &ReleaseVersion) -> PathBuf {
        let relative = self
            .bundle_path
            .replace("{target}", &self.target)
            .replace("{version}", version.as_str())
            .replace("{prefix}", &self.product_prefix)
            .replace("{qualifier}", &self.qualifier)
            .replace("{ext}", &self.extension);
        self.root.join(relative)
    }

    /// Find the installer to publish and check that it exists.
    pub fn resolve_source(
        &self,
        options: &PublishOptions,
        version: &ReleaseVersion,
    ) -> Result<ArtifactReference> {
        let reference = match &options.asset_path {
            Some(path) => ArtifactReference {
                path: self.root.join(path),
                role: ArtifactRole::Explicit,
            },
            None => ArtifactReference {
                path: self.default_source_path(version),
                role: ArtifactRole::BuildOutput,
            },
        };

        reference.ensure_exists()?;
        tracing::info!("Using {} artifact: {}", reference.role, reference.path.display());
        Ok(reference)
    }

    /// Copy `source` into the staging directory under its release name.
    ///
    /// Under dry-run nothing is created or copied, but the would-be
    /// location is still returned.
    pub fn stage(
        &self,
        source: &ArtifactReference,
        version: &ReleaseVersion,
        dry_run: bool,
    ) -> Result<StagedArtifact> {
        let staging_dir = self.staging_path();
        let name = self.staged_filename(version);
        let dest = staging_dir.join(&name);
        let reference = ArtifactReference {
            path: dest.clone(),
            role: ArtifactRole::Staged,
        };

        if dry_run {
            tracing::info!(
                "[dry-run] would copy {} -> {}",
                source.path.display(),
                dest.display()
            );
            return Ok(StagedArtifact {
                reference,
                name,
                copied: false,
            });
        }

        fs::create_dir_all(&staging_dir).map_err(|e| PublishError::io(&staging_dir, e))?;

        let copied = if same_file(&source.path, &dest) {
            tracing::info!("Artifact already staged at {}", dest.display());
            false
        } else {
            fs::copy(&source.path, &dest).map_err(|e| PublishError::io(&dest, e))?;
            tracing::info!("Staged {} -> {}", source.path.display(), dest.display());
            true
        };

        if !dest.is_file() {
            return Err(PublishError::io(
                &dest,
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "staged artifact missing after copy",
                ),
            ));
        }

        Ok(StagedArtifact {
            reference,
            name,
            copied,
        })
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

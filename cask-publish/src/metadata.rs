use cargo_manifest::{Manifest, MaybeInherited};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

use crate::error::{PublishError, Result};

/// Semantic version of the release being published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseVersion(String);

impl ReleaseVersion {
    pub fn parse(raw: &str) -> Result<Self> {
        let version = raw.trim();
        if version.is_empty() {
            return Err(PublishError::Configuration(
                "project version is empty".to_string(),
            ));
        }
        semver::Version::parse(version).map_err(|e| {
            PublishError::Configuration(format!("invalid project version '{version}': {e}"))
        })?;
        Ok(Self(version.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `v<version>`, the default release tag.
    pub fn tag(&self) -> String {
        format!("v{}", self.0)
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the pipeline needs to know about the application being released.
#[derive(Debug, Clone)]
pub struct ProjectMetadata {
    pub version: ReleaseVersion,
    /// `owner/repo` derived from the metadata's repository URL, if any.
    pub repository: Option<String>,
}

#[derive(Deserialize)]
struct PackageJson {
    version: Option<String>,
    repository: Option<PackageRepository>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PackageRepository {
    Url(String),
    Object { url: String },
}

impl ProjectMetadata {
    /// Read `package.json` or a `Cargo.toml`, chosen by file name.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PublishError::Configuration(format!(
                "project metadata {} does not exist",
                path.display()
            )));
        }

        let is_cargo = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n == "Cargo.toml");

        if is_cargo {
            Self::from_cargo_toml(path)
        } else {
            Self::from_package_json(path)
        }
    }

    fn from_package_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PublishError::io(path, e))?;
        let package: PackageJson = serde_json::from_str(&content).map_err(|e| {
            PublishError::Configuration(format!("invalid {}: {e}", path.display()))
        })?;

        let version = package.version.ok_or_else(|| {
            PublishError::Configuration(format!("no version field in {}", path.display()))
        })?;

        let repository = package.repository.and_then(|repo| match repo {
            PackageRepository::Url(url) | PackageRepository::Object { url } => {
                parse_github_repository(&url)
            }
        });

        Ok(Self {
            version: ReleaseVersion::parse(&version)?,
            repository,
        })
    }

    fn from_cargo_toml(path: &Path) -> Result<Self> {
        let manifest = Manifest::from_path(path).map_err(|e| {
            PublishError::Configuration(format!("failed to parse {}: {e}", path.display()))
        })?;

        let workspace_package = manifest.workspace.as_ref().and_then(|ws| ws.package.as_ref());

        let mut version = workspace_package.and_then(|p| p.version.clone());
        let mut repository = workspace_package.and_then(|p| p.repository.clone());
        let mut inherits = false;

        if let Some(package) = &manifest.package {
            match &package.version {
                Some(MaybeInherited::Local(local)) => version = Some(local.clone()),
                Some(MaybeInherited::Inherited { .. }) => inherits = true,
                None => {}
            }
            match &package.repository {
                Some(MaybeInherited::Local(local)) => repository = Some(local.clone()),
                Some(MaybeInherited::Inherited { .. }) => inherits = true,
                None => {}
            }
        }

        // Member crates (e.g. `src-tauri/`) take inherited fields from the workspace root.
        if inherits || version.is_none() {
            if let Some(ws_package) = find_workspace_manifest(path)
                .and_then(|root| root.workspace)
                .and_then(|ws| ws.package)
            {
                version = version.or(ws_package.version);
                repository = repository.or(ws_package.repository);
            }
        }

        let version = version.ok_or_else(|| {
            PublishError::Configuration(format!("no version field found in {}", path.display()))
        })?;

        Ok(Self {
            version: ReleaseVersion::parse(&version)?,
            repository: repository.as_deref().and_then(parse_github_repository),
        })
    }
}

/// Find the workspace manifest above `member` by looking up parent directories
fn find_workspace_manifest(member: &Path) -> Option<Manifest> {
    let member_dir = member.parent()?;

    for dir in member_dir.ancestors().skip(1) {
        let manifest_path = dir.join("Cargo.toml");
        if !manifest_path.exists() {
            continue;
        }
        match Manifest::from_path(&manifest_path) {
            Ok(manifest) if manifest.workspace.is_some() => {
                tracing::debug!("Using workspace manifest {}", manifest_path.display());
                return Some(manifest);
            }
            Ok(_) => {}
            Err(e) => tracing::debug!("Ignoring {}: {}", manifest_path.display(), e),
        }
    }

    None
}

/// Extract `owner/repo` from the common GitHub repository URL spellings.
pub fn parse_github_repository(url: &str) -> Option<String> {
    let url = url.trim().trim_end_matches('/').trim_end_matches(".git");
    let rest = ["https://github.com/", "git+https://github.com/", "git@github.com:", "github:"]
        .iter()
        .find_map(|prefix| url.strip_prefix(prefix))?;

    let parts: Vec<&str> = rest.split('/').collect();
    if parts.len() == 2 && parts.iter().all(|p| !p.is_empty()) {
        Some(format!("{}/{}", parts[0], parts[1]))
    } else {
        None
    }
}

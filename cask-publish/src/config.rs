use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{PublishError, Result};

/// Project-relative location of the config file.
pub const DEFAULT_CONFIG_PATH: &str = ".config/cask-publish.toml";

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub artifact: ArtifactConfig,

    #[serde(default)]
    pub release: ReleaseConfig,

    #[serde(default)]
    pub cask: CaskConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectConfig {
    /// `package.json` or a `Cargo.toml` carrying the release version.
    #[serde(default = "default_metadata")]
    pub metadata: PathBuf,

    #[serde(default = "default_product_prefix")]
    pub product_prefix: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            metadata: default_metadata(),
            product_prefix: default_product_prefix(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BuildConfig {
    /// Program plus leading arguments; `build -- --target <triple>` is appended.
    #[serde(default = "default_build_command")]
    pub command: Vec<String>,

    #[serde(default = "default_target")]
    pub target: String,

    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            command: default_build_command(),
            target: default_target(),
            env: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtifactConfig {
    #[serde(default = "default_qualifier")]
    pub qualifier: String,

    #[serde(default = "default_extension")]
    pub extension: String,

    /// Supports `{target}`, `{version}`, `{prefix}`, `{qualifier}` and `{ext}`.
    #[serde(default = "default_bundle_path")]
    pub bundle_path: String,

    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            qualifier: default_qualifier(),
            extension: default_extension(),
            bundle_path: default_bundle_path(),
            staging_dir: default_staging_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReleaseConfig {
    #[serde(default = "default_cli")]
    pub cli: String,

    pub repository: Option<String>,

    #[serde(default)]
    pub draft: bool,

    #[serde(default)]
    pub generate_notes: bool,

    /// Used when no notes option was given; `{tag}` is substituted.
    #[serde(default = "default_notes")]
    pub default_notes: String,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            cli: default_cli(),
            repository: None,
            draft: false,
            generate_notes: false,
            default_notes: default_notes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaskConfig {
    #[serde(default = "default_cask_path")]
    pub path: PathBuf,
}

impl Default for CaskConfig {
    fn default() -> Self {
        Self {
            path: default_cask_path(),
        }
    }
}

fn default_metadata() -> PathBuf {
    PathBuf::from("package.json")
}

fn default_product_prefix() -> String {
    "App".to_string()
}

fn default_build_command() -> Vec<String> {
    vec!["npm".to_string(), "run".to_string(), "tauri".to_string()]
}

fn default_target() -> String {
    "universal-apple-darwin".to_string()
}

fn default_qualifier() -> String {
    "universal".to_string()
}

fn default_extension() -> String {
    "dmg".to_string()
}

fn default_bundle_path() -> String {
    "src-tauri/target/{target}/release/bundle/dmg/{prefix}_{version}_{qualifier}.{ext}".to_string()
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("release-artifacts")
}

fn default_cli() -> String {
    "gh".to_string()
}

fn default_notes() -> String {
    "Release {tag}".to_string()
}

fn default_cask_path() -> PathBuf {
    PathBuf::from("Casks/app.rb")
}

impl Config {
    /// Load configuration from file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| PublishError::io(path, e))?;
        toml::from_str(&content).map_err(|e| {
            PublishError::Configuration(format!("invalid config {}: {e}", path.display()))
        })
    }

    /// Load the explicit path if given, else the project file, else the user-wide file.
    pub fn discover(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            let path = root.join(path);
            if !path.exists() {
                return Err(PublishError::Configuration(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            return Self::load(&path);
        }

        let project = root.join(DEFAULT_CONFIG_PATH);
        if project.exists() {
            tracing::debug!("Using config {}", project.display());
            return Self::load(&project);
        }

        Self::load(&Self::user_path())
    }

    /// Get the user-wide configuration file path
    pub fn user_path() -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("cask-publish.toml"))
            .unwrap_or_else(|| PathBuf::from("~/.config/cask-publish.toml"))
    }
}

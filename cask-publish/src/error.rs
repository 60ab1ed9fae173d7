use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PublishError {
    /// Bad or missing command-line / config input, raised before any side effect.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Prerequisite check failed: {0}")]
    Prerequisite(String),

    #[error("Missing {role} artifact: {} does not exist", .path.display())]
    MissingArtifact { role: String, path: PathBuf },

    #[error("IO error at {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to execute `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command `{command}` exited with {status}")]
    CommandFailed { command: String, status: String },

    #[error("Release publishing failed: {0}")]
    Publish(String),

    #[error("Cask {} has no `{field}` field", .path.display())]
    ManifestFormat { path: PathBuf, field: &'static str },

    #[error("Cask {} url `{url}` does not reference a `{qualifier}` artifact", .path.display())]
    ManifestMismatch {
        path: PathBuf,
        url: String,
        qualifier: String,
    },
}

impl PublishError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PublishError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PublishError>;

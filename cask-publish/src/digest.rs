use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

use crate::error::{PublishError, Result};

/// Lowercase hex SHA-256 of an artifact, as written into the cask.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stream a file through SHA-256 and return its hex digest.
pub fn sha256_file(path: &Path) -> Result<Sha256Digest> {
    let mut file = File::open(path).map_err(|e| PublishError::io(path, e))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|e| PublishError::io(path, e))?;
    let hash = hasher.finalize();

    let digest = Sha256Digest(hex::encode(hash));
    tracing::debug!("sha256({}) = {}", path.display(), digest);
    Ok(digest)
}

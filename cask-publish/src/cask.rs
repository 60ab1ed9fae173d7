//! Homebrew cask synchronisation.
//!
//! The cask is treated as opaque text with three addressable fields, each
//! found by its own line-anchored rule. A cask whose shape has drifted is
//! rejected as a whole rather than partially rewritten.

use regex::Regex;
use similar::TextDiff;
use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::digest::Sha256Digest;
use crate::error::{PublishError, Result};
use crate::metadata::ReleaseVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaskField {
    Version,
    Sha256,
    Url,
}

impl CaskField {
    pub fn name(self) -> &'static str {
        match self {
            CaskField::Version => "version",
            CaskField::Sha256 => "sha256",
            CaskField::Url => "url",
        }
    }
}

impl fmt::Display for CaskField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One located field: its quoted value and where that value sits in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch {
    pub field: CaskField,
    pub value: String,
    pub value_range: Range<usize>,
    pub line: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaskFields {
    pub version: FieldMatch,
    pub sha256: FieldMatch,
    pub url: FieldMatch,
}

struct FieldRule {
    field: CaskField,
    pattern: Regex,
}

/// The three extraction rules a cask must satisfy.
pub struct CaskSchema {
    rules: [FieldRule; 3],
}

impl CaskSchema {
    pub fn new() -> Self {
        Self {
            rules: [
                FieldRule::new(CaskField::Version),
                FieldRule::new(CaskField::Sha256),
                FieldRule::new(CaskField::Url),
            ],
        }
    }

    /// Locate all three fields or name the first one that is missing.
    pub fn extract(&self, path: &Path, content: &str) -> Result<CaskFields> {
        let [version, sha256, url] = &self.rules;
        Ok(CaskFields {
            version: version.find(path, content)?,
            sha256: sha256.find(path, content)?,
            url: url.find(path, content)?,
        })
    }
}

impl Default for CaskSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldRule {
    fn new(field: CaskField) -> Self {
        // Field names are fixed identifiers, so the pattern is always valid.
        let pattern = Regex::new(&format!(r#"(?m)^[ \t]*{}[ \t]+"([^"\n]*)""#, field.name()))
            .unwrap_or_else(|e| unreachable!("invalid cask pattern for {field}: {e}"));
        Self { field, pattern }
    }

    fn find(&self, path: &Path, content: &str) -> Result<FieldMatch> {
        let captures = self
            .pattern
            .captures(content)
            .ok_or_else(|| PublishError::ManifestFormat {
                path: path.to_path_buf(),
                field: self.field.name(),
            })?;
        let (Some(whole), Some(value)) = (captures.get(0), captures.get(1)) else {
            return Err(PublishError::ManifestFormat {
                path: path.to_path_buf(),
                field: self.field.name(),
            });
        };

        Ok(FieldMatch {
            field: self.field,
            value: value.as_str().to_string(),
            value_range: value.range(),
            line: whole.as_str().trim().to_string(),
        })
    }
}

/// What happened to the cask file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaskUpdate {
    UpToDate,
    /// Dry-run: the unified diff that would have been applied.
    Previewed { diff: String },
    Written { version_line: String, sha256_line: String },
}

impl fmt::Display for CaskUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaskUpdate::UpToDate => write!(f, "already up to date"),
            CaskUpdate::Previewed { .. } => write!(f, "previewed (dry-run)"),
            CaskUpdate::Written { .. } => write!(f, "updated"),
        }
    }
}

/// Rewrites a cask file's version and sha256 for a new release.
pub struct CaskUpdater {
    path: PathBuf,
    qualifier: String,
    schema: CaskSchema,
}

impl CaskUpdater {
    pub fn new(path: impl Into<PathBuf>, qualifier: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            qualifier: qualifier.into(),
            schema: CaskSchema::new(),
        }
    }

    /// Compute the new content without touching the file.
    pub fn render(
        &self,
        original: &str,
        version: &ReleaseVersion,
        digest: &Sha256Digest,
    ) -> Result<String> {
        let fields = self.schema.extract(&self.path, original)?;

        if !fields.url.value.contains(&self.qualifier) {
            return Err(PublishError::ManifestMismatch {
                path: self.path.clone(),
                url: fields.url.value,
                qualifier: self.qualifier.clone(),
            });
        }

        let mut edits = [
            (fields.version.value_range, version.as_str()),
            (fields.sha256.value_range, digest.as_str()),
        ];
        // Splice back to front so earlier ranges stay valid.
        edits.sort_by_key(|(range, _)| std::cmp::Reverse(range.start));

        let mut updated = original.to_string();
        for (range, value) in edits {
            updated.replace_range(range, value);
        }
        Ok(updated)
    }

    pub fn update(
        &self,
        version: &ReleaseVersion,
        digest: &Sha256Digest,
        dry_run: bool,
    ) -> Result<CaskUpdate> {
        let original =
            std::fs::read_to_string(&self.path).map_err(|e| PublishError::io(&self.path, e))?;
        let updated = self.render(&original, version, digest)?;

        if updated == original {
            tracing::info!("Cask {} is already up to date", self.path.display());
            return Ok(CaskUpdate::UpToDate);
        }

        if dry_run {
            let diff = TextDiff::from_lines(original.as_str(), updated.as_str())
                .unified_diff()
                .context_radius(0)
                .header("current", "proposed")
                .to_string();
            tracing::info!("[dry-run] would update {}:\n{}", self.path.display(), diff);
            return Ok(CaskUpdate::Previewed { diff });
        }

        std::fs::write(&self.path, &updated).map_err(|e| PublishError::io(&self.path, e))?;

        let fields = self.schema.extract(&self.path, &updated)?;
        tracing::info!("Updated {}", self.path.display());
        tracing::info!("  {}", fields.version.line);
        tracing::info!("  {}", fields.sha256.line);

        Ok(CaskUpdate::Written {
            version_line: fields.version.line,
            sha256_line: fields.sha256.line,
        })
    }
}

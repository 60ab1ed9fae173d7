//! # cask-publish
//!
//! Publishes a desktop application's installer to GitHub Releases and keeps
//! its Homebrew cask in sync.
//!
//! ## Overview
//!
//! `cask-publish` runs a short, re-runnable release pipeline:
//!
//! - builds the installer for `universal-apple-darwin` (skippable)
//! - locates the bundle output and stages it as
//!   `release-artifacts/<Prefix>_<version>_universal.dmg`
//! - computes its SHA-256
//! - creates the `v<version>` release with the asset attached, or replaces
//!   the asset on an existing release (`gh release upload --clobber`)
//! - rewrites the cask's `version` and `sha256` lines
//!
//! Every step can be previewed with `--dry-run`, which spawns nothing and
//! writes nothing.
//!
//! ## Usage
//!
//! ```bash
//! # Full release
//! cask-publish --repo acme/desk-app --cask Casks/desk-app.rb
//!
//! # Re-publish an existing build as a draft with generated notes
//! cask-publish --skip-build --draft --generate-notes
//!
//! # Preview everything
//! cask-publish --dry-run
//! ```
//!
//! ## Configuration
//!
//! Defaults can be set in `.config/cask-publish.toml` in the project
//! directory or `~/.config/cask-publish.toml` for user-wide settings.

/// Installer location, staging directory and staged naming
pub mod artifact;

/// Platform build trigger
pub mod builder;

/// Homebrew cask field extraction and rewriting
pub mod cask;

/// Command-line interface definitions and option resolution
pub mod cli;

/// Configuration file handling and default settings management
pub mod config;

/// SHA-256 digests of artifacts
pub mod digest;

/// Error types and error handling utilities
pub mod error;

/// GitHub release creation and asset upload through the `gh` CLI
pub mod github;

/// Project version and repository discovery
pub mod metadata;

/// Step sequencing and run summary
pub mod pipeline;

/// External command execution with dry-run support
pub mod runner;

use std::path::Path;

use crate::cli::PublishOptions;
use crate::config::BuildConfig;
use crate::error::{PublishError, Result};
use crate::pipeline::StepOutcome;
use crate::runner::{CommandRunner, Invocation};

/// `<command...> build -- --target <triple>`, run from the project root.
pub fn build_invocation(config: &BuildConfig, root: &Path, dry_run: bool) -> Result<Invocation> {
    let (program, prefix) = config.command.split_first().ok_or_else(|| {
        PublishError::Configuration("[build].command must name a program".to_string())
    })?;

    Ok(Invocation::new(program.as_str())
        .args(prefix.iter().map(String::as_str))
        .args(["build", "--", "--target", config.target.as_str()])
        .cwd(root)
        .dry_run(dry_run))
}

/// Run the platform build unless `--skip-build` was given.
pub fn build<R: CommandRunner>(
    options: &PublishOptions,
    config: &BuildConfig,
    root: &Path,
    runner: &R,
) -> Result<StepOutcome<()>> {
    if options.skip_build {
        tracing::info!("Skipping build (--skip-build)");
        return Ok(StepOutcome::skipped("--skip-build"));
    }

    tracing::info!("Building for target: {}", config.target);
    let invocation = build_invocation(config, root, options.dry_run)?;
    runner.run(&invocation)?;
    Ok(StepOutcome::Executed(()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ReleaseNotes;
    use crate::runner::{CommandResult, MockCommandRunner};
    use std::path::PathBuf;

    fn options(skip_build: bool) -> PublishOptions {
        PublishOptions {
            skip_build,
            skip_publish: true,
            skip_cask: true,
            dry_run: false,
            draft: false,
            notes: ReleaseNotes::Default,
            tag: None,
            repo: "owner/repo".to_string(),
            cask: PathBuf::from("Casks/app.rb"),
            asset_path: None,
        }
    }

    #[test]
    fn test_build_invocation_shape() {
        let invocation =
            build_invocation(&BuildConfig::default(), Path::new("/work"), false).unwrap();
        assert_eq!(
            invocation.to_string(),
            "npm run tauri build -- --target universal-apple-darwin"
        );
        assert_eq!(invocation.cwd, Some(PathBuf::from("/work")));
        assert!(!invocation.allow_failure);
    }

    #[test]
    fn test_empty_build_command_is_rejected() {
        let config = BuildConfig {
            command: Vec::new(),
            ..BuildConfig::default()
        };
        assert!(matches!(
            build_invocation(&config, Path::new("."), false),
            Err(PublishError::Configuration(_))
        ));
    }

    #[test]
    fn test_skip_build_runs_nothing() {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().never();

        let outcome = build(&options(true), &BuildConfig::default(), Path::new("."), &runner)
            .unwrap();
        assert!(outcome.is_skipped());
    }

    #[test]
    fn test_build_failure_propagates() {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().times(1).returning(|invocation| {
            Err(PublishError::CommandFailed {
                command: invocation.to_string(),
                status: "exit code 1".to_string(),
            })
        });

        let err = build(&options(false), &BuildConfig::default(), Path::new("."), &runner)
            .unwrap_err();
        assert!(matches!(err, PublishError::CommandFailed { .. }));
    }

    #[test]
    fn test_build_runs_once() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|invocation| invocation.program == "npm" && invocation.arg_at(2) == "build")
            .times(1)
            .returning(|_| Ok(CommandResult::from_code(0)));

        let outcome = build(&options(false), &BuildConfig::default(), Path::new("."), &runner)
            .unwrap();
        assert!(!outcome.is_skipped());
    }
}

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use crate::error::{PublishError, Result};

/// A single external program call, plus the caller's expectations about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub capture_output: bool,
    pub dry_run: bool,
    /// Return a non-zero exit to the caller instead of raising it.
    pub allow_failure: bool,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            capture_output: false,
            dry_run: false,
            allow_failure: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn capture(mut self) -> Self {
        self.capture_output = true;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn allow_failure(mut self) -> Self {
        self.allow_failure = true;
        self
    }

    /// The argument at `index`, or an empty string.
    pub fn arg_at(&self, index: usize) -> &str {
        self.args.get(index).map(String::as_str).unwrap_or("")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {arg:?}")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    /// `None` when the process never ran or was killed by a signal.
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    /// Synthesized without spawning anything.
    pub dry_run: bool,
}

impl CommandResult {
    pub fn synthetic_success() -> Self {
        Self {
            code: Some(0),
            success: true,
            dry_run: true,
            ..Default::default()
        }
    }

    pub fn from_code(code: i32) -> Self {
        Self {
            code: Some(code),
            success: code == 0,
            ..Default::default()
        }
    }

    fn describe_status(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {code}"),
            None => "no exit code (terminated by signal)".to_string(),
        }
    }
}

/// Abstraction for running external commands.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner {
    /// Runs `invocation`, honouring its dry-run and allow-failure flags.
    ///
    /// # Errors
    ///
    /// [`PublishError::Spawn`] when the program cannot be started and
    /// [`PublishError::CommandFailed`] on a non-zero exit, unless the
    /// invocation allows failure.
    fn run(&self, invocation: &Invocation) -> Result<CommandResult>;
}

/// Runs commands on the host with an explicit, immutable environment.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    env: BTreeMap<OsString, OsString>,
}

impl SystemRunner {
    pub fn new(env: BTreeMap<OsString, OsString>) -> Self {
        Self { env }
    }

    /// Snapshot of the current process environment with `overrides` applied on top.
    ///
    /// Variables that are not valid Unicode are passed through untouched.
    pub fn from_process_env(overrides: &BTreeMap<String, String>) -> Self {
        let mut env: BTreeMap<OsString, OsString> = std::env::vars_os().collect();
        env.extend(
            overrides
                .iter()
                .map(|(k, v)| (OsString::from(k), OsString::from(v))),
        );
        Self::new(env)
    }

    pub fn env(&self) -> &BTreeMap<OsString, OsString> {
        &self.env
    }

    fn command(&self, invocation: &Invocation) -> Command {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args).env_clear().envs(&self.env);
        if let Some(dir) = &invocation.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandResult> {
        if invocation.dry_run {
            tracing::info!("[dry-run] would run: {}", invocation);
            return Ok(CommandResult::synthetic_success());
        }

        tracing::debug!("Running: {}{}", invocation, describe_cwd(invocation.cwd.as_deref()));
        let mut cmd = self.command(invocation);

        let spawned = if invocation.capture_output {
            cmd.stdin(Stdio::null()).output().map(|output| CommandResult {
                code: output.status.code(),
                success: output.status.success(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                dry_run: false,
            })
        } else {
            cmd.status().map(|status: ExitStatus| CommandResult {
                code: status.code(),
                success: status.success(),
                ..Default::default()
            })
        };

        let result = match spawned {
            Ok(result) => result,
            Err(source) if invocation.allow_failure => {
                tracing::debug!("Could not start {}: {}", invocation.program, source);
                return Ok(CommandResult {
                    code: None,
                    success: false,
                    stderr: source.to_string(),
                    ..Default::default()
                });
            }
            Err(source) => {
                return Err(PublishError::Spawn {
                    command: invocation.to_string(),
                    source,
                })
            }
        };

        if !result.success && !invocation.allow_failure {
            return Err(PublishError::CommandFailed {
                command: invocation.to_string(),
                status: result.describe_status(),
            });
        }

        Ok(result)
    }
}

fn describe_cwd(cwd: Option<&Path>) -> String {
    cwd.map(|dir| format!(" (in {})", dir.display()))
        .unwrap_or_default()
}

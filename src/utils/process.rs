//! Process execution utilities
//!
//! Every external tool the pipeline touches (tar, git, the packagers, custom
//! commands) goes through `ProcessRunner::run` with a `CommandSpec` describing
//! program, arguments, working directory and environment overrides.

use crate::error::{BuilderError, Result};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// How the child's stdout/stderr are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Collected and only surfaced on failure, unless the runner is in debug mode
    Captured,
    /// Always inherited from this process
    Streamed,
}

/// A fully described external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Added on top of the inherited environment
    pub env: Vec<(String, String)>,
    pub output: OutputMode,
}

impl CommandSpec {
    /// Captured command running in `cwd` with no extra environment
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            env: Vec::new(),
            output: OutputMode::Captured,
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

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn streamed(mut self) -> Self {
        self.output = OutputMode::Streamed;
        self
    }

    /// Human readable command line for logs and errors
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of a process execution
#[derive(Debug)]
pub struct ProcessResult {
    /// Exit status code
    pub exit_code: Option<i32>,
    /// Standard output, empty when the output was not captured
    pub stdout: String,
    /// Standard error, empty when the output was not captured
    pub stderr: String,
}

/// Utility for running external processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner {
    debug: bool,
}

impl ProcessRunner {
    /// Create a new process runner; in debug mode captured output is streamed instead
    #[must_use]
    pub const fn new(debug: bool) -> Self {
        Self { debug }
    }

    /// Run a command to completion, failing on spawn errors and non-zero exits
    #[instrument(skip(self, spec), fields(command = %spec.program))]
    pub async fn run(&self, spec: &CommandSpec) -> Result<ProcessResult> {
        let cmd_str = spec.command_line();
        let stream = self.debug || spec.output == OutputMode::Streamed;

        if self.debug {
            debug!("Running command in {}: {}", spec.cwd.display(), cmd_str);
            if !spec.env.is_empty() {
                debug!("Environment overrides: {:?}", spec.env);
            }
        } else {
            info!("+ {}", cmd_str);
        }

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .current_dir(&spec.cwd)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null());

        if stream {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            let status = cmd
                .status()
                .await
                .map_err(|e| BuilderError::spawn(cmd_str.clone(), e))?;

            if !status.success() {
                return Err(BuilderError::process(cmd_str, status.code(), String::new()));
            }

            debug!("Command completed successfully");
            return Ok(ProcessResult {
                exit_code: status.code(),
                stdout: String::new(),
                stderr: String::new(),
            });
        }

        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        let output = cmd
            .output()
            .await
            .map_err(|e| BuilderError::spawn(cmd_str.clone(), e))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let exit_code = output.status.code();

        if !output.status.success() {
            debug!("Command stderr: {}", stderr);
            return Err(BuilderError::process(cmd_str, exit_code, stderr));
        }

        debug!(
            "Command finished: exit_code={:?}, stdout_len={}, stderr_len={}",
            exit_code,
            stdout.len(),
            stderr.len()
        );

        Ok(ProcessResult {
            exit_code,
            stdout,
            stderr,
        })
    }
}

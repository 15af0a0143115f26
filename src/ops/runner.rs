#![allow(async_fn_in_trait)]

use std::path::PathBuf;
use std::time::Duration;

#[cfg(test)]
use mockall::automock;
use tokio::process::Command;
use tracing::debug;

use crate::command::CommandLine;
use crate::command::Stdio;
use crate::error::VcsError;
use crate::error::VcsResult;
use crate::scope::ScopedDir;

// -----------------------------------------------------------------------------
// Types

/// One external command to run, with the directory it runs in.
///
/// `cwd` is `None` for commands that name their target directory explicitly,
/// like `init` and `clone`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: CommandLine,
    pub cwd: Option<PathBuf>,
    pub stdio: Stdio,
}

/// Outcome of a finished external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Execution {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Runs external commands.
#[cfg_attr(test, automock)]
pub trait Runner {
    async fn run(&self, invocation: &Invocation) -> VcsResult<Execution>;
}

// -----------------------------------------------------------------------------
// Invocation / Execution impls

impl Invocation {
    pub fn new(command: CommandLine, cwd: Option<PathBuf>, stdio: Stdio) -> Self {
        Self {
            command,
            cwd,
            stdio,
        }
    }
}

impl Execution {
    /// Every stdout line in the order the tool printed them.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.lines()
    }

    /// Turn a non-zero exit into an error carrying the tool's stderr.
    pub fn check(self, command: &CommandLine) -> VcsResult<Self> {
        if self.success {
            return Ok(self);
        }
        Err(VcsError::ExternalToolFailure {
            command: command.to_string(),
            code: self.code,
            stderr: self.stderr.trim_end().to_string(),
        })
    }
}

// -----------------------------------------------------------------------------
// ProcessRunner

/// Real implementation that spawns child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
    scoped_cwd: bool,
}

impl ProcessRunner {
    pub fn new(timeout: Option<Duration>, scoped_cwd: bool) -> Self {
        Self {
            timeout,
            scoped_cwd,
        }
    }
}

impl Runner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> VcsResult<Execution> {
        let rendered = invocation.command.to_string();
        debug!(command = %rendered, cwd = ?invocation.cwd, "running");

        let mut cmd = Command::new(&invocation.command.program);
        cmd.args(&invocation.command.args).kill_on_drop(true);
        match invocation.stdio {
            Stdio::Capture => {
                cmd.stdin(std::process::Stdio::null())
                    .stdout(std::process::Stdio::piped())
                    .stderr(std::process::Stdio::piped());
            }
            Stdio::Inherit => {
                cmd.stdin(std::process::Stdio::inherit())
                    .stdout(std::process::Stdio::inherit())
                    .stderr(std::process::Stdio::inherit());
            }
        }

        let spawned = match &invocation.cwd {
            // The child inherits the directory at spawn time, so the scope
            // only has to cover the spawn itself.
            Some(dir) if self.scoped_cwd => {
                let _scope = ScopedDir::enter(dir)?;
                cmd.spawn()
            }
            Some(dir) => cmd.current_dir(dir).spawn(),
            None => cmd.spawn(),
        };
        let child = spawned.map_err(|source| VcsError::Spawn {
            command: rendered.clone(),
            source,
        })?;

        let wait = child.wait_with_output();
        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, wait)
                .await
                .map_err(|_| VcsError::Timeout {
                    command: rendered.clone(),
                    timeout,
                })??,
            None => wait.await?,
        };

        debug!(command = %rendered, status = %output.status, "finished");

        Ok(Execution {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

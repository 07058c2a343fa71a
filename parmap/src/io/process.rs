//! Spawning shell jobs and reaping them with `waitpid`.
//!
//! The [`JobRunner`] trait decouples the controller from real processes.
//! Tests use scripted runners that report predetermined terminations
//! without forking.

use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow};
use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;
use tracing::{debug, error, instrument};

use crate::core::types::Termination;

/// Shell used to interpret the command string.
pub const SHELL: &str = "/bin/sh";

/// A child harvested by [`JobRunner::reap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaped {
    pub pid: u32,
    /// Token the child was spawned with, when the runner still knows it.
    pub token: Option<String>,
    pub termination: Termination,
}

/// Abstraction over the process facility used by the controller.
pub trait JobRunner {
    /// Start one job with `token` bound in its environment. Returns its pid.
    fn spawn(&mut self, token: &[u8]) -> Result<u32>;

    /// Harvest at most one finished job.
    ///
    /// With `block = false` this never waits; with `block = true` it waits for
    /// any job to finish. `Ok(None)` means nothing was ready, or no children
    /// are left at all.
    fn reap(&mut self, block: bool) -> Result<Option<Reaped>>;
}

/// Runs `sh -c COMMAND` once per token, with the token bound to `variable`.
pub struct ShellRunner {
    shell: PathBuf,
    variable: OsString,
    command: String,
    tokens: HashMap<u32, String>,
}

impl ShellRunner {
    pub fn new(variable: impl Into<OsString>, command: impl Into<String>) -> Self {
        Self {
            shell: PathBuf::from(SHELL),
            variable: variable.into(),
            command: command.into(),
            tokens: HashMap::new(),
        }
    }
}

impl JobRunner for ShellRunner {
    #[instrument(skip_all, fields(token_len = token.len()))]
    fn spawn(&mut self, token: &[u8]) -> Result<u32> {
        if token.contains(&0) {
            return Err(anyhow!("bind {:?}: token contains a NUL byte", self.variable));
        }

        // The overlay is captured by this child only; later tokens rebind it
        // for later children.
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(&self.command)
            .env(&self.variable, OsStr::from_bytes(token))
            .stdin(Stdio::null());

        let child = match cmd.spawn() {
            Ok(c) => c,
            Err(e) => {
                error!(err = %e, "failed to spawn shell");
                return Err(e).with_context(|| format!("spawn {}", self.shell.display()));
            }
        };

        // The std handle is dropped without waiting; `reap` collects the pid.
        let pid = child.id();
        let token = String::from_utf8_lossy(token).into_owned();
        debug!(pid, token = %token, "spawned job");
        self.tokens.insert(pid, token);
        Ok(pid)
    }

    fn reap(&mut self, block: bool) -> Result<Option<Reaped>> {
        let flags = if block {
            None
        } else {
            Some(WaitPidFlag::WNOHANG)
        };

        loop {
            let (pid, termination) = match waitpid(Pid::from_raw(-1), flags) {
                Ok(WaitStatus::Exited(pid, code)) => (pid, Termination::Exited(code)),
                Ok(WaitStatus::Signaled(pid, signal, _)) => {
                    (pid, Termination::Signaled(signal as i32))
                }
                Ok(WaitStatus::StillAlive) => return Ok(None),
                Ok(_) => continue,
                Err(Errno::EINTR) => continue,
                Err(Errno::ECHILD) => return Ok(None),
                Err(e) => return Err(e).context("waitpid"),
            };

            let pid = pid.as_raw().unsigned_abs();
            let token = self.tokens.remove(&pid);
            debug!(pid, ?termination, "reaped job");
            return Ok(Some(Reaped {
                pid,
                token,
                termination,
            }));
        }
    }
}

/// Human-readable termination, naming signals (`SIGKILL`) where known.
pub fn describe(termination: Termination) -> String {
    match termination {
        Termination::Signaled(number) => match Signal::try_from(number) {
            Ok(signal) => format!("terminated by signal {}", signal.as_str()),
            Err(_) => termination.to_string(),
        },
        Termination::Exited(_) => termination.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_names_known_signals() {
        assert_eq!(
            describe(Termination::Signaled(9)),
            "terminated by signal SIGKILL"
        );
        assert_eq!(describe(Termination::Exited(255)), "exited with status 255");
    }

    #[test]
    fn describe_falls_back_to_signal_number() {
        assert_eq!(
            describe(Termination::Signaled(200)),
            "terminated by signal 200"
        );
    }

    #[test]
    fn spawn_rejects_nul_in_token() {
        let mut runner = ShellRunner::new("N", "true");
        let err = runner.spawn(b"a\0b").unwrap_err();
        assert!(err.to_string().contains("NUL"));
    }
}

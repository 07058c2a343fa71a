//! Test-only job runner that never forks.

use std::collections::VecDeque;

use anyhow::{Result, anyhow};

use crate::core::types::Termination;
use crate::io::process::{JobRunner, Reaped};

/// When a scripted job becomes reapable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finish {
    /// Visible to a non-blocking reap right after spawn.
    Immediately,
    /// Only a blocking reap collects it.
    WhenWaited,
}

/// Predetermined behavior for the n-th spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedJob {
    pub termination: Termination,
    pub finish: Finish,
    pub spawn_fails: bool,
}

impl ScriptedJob {
    pub fn new(termination: Termination, finish: Finish) -> Self {
        Self {
            termination,
            finish,
            spawn_fails: false,
        }
    }

    pub fn ok(finish: Finish) -> Self {
        Self::new(Termination::Exited(0), finish)
    }

    pub fn spawn_error() -> Self {
        Self {
            spawn_fails: true,
            ..Self::ok(Finish::Immediately)
        }
    }
}

#[derive(Debug, Clone)]
struct LiveJob {
    pid: u32,
    token: String,
    job: ScriptedJob,
}

/// Scripted [`JobRunner`]: hands out jobs in order, then succeeds immediately.
///
/// Records spawned tokens and the peak number of simultaneously live jobs.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    script: VecDeque<ScriptedJob>,
    live: Vec<LiveJob>,
    spawned: Vec<String>,
    peak_live: usize,
    next_pid: u32,
}

impl ScriptedRunner {
    pub fn new(script: Vec<ScriptedJob>) -> Self {
        Self {
            script: script.into(),
            next_pid: 100,
            ..Self::default()
        }
    }

    pub fn spawned_tokens(&self) -> Vec<&str> {
        self.spawned.iter().map(String::as_str).collect()
    }

    /// Tokens of jobs that were spawned but not yet reaped.
    pub fn live(&self) -> Vec<&str> {
        self.live.iter().map(|job| job.token.as_str()).collect()
    }

    pub fn peak_live(&self) -> usize {
        self.peak_live
    }
}

impl JobRunner for ScriptedRunner {
    fn spawn(&mut self, token: &[u8]) -> Result<u32> {
        let job = self
            .script
            .pop_front()
            .unwrap_or_else(|| ScriptedJob::ok(Finish::Immediately));
        if job.spawn_fails {
            return Err(anyhow!("scripted spawn failure"));
        }

        let token = String::from_utf8_lossy(token).into_owned();
        let pid = self.next_pid;
        self.next_pid += 1;
        self.spawned.push(token.clone());
        self.live.push(LiveJob { pid, token, job });
        self.peak_live = self.peak_live.max(self.live.len());
        Ok(pid)
    }

    fn reap(&mut self, block: bool) -> Result<Option<Reaped>> {
        let index = if block {
            (!self.live.is_empty()).then_some(0)
        } else {
            self.live
                .iter()
                .position(|live| live.job.finish == Finish::Immediately)
        };

        Ok(index.map(|index| {
            let live = self.live.remove(index);
            Reaped {
                pid: live.pid,
                token: Some(live.token),
                termination: live.job.termination,
            }
        }))
    }
}

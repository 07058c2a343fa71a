//! Bounded process pool: dispatch one job per token, reap, aggregate.
//!
//! The controller is single-threaded. Concurrency comes only from child
//! processes; the job count, token buffer and verdict are owned by [`Pool`]
//! and touched by nothing else.

use std::io::BufRead;

use anyhow::Result;
use tracing::{debug, info, instrument, warn};

use crate::core::classifier::classify;
use crate::core::tokenizer::{TokenBuffer, Tokenizer};
use crate::core::types::Verdict;
use crate::io::process::{JobRunner, Reaped, describe};

/// Counts and final verdict of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub spawned: usize,
    pub succeeded: usize,
    pub soft_failures: usize,
    pub fatal: usize,
    pub verdict: Verdict,
}

/// The process pool controller.
pub struct Pool<J> {
    runner: J,
    max_jobs: usize,
    running: usize,
    buffer: TokenBuffer,
    summary: RunSummary,
}

impl<J: JobRunner> Pool<J> {
    /// `max_jobs` is clamped to at least 1.
    pub fn new(runner: J, max_jobs: usize, token_capacity: usize) -> Self {
        Self {
            runner,
            max_jobs: max_jobs.max(1),
            running: 0,
            buffer: TokenBuffer::new(token_capacity),
            summary: RunSummary::default(),
        }
    }

    pub fn runner(&self) -> &J {
        &self.runner
    }

    /// Live, not-yet-reaped jobs.
    pub fn running(&self) -> usize {
        self.running
    }

    /// Dispatch every token from `tokenizer`, then wait for all children.
    ///
    /// A fatal child stops dispatch but still returns a summary. A parse or
    /// resource error is returned as `Err`, after the outstanding children
    /// have been drained.
    #[instrument(skip_all, fields(max_jobs = self.max_jobs, token_capacity = self.buffer.limit()))]
    pub fn run<R: BufRead>(&mut self, tokenizer: &mut Tokenizer<R>) -> Result<RunSummary> {
        let dispatched = self.dispatch(tokenizer);
        if dispatched.is_err() {
            self.summary.verdict.absorb(Verdict::Fatal);
        }
        let drained = self.drain();

        match (dispatched, drained) {
            (Err(err), Err(drain_err)) => {
                warn!(err = %format!("{drain_err:#}"), "drain failed after fatal error");
                Err(err)
            }
            (Err(err), Ok(())) | (Ok(()), Err(err)) => Err(err),
            (Ok(()), Ok(())) => {
                debug!(summary = ?self.summary, "run finished");
                Ok(self.summary.clone())
            }
        }
    }

    fn dispatch<R: BufRead>(&mut self, tokenizer: &mut Tokenizer<R>) -> Result<()> {
        while let Some(len) = tokenizer.next_token(&mut self.buffer)? {
            if len == 0 {
                continue;
            }

            self.runner.spawn(self.buffer.as_bytes())?;
            self.running += 1;
            self.summary.spawned += 1;

            self.reap_throttled()?;
            if self.summary.verdict.is_fatal() {
                info!(
                    spawned = self.summary.spawned,
                    "fatal child condition, no further input is read"
                );
                break;
            }
        }
        Ok(())
    }

    /// Reap opportunistically, blocking only when the pool is full.
    fn reap_throttled(&mut self) -> Result<()> {
        let block = self.running >= self.max_jobs;
        if let Some(reaped) = self.runner.reap(block)? {
            self.record(reaped);
        }
        Ok(())
    }

    /// Block until every outstanding child is harvested.
    fn drain(&mut self) -> Result<()> {
        while let Some(reaped) = self.runner.reap(true)? {
            self.record(reaped);
        }
        if self.running != 0 {
            debug!(
                running = self.running,
                "no children left to wait for, clearing job count"
            );
            self.running = 0;
        }
        Ok(())
    }

    fn record(&mut self, reaped: Reaped) {
        self.running = self.running.saturating_sub(1);
        let verdict = classify(reaped.termination);
        let token = reaped.token.as_deref().unwrap_or("?");
        match verdict {
            Verdict::Ok => self.summary.succeeded += 1,
            Verdict::SoftFailure => {
                self.summary.soft_failures += 1;
                debug!(pid = reaped.pid, token, "{}", describe(reaped.termination));
            }
            Verdict::Fatal => {
                self.summary.fatal += 1;
                warn!(pid = reaped.pid, token, "{}", describe(reaped.termination));
            }
        }
        self.summary.verdict.absorb(verdict);
    }
}

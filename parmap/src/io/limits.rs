//! System limits consulted once at startup.

use std::num::NonZeroUsize;
use std::thread;

use anyhow::{Context, Result};
use nix::unistd::{SysconfVar, sysconf};
use tracing::{debug, warn};

use crate::core::capacity::POSIX_ARG_MAX;

/// `sysconf(_SC_ARG_MAX)`, or the POSIX minimum when indeterminate.
pub fn arg_max() -> Result<i64> {
    match sysconf(SysconfVar::ARG_MAX).context("sysconf ARG_MAX")? {
        Some(limit) => {
            debug!(arg_max = limit, "read ARG_MAX");
            Ok(i64::from(limit))
        }
        None => {
            warn!(fallback = POSIX_ARG_MAX, "ARG_MAX is indeterminate");
            Ok(POSIX_ARG_MAX)
        }
    }
}

/// Byte length of each `KEY=VALUE` entry children will inherit.
pub fn environment_entry_lengths() -> Vec<usize> {
    std::env::vars_os()
        .map(|(key, value)| key.len() + 1 + value.len())
        .collect()
}

/// Number of processors available to this process, at least 1.
pub fn detected_parallelism() -> usize {
    match thread::available_parallelism() {
        Ok(count) => count.get(),
        Err(err) => {
            warn!(err = %err, "cannot detect processor count, using 1");
            NonZeroUsize::MIN.get()
        }
    }
}

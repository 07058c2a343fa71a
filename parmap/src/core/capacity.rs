//! Token buffer capacity derived from the exec argument-size limit.
//!
//! Follows the POSIX xargs rule: the combined command line and environment
//! handed to `exec` must stay below `ARG_MAX - 2048`.

use thiserror::Error;

/// Headroom POSIX asks xargs to leave below `ARG_MAX`.
pub const ARG_MAX_HEADROOM: i64 = 2048;
/// Bytes taken by the fixed `sh -c` argv, its pointers and terminators.
pub const EXEC_OVERHEAD: i64 = 8;
/// `_POSIX_ARG_MAX`, used when the system limit is indeterminate.
pub const POSIX_ARG_MAX: i64 = 4096;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CapacityError {
    #[error("environment too large for token buffer (arg_max {arg_max}, remaining {remaining})")]
    EnvironmentTooLarge { arg_max: i64, remaining: i64 },
}

/// Compute how many token bytes fit in one invocation.
///
/// `env_entry_lengths` yields the length of each `KEY=VALUE` entry of the
/// environment children will inherit. One byte of the remaining space is
/// reserved for the terminator of the token itself.
pub fn token_capacity<I>(
    arg_max: i64,
    variable_len: usize,
    command_len: usize,
    env_entry_lengths: I,
) -> Result<usize, CapacityError>
where
    I: IntoIterator<Item = usize>,
{
    let mut remaining = arg_max
        .saturating_sub(ARG_MAX_HEADROOM)
        .saturating_sub(to_i64(variable_len))
        .saturating_sub(to_i64(command_len))
        .saturating_sub(EXEC_OVERHEAD);
    for len in env_entry_lengths {
        remaining = remaining.saturating_sub(to_i64(len).saturating_add(1));
    }

    if remaining <= 0 {
        return Err(CapacityError::EnvironmentTooLarge { arg_max, remaining });
    }
    usize::try_from(remaining - 1)
        .map_err(|_| CapacityError::EnvironmentTooLarge { arg_max, remaining })
}

fn to_i64(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

//! Parallel per-token shell execution, the `xargs -P` way.
//!
//! Reads tokens from an input stream and runs a shell command once per token,
//! with the token bound to an environment variable, keeping at most `max_jobs`
//! children alive. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (tokenizer, outcome classification,
//!   capacity arithmetic). No process side effects, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (spawning, `waitpid`, system limits).
//!   Isolated behind [`io::process::JobRunner`] to enable scripting in tests.
//!
//! [`pool`] coordinates the two: it is the controller loop the CLI drives.

pub mod config;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod pool;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

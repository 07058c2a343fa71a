//! Side-effecting helpers: child processes and system limits.

pub mod limits;
pub mod process;

//! Stable exit codes for the parmap CLI.
//!
//! Every failure cause shares one code.

/// Every child exited 0 and no parse or resource error occurred.
pub const OK: i32 = 0;
/// Usage error, parse error, resource error, or any failed child.
pub const FAILURE: i32 = 1;

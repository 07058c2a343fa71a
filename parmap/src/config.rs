//! Run configuration assembled from the command line.

use anyhow::{Result, anyhow};

use crate::core::tokenizer::Delimiters;

/// Everything the controller needs for one run. Fixed for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Environment variable each child sees its token under.
    pub variable: String,

    /// Shell command string, passed verbatim to `sh -c`.
    pub command: String,

    pub delimiters: Delimiters,

    /// Ceiling on live, unreaped children.
    pub max_jobs: usize,
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.variable.is_empty() {
            return Err(anyhow!("variable name must not be empty"));
        }
        if self.variable.contains('=') {
            return Err(anyhow!(
                "invalid variable name '{}': must not contain '='",
                self.variable
            ));
        }
        if self.variable.contains('\0') {
            return Err(anyhow!("invalid variable name: must not contain NUL"));
        }
        if self.max_jobs == 0 {
            return Err(anyhow!("max_jobs must be > 0"));
        }
        Ok(())
    }
}

/// Resolve the `-m` value: anything below 1 (or absent) means `detected`.
pub fn resolve_max_jobs(requested: Option<i64>, detected: usize) -> usize {
    match requested {
        Some(n) if n >= 1 => usize::try_from(n).unwrap_or(usize::MAX),
        _ => detected.max(1),
    }
}

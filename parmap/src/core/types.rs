//! Shared deterministic types for child outcomes.
//!
//! These types are the contract between the reaper (which observes real
//! processes) and the status aggregation in the controller.

use std::fmt;

/// How a reaped child terminated, as reported by the wait facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The child called `exit` with this status.
    Exited(i32),
    /// The child was killed by this signal number.
    Signaled(i32),
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Exited(code) => write!(f, "exited with status {code}"),
            Termination::Signaled(signal) => write!(f, "terminated by signal {signal}"),
        }
    }
}

/// Run-wide verdict, ordered as a lattice: `Ok < SoftFailure < Fatal`.
///
/// Folding with [`Verdict::absorb`] never moves down the lattice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verdict {
    /// Every child so far exited 0.
    #[default]
    Ok,
    /// Some child exited nonzero (but not 255).
    SoftFailure,
    /// A child exited 255, was signaled, or the controller hit a fatal error.
    Fatal,
}

impl Verdict {
    /// Fold another outcome into this verdict.
    pub fn absorb(&mut self, other: Verdict) {
        *self = (*self).max(other);
    }

    pub fn is_fatal(self) -> bool {
        self == Verdict::Fatal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absorb_is_monotonic() {
        let mut verdict = Verdict::Ok;
        verdict.absorb(Verdict::SoftFailure);
        assert_eq!(verdict, Verdict::SoftFailure);
        verdict.absorb(Verdict::Ok);
        assert_eq!(verdict, Verdict::SoftFailure);
        verdict.absorb(Verdict::Fatal);
        assert_eq!(verdict, Verdict::Fatal);
        verdict.absorb(Verdict::SoftFailure);
        assert!(verdict.is_fatal());
    }

    #[test]
    fn termination_display() {
        assert_eq!(Termination::Exited(3).to_string(), "exited with status 3");
        assert_eq!(
            Termination::Signaled(9).to_string(),
            "terminated by signal 9"
        );
    }
}

//! Deterministic classification of reaped children.

use crate::core::types::{Termination, Verdict};

/// Exit status reserved by xargs convention for "stop everything".
pub const STOP_STATUS: i32 = 255;

/// Classify one child termination, in precedence order:
///
/// - signaled → `Fatal`
/// - exit status 255 → `Fatal`
/// - any other nonzero status → `SoftFailure`
/// - status 0 → `Ok`
pub fn classify(termination: Termination) -> Verdict {
    match termination {
        Termination::Signaled(_) => Verdict::Fatal,
        Termination::Exited(STOP_STATUS) => Verdict::Fatal,
        Termination::Exited(0) => Verdict::Ok,
        Termination::Exited(_) => Verdict::SoftFailure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_zero_is_ok() {
        assert_eq!(classify(Termination::Exited(0)), Verdict::Ok);
    }

    #[test]
    fn classify_nonzero_is_soft_failure() {
        assert_eq!(classify(Termination::Exited(1)), Verdict::SoftFailure);
        assert_eq!(classify(Termination::Exited(254)), Verdict::SoftFailure);
    }

    #[test]
    fn classify_stop_status_is_fatal() {
        assert_eq!(classify(Termination::Exited(255)), Verdict::Fatal);
    }

    #[test]
    fn classify_signal_is_fatal() {
        assert_eq!(classify(Termination::Signaled(9)), Verdict::Fatal);
        assert_eq!(classify(Termination::Signaled(15)), Verdict::Fatal);
    }
}

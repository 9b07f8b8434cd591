//! Fixed-point resolution of units that may depend on each other in any order.

use tracing::{debug, trace};

use crate::error::{BindError, Failure};

/// Outcome of a successful retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryReport {
    /// Units attempted in the first round.
    pub units: usize,
    /// Rounds run.
    pub rounds: usize,
}

/// Attempts units round after round until all succeed or a round makes no progress.
pub struct RetryResolver;

impl RetryResolver {
    /// Run `attempt` over `units` to a fixed point.
    ///
    /// A unit failing with [`Failure::Recoverable`] is retried in the next round. The loop
    /// stops when nothing fails or when the failing set did not shrink; in the latter case
    /// the first recoverable cause seen is returned. A [`Failure::Fatal`] aborts immediately.
    pub fn resolve<T, F>(units: Vec<T>, mut attempt: F) -> Result<RetryReport, BindError>
    where
        F: FnMut(&T) -> Result<(), Failure>,
    {
        let mut report = RetryReport {
            units: units.len(),
            rounds: 0,
        };
        let mut remaining = units;
        let mut first_cause: Option<BindError> = None;

        while !remaining.is_empty() {
            report.rounds += 1;
            let attempted = remaining.len();
            let mut failing = Vec::new();

            for unit in remaining {
                match attempt(&unit) {
                    Ok(()) => {}
                    Err(Failure::Recoverable(cause)) => {
                        trace!(round = report.rounds, cause = %cause, "unit not ready");
                        first_cause.get_or_insert(cause);
                        failing.push(unit);
                    }
                    Err(Failure::Fatal(cause)) => return Err(cause),
                }
            }

            debug!(
                round = report.rounds,
                attempted,
                failing = failing.len(),
                "retry round finished"
            );

            if !failing.is_empty() && failing.len() == attempted {
                return Err(first_cause.unwrap_or_else(|| BindError::Internal {
                    path: "retry".to_string(),
                    message: "units failed without a recorded cause".to_string(),
                }));
            }
            remaining = failing;
        }

        Ok(report)
    }
}

//! Consecutive-failure circuit breaker.
//!
//! Two states: closed (counting) and open. Open is terminal for the lifetime
//! of the owning executor; there is no half-open probe.

use std::sync::{Mutex, MutexGuard};

use super::types::BreakerSnapshot;

/// Outcome of recording one failure.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum FailureOutcome {
    /// Still closed; carries the updated counter.
    Counted(u32),
    /// This failure reached the threshold.
    Tripped(u32),
    /// Already open before this failure was recorded.
    AlreadyOpen(u32),
}

#[derive(Debug, Default)]
struct BreakerState {
    consecutive_failures: u32,
    open: bool,
}

pub(super) struct CircuitBreaker {
    threshold: u32,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub(super) fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            state: Mutex::new(BreakerState::default()),
        }
    }

    // Counter updates never leave the state half-written, so a poisoned lock
    // still holds consistent data.
    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// `Err(count)` when open.
    pub(super) fn check(&self) -> Result<(), u32> {
        let state = self.lock();
        if state.open {
            Err(state.consecutive_failures)
        } else {
            Ok(())
        }
    }

    /// Reset the counter. A success observed after the breaker opened (a
    /// command already in flight when it tripped) leaves it open.
    pub(super) fn record_success(&self) {
        let mut state = self.lock();
        if !state.open {
            state.consecutive_failures = 0;
        }
    }

    pub(super) fn record_failure(&self) -> FailureOutcome {
        let mut state = self.lock();
        if state.open {
            state.consecutive_failures = state.consecutive_failures.saturating_add(1);
            return FailureOutcome::AlreadyOpen(state.consecutive_failures);
        }
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        if state.consecutive_failures >= self.threshold {
            state.open = true;
            FailureOutcome::Tripped(state.consecutive_failures)
        } else {
            FailureOutcome::Counted(state.consecutive_failures)
        }
    }

    pub(super) fn snapshot(&self) -> BreakerSnapshot {
        let state = self.lock();
        BreakerSnapshot {
            consecutive_failures: state.consecutive_failures,
            open: state.open,
        }
    }
}

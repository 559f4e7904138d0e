//! Per-instance backlog latch
//!
//! Two states, `Clear` and `Signaled`. The owning instance's processing tick
//! moves it Clear -> Signaled at most once per hardware period; the realtime
//! pass moves every latch back to Clear at the end of each period.

use std::sync::atomic::{AtomicU8, Ordering};

const CLEAR: u8 = 0;
const SIGNALED: u8 = 1;

/// Observable latch state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatchState {
    Clear,
    Signaled,
}

/// Atomic {Clear, Signaled} flag
#[derive(Debug)]
pub struct BacklogLatch {
    state: AtomicU8,
}

impl BacklogLatch {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(CLEAR),
        }
    }

    /// Try the Clear -> Signaled transition
    ///
    /// Returns true only for the call that performed the transition, so the
    /// caller counts each instance at most once per period.
    #[inline]
    pub fn try_signal(&self) -> bool {
        self.state
            .compare_exchange(CLEAR, SIGNALED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Force back to Clear; returns the previous state
    #[inline]
    pub fn reset(&self) -> LatchState {
        match self.state.swap(CLEAR, Ordering::AcqRel) {
            SIGNALED => LatchState::Signaled,
            _ => LatchState::Clear,
        }
    }

    #[inline]
    pub fn state(&self) -> LatchState {
        match self.state.load(Ordering::Acquire) {
            SIGNALED => LatchState::Signaled,
            _ => LatchState::Clear,
        }
    }

    #[inline]
    pub fn is_signaled(&self) -> bool {
        self.state() == LatchState::Signaled
    }
}

impl Default for BacklogLatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_transitions_once() {
        let latch = BacklogLatch::new();
        assert_eq!(latch.state(), LatchState::Clear);
        assert!(latch.try_signal());
        assert!(!latch.try_signal());
        assert!(latch.is_signaled());
    }

    #[test]
    fn test_reset_reports_previous_state() {
        let latch = BacklogLatch::new();
        assert_eq!(latch.reset(), LatchState::Clear);
        latch.try_signal();
        assert_eq!(latch.reset(), LatchState::Signaled);
        assert_eq!(latch.state(), LatchState::Clear);
        assert!(latch.try_signal());
    }
}

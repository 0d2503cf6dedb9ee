use commit_registry_types::Timepoint;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::OrderingMode;
use crate::error::ClockError;

/// Ordering clock for accepted commitments.
///
/// Combines the host's coarse time hint with a tie-break counter to guarantee:
/// - Weak mode: every timepoint is >= all previous ones
/// - Strict mode: every timepoint is > all previous ones, even when many
///   acceptances share one hint
/// - Timepoints stay on the host's tick whenever the hint advances
///
/// The only way to advance the clock is [`OrderingClock::next`]. State changes
/// only when it succeeds.
#[derive(Clone, Debug)]
pub struct OrderingClock {
    mode: OrderingMode,
    /// Largest backward step of the hint that is absorbed instead of faulting
    max_regression: u64,
    last: Option<Timepoint>,
}

/// Persistable clock state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockState {
    pub last: Option<Timepoint>,
}

impl OrderingClock {
    /// Create a clock with the default regression tolerance of 1000 ticks.
    pub fn new(mode: OrderingMode) -> Self {
        Self::with_max_regression(mode, 1000)
    }

    pub fn with_max_regression(mode: OrderingMode, max_regression: u64) -> Self {
        Self {
            mode,
            max_regression,
            last: None,
        }
    }

    /// Resume a clock from persisted state.
    pub fn restore(mode: OrderingMode, max_regression: u64, state: ClockState) -> Self {
        Self {
            mode,
            max_regression,
            last: state.last,
        }
    }

    /// Assign the next timepoint for the given host time hint.
    pub fn next(&mut self, time_hint: u64) -> Result<Timepoint, ClockError> {
        let next = self.candidate(time_hint)?;
        debug!(hint = time_hint, timepoint = %next, "Assigned timepoint");
        self.last = Some(next);
        Ok(next)
    }

    fn candidate(&self, time_hint: u64) -> Result<Timepoint, ClockError> {
        let Some(last) = self.last else {
            return Ok(Timepoint::new(time_hint, 0));
        };

        if time_hint > last.tick {
            // Hint advanced, reset tie-break counter
            return Ok(Timepoint::new(time_hint, 0));
        }

        if time_hint < last.tick {
            let behind = last.tick - time_hint;
            if behind > self.max_regression {
                warn!(hint = time_hint, last = %last, behind, "Time hint regressed past tolerance");
                return Err(ClockError::Regression {
                    hint: time_hint,
                    last,
                    behind,
                    max_regression: self.max_regression,
                });
            }
        }

        // Hint has not advanced: stay on the last tick
        match self.mode {
            OrderingMode::Weak => Ok(last),
            OrderingMode::Strict => {
                let seq = last
                    .seq
                    .checked_add(1)
                    .ok_or(ClockError::TieBreakExhausted { tick: last.tick })?;
                Ok(Timepoint::new(last.tick, seq))
            }
        }
    }

    /// Most recently assigned timepoint.
    pub fn last(&self) -> Option<Timepoint> {
        self.last
    }

    pub fn mode(&self) -> OrderingMode {
        self.mode
    }

    pub fn max_regression(&self) -> u64 {
        self.max_regression
    }

    pub fn state(&self) -> ClockState {
        ClockState { last: self.last }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strictly_increasing_on_repeated_hint() {
        let mut clock = OrderingClock::new(OrderingMode::Strict);
        let mut prev = clock.next(100).unwrap();
        for _ in 0..1000 {
            let tp = clock.next(100).unwrap();
            assert!(tp > prev, "strict clock must increase: {} should be > {}", tp, prev);
            prev = tp;
        }
        assert_eq!(prev, Timepoint::new(100, 1000));
    }

    #[test]
    fn weak_mode_repeats_within_tick() {
        let mut clock = OrderingClock::new(OrderingMode::Weak);
        let a = clock.next(7).unwrap();
        let b = clock.next(7).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, Timepoint::new(7, 0));
    }

    #[test]
    fn advancing_hint_resets_counter() {
        let mut clock = OrderingClock::new(OrderingMode::Strict);
        clock.next(5).unwrap();
        clock.next(5).unwrap();
        assert_eq!(clock.next(6).unwrap(), Timepoint::new(6, 0));
    }

    #[test]
    fn small_regression_is_absorbed() {
        let mut strict = OrderingClock::with_max_regression(OrderingMode::Strict, 10);
        strict.next(50).unwrap();
        assert_eq!(strict.next(45).unwrap(), Timepoint::new(50, 1));

        let mut weak = OrderingClock::with_max_regression(OrderingMode::Weak, 10);
        weak.next(50).unwrap();
        assert_eq!(weak.next(40).unwrap(), Timepoint::new(50, 0));
    }

    #[test]
    fn large_regression_faults_without_state_change() {
        let mut clock = OrderingClock::with_max_regression(OrderingMode::Strict, 10);
        let first = clock.next(100).unwrap();

        let err = clock.next(89).unwrap_err();
        assert_eq!(
            err,
            ClockError::Regression {
                hint: 89,
                last: first,
                behind: 11,
                max_regression: 10,
            }
        );
        assert_eq!(clock.last(), Some(first));
        assert_eq!(clock.next(100).unwrap(), Timepoint::new(100, 1));
    }

    #[test]
    fn zero_tolerance_rejects_any_regression() {
        let mut clock = OrderingClock::with_max_regression(OrderingMode::Weak, 0);
        clock.next(10).unwrap();
        assert!(clock.next(9).is_err());
        assert!(clock.next(10).is_ok());
    }

    #[test]
    fn tie_break_exhaustion_faults() {
        let state = ClockState {
            last: Some(Timepoint::new(3, u32::MAX)),
        };
        let mut clock = OrderingClock::restore(OrderingMode::Strict, 0, state.clone());
        assert_eq!(
            clock.next(3).unwrap_err(),
            ClockError::TieBreakExhausted { tick: 3 }
        );
        assert_eq!(clock.state(), state);
        // A fresh tick recovers.
        assert_eq!(clock.next(4).unwrap(), Timepoint::new(4, 0));
    }

    #[test]
    fn restore_continues_sequence() {
        let mut clock = OrderingClock::new(OrderingMode::Strict);
        clock.next(9).unwrap();
        clock.next(9).unwrap();

        let mut resumed = OrderingClock::restore(OrderingMode::Strict, 1000, clock.state());
        assert_eq!(resumed.next(9).unwrap(), Timepoint::new(9, 2));
    }

    #[test]
    fn state_serialization_roundtrip() {
        let state = ClockState {
            last: Some(Timepoint::new(1234567890, 42)),
        };
        let json = serde_json::to_string(&state).unwrap();
        let restored: ClockState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, restored);
    }
}

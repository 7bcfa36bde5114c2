//! Retry state tracking for a single crawl target
//!
//! Each target carries its own retry state from discovery until it reaches a
//! terminal outcome, so attempts and delays never leak between targets.

use std::fmt;
use std::time::Duration;

/// Phase of a target's retry sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetryPhase {
    /// Ready to be (re-)issued
    Idle,

    /// A retry has been scheduled and the target is waiting out its delay
    Waiting,

    /// Retries are used up; the target is reported as a permanent failure
    Exhausted,
}

impl RetryPhase {
    /// Returns true if no further attempts will be made
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Exhausted)
    }

    /// Checks whether moving to `next` is a legal transition
    ///
    /// Legal transitions:
    /// - Idle -> Waiting (retry scheduled)
    /// - Waiting -> Idle (retry re-issued)
    /// - Idle -> Exhausted (retry budget spent)
    pub fn can_transition_to(&self, next: RetryPhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Waiting) | (Self::Waiting, Self::Idle) | (Self::Idle, Self::Exhausted)
        )
    }
}

impl fmt::Display for RetryPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Waiting => "waiting",
            Self::Exhausted => "exhausted",
        };
        f.write_str(name)
    }
}

/// Error returned when a retry transition is not allowed from the current phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid retry transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: RetryPhase,
    pub to: RetryPhase,
}

/// Attempts made so far and the delay before the next one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    attempt: u32,
    next_delay: Option<Duration>,
    phase: RetryPhase,
}

impl RetryState {
    /// Creates an idle state with no attempts
    pub fn new() -> Self {
        Self {
            attempt: 0,
            next_delay: None,
            phase: RetryPhase::Idle,
        }
    }

    /// Number of retries issued so far
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Delay of the most recently scheduled retry
    pub fn next_delay(&self) -> Option<Duration> {
        self.next_delay
    }

    pub fn phase(&self) -> RetryPhase {
        self.phase
    }

    /// Idle -> Waiting: records a scheduled retry and bumps the attempt count
    pub fn schedule(&mut self, delay: Duration) -> Result<(), InvalidTransition> {
        self.transition(RetryPhase::Waiting)?;
        self.attempt += 1;
        self.next_delay = Some(delay);
        Ok(())
    }

    /// Waiting -> Idle: the target is being issued again
    pub fn reissue(&mut self) -> Result<(), InvalidTransition> {
        self.transition(RetryPhase::Idle)
    }

    /// Idle -> Exhausted: no retries remain
    pub fn exhaust(&mut self) -> Result<(), InvalidTransition> {
        self.transition(RetryPhase::Exhausted)?;
        self.next_delay = None;
        Ok(())
    }

    fn transition(&mut self, to: RetryPhase) -> Result<(), InvalidTransition> {
        if !self.phase.can_transition_to(to) {
            return Err(InvalidTransition {
                from: self.phase,
                to,
            });
        }
        self.phase = to;
        Ok(())
    }
}

impl Default for RetryState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_idle() {
        let state = RetryState::new();
        assert_eq!(state.phase(), RetryPhase::Idle);
        assert_eq!(state.attempt(), 0);
        assert_eq!(state.next_delay(), None);
    }

    #[test]
    fn test_schedule_then_reissue() {
        let mut state = RetryState::new();
        state.schedule(Duration::from_secs(5)).unwrap();
        assert_eq!(state.phase(), RetryPhase::Waiting);
        assert_eq!(state.attempt(), 1);
        assert_eq!(state.next_delay(), Some(Duration::from_secs(5)));

        state.reissue().unwrap();
        assert_eq!(state.phase(), RetryPhase::Idle);
        assert_eq!(state.attempt(), 1);
    }

    #[test]
    fn test_cannot_schedule_while_waiting() {
        let mut state = RetryState::new();
        state.schedule(Duration::from_secs(1)).unwrap();
        let err = state.schedule(Duration::from_secs(2)).unwrap_err();
        assert_eq!(err.from, RetryPhase::Waiting);
        assert_eq!(err.to, RetryPhase::Waiting);
        assert_eq!(state.attempt(), 1);
    }

    #[test]
    fn test_exhausted_is_terminal() {
        let mut state = RetryState::new();
        state.exhaust().unwrap();
        assert!(state.phase().is_terminal());
        assert!(state.reissue().is_err());
        assert!(state.schedule(Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_cannot_exhaust_while_waiting() {
        let mut state = RetryState::new();
        state.schedule(Duration::from_secs(1)).unwrap();
        assert!(state.exhaust().is_err());
    }

    #[test]
    fn test_transition_table() {
        use RetryPhase::*;
        assert!(Idle.can_transition_to(Waiting));
        assert!(Waiting.can_transition_to(Idle));
        assert!(Idle.can_transition_to(Exhausted));
        assert!(!Waiting.can_transition_to(Exhausted));
        assert!(!Exhausted.can_transition_to(Idle));
        assert!(!Idle.can_transition_to(Idle));
    }
}

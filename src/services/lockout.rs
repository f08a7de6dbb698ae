//! Login lockout policy.
//!
//! Tracks consecutive failed attempts and enforces a timed lockout window.
//! Every transition takes an explicit `now` so the failure path can be
//! tested without hashing cost or a real clock. The attempt counter here is
//! the single source of truth for brute-force mitigation; credential
//! verification never looks at it.

use chrono::{DateTime, Duration, Utc};

use crate::config::LockoutConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockoutState {
    pub failed_attempts: u32,
    pub locked_until: Option<DateTime<Utc>>,
}

impl LockoutState {
    /// Record one failed login. Once the configured maximum is reached the
    /// lockout window starts and the counter resets with it.
    pub fn record_failure(&mut self, now: DateTime<Utc>, policy: &LockoutConfig) {
        self.failed_attempts += 1;

        if self.failed_attempts >= policy.max_attempts {
            self.locked_until = Some(now + Duration::minutes(policy.lockout_minutes));
            self.failed_attempts = 0;
        }
    }

    /// True iff a lockout window is set and has not yet passed.
    /// An expired window is cleared here, so the next attempt after expiry
    /// is evaluated with a clean slate.
    pub fn is_locked(&mut self, now: DateTime<Utc>) -> bool {
        match self.locked_until {
            Some(until) if now < until => true,
            Some(_) => {
                self.reset();
                false
            }
            None => false,
        }
    }

    /// Minutes until the window passes, rounded up. Zero when not locked.
    #[must_use]
    pub fn minutes_remaining(&self, now: DateTime<Utc>) -> i64 {
        self.locked_until
            .map(|until| {
                let secs = (until - now).num_seconds().max(0);
                (secs + 59) / 60
            })
            .unwrap_or(0)
    }

    pub fn reset(&mut self) {
        self.failed_attempts = 0;
        self.locked_until = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> LockoutConfig {
        LockoutConfig {
            max_attempts: 5,
            lockout_minutes: 15,
        }
    }

    #[test]
    fn test_four_failures_do_not_lock() {
        let now = Utc::now();
        let mut state = LockoutState::default();

        for _ in 0..4 {
            state.record_failure(now, &policy());
        }

        assert_eq!(state.failed_attempts, 4);
        assert!(!state.is_locked(now));
    }

    #[test]
    fn test_fifth_failure_locks_for_window() {
        let now = Utc::now();
        let mut state = LockoutState::default();

        for _ in 0..5 {
            state.record_failure(now, &policy());
        }

        assert_eq!(state.locked_until, Some(now + Duration::minutes(15)));
        assert!(state.is_locked(now));
        assert_eq!(state.minutes_remaining(now), 15);
    }

    #[test]
    fn test_lock_holds_until_expiry() {
        let now = Utc::now();
        let mut state = LockoutState::default();

        for _ in 0..5 {
            state.record_failure(now, &policy());
        }

        assert!(state.is_locked(now + Duration::minutes(14)));
        assert!(!state.is_locked(now + Duration::minutes(15)));
    }

    #[test]
    fn test_expiry_clears_counter_and_window() {
        let now = Utc::now();
        let mut state = LockoutState::default();

        for _ in 0..5 {
            state.record_failure(now, &policy());
        }

        let later = now + Duration::minutes(16);
        assert!(!state.is_locked(later));

        // First attempt after expiry is evaluated normally, not auto-locked.
        assert_eq!(state, LockoutState::default());
        state.record_failure(later, &policy());
        assert_eq!(state.failed_attempts, 1);
        assert!(state.locked_until.is_none());
    }

    #[test]
    fn test_reset_on_success() {
        let now = Utc::now();
        let mut state = LockoutState::default();

        for _ in 0..3 {
            state.record_failure(now, &policy());
        }

        state.reset();
        assert_eq!(state.failed_attempts, 0);
        assert!(state.locked_until.is_none());
    }

    #[test]
    fn test_minutes_remaining_rounds_up() {
        let now = Utc::now();
        let mut state = LockoutState::default();

        for _ in 0..5 {
            state.record_failure(now, &policy());
        }

        let almost_over = now + Duration::minutes(14) + Duration::seconds(30);
        assert_eq!(state.minutes_remaining(almost_over), 1);
    }
}

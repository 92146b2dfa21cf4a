use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};

use crate::store::models::Account;

/// Max failed login attempts before account lockout
pub const DEFAULT_MAX_FAILED_ATTEMPTS: u32 = 5;

/// Account lockout duration in minutes
pub const DEFAULT_LOCKOUT_DURATION_MINUTES: i64 = 5;

/// Lock state of an account at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unlocked,
    Locked { until: DateTime<Utc> },
}

/// Outcome of evaluating a record against the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub state: LockState,
    /// True when lazy expiry cleared the lock; the caller must persist the
    /// record before acting on the state.
    pub record_changed: bool,
}

/// Per-account lockout state machine: a counter of failed attempts that
/// escalates to a timed lock, with lazy expiry on read.
///
/// The policy mutates records in memory only. Callers persist through the
/// account repository immediately after every mutating call.
#[derive(Debug, Clone, Copy)]
pub struct LockoutPolicy {
    max_failed: u32,
    lock_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failed: DEFAULT_MAX_FAILED_ATTEMPTS,
            lock_duration: Duration::minutes(DEFAULT_LOCKOUT_DURATION_MINUTES),
        }
    }
}

impl LockoutPolicy {
    pub fn new(max_failed: u32, lock_duration: Duration) -> Self {
        Self {
            max_failed,
            lock_duration,
        }
    }

    /// Evaluate the lock state at `now`, applying the lazy transition back
    /// to Unlocked when the lock has expired.
    ///
    /// Every read path goes through this single transition function, so no
    /// caller can observe a stale "locked" state past its expiry.
    pub fn evaluate(&self, account: &mut Account, now: DateTime<Utc>) -> Evaluation {
        match account.locked_until {
            Some(until) if until > now => Evaluation {
                state: LockState::Locked { until },
                record_changed: false,
            },
            Some(_) => {
                debug!("Lock expired for {}, resetting attempts", account.email);
                account.locked_until = None;
                account.failed_attempts = 0;
                Evaluation {
                    state: LockState::Unlocked,
                    record_changed: true,
                }
            }
            None => Evaluation {
                state: LockState::Unlocked,
                record_changed: false,
            },
        }
    }

    /// Record a verified-wrong-secret attempt. Locks the account once the
    /// counter reaches the threshold.
    ///
    /// Only call this after `evaluate` found the account unlocked for the
    /// same attempt.
    pub fn record_failure(&self, account: &mut Account, now: DateTime<Utc>) {
        account.failed_attempts += 1;

        if account.failed_attempts >= self.max_failed {
            let until = now + self.lock_duration;
            account.locked_until = Some(until);
            warn!(
                "Account {} locked until {} after {} failed attempts",
                account.email, until, account.failed_attempts
            );
        }
    }

    /// Record a verified-correct attempt: reset the counter and clear any
    /// lock.
    pub fn record_success(&self, account: &mut Account) {
        account.failed_attempts = 0;
        account.locked_until = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn account() -> Account {
        Account::new("user@example.com".to_string(), "hash".to_string())
    }

    #[test_case(1, false; "one failure stays unlocked")]
    #[test_case(4, false; "below threshold stays unlocked")]
    #[test_case(5, true; "threshold locks")]
    #[test_case(6, true; "beyond threshold stays locked")]
    fn test_failures_lock_at_threshold(failures: u32, expect_locked: bool) {
        let policy = LockoutPolicy::default();
        let now = Utc::now();
        let mut account = account();

        for _ in 0..failures {
            policy.record_failure(&mut account, now);
        }

        assert_eq!(account.locked_until.is_some(), expect_locked);
        let state = policy.evaluate(&mut account, now).state;
        assert_eq!(matches!(state, LockState::Locked { .. }), expect_locked);
    }

    #[test]
    fn test_lock_expiry_is_now_plus_duration() {
        let policy = LockoutPolicy::new(5, Duration::minutes(5));
        let now = Utc::now();
        let mut account = account();

        for _ in 0..5 {
            policy.record_failure(&mut account, now);
        }

        assert_eq!(account.locked_until, Some(now + Duration::minutes(5)));
    }

    #[test]
    fn test_lock_holds_until_expiry() {
        let policy = LockoutPolicy::default();
        let now = Utc::now();
        let mut account = account();

        for _ in 0..5 {
            policy.record_failure(&mut account, now);
        }

        let just_before = now + Duration::minutes(5) - Duration::milliseconds(1);
        let eval = policy.evaluate(&mut account, just_before);
        assert!(matches!(eval.state, LockState::Locked { .. }));
        assert!(!eval.record_changed);
    }

    #[test]
    fn test_lazy_expiry_clears_lock_and_counter() {
        let policy = LockoutPolicy::default();
        let now = Utc::now();
        let mut account = account();

        for _ in 0..5 {
            policy.record_failure(&mut account, now);
        }

        let after = now + Duration::minutes(5) + Duration::milliseconds(1);
        let eval = policy.evaluate(&mut account, after);

        assert_eq!(eval.state, LockState::Unlocked);
        assert!(eval.record_changed);
        assert_eq!(account.failed_attempts, 0);
        assert!(account.locked_until.is_none());
    }

    #[test]
    fn test_lazy_expiry_is_idempotent() {
        let policy = LockoutPolicy::default();
        let now = Utc::now();
        let mut account = account();

        for _ in 0..5 {
            policy.record_failure(&mut account, now);
        }

        let after = now + Duration::minutes(6);
        for _ in 0..3 {
            let eval = policy.evaluate(&mut account, after);
            assert_eq!(eval.state, LockState::Unlocked);
            assert_eq!(account.failed_attempts, 0);
        }

        // Only the first evaluation mutated the record
        assert!(!policy.evaluate(&mut account, after).record_changed);
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let policy = LockoutPolicy::default();
        let now = Utc::now();
        let mut account = account();

        for _ in 0..5 {
            policy.record_failure(&mut account, now);
        }
        let expiry = account.locked_until.unwrap();

        // an expiry equal to "now" counts as expired
        let eval = policy.evaluate(&mut account, expiry);
        assert_eq!(eval.state, LockState::Unlocked);
    }

    #[test]
    fn test_success_resets_counter_and_clears_lock() {
        let policy = LockoutPolicy::default();
        let now = Utc::now();
        let mut account = account();

        for _ in 0..5 {
            policy.record_failure(&mut account, now);
        }

        policy.record_success(&mut account);

        assert_eq!(account.failed_attempts, 0);
        assert!(account.locked_until.is_none());
        assert_eq!(
            policy.evaluate(&mut account, now).state,
            LockState::Unlocked
        );
    }
}

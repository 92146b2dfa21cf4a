use std::sync::Mutex;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use regex::Regex;
use serde::Serialize;

use crate::policy::{LockState, LockoutPolicy};
use crate::security::password::PasswordHasher;
use crate::store::models::Account;
use crate::store::{AccountRepository, StoreError};

/// Email regex pattern for identifier validation
pub const EMAIL_REGEX: &str = r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$";

/// Minimum password length for registration
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Registration error types
#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("Account already exists")]
    AlreadyExists,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Password must be at least {0} characters")]
    PasswordTooShort(usize),

    #[error("Failed to hash password: {0}")]
    Hash(String),

    #[error("Store error: {0}")]
    Store(#[source] StoreError),
}

/// Why an authentication attempt was rejected.
///
/// `NotFound` and `BadCredentials` must be collapsed into one generic
/// denial at the presentation layer; only `Locked` is distinguishable,
/// carrying the remaining lock time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    NotFound,
    BadCredentials,
    Locked { remaining_ms: i64 },
}

/// The authenticated identity. Never carries the secret hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedUser {
    pub id: String,
    pub email: String,
}

/// Outcome of an authentication attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Accepted(AuthenticatedUser),
    Rejected(RejectReason),
}

/// Lock status for the countdown side channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockStatus {
    pub exists: bool,
    pub locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_ms: Option<i64>,
}

/// Authentication gate: orchestrates lookup, lock check, password
/// verification and attempt recording against an injected repository.
///
/// The repository sits behind a mutex held for the whole
/// check/verify/record/persist sequence of one attempt, so concurrent
/// attempts against the same account cannot under- or over-count near
/// the lockout threshold.
pub struct AuthGate<R: AccountRepository> {
    store: Mutex<R>,
    hasher: PasswordHasher,
    policy: LockoutPolicy,
    email_re: Regex,
    min_password_len: usize,
}

impl<R: AccountRepository> AuthGate<R> {
    pub fn new(store: R, hasher: PasswordHasher, policy: LockoutPolicy) -> Self {
        Self {
            store: Mutex::new(store),
            hasher,
            policy,
            email_re: Regex::new(EMAIL_REGEX).unwrap(),
            min_password_len: MIN_PASSWORD_LENGTH,
        }
    }

    pub fn with_min_password_length(mut self, len: usize) -> Self {
        self.min_password_len = len;
        self
    }

    /// Register a new account.
    pub fn register(&self, email: &str, secret: &str) -> Result<AuthenticatedUser, RegisterError> {
        let email = normalize_email(email);

        if !self.email_re.is_match(&email) {
            return Err(RegisterError::InvalidEmail);
        }
        if secret.len() < self.min_password_len {
            return Err(RegisterError::PasswordTooShort(self.min_password_len));
        }

        let hash = self
            .hasher
            .hash(secret)
            .map_err(|e| RegisterError::Hash(e.to_string()))?;

        let account = Account::new(email, hash);
        let user = AuthenticatedUser {
            id: account.id.clone(),
            email: account.email.clone(),
        };

        let mut store = self.store.lock().unwrap();
        match store.insert(account) {
            Ok(()) => {
                info!("Registered account {}", user.email);
                Ok(user)
            }
            Err(StoreError::AlreadyExists) => Err(RegisterError::AlreadyExists),
            Err(e) => Err(RegisterError::Store(e)),
        }
    }

    /// Authenticate one attempt at `now`.
    ///
    /// Rejections are ordinary values; only persistence failures are
    /// errors, since an unpersisted attempt would lose lockout state
    /// across restarts.
    pub fn authenticate(
        &self,
        email: &str,
        secret: &str,
        now: DateTime<Utc>,
    ) -> Result<Decision, StoreError> {
        let email = normalize_email(email);
        let mut store = self.store.lock().unwrap();

        let mut account = match store.find(&email) {
            Some(account) => account,
            None => {
                debug!("Authentication attempt for unknown account {}", email);
                return Ok(Decision::Rejected(RejectReason::NotFound));
            }
        };

        let eval = self.policy.evaluate(&mut account, now);
        if eval.record_changed {
            store.update(&account)?;
        }
        if let LockState::Locked { until } = eval.state {
            debug!("Rejecting attempt for locked account {}", email);
            return Ok(Decision::Rejected(RejectReason::Locked {
                remaining_ms: remaining_ms(until, now),
            }));
        }

        if !self.hasher.verify(secret, &account.password_hash) {
            self.policy.record_failure(&mut account, now);
            store.update(&account)?;
            warn!(
                "Failed authentication for {} (attempt {})",
                email, account.failed_attempts
            );
            return Ok(Decision::Rejected(RejectReason::BadCredentials));
        }

        self.policy.record_success(&mut account);
        store.update(&account)?;
        info!("Authenticated {}", email);

        Ok(Decision::Accepted(AuthenticatedUser {
            id: account.id,
            email: account.email,
        }))
    }

    /// Lock status side channel, applying the same lazy expiry as
    /// `authenticate` so it never reports a stale lock.
    pub fn lock_status(&self, email: &str, now: DateTime<Utc>) -> Result<LockStatus, StoreError> {
        let email = normalize_email(email);
        let mut store = self.store.lock().unwrap();

        let mut account = match store.find(&email) {
            Some(account) => account,
            None => {
                return Ok(LockStatus {
                    exists: false,
                    locked: false,
                    remaining_ms: None,
                })
            }
        };

        let eval = self.policy.evaluate(&mut account, now);
        if eval.record_changed {
            store.update(&account)?;
        }

        Ok(match eval.state {
            LockState::Locked { until } => LockStatus {
                exists: true,
                locked: true,
                remaining_ms: Some(remaining_ms(until, now)),
            },
            LockState::Unlocked => LockStatus {
                exists: true,
                locked: false,
                remaining_ms: None,
            },
        })
    }

    /// Administrative unlock: clear any lock and reset the counter.
    /// Returns false when the account does not exist.
    pub fn unlock(&self, email: &str) -> Result<bool, StoreError> {
        let email = normalize_email(email);
        let mut store = self.store.lock().unwrap();

        let mut account = match store.find(&email) {
            Some(account) => account,
            None => return Ok(false),
        };

        self.policy.record_success(&mut account);
        store.update(&account)?;
        info!("Account {} unlocked", email);
        Ok(true)
    }
}

/// Canonical form of an account identifier.
fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn remaining_ms(until: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (until - now).num_milliseconds().max(0)
}

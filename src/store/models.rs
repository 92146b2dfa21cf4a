use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account record
///
/// Persisted in camelCase with `lockedUntil` as a nullable epoch-millisecond
/// timestamp.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub failed_attempts: u32,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub locked_until: Option<DateTime<Utc>>,
}

impl Account {
    pub fn new(email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            failed_attempts: 0,
            locked_until: None,
        }
    }
}

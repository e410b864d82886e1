//! User records and their public summary.
//!
//! - [`UserRecord`]: stored credential plus profile, never serialized
//! - [`UserSummary`]: what the API returns about a user

use chrono::{DateTime, Utc};
use secflow_core::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user, including the password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl UserRecord {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        full_name: impl Into<String>,
        password_hash: String,
        role: Role,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            full_name: full_name.into(),
            password_hash,
            role,
            created_at: Utc::now(),
            last_login: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<&UserRecord> for UserSummary {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username.clone(),
            email: record.email.clone(),
            full_name: record.full_name.clone(),
            role: record.role,
            created_at: record.created_at,
            last_login: record.last_login,
        }
    }
}

impl From<UserRecord> for UserSummary {
    fn from(record: UserRecord) -> Self {
        Self::from(&record)
    }
}

//! In-process user store.
//!
//! Lookups go straight to the maps. Registration takes a single mutex so the
//! uniqueness checks and the insert happen as one step.

use chrono::Utc;
use dashmap::DashMap;
use secflow_core::{AppError, errors::codes};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::model::{UserRecord, UserSummary};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DuplicateUser {
    #[error("Username is already in use: {0}")]
    Username(String),
    #[error("Email is already in use: {0}")]
    Email(String),
}

impl From<DuplicateUser> for AppError {
    fn from(err: DuplicateUser) -> Self {
        let code = match err {
            DuplicateUser::Username(_) => codes::USERNAME_ALREADY_EXISTS,
            DuplicateUser::Email(_) => codes::EMAIL_ALREADY_EXISTS,
        };
        AppError::validation(err).with_code(code)
    }
}

#[derive(Debug, Default)]
pub struct UserRepository {
    users: DashMap<Uuid, UserRecord>,
    usernames: DashMap<String, Uuid>,
    registration: Mutex<()>,
}

impl UserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Usernames match exactly.
    pub fn find_by_username(&self, username: &str) -> Option<UserRecord> {
        let id = *self.usernames.get(username)?;
        self.users.get(&id).map(|record| record.clone())
    }

    /// `id` is the string form used as token subject. Anything that is not a
    /// UUID is simply not found.
    pub fn find_by_id(&self, id: &str) -> Option<UserRecord> {
        let id = Uuid::parse_str(id).ok()?;
        self.users.get(&id).map(|record| record.clone())
    }

    /// Emails compare case-insensitively.
    pub fn email_taken(&self, email: &str) -> bool {
        self.users
            .iter()
            .any(|record| record.email.eq_ignore_ascii_case(email))
    }

    /// Inserts `record` unless its username or email is already registered.
    pub async fn insert_unique(&self, record: UserRecord) -> Result<UserSummary, DuplicateUser> {
        let _guard = self.registration.lock().await;

        if self.usernames.contains_key(&record.username) {
            return Err(DuplicateUser::Username(record.username));
        }
        if self.email_taken(&record.email) {
            return Err(DuplicateUser::Email(record.email));
        }

        let summary = UserSummary::from(&record);
        self.usernames.insert(record.username.clone(), record.id);
        self.users.insert(record.id, record);

        Ok(summary)
    }

    /// Stamps `last_login` with the current time and returns the updated
    /// summary.
    pub fn record_login(&self, id: Uuid) -> Option<UserSummary> {
        self.users.get_mut(&id).map(|mut record| {
            record.last_login = Some(Utc::now());
            UserSummary::from(&*record)
        })
    }
}

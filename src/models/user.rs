use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::from_millis;

/// User record stored in redb
/// Uses Unix timestamps for compact storage with bincode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Normalized (trimmed, lowercase) email address
    pub email: String,
    /// bcrypt hash of the password
    pub password_hash: String,
    /// When the user was created (Unix milliseconds)
    pub created_at: i64,
}

/// User model for API responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn from_record(id: String, record: UserRecord) -> Self {
        Self {
            id,
            email: record.email,
            created_at: from_millis(record.created_at),
        }
    }

    /// Normalize an email address for lookups
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    /// Minimal shape check: one '@' with a non-empty local part and a dotted domain
    pub fn validate_email(email: &str) -> bool {
        let mut parts = email.split('@');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(local), Some(domain), None) => {
                !local.is_empty()
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && !email.chars().any(char::is_whitespace)
            }
            _ => false,
        }
    }
}

/// Session record stored in redb, keyed by the hash of the session id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: String,
    /// Unix seconds
    pub expires_at: i64,
}

impl SessionRecord {
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

/// Profile record stored in redb, keyed by user id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub username: String,
    pub avatar_url: String,
    pub updated_at: i64,
}

/// User profile information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Same as the user id
    pub id: String,
    pub username: String,
    pub avatar_url: String,
    pub updated_at: DateTime<Utc>,
}

impl ProfileRecord {
    pub fn into_profile(self, id: String) -> Profile {
        Profile {
            id,
            username: self.username,
            avatar_url: self.avatar_url,
            updated_at: from_millis(self.updated_at),
        }
    }
}

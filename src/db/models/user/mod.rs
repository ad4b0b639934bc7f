use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod manager;

/// Trait for managing users.
#[async_trait]
pub trait Manager {
    /// Find a user by their API token.
    async fn find_by_token(&self, token: &str) -> anyhow::Result<Option<User>>;
    /// Find a user by id.
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>>;
    /// Create a new user.
    async fn create(&self, user: &NewUser) -> anyhow::Result<User>;
}

/// Role of an account. Determines visibility and permitted actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Deserialize, Serialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Platform administrator.
    Admin,
    /// Course author.
    Teacher,
    /// Learner.
    Student,
}

impl Role {
    /// Convert a string to a `Role` enum.
    /// # Errors
    /// Returns an error if the string is not a valid role.
    pub fn from_string(role: &str) -> anyhow::Result<Self> {
        match role {
            "admin" => Ok(Self::Admin),
            "teacher" => Ok(Self::Teacher),
            "student" => Ok(Self::Student),
            _ => Err(anyhow::anyhow!(
                "Invalid role '{role}', expected one of: admin, teacher, student"
            )),
        }
    }

    /// Whether the role may be part of a course's enrollment set.
    #[must_use]
    pub const fn is_student(self) -> bool {
        matches!(self, Self::Student)
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
/// Model for an authenticated account.
pub struct User {
    /// Unique user identifier.
    pub id: i64,
    /// Unique login name.
    pub username: String,
    /// Role of the user.
    pub role: Role,
    /// API token presented in the `Authorization` header.
    #[serde(skip_serializing)]
    pub token: String,
    /// Voice used for conversions when a request doesn't name one.
    pub preferred_voice_type: String,
    /// Speech rate used for conversions when a request doesn't name one.
    pub preferred_speech_rate: f64,
    /// Language used for conversions when a request doesn't name one.
    pub preferred_language: String,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
}

/// Fields required to register a user. Preferences take the table defaults.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Unique login name.
    pub username: String,
    /// Role of the user.
    pub role: Role,
    /// API token.
    pub token: String,
}

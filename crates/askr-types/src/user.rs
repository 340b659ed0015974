use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated user.
///
/// Users are created by the identity side (the `user create` command) and are
/// read-only to the chat flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a new, not yet persisted user.
    pub fn new(email: impl Into<String>, is_admin: bool) -> Self {
        Self {
            id: Uuid::now_v7(),
            email: email.into(),
            is_admin,
            created_at: Utc::now(),
        }
    }
}

/// Metadata for an issued API key. The plaintext key is never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

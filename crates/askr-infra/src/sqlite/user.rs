//! SQLite user and API key store.
//!
//! Only SHA-256 hashes of API keys are stored; the plaintext key is returned
//! once, when it is issued.

use askr_types::error::RepositoryError;
use askr_types::user::{ApiKey, User};
use chrono::Utc;
use sha2::{Digest, Sha256};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// Prefix of every issued API key.
pub const API_KEY_PREFIX: &str = "askr_";

/// SQLite-backed users and API keys.
#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

struct UserRow {
    id: String,
    email: String,
    is_admin: bool,
    created_at: String,
}

impl UserRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            is_admin: row.try_get("is_admin")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_user(self) -> Result<User, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid user id: {e}")))?;
        Ok(User {
            id,
            email: self.email,
            is_admin: self.is_admin,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

/// Compute SHA-256 hash of an API key (lowercase hex).
pub fn hash_api_key(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("{:x}", digest)
}

/// Generate a new random API key.
pub fn generate_api_key() -> String {
    use aes_gcm::aead::{OsRng, rand_core::RngCore};
    let mut key_bytes = [0u8; 32];
    OsRng.fill_bytes(&mut key_bytes);
    format!(
        "{API_KEY_PREFIX}{}",
        key_bytes.iter().map(|b| format!("{b:02x}")).collect::<String>()
    )
}

impl SqliteUserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Insert a new user. Fails with `Conflict` if the email is taken.
    pub async fn create_user(&self, user: &User) -> Result<User, RepositoryError> {
        sqlx::query("INSERT INTO users (id, email, is_admin, created_at) VALUES (?, ?, ?, ?)")
            .bind(user.id.to_string())
            .bind(&user.email)
            .bind(user.is_admin)
            .bind(format_datetime(&user.created_at))
            .execute(&self.pool.writer)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e {
                    if db_err.message().contains("UNIQUE") {
                        return RepositoryError::Conflict(format!(
                            "user '{}' already exists",
                            user.email
                        ));
                    }
                }
                RepositoryError::Query(e.to_string())
            })?;
        Ok(user.clone())
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.map(|row| {
            UserRow::from_row(&row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?
                .into_user()
        })
        .transpose()
    }

    /// Issue a new API key for `user_id`. Returns the plaintext key.
    pub async fn issue_api_key(&self, user_id: &Uuid, name: &str) -> Result<String, RepositoryError> {
        let plaintext_key = generate_api_key();
        sqlx::query(
            "INSERT INTO api_keys (id, user_id, key_hash, name, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::now_v7().to_string())
        .bind(user_id.to_string())
        .bind(hash_api_key(&plaintext_key))
        .bind(name)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(plaintext_key)
    }

    /// Resolve a key hash to its owner, recording the use.
    pub async fn find_user_by_key_hash(&self, key_hash: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(
            r#"SELECT u.*, k.id AS key_id FROM api_keys k
               JOIN users u ON u.id = k.user_id
               WHERE k.key_hash = ?"#,
        )
        .bind(key_hash)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let key_id: String = row
            .try_get("key_id")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        let user = UserRow::from_row(&row)
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .into_user()?;

        // Best effort; a failed touch does not fail authentication.
        if let Err(e) = sqlx::query("UPDATE api_keys SET last_used_at = ? WHERE id = ?")
            .bind(format_datetime(&Utc::now()))
            .bind(&key_id)
            .execute(&self.pool.writer)
            .await
        {
            tracing::debug!(error = %e, "failed to record api key use");
        }

        Ok(Some(user))
    }

    /// API keys issued to `user_id`, oldest first.
    pub async fn list_api_keys(&self, user_id: &Uuid) -> Result<Vec<ApiKey>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM api_keys WHERE user_id = ? ORDER BY created_at ASC")
            .bind(user_id.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut keys = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: String = row.try_get("id").map_err(|e| RepositoryError::Query(e.to_string()))?;
            let name: String = row.try_get("name").map_err(|e| RepositoryError::Query(e.to_string()))?;
            let created_at: String = row
                .try_get("created_at")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let last_used_at: Option<String> = row
                .try_get("last_used_at")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            keys.push(ApiKey {
                id: Uuid::parse_str(&id).map_err(|e| RepositoryError::Query(format!("invalid key id: {e}")))?,
                user_id: *user_id,
                name,
                created_at: parse_datetime(&created_at)?,
                last_used_at: last_used_at
                    .as_deref()
                    .map(parse_datetime)
                    .transpose()?,
            });
        }
        Ok(keys)
    }
}

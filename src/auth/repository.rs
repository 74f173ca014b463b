// Storage for users and revoked tokens

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::auth::{error::AuthError, models::User, password::PasswordService};
use crate::config::SeedUser;

/// Read access to the user table
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Exact, case-sensitive username match
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AuthError>;

    async fn create_user(&self, name: &str, username: &str, password_hash: &str) -> Result<User, AuthError>;
}

/// Token ids invalidated before their natural expiry
#[async_trait]
pub trait TokenDenylist: Send + Sync {
    async fn revoke(&self, token_id: &str, expires_at: DateTime<Utc>) -> Result<(), AuthError>;

    async fn is_revoked(&self, token_id: &str) -> Result<bool, AuthError>;

    /// Drop entries whose token would be expired anyway; returns how many were removed
    async fn purge_expired(&self) -> Result<u64, AuthError>;
}

/// Hash a token id using SHA-256
fn hash_token_id(token_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token_id.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// User repository for database operations
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, username, password_hash, created_at, updated_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, username, password_hash, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_user(&self, name: &str, username: &str, password_hash: &str) -> Result<User, AuthError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, username, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, username, password_hash, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}

/// Revoked token repository backed by the `revoked_tokens` table
pub struct PgTokenDenylist {
    pool: PgPool,
}

impl PgTokenDenylist {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenDenylist for PgTokenDenylist {
    async fn revoke(&self, token_id: &str, expires_at: DateTime<Utc>) -> Result<(), AuthError> {
        sqlx::query(
            "INSERT INTO revoked_tokens (token_hash, expires_at) VALUES ($1, $2) ON CONFLICT (token_hash) DO NOTHING",
        )
        .bind(hash_token_id(token_id))
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn is_revoked(&self, token_id: &str) -> Result<bool, AuthError> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE token_hash = $1)")
            .bind(hash_token_id(token_id))
            .fetch_one(&self.pool)
            .await?;

        Ok(exists.0)
    }

    async fn purge_expired(&self) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// Process-local user store, used by tests and local tooling
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a user, returning whether it existed
    pub fn remove(&self, id: i64) -> bool {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        let before = users.len();
        users.retain(|u| u.id != id);
        users.len() != before
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AuthError> {
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, name: &str, username: &str, password_hash: &str) -> Result<User, AuthError> {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        if users.iter().any(|u| u.username == username) {
            return Err(AuthError::DatabaseError(format!("username '{}' already exists", username)));
        }

        let now = Utc::now();
        let user = User {
            id: users.iter().map(|u| u.id).max().unwrap_or(0) + 1,
            name: name.to_string(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }
}

/// Process-local revoked token list
#[derive(Default)]
pub struct InMemoryTokenDenylist {
    entries: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryTokenDenylist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TokenDenylist for InMemoryTokenDenylist {
    async fn revoke(&self, token_id: &str, expires_at: DateTime<Utc>) -> Result<(), AuthError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.entry(hash_token_id(token_id)).or_insert(expires_at);
        Ok(())
    }

    async fn is_revoked(&self, token_id: &str) -> Result<bool, AuthError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.contains_key(&hash_token_id(token_id)))
    }

    async fn purge_expired(&self) -> Result<u64, AuthError> {
        let now = Utc::now();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, expires_at| *expires_at >= now);
        Ok((before - entries.len()) as u64)
    }
}

/// Create the configured seed user unless the username is already taken
///
/// Returns `true` when a user was created.
pub async fn ensure_user(store: &dyn UserStore, seed: &SeedUser) -> Result<bool, AuthError> {
    if store.find_by_username(&seed.username).await?.is_some() {
        debug!("Seed user '{}' already exists", seed.username);
        return Ok(false);
    }

    let hash = PasswordService::hash_password(&seed.password)?;
    let user = store.create_user(&seed.name, &seed.username, &hash).await?;
    info!(user_id = user.id, "Created seed user '{}'", user.username);
    Ok(true)
}

/// Periodically drop revoked token entries that have expired
pub fn spawn_purge_task(denylist: Arc<dyn TokenDenylist>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match denylist.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => info!("Purged {} expired revoked tokens", removed),
                Err(e) => error!("Failed to purge revoked tokens: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn test_hash_token_id_is_stable_hex() {
        let hash = hash_token_id("abc");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_token_id("abc"));
        assert_ne!(hash, hash_token_id("abd"));
    }

    #[tokio::test]
    async fn test_in_memory_user_store() {
        let store = InMemoryUserStore::new();
        let alice = store.create_user("Alice", "alice", "hash-a").await.unwrap();
        let bob = store.create_user("Bob", "bob", "hash-b").await.unwrap();
        assert_ne!(alice.id, bob.id);

        assert_eq!(store.find_by_username("alice").await.unwrap().unwrap().id, alice.id);
        assert!(store.find_by_username("Alice").await.unwrap().is_none());
        assert_eq!(store.find_by_id(bob.id).await.unwrap().unwrap().username, "bob");

        assert!(store.create_user("Other", "alice", "hash").await.is_err());

        assert!(store.remove(alice.id));
        assert!(store.find_by_id(alice.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_in_memory_denylist_revoke_and_purge() {
        let denylist = InMemoryTokenDenylist::new();
        let now = Utc::now();

        denylist.revoke("live", now + ChronoDuration::hours(1)).await.unwrap();
        denylist.revoke("stale", now - ChronoDuration::hours(1)).await.unwrap();
        denylist.revoke("live", now + ChronoDuration::hours(2)).await.unwrap();

        assert!(denylist.is_revoked("live").await.unwrap());
        assert!(denylist.is_revoked("stale").await.unwrap());
        assert!(!denylist.is_revoked("unknown").await.unwrap());
        assert_eq!(denylist.len(), 2);

        assert_eq!(denylist.purge_expired().await.unwrap(), 1);
        assert!(!denylist.is_revoked("stale").await.unwrap());
        assert!(denylist.is_revoked("live").await.unwrap());
    }

    #[tokio::test]
    async fn test_ensure_user_is_idempotent() {
        let store = InMemoryUserStore::new();
        let seed = SeedUser {
            name: "Admin".to_string(),
            username: "admin".to_string(),
            password: "password123".to_string(),
        };

        assert!(ensure_user(&store, &seed).await.unwrap());
        assert!(!ensure_user(&store, &seed).await.unwrap());

        let user = store.find_by_username("admin").await.unwrap().unwrap();
        assert_eq!(user.name, "Admin");
        assert!(PasswordService::verify_password("password123", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_purge_task_removes_expired_entries() {
        let denylist = Arc::new(InMemoryTokenDenylist::new());
        denylist.revoke("stale", Utc::now() - ChronoDuration::hours(1)).await.unwrap();

        let handle = spawn_purge_task(denylist.clone(), std::time::Duration::from_millis(10));
        for _ in 0..50 {
            if denylist.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        handle.abort();

        assert!(denylist.is_empty());
    }
}

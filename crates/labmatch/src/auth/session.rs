//! Server-side refresh session tracking.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::{debug, instrument};

/// Tracks the single valid refresh token per account as a one-way hash in
/// the user row (`refresh_token_hash`, NULL when no session is active).
///
/// The raw refresh token is never stored. Concurrent rotations on the same
/// user race at single-row UPDATE granularity: last write wins, which is the
/// accepted behavior for a double-refresh.
#[derive(Debug, Clone)]
pub struct RefreshSessionStore {
    pool: SqlitePool,
}

impl RefreshSessionStore {
    /// Create a store over the shared connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// One-way hash of a refresh token, as stored and compared.
    fn digest(token: &str) -> String {
        hex::encode(Sha256::digest(token.as_bytes()))
    }

    /// Overwrite the stored hash with the hash of `new_refresh_token`,
    /// unconditionally replacing any prior value.
    #[instrument(skip(self, new_refresh_token))]
    pub async fn rotate(&self, user_id: i64, new_refresh_token: &str) -> Result<()> {
        let hash = Self::digest(new_refresh_token);

        sqlx::query("UPDATE users SET refresh_token_hash = ? WHERE id = ?")
            .bind(&hash)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to rotate refresh token hash")?;

        debug!("rotated refresh session for user {}", user_id);
        Ok(())
    }

    /// Check a presented refresh token against the stored hash.
    ///
    /// Fails closed: no row or no stored hash yields `false`.
    #[instrument(skip(self, presented_token))]
    pub async fn verify(&self, user_id: i64, presented_token: &str) -> Result<bool> {
        let stored: Option<Option<String>> =
            sqlx::query_scalar("SELECT refresh_token_hash FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to fetch refresh token hash")?;

        Ok(match stored.flatten() {
            Some(hash) => hash == Self::digest(presented_token),
            None => false,
        })
    }

    /// Clear the stored hash, ending the session unconditionally.
    #[instrument(skip(self))]
    pub async fn clear(&self, user_id: i64) -> Result<()> {
        sqlx::query("UPDATE users SET refresh_token_hash = NULL WHERE id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to clear refresh token hash")?;

        debug!("cleared refresh session for user {}", user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::db::Database;
    use crate::user::{CreateUserRequest, UserRepository};

    async fn store_with_user() -> (RefreshSessionStore, i64) {
        let db = Database::in_memory().await.unwrap();
        let users = UserRepository::new(db.pool().clone());
        let user = users
            .create(CreateUserRequest {
                email: "alice@x.edu".to_string(),
                password_hash: "irrelevant".to_string(),
                name: "Alice".to_string(),
                role: Role::Student,
            })
            .await
            .unwrap();

        (RefreshSessionStore::new(db.pool().clone()), user.id)
    }

    #[tokio::test]
    async fn test_verify_fails_closed_without_session() {
        let (store, user_id) = store_with_user().await;
        assert!(!store.verify(user_id, "anything").await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_fails_closed_for_unknown_user() {
        let (store, _) = store_with_user().await;
        assert!(!store.verify(9999, "anything").await.unwrap());
    }

    #[tokio::test]
    async fn test_rotate_then_verify() {
        let (store, user_id) = store_with_user().await;

        store.rotate(user_id, "token-one").await.unwrap();
        assert!(store.verify(user_id, "token-one").await.unwrap());
        assert!(!store.verify(user_id, "token-two").await.unwrap());
    }

    #[tokio::test]
    async fn test_rotate_overwrites_previous_session() {
        let (store, user_id) = store_with_user().await;

        store.rotate(user_id, "token-one").await.unwrap();
        store.rotate(user_id, "token-two").await.unwrap();

        // The rotated-out token is permanently invalid.
        assert!(!store.verify(user_id, "token-one").await.unwrap());
        assert!(store.verify(user_id, "token-two").await.unwrap());
    }

    #[tokio::test]
    async fn test_clear_ends_session() {
        let (store, user_id) = store_with_user().await;

        store.rotate(user_id, "token-one").await.unwrap();
        store.clear(user_id).await.unwrap();
        assert!(!store.verify(user_id, "token-one").await.unwrap());
    }

    #[test]
    fn test_digest_is_not_the_token() {
        let hash = RefreshSessionStore::digest("some-refresh-token");
        assert_ne!(hash, "some-refresh-token");
        // SHA-256 hex digest
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

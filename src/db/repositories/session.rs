//! Session repository
//!
//! Database operations for login sessions.
//!
//! A session is valid while `expires_at > now`. Validation is a single
//! statement that joins the owning user and filters on expiry, so a missing,
//! expired or forged token all look the same to callers.

use crate::models::{Session, SessionInfo};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use super::user::row_to_user;

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a new session
    async fn create(&self, session: &Session) -> Result<Session>;

    /// Get the owner and timing of a session that has not expired
    async fn get_valid(&self, token: &str) -> Result<Option<SessionInfo>>;

    /// Push expiry forward and stamp activity. Returns false if no row matched.
    async fn renew(&self, token: &str, expires_at: DateTime<Utc>) -> Result<bool>;

    /// Delete a session; deleting an unknown token is not an error
    async fn delete(&self, token: &str) -> Result<()>;

    /// Delete all sessions for a user
    async fn delete_by_user(&self, user_id: i64) -> Result<u64>;

    /// Delete expired sessions
    async fn delete_expired(&self) -> Result<u64>;
}

/// SQLx-based session repository implementation
pub struct SqlxSessionRepository {
    pool: SqlitePool,
}

impl SqlxSessionRepository {
    /// Create a new SQLx session repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session> {
        create_session(&self.pool, session).await
    }

    async fn get_valid(&self, token: &str) -> Result<Option<SessionInfo>> {
        get_valid_session(&self.pool, token).await
    }

    async fn renew(&self, token: &str, expires_at: DateTime<Utc>) -> Result<bool> {
        renew_session(&self.pool, token, expires_at).await
    }

    async fn delete(&self, token: &str) -> Result<()> {
        delete_session(&self.pool, token).await
    }

    async fn delete_by_user(&self, user_id: i64) -> Result<u64> {
        delete_sessions_by_user(&self.pool, user_id).await
    }

    async fn delete_expired(&self) -> Result<u64> {
        delete_expired_sessions(&self.pool).await
    }
}

// ============================================================================
// SQLite queries
// ============================================================================

async fn create_session(pool: &SqlitePool, session: &Session) -> Result<Session> {
    let session = Session {
        expires_at: session.expires_at.trunc_subsecs(0),
        last_activity: session.last_activity.trunc_subsecs(0),
        ..session.clone()
    };

    sqlx::query(
        r#"
        INSERT INTO sessions (token, user_id, expires_at, last_activity, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&session.token)
    .bind(session.user_id)
    .bind(session.expires_at)
    .bind(session.last_activity)
    .bind(session.last_activity)
    .execute(pool)
    .await
    .context("Failed to create session")?;

    Ok(session)
}

async fn get_valid_session(pool: &SqlitePool, token: &str) -> Result<Option<SessionInfo>> {
    let row = sqlx::query(
        r#"
        SELECT u.id, u.username, u.password_hash, u.created_at,
               s.last_activity, s.expires_at
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token = ? AND s.expires_at > ?
        "#,
    )
    .bind(token)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await
    .context("Failed to validate session")?;

    Ok(row.map(|row| SessionInfo {
        user: row_to_user(&row),
        last_activity: row.get("last_activity"),
        expires_at: row.get("expires_at"),
    }))
}

async fn renew_session(pool: &SqlitePool, token: &str, expires_at: DateTime<Utc>) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE sessions
        SET last_activity = ?, expires_at = ?
        WHERE token = ?
        "#,
    )
    .bind(Utc::now().trunc_subsecs(0))
    .bind(expires_at.trunc_subsecs(0))
    .bind(token)
    .execute(pool)
    .await
    .context("Failed to renew session")?;

    Ok(result.rows_affected() > 0)
}

async fn delete_session(pool: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await
        .context("Failed to delete session")?;

    Ok(())
}

async fn delete_sessions_by_user(pool: &SqlitePool, user_id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to delete sessions by user")?;

    Ok(result.rows_affected())
}

async fn delete_expired_sessions(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(Utc::now())
        .execute(pool)
        .await
        .context("Failed to delete expired sessions")?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use chrono::Duration;

    async fn setup_test_repo() -> (SqlitePool, SqlxSessionRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxSessionRepository::new(pool.clone());
        (pool, repo)
    }

    // Helper to create a test user for foreign key constraint
    async fn create_test_user(pool: &SqlitePool, id: i64) {
        sqlx::query("INSERT INTO users (id, username, password_hash) VALUES (?, ?, ?)")
            .bind(id)
            .bind(format!("user{}", id))
            .bind("hash")
            .execute(pool)
            .await
            .expect("Failed to create test user");
    }

    fn create_test_session(token: &str, user_id: i64, expires_in: Duration) -> Session {
        let now = Utc::now();
        Session {
            token: token.to_string(),
            user_id,
            expires_at: now + expires_in,
            last_activity: now,
        }
    }

    #[tokio::test]
    async fn test_create_then_validate_returns_owner() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;

        let session = create_test_session("tok-1", 1, Duration::days(7));
        repo.create(&session).await.expect("Failed to create session");

        let info = repo
            .get_valid("tok-1")
            .await
            .expect("Failed to validate")
            .expect("Session not found");

        assert_eq!(info.user.id, 1);
        assert_eq!(info.user.username, "user1");
        assert_eq!(info.expires_at, session.expires_at.trunc_subsecs(0));
    }

    #[tokio::test]
    async fn test_unknown_token_is_invalid() {
        let (_pool, repo) = setup_test_repo().await;

        let info = repo.get_valid("nonexistent-token").await.expect("Failed to validate");
        assert!(info.is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_invalid() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;

        let session = create_test_session("old", 1, -Duration::hours(1));
        repo.create(&session).await.expect("Failed to create session");

        assert!(repo.get_valid("old").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_renew_moves_expiry() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;

        repo.create(&create_test_session("tok", 1, Duration::days(1)))
            .await
            .unwrap();

        let new_expiry = Utc::now() + Duration::days(30);
        assert!(repo.renew("tok", new_expiry).await.unwrap());

        let info = repo.get_valid("tok").await.unwrap().unwrap();
        assert_eq!(info.expires_at, new_expiry.trunc_subsecs(0));

        assert!(!repo.renew("missing", new_expiry).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_session_is_idempotent() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;

        repo.create(&create_test_session("tok", 1, Duration::days(7)))
            .await
            .unwrap();

        repo.delete("tok").await.expect("Failed to delete session");
        repo.delete("tok").await.expect("Second delete should succeed");

        assert!(repo.get_valid("tok").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_sessions_by_user() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;
        create_test_user(&pool, 2).await;

        repo.create(&create_test_session("a", 1, Duration::days(7))).await.unwrap();
        repo.create(&create_test_session("b", 1, Duration::days(7))).await.unwrap();
        repo.create(&create_test_session("c", 2, Duration::days(7))).await.unwrap();

        let deleted = repo.delete_by_user(1).await.expect("Failed to delete");
        assert_eq!(deleted, 2);

        assert!(repo.get_valid("a").await.unwrap().is_none());
        assert!(repo.get_valid("b").await.unwrap().is_none());
        assert!(repo.get_valid("c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_expired_sessions() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;

        repo.create(&create_test_session("expired", 1, -Duration::days(1)))
            .await
            .unwrap();
        repo.create(&create_test_session("valid", 1, Duration::days(7)))
            .await
            .unwrap();

        let deleted = repo.delete_expired().await.expect("Failed to sweep");
        assert_eq!(deleted, 1);

        assert!(repo.get_valid("valid").await.unwrap().is_some());
        let remaining: i64 = sqlx::query("SELECT COUNT(*) AS count FROM sessions")
            .fetch_one(&pool)
            .await
            .unwrap()
            .get("count");
        assert_eq!(remaining, 1);
    }
}

//! User service
//!
//! Implements the credential and session lifecycle:
//! - Login/logout
//! - Session validation and rolling renewal
//! - Expired-session sweeping
//! - First-start administrator bootstrap

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{Session, SessionInfo, User};
use crate::services::password::{
    generate_random_password, generate_session_token, hash_password, verify_password,
};
use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Default session lifetime in days
const DEFAULT_SESSION_LIFETIME_DAYS: i64 = 30;

/// Username used when bootstrap credentials are not configured
const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// User already exists
    #[error("User already exists: {0}")]
    UserExists(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Input for login
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

impl LoginInput {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// User service for authentication and session management
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_lifetime: Duration,
}

impl UserService {
    /// Create a new user service with the default 30-day session lifetime
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
    ) -> Self {
        Self::with_session_lifetime(
            user_repo,
            session_repo,
            Duration::days(DEFAULT_SESSION_LIFETIME_DAYS),
        )
    }

    /// Create a new user service with a custom session lifetime
    pub fn with_session_lifetime(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_lifetime: Duration,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_lifetime,
        }
    }

    /// Full lifetime of a fresh or renewed session
    pub fn session_lifetime(&self) -> Duration {
        self.session_lifetime
    }

    /// Create a user with a hashed password.
    ///
    /// # Errors
    ///
    /// - `ValidationError` if username or password is empty
    /// - `UserExists` if the username is taken
    pub async fn create_user(&self, username: &str, password: &str) -> Result<User, UserServiceError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Username cannot be empty".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Password cannot be empty".to_string(),
            ));
        }

        if self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Username '{}' is already taken",
                username
            )));
        }

        let password_hash = hash_password(password).context("Failed to hash password")?;
        let user = self
            .user_repo
            .create(&User::new(username.to_string(), password_hash))
            .await
            .context("Failed to create user")?;

        Ok(user)
    }

    /// Login with username and password.
    ///
    /// An unknown username and a wrong password produce the same error.
    pub async fn login(&self, input: LoginInput) -> Result<Session, UserServiceError> {
        let username = input.username.trim();
        if username.is_empty() || input.password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Username and password are required".to_string(),
            ));
        }

        let user = self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to look up user")?;

        let user = match user {
            Some(user) if verify_password(&input.password, &user.password_hash) => user,
            _ => {
                tracing::info!("Failed login attempt for '{}'", username);
                return Err(UserServiceError::AuthenticationError(
                    "Invalid username or password".to_string(),
                ));
            }
        };

        let session = self.create_session(user.id).await?;
        tracing::info!("User '{}' logged in", user.username);
        Ok(session)
    }

    /// Issue a new session for a user
    pub async fn create_session(&self, user_id: i64) -> Result<Session, UserServiceError> {
        let now = Utc::now();
        let session = Session {
            token: generate_session_token().context("Failed to generate session token")?,
            user_id,
            expires_at: self.expiry_from(now)?,
            last_activity: now,
        };

        let session = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        Ok(session)
    }

    fn expiry_from(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, UserServiceError> {
        now.checked_add_signed(self.session_lifetime).ok_or_else(|| {
            UserServiceError::InternalError(anyhow::anyhow!(
                "Session lifetime of {} days overflows the expiry date",
                self.session_lifetime.num_days()
            ))
        })
    }

    /// Logout (delete session). Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Validate a session token and return the owning user
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        Ok(self
            .validate_session_with_info(token)
            .await?
            .map(|info| info.user))
    }

    /// Validate a session token and return the owner plus session timing.
    ///
    /// Missing, expired and forged tokens all return `Ok(None)`.
    pub async fn validate_session_with_info(
        &self,
        token: &str,
    ) -> Result<Option<SessionInfo>, UserServiceError> {
        if token.is_empty() {
            return Ok(None);
        }

        let info = self
            .session_repo
            .get_valid(token)
            .await
            .context("Failed to validate session")?;

        Ok(info)
    }

    /// Extend a session to a full lifetime when less than half remains.
    ///
    /// Returns the new expiry when a renewal happened.
    pub async fn renew_if_needed(
        &self,
        token: &str,
        info: &SessionInfo,
    ) -> Result<Option<DateTime<Utc>>, UserServiceError> {
        let now = Utc::now();
        if !info.needs_renewal(self.session_lifetime, now) {
            return Ok(None);
        }

        let expires_at = self.expiry_from(now)?;
        let renewed = self
            .session_repo
            .renew(token, expires_at)
            .await
            .context("Failed to renew session")?;

        Ok(renewed.then_some(expires_at))
    }

    /// Delete every session of one user
    pub async fn delete_user_sessions(&self, user_id: i64) -> Result<u64, UserServiceError> {
        let count = self
            .session_repo
            .delete_by_user(user_id)
            .await
            .context("Failed to delete user sessions")?;
        Ok(count)
    }

    /// Clean up expired sessions
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, UserServiceError> {
        let count = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to cleanup expired sessions")?;

        if count > 0 {
            tracing::info!("Cleaned up {} expired session(s)", count);
        }

        Ok(count)
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        let user = self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")?;
        Ok(user)
    }

    /// Create the first administrator when no users exist.
    ///
    /// With both credentials supplied they are used as given. Otherwise an
    /// `admin` account is created with a generated password, which is logged
    /// once. Returns the created user, or `None` if users already exist.
    pub async fn bootstrap_admin(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<Option<User>, UserServiceError> {
        let count = self
            .user_repo
            .count()
            .await
            .context("Failed to count users")?;
        if count > 0 {
            return Ok(None);
        }

        let configured = match (username, password) {
            (Some(u), Some(p)) if !u.trim().is_empty() && !p.is_empty() => Some((u, p)),
            _ => None,
        };

        let user = match configured {
            Some((username, password)) => {
                let user = self.create_user(username, password).await?;
                tracing::info!("Created administrator '{}' from configuration", user.username);
                user
            }
            None => {
                let password =
                    generate_random_password().context("Failed to generate admin password")?;
                let user = self.create_user(DEFAULT_ADMIN_USERNAME, &password).await?;
                tracing::warn!("==================================================");
                tracing::warn!("Created default administrator account");
                tracing::warn!("Username: {}", user.username);
                tracing::warn!("Password: {}", password);
                tracing::warn!("Change it by setting SPENDLOG_ADMIN_PASSWORD");
                tracing::warn!("==================================================");
                user
            }
        };

        Ok(Some(user))
    }
}

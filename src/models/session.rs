//! Session model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::User;

/// Server-side login session, mirrored by the client's session cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque token (the cookie value)
    pub token: String,
    /// Associated user ID
    pub user_id: i64,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Last time the session was created or renewed
    pub last_activity: DateTime<Utc>,
}

impl Session {
    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// A validated session joined with its owner.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub user: User,
    pub last_activity: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionInfo {
    /// Time left before the session expires, as of `now`.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }

    /// Rolling renewal kicks in once less than half of the lifetime remains.
    pub fn needs_renewal(&self, lifetime: Duration, now: DateTime<Utc>) -> bool {
        self.remaining(now) < lifetime / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info_expiring_in(remaining: Duration, now: DateTime<Utc>) -> SessionInfo {
        SessionInfo {
            user: User::new("alice".to_string(), "hash".to_string()),
            last_activity: now,
            expires_at: now + remaining,
        }
    }

    #[test]
    fn test_needs_renewal_below_half_life() {
        let now = Utc::now();
        let lifetime = Duration::days(30);

        assert!(info_expiring_in(Duration::days(10), now).needs_renewal(lifetime, now));
        assert!(info_expiring_in(Duration::hours(1), now).needs_renewal(lifetime, now));
    }

    #[test]
    fn test_no_renewal_at_or_above_half_life() {
        let now = Utc::now();
        let lifetime = Duration::days(30);

        assert!(!info_expiring_in(Duration::days(15), now).needs_renewal(lifetime, now));
        assert!(!info_expiring_in(Duration::days(29), now).needs_renewal(lifetime, now));
    }

    #[test]
    fn test_is_expired() {
        let now = Utc::now();
        let session = Session {
            token: "t".to_string(),
            user_id: 1,
            expires_at: now - Duration::seconds(1),
            last_activity: now - Duration::days(30),
        };
        assert!(session.is_expired());

        let session = Session {
            expires_at: now + Duration::days(1),
            ..session
        };
        assert!(!session.is_expired());
    }
}

//! Session types for authentication

use serde::{Deserialize, Serialize};

/// Cookie name for the encrypted session
pub const SESSION_COOKIE_NAME: &str = "risk_session";

/// Logged-in user session stored in the encrypted cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user_id: i64,
    pub username: String,
    /// Session expiration (Unix timestamp)
    pub expires_at: i64,
}

impl AuthSession {
    pub fn new(user_id: i64, username: impl Into<String>, ttl_hours: u32) -> Self {
        Self {
            user_id,
            username: username.into(),
            expires_at: chrono::Utc::now().timestamp() + i64::from(ttl_hours) * 3600,
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        chrono::Utc::now().timestamp() >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_serialize_deserialize() {
        let session = AuthSession::new(7, "alice", 8);

        let json = serde_json::to_string(&session).unwrap();
        let deserialized: AuthSession = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.user_id, 7);
        assert_eq!(deserialized.username, "alice");
        assert!(!deserialized.is_expired());
    }

    #[test]
    fn test_session_expired() {
        let session = AuthSession {
            user_id: 1,
            username: "alice".to_string(),
            expires_at: chrono::Utc::now().timestamp() - 100,
        };

        assert!(session.is_expired());
    }
}

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of principal a session was minted for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    User,
    Agent,
    System,
    External,
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionType::User => write!(f, "user"),
            SessionType::Agent => write!(f, "agent"),
            SessionType::System => write!(f, "system"),
            SessionType::External => write!(f, "external"),
        }
    }
}

/// A live authenticated context
///
/// Invariant: `expires_at > created_at`; the session is valid iff
/// `now < expires_at`. The store exclusively owns these records; callers
/// hold only the opaque `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub provider_name: String,
    pub session_type: SessionType,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub origin_address: Option<String>,
    pub client_agent: Option<String>,
}

impl Session {
    pub fn is_valid(&self) -> bool {
        Utc::now() < self.expires_at
    }

    pub fn is_active_within(&self, window: Duration) -> bool {
        Utc::now() - self.last_activity_at < window
    }
}

/// Data required to mint a new session
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub user_id: String,
    pub provider_name: String,
    pub session_type: SessionType,
    pub ttl: Duration,
    pub origin_address: Option<String>,
    pub client_agent: Option<String>,
}

impl SessionRequest {
    pub fn new(user_id: &str, provider_name: &str, session_type: SessionType, ttl: Duration) -> Self {
        Self {
            user_id: user_id.to_string(),
            provider_name: provider_name.to_string(),
            session_type,
            ttl,
            origin_address: None,
            client_agent: None,
        }
    }

    pub fn with_origin(mut self, origin_address: &str) -> Self {
        self.origin_address = Some(origin_address.to_string());
        self
    }

    pub fn with_client_agent(mut self, client_agent: &str) -> Self {
        self.client_agent = Some(client_agent.to_string());
        self
    }
}

/// Outcome of a session lookup
#[derive(Debug, Clone)]
pub enum SessionStatus {
    /// Session exists and is unexpired; activity has been updated
    Valid(Session),
    /// Session existed but its expiry had passed; the record is gone
    Expired(Session),
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(expires_in: Duration) -> Session {
        let now = Utc::now();
        Session {
            id: "s".to_string(),
            user_id: "u".to_string(),
            provider_name: "local".to_string(),
            session_type: SessionType::User,
            created_at: now,
            expires_at: now + expires_in,
            last_activity_at: now,
            origin_address: None,
            client_agent: None,
        }
    }

    #[test]
    fn test_validity_boundary() {
        assert!(session(Duration::seconds(30)).is_valid());
        assert!(!session(Duration::milliseconds(-1)).is_valid());
    }

    #[test]
    fn test_session_type_display() {
        assert_eq!(SessionType::External.to_string(), "external");
        assert_eq!(SessionType::Agent.to_string(), "agent");
    }
}

// Event types and structures
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

/// Generic event envelope for sinks that need a wire representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub event_type: String,
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// The closed set of security events emitted by the authentication core
///
/// Payload fields follow the audit vocabulary: identities and user ids are
/// opaque strings, timestamps are UTC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SecurityEvent {
    AuthenticationSuccess {
        user_id: String,
        provider: String,
        session_id: String,
    },
    AuthenticationFailed {
        identity: String,
        provider: String,
        reason: String,
    },
    PermissionDenied {
        user_id: String,
        permission: String,
        role: String,
    },
    AccountLocked {
        identity: String,
        failed_attempts: u32,
        lockout_expires_at: DateTime<Utc>,
    },
    LockoutExpired {
        identity: String,
    },
    SessionExpired {
        user_id: String,
        session_id: String,
    },
    Logout {
        user_id: String,
        session_id: String,
    },
}

impl SecurityEvent {
    /// Stable event name used as the envelope `event_type`
    pub fn name(&self) -> &'static str {
        match self {
            SecurityEvent::AuthenticationSuccess { .. } => "authentication_success",
            SecurityEvent::AuthenticationFailed { .. } => "authentication_failed",
            SecurityEvent::PermissionDenied { .. } => "permission_denied",
            SecurityEvent::AccountLocked { .. } => "account_locked",
            SecurityEvent::LockoutExpired { .. } => "lockout_expired",
            SecurityEvent::SessionExpired { .. } => "session_expired",
            SecurityEvent::Logout { .. } => "logout",
        }
    }

    /// Structured payload without the event name
    pub fn payload(&self) -> serde_json::Value {
        match self {
            SecurityEvent::AuthenticationSuccess {
                user_id,
                provider,
                session_id,
            } => json!({
                "user_id": user_id,
                "provider": provider,
                "session_id": session_id,
            }),
            SecurityEvent::AuthenticationFailed {
                identity,
                provider,
                reason,
            } => json!({
                "identity": identity,
                "provider": provider,
                "reason": reason,
            }),
            SecurityEvent::PermissionDenied {
                user_id,
                permission,
                role,
            } => json!({
                "user_id": user_id,
                "permission": permission,
                "role": role,
            }),
            SecurityEvent::AccountLocked {
                identity,
                failed_attempts,
                lockout_expires_at,
            } => json!({
                "identity": identity,
                "failed_attempts": failed_attempts,
                "lockout_expires_at": lockout_expires_at,
            }),
            SecurityEvent::LockoutExpired { identity } => json!({
                "identity": identity,
            }),
            SecurityEvent::SessionExpired {
                user_id,
                session_id,
            } => json!({
                "user_id": user_id,
                "session_id": session_id,
            }),
            SecurityEvent::Logout {
                user_id,
                session_id,
            } => json!({
                "user_id": user_id,
                "session_id": session_id,
            }),
        }
    }

    /// Wrap into a timestamped envelope
    pub fn to_envelope(&self) -> Event {
        Event {
            id: Uuid::new_v4(),
            event_type: self.name().to_string(),
            data: self.payload(),
            timestamp: Utc::now(),
        }
    }
}

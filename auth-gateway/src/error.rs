use auth_session::StoreError;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Caller-visible authentication failures
///
/// Every variant except `Configuration` and `System` is an expected outcome:
/// the manager reports it as a security event, never as an unexpected error.
/// Unknown-username and wrong-password both surface as `InvalidCredentials`
/// so callers cannot enumerate accounts.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Account locked until {lockout_expires_at}")]
    AccountLocked { lockout_expires_at: DateTime<Utc> },

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid system key")]
    InvalidSystemKey,

    #[error("Permission denied: {permission} for role {role}")]
    PermissionDenied { permission: String, role: String },

    #[error("Session not found")]
    SessionNotFound,

    #[error("Session expired")]
    SessionExpired,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// Backing store failure after the bounded retry; access is denied
    #[error("Authentication store failure: {0}")]
    System(#[from] StoreError),
}

impl AuthError {
    /// Stable reason code carried in security event payloads
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::AccountLocked { .. } => "account_locked",
            AuthError::UnknownProvider(_) => "unknown_provider",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidToken => "invalid_token",
            AuthError::InvalidSystemKey => "invalid_system_key",
            AuthError::PermissionDenied { .. } => "permission_denied",
            AuthError::SessionNotFound => "session_not_found",
            AuthError::SessionExpired => "session_expired",
            AuthError::Configuration(_) => "configuration_error",
            AuthError::Internal(_) => "internal_error",
            AuthError::System(_) => "system_error",
        }
    }

    /// Whether this failure counts toward the identity's lockout threshold
    pub fn is_credential_failure(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials
                | AuthError::InvalidToken
                | AuthError::TokenExpired
                | AuthError::InvalidSystemKey
        )
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;

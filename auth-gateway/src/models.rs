use auth_rbac::Role;
use auth_session::Session;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::AuthError;

/// Identity resolved by a provider on successful authentication
///
/// Immutable for the lifetime of a session. Permissions are deliberately not
/// stored here: they are re-derived from `role` at every check, so a stale
/// or tampered cached set can never grant access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub profile: HashMap<String, serde_json::Value>,
}

/// Lifecycle states of an authentication flow
///
/// State is local to each `authenticate` call; the terminal-adjacent states
/// (`TokenExpired`, `Locked`, `Suspended`) all route back to
/// `Unauthenticated` on the next successful authentication. `Suspended` is
/// reserved for identity sources that report account suspension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    Unauthenticated,
    Authenticating,
    Authenticated,
    TokenExpired,
    Locked,
    Suspended,
}

impl AuthState {
    /// State a failed authentication lands in
    pub fn from_failure(error: &AuthError) -> Self {
        match error {
            AuthError::AccountLocked { .. } => AuthState::Locked,
            AuthError::TokenExpired => AuthState::TokenExpired,
            _ => AuthState::Unauthenticated,
        }
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::Unauthenticated => write!(f, "unauthenticated"),
            AuthState::Authenticating => write!(f, "authenticating"),
            AuthState::Authenticated => write!(f, "authenticated"),
            AuthState::TokenExpired => write!(f, "token_expired"),
            AuthState::Locked => write!(f, "locked"),
            AuthState::Suspended => write!(f, "suspended"),
        }
    }
}

/// Result of a successful authentication
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub session: Session,
}

/// Point-in-time counters over the auth tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStats {
    pub total_sessions: usize,
    pub recent_sessions: usize,
    pub locked_accounts: usize,
}

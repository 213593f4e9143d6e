/// Authentication provider implementations
///
/// Each provider turns one credential payload shape into a verified `User`.
/// The set of strategies is closed (`Local | Token | System`) so dispatch is
/// an exhaustive match and adding a provider is a compile-time event.

pub mod local;
pub mod system;
pub mod token;

pub use local::{DirectoryUser, InMemoryUserDirectory, LocalProvider, UserDirectory};
pub use system::SystemProvider;
pub use token::{TokenClaims, TokenProvider};

use crate::{
    config::ProviderConfig,
    error::{AuthError, Result},
    models::User,
};
use auth_session::Session;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Generic credentials enum for all auth methods
#[derive(Debug, Clone)]
pub enum Credentials {
    Local { username: String, password: String },
    Bearer { token: String },
    System { component: String, key: String },
}

impl Credentials {
    /// Identity key for lockout bookkeeping, resolved before any provider
    /// runs
    ///
    /// For bearer tokens this is the unverified `sub` claim; a payload that
    /// cannot be peeked has no identity to throttle.
    pub fn identity_key(&self) -> Option<String> {
        match self {
            Credentials::Local { username, .. } => Some(username.clone()),
            Credentials::Bearer { token } => token::peek_subject(token),
            Credentials::System { component, .. } => Some(format!("system:{}", component)),
        }
    }
}

/// Closed set of provider strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Local,
    Token,
    System,
}

impl ProviderKind {
    /// Resolve a caller-supplied provider name
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "local" => Ok(ProviderKind::Local),
            "token" => Ok(ProviderKind::Token),
            "system" => Ok(ProviderKind::System),
            other => Err(AuthError::UnknownProvider(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Local => "local",
            ProviderKind::Token => "token",
            ProviderKind::System => "system",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The configured provider strategies
///
/// The local provider is always present (its identity source is injected);
/// token and system providers exist only when their secrets are configured.
/// Asking for an unconfigured provider fails the same way as asking for a
/// name that never existed.
pub struct ProviderSet {
    local: LocalProvider,
    token: Option<TokenProvider>,
    system: Option<SystemProvider>,
}

impl ProviderSet {
    pub fn new(directory: Arc<dyn UserDirectory>, config: &ProviderConfig) -> Result<Self> {
        let token = config
            .token_secret
            .as_deref()
            .map(TokenProvider::new)
            .transpose()?;
        let system = config
            .system_key
            .as_deref()
            .map(SystemProvider::new)
            .transpose()?;

        Ok(Self {
            local: LocalProvider::new(directory),
            token,
            system,
        })
    }

    /// Validate a credential payload with the selected strategy
    pub async fn authenticate(&self, kind: ProviderKind, credentials: &Credentials) -> Result<User> {
        match kind {
            ProviderKind::Local => self.local.authenticate(credentials).await,
            ProviderKind::Token => {
                let provider = self
                    .token
                    .as_ref()
                    .ok_or_else(|| AuthError::UnknownProvider(kind.as_str().to_string()))?;
                provider.authenticate(credentials).await
            }
            ProviderKind::System => {
                let provider = self
                    .system
                    .as_ref()
                    .ok_or_else(|| AuthError::UnknownProvider(kind.as_str().to_string()))?;
                provider.authenticate(credentials).await
            }
        }
    }

    /// Best-effort cleanup hook invoked when a session is logged out
    pub async fn logout(&self, kind: ProviderKind, session: &Session) {
        match kind {
            ProviderKind::Local => self.local.logout(session).await,
            ProviderKind::Token => {
                if let Some(provider) = self.token.as_ref() {
                    provider.logout(session).await;
                }
            }
            ProviderKind::System => {
                if let Some(provider) = self.system.as_ref() {
                    provider.logout(session).await;
                }
            }
        }
        debug!(session_id = %session.id, provider = %kind, "provider logout hook finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_names_round_trip() {
        for kind in [ProviderKind::Local, ProviderKind::Token, ProviderKind::System] {
            assert_eq!(ProviderKind::parse(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_provider_name() {
        let err = ProviderKind::parse("oauth").unwrap_err();
        assert!(matches!(err, AuthError::UnknownProvider(name) if name == "oauth"));
    }

    #[test]
    fn test_identity_key_shapes() {
        let local = Credentials::Local {
            username: "alice".to_string(),
            password: "pw".to_string(),
        };
        assert_eq!(local.identity_key().as_deref(), Some("alice"));

        let system = Credentials::System {
            component: "scheduler".to_string(),
            key: "k".to_string(),
        };
        assert_eq!(system.identity_key().as_deref(), Some("system:scheduler"));

        let garbage = Credentials::Bearer {
            token: "not-a-token".to_string(),
        };
        assert_eq!(garbage.identity_key(), None);
    }
}

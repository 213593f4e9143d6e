/// Internal system provider
///
/// Authenticates service-to-service callers against a shared key from
/// configuration. The comparison is constant-time and the configured key is
/// kept wrapped in memory.

use super::Credentials;
use crate::{
    error::{AuthError, Result},
    models::User,
};
use auth_rbac::Role;
use auth_session::Session;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use subtle::ConstantTimeEq;

pub struct SystemProvider {
    key: SecretString,
}

impl SystemProvider {
    pub fn new(key: &str) -> Result<Self> {
        if key.is_empty() {
            return Err(AuthError::Configuration(
                "system key must not be empty".to_string(),
            ));
        }
        Ok(Self {
            key: SecretString::new(key.to_string()),
        })
    }

    pub async fn authenticate(&self, credentials: &Credentials) -> Result<User> {
        let Credentials::System { component, key } = credentials else {
            return Err(AuthError::InvalidSystemKey);
        };

        let matches: bool = key
            .as_bytes()
            .ct_eq(self.key.expose_secret().as_bytes())
            .into();
        if !matches {
            return Err(AuthError::InvalidSystemKey);
        }

        Ok(User {
            id: format!("system:{}", component),
            username: component.clone(),
            role: Role::system(),
            profile: HashMap::new(),
        })
    }

    /// Best-effort logout hook; system sessions hold no external state
    pub async fn logout(&self, _session: &Session) {}
}

/// Local credential provider
///
/// Verifies username/password pairs against an injected user directory.
/// Password hashes are Argon2id PHC strings; verification is salted,
/// constant-time, and runs on the blocking pool so it never stalls the
/// async runtime.

use super::Credentials;
use crate::{
    error::{AuthError, Result},
    models::User,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use auth_rbac::Role;
use auth_session::Session;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Credential record owned by the external identity source
#[derive(Debug, Clone)]
pub struct DirectoryUser {
    pub id: String,
    pub username: String,
    pub role: Role,
    /// Argon2id hash in PHC string format
    pub password_hash: String,
    pub profile: HashMap<String, serde_json::Value>,
}

/// Injected identity source for the local provider
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<DirectoryUser>>;
}

pub struct LocalProvider {
    directory: Arc<dyn UserDirectory>,
    argon2: Argon2<'static>,
}

impl LocalProvider {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            directory,
            argon2: Argon2::default(),
        }
    }

    pub async fn authenticate(&self, credentials: &Credentials) -> Result<User> {
        let Credentials::Local { username, password } = credentials else {
            return Err(AuthError::InvalidCredentials);
        };

        // Unknown username and wrong password must be indistinguishable to
        // the caller
        let Some(stored) = self.directory.find_by_username(username).await? else {
            debug!(username, "no directory entry for username");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.verify_password(password, &stored.password_hash).await? {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(User {
            id: stored.id,
            username: stored.username,
            role: stored.role,
            profile: stored.profile,
        })
    }

    /// Best-effort logout hook; local sessions need no credential cleanup
    pub async fn logout(&self, _session: &Session) {}

    /// Verify a password against its hash with constant-time comparison
    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let password = password.to_string();
        let hash = hash.to_string();
        let argon2 = self.argon2.clone();

        // Run verification in a blocking task
        tokio::task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&hash)
                .map_err(|err| AuthError::Internal(format!("malformed password hash: {}", err)))?;

            match argon2.verify_password(password.as_bytes(), &parsed_hash) {
                Ok(()) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(err) => Err(AuthError::Internal(format!(
                    "password verification error: {}",
                    err
                ))),
            }
        })
        .await
        .map_err(|err| AuthError::Internal(format!("password verification task failed: {}", err)))?
    }

    /// Hash a password with Argon2id; CPU-intensive, runs on the blocking
    /// pool
    pub async fn hash_password(password: &str) -> Result<String> {
        let password = password.to_string();

        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|err| AuthError::Internal(format!("failed to hash password: {}", err)))
        })
        .await
        .map_err(|err| AuthError::Internal(format!("password hashing task failed: {}", err)))?
    }
}

/// In-memory directory for development and testing
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: DashMap<String, DirectoryUser>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash `password` and store a directory entry under `username`
    pub async fn add_user(&self, id: &str, username: &str, password: &str, role: Role) -> Result<()> {
        let password_hash = LocalProvider::hash_password(password).await?;
        self.users.insert(
            username.to_string(),
            DirectoryUser {
                id: id.to_string(),
                username: username.to_string(),
                role,
                password_hash,
                profile: HashMap::new(),
            },
        );
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<DirectoryUser>> {
        Ok(self.users.get(username).map(|entry| entry.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn provider_with_alice() -> LocalProvider {
        let directory = Arc::new(InMemoryUserDirectory::new());
        directory
            .add_user("user-1", "alice", "correct horse battery", Role::user())
            .await
            .unwrap();
        LocalProvider::new(directory)
    }

    #[tokio::test]
    async fn test_valid_credentials() {
        let provider = provider_with_alice().await;
        let user = provider
            .authenticate(&Credentials::Local {
                username: "alice".to_string(),
                password: "correct horse battery".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(user.id, "user-1");
        assert_eq!(user.role, Role::user());
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_are_indistinguishable() {
        let provider = provider_with_alice().await;

        let wrong_password = provider
            .authenticate(&Credentials::Local {
                username: "alice".to_string(),
                password: "nope".to_string(),
            })
            .await
            .unwrap_err();
        let unknown_user = provider
            .authenticate(&Credentials::Local {
                username: "nobody".to_string(),
                password: "nope".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.reason(), unknown_user.reason());
    }

    #[tokio::test]
    async fn test_mismatched_credential_shape() {
        let provider = provider_with_alice().await;
        let err = provider
            .authenticate(&Credentials::Bearer {
                token: "tok".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_hashes_are_salted() {
        let first = LocalProvider::hash_password("same password").await.unwrap();
        let second = LocalProvider::hash_password("same password").await.unwrap();
        assert_ne!(first, second);
        assert!(first.starts_with("$argon2"));
    }
}

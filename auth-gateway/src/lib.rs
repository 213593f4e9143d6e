//! Authentication manager and provider strategies for the Beacon auth core
//!
//! This crate ties the core together:
//! - Pluggable credential strategies: local username/password, bearer
//!   tokens, and the internal system key
//! - The authentication state machine with failed-attempt lockout enforced
//!   before any provider runs
//! - Session minting, validation and logout over the session store
//! - Fail-closed role-based permission checks
//! - Background reclamation of expired sessions and lockouts
//!
//! # Example
//!
//! ```rust,no_run
//! use auth_gateway::{AuthConfig, AuthManager, Credentials, InMemoryUserDirectory};
//! use auth_events::TracingSink;
//! use auth_rbac::Role;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let directory = Arc::new(InMemoryUserDirectory::new());
//!     directory.add_user("user-1", "alice", "s3cret", Role::user()).await?;
//!
//!     let manager = Arc::new(AuthManager::new(
//!         AuthConfig::default(),
//!         directory,
//!         Arc::new(TracingSink::default()),
//!     )?);
//!     let _reclaim = manager.spawn_reclaim_tasks();
//!
//!     let outcome = manager
//!         .authenticate(
//!             "local",
//!             &Credentials::Local {
//!                 username: "alice".to_string(),
//!                 password: "s3cret".to_string(),
//!             },
//!         )
//!         .await?;
//!     let session = manager.validate_session(&outcome.session.id).await?;
//!     manager.logout(&session.id).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod manager;
pub mod models;
pub mod providers;

pub use config::{AuthConfig, ProviderConfig};
pub use error::AuthError;
pub use manager::{AuthManager, ReclaimTasks};
pub use models::{AuthSession, AuthState, AuthStats, User};
pub use providers::{
    Credentials, DirectoryUser, InMemoryUserDirectory, LocalProvider, ProviderKind, ProviderSet,
    SystemProvider, TokenClaims, TokenProvider, UserDirectory,
};

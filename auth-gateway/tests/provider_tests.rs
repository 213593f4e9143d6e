//! Provider strategies through the manager
//!
//! Token expiry never mints a session, the system key is checked
//! constant-time against configuration, and unknown provider names fail
//! without touching any provider.

use auth_events::CapturingSink;
use auth_gateway::{
    providers::token::encode_claims, AuthConfig, AuthError, AuthManager, Credentials,
    InMemoryUserDirectory, TokenClaims,
};
use auth_rbac::Role;
use auth_session::SessionType;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

const TOKEN_SECRET: &str = "test-token-secret";
const SYSTEM_KEY: &str = "internal-system-key";

async fn manager_with_providers() -> (Arc<AuthManager>, Arc<CapturingSink>) {
    let config = AuthConfig {
        providers: auth_gateway::ProviderConfig {
            token_secret: Some(TOKEN_SECRET.to_string()),
            system_key: Some(SYSTEM_KEY.to_string()),
        },
        ..AuthConfig::default()
    };

    let directory = Arc::new(InMemoryUserDirectory::new());
    directory
        .add_user("user-bob", "bob", "correct-password", Role::user())
        .await
        .unwrap();

    let sink = Arc::new(CapturingSink::new());
    let manager = Arc::new(AuthManager::new(config, directory, sink.clone()).unwrap());
    (manager, sink)
}

fn claims(sub: &str, role: &str, expires_in_secs: i64) -> TokenClaims {
    let now = Utc::now().timestamp();
    TokenClaims {
        sub: sub.to_string(),
        exp: now + expires_in_secs,
        iat: now,
        role: role.to_string(),
        username: None,
        profile: HashMap::new(),
    }
}

#[tokio::test]
async fn test_expired_token_never_creates_a_session() {
    let (manager, sink) = manager_with_providers().await;

    let token = encode_claims(&claims("agent-7", "agent", -1), TOKEN_SECRET).unwrap();
    let err = manager
        .authenticate("token", &Credentials::Bearer { token })
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::TokenExpired));
    assert_eq!(manager.stats().await.unwrap().total_sessions, 0);

    let events = sink.take();
    let failed = events
        .iter()
        .find(|event| event.name() == "authentication_failed")
        .expect("authentication_failed event");
    assert_eq!(failed.payload()["identity"], "agent-7");
    assert_eq!(failed.payload()["reason"], "token_expired");
}

#[tokio::test]
async fn test_valid_agent_token_mints_an_agent_session() {
    let (manager, _sink) = manager_with_providers().await;

    let token = encode_claims(&claims("agent-7", "agent", 60), TOKEN_SECRET).unwrap();
    let outcome = manager
        .authenticate("token", &Credentials::Bearer { token })
        .await
        .unwrap();

    assert_eq!(outcome.user.id, "agent-7");
    assert_eq!(outcome.user.role, Role::agent());
    assert_eq!(outcome.session.session_type, SessionType::Agent);
    assert_eq!(outcome.session.provider_name, "token");
}

#[tokio::test]
async fn test_forged_token_is_invalid() {
    let (manager, _sink) = manager_with_providers().await;

    let token = encode_claims(&claims("agent-7", "admin", 60), "attacker-secret").unwrap();
    let err = manager
        .authenticate("token", &Credentials::Bearer { token })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken));
}

#[tokio::test]
async fn test_system_key_round_trip() {
    let (manager, _sink) = manager_with_providers().await;

    let outcome = manager
        .authenticate(
            "system",
            &Credentials::System {
                component: "scheduler".to_string(),
                key: SYSTEM_KEY.to_string(),
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.user.role, Role::system());
    assert_eq!(outcome.session.session_type, SessionType::System);

    let err = manager
        .authenticate(
            "system",
            &Credentials::System {
                component: "scheduler".to_string(),
                key: "wrong-key".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidSystemKey));
}

#[tokio::test]
async fn test_unknown_provider_name() {
    let (manager, sink) = manager_with_providers().await;

    let err = manager
        .authenticate(
            "oauth",
            &Credentials::Local {
                username: "bob".to_string(),
                password: "correct-password".to_string(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::UnknownProvider(name) if name == "oauth"));
    // Nothing ran, nothing was emitted
    assert!(sink.take().is_empty());
}

#[tokio::test]
async fn test_unconfigured_provider_is_unknown() {
    // Default config enables neither token nor system provider
    let directory = Arc::new(InMemoryUserDirectory::new());
    let sink = Arc::new(CapturingSink::new());
    let manager =
        Arc::new(AuthManager::new(AuthConfig::default(), directory, sink).unwrap());

    let err = manager
        .authenticate(
            "system",
            &Credentials::System {
                component: "scheduler".to_string(),
                key: SYSTEM_KEY.to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::UnknownProvider(name) if name == "system"));
}

#[tokio::test]
async fn test_local_flow_end_to_end() {
    let (manager, sink) = manager_with_providers().await;

    let outcome = manager
        .authenticate(
            "local",
            &Credentials::Local {
                username: "bob".to_string(),
                password: "correct-password".to_string(),
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.session.session_type, SessionType::User);
    assert_eq!(outcome.user.username, "bob");

    let success = sink
        .take()
        .into_iter()
        .find(|event| event.name() == "authentication_success")
        .expect("authentication_success event");
    let payload = success.payload();
    assert_eq!(payload["user_id"], "user-bob");
    assert_eq!(payload["provider"], "local");
    assert_eq!(payload["session_id"], outcome.session.id.as_str());
}

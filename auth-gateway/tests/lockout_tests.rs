//! Lockout behavior through the manager
//!
//! Covers the throttling contract end to end: threshold, expiry,
//! counter reset, and the brute-force scenario where even the correct
//! password is refused while the account is locked.

use auth_events::CapturingSink;
use auth_gateway::{AuthConfig, AuthError, AuthManager, Credentials, InMemoryUserDirectory};
use auth_rbac::Role;
use std::sync::Arc;

async fn manager_with(config: AuthConfig) -> (Arc<AuthManager>, Arc<CapturingSink>) {
    let directory = Arc::new(InMemoryUserDirectory::new());
    directory
        .add_user("user-bob", "bob", "correct-password", Role::user())
        .await
        .unwrap();

    let sink = Arc::new(CapturingSink::new());
    let manager = Arc::new(AuthManager::new(config, directory, sink.clone()).unwrap());
    (manager, sink)
}

fn local(username: &str, password: &str) -> Credentials {
    Credentials::Local {
        username: username.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn test_brute_force_locks_even_the_correct_password() {
    let config = AuthConfig {
        max_failed_attempts: 5,
        ..AuthConfig::default()
    };
    let (manager, sink) = manager_with(config).await;

    for _ in 0..5 {
        let err = manager
            .authenticate("local", &local("bob", "wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }
    assert_eq!(sink.count_of("account_locked"), 1);

    // Sixth attempt with the correct password is still refused
    let err = manager
        .authenticate("local", &local("bob", "correct-password"))
        .await
        .unwrap_err();
    match err {
        AuthError::AccountLocked { lockout_expires_at } => {
            assert!(lockout_expires_at > chrono::Utc::now());
        }
        other => panic!("expected AccountLocked, got {:?}", other),
    }

    // The refusal happened before any provider ran, so no session exists
    assert_eq!(manager.stats().await.unwrap().total_sessions, 0);
}

#[tokio::test]
async fn test_lockout_expires_and_correct_password_recovers() {
    let config = AuthConfig {
        max_failed_attempts: 2,
        lockout_duration_ms: 150,
        ..AuthConfig::default()
    };
    let (manager, _sink) = manager_with(config).await;

    for _ in 0..2 {
        manager
            .authenticate("local", &local("bob", "wrong"))
            .await
            .unwrap_err();
    }
    assert!(matches!(
        manager
            .authenticate("local", &local("bob", "correct-password"))
            .await
            .unwrap_err(),
        AuthError::AccountLocked { .. }
    ));

    tokio::time::sleep(std::time::Duration::from_millis(300)).await;

    // Lockout has lapsed; no sweep needed for the gate to reopen
    let outcome = manager
        .authenticate("local", &local("bob", "correct-password"))
        .await
        .unwrap();
    assert_eq!(outcome.user.username, "bob");
}

#[tokio::test]
async fn test_success_resets_the_failure_counter() {
    let config = AuthConfig {
        max_failed_attempts: 2,
        ..AuthConfig::default()
    };
    let (manager, sink) = manager_with(config).await;

    manager
        .authenticate("local", &local("bob", "wrong"))
        .await
        .unwrap_err();
    manager
        .authenticate("local", &local("bob", "correct-password"))
        .await
        .unwrap();

    // One more failure starts from zero and must not relock
    manager
        .authenticate("local", &local("bob", "wrong"))
        .await
        .unwrap_err();
    assert_eq!(sink.count_of("account_locked"), 0);

    let outcome = manager
        .authenticate("local", &local("bob", "correct-password"))
        .await
        .unwrap();
    assert_eq!(outcome.user.id, "user-bob");
}

#[tokio::test]
async fn test_failed_attempts_emit_events_with_reasons() {
    let (manager, sink) = manager_with(AuthConfig::default()).await;

    manager
        .authenticate("local", &local("bob", "wrong"))
        .await
        .unwrap_err();

    let events = sink.take();
    let failed = events
        .iter()
        .find(|event| event.name() == "authentication_failed")
        .expect("authentication_failed event");
    let payload = failed.payload();
    assert_eq!(payload["identity"], "bob");
    assert_eq!(payload["provider"], "local");
    assert_eq!(payload["reason"], "invalid_credentials");
}

#[tokio::test]
async fn test_unknown_user_and_wrong_password_share_a_reason() {
    let (manager, sink) = manager_with(AuthConfig::default()).await;

    let wrong_password = manager
        .authenticate("local", &local("bob", "nope"))
        .await
        .unwrap_err();
    let unknown_user = manager
        .authenticate("local", &local("nobody", "nope"))
        .await
        .unwrap_err();

    assert!(matches!(wrong_password, AuthError::InvalidCredentials));
    assert!(matches!(unknown_user, AuthError::InvalidCredentials));

    let reasons: Vec<String> = sink
        .take()
        .iter()
        .filter(|event| event.name() == "authentication_failed")
        .map(|event| event.payload()["reason"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(reasons, vec!["invalid_credentials", "invalid_credentials"]);
}

use crate::{
    config::AuthConfig,
    error::{AuthError, Result},
    models::{AuthSession, AuthState, AuthStats, User},
    providers::{Credentials, ProviderKind, ProviderSet, UserDirectory},
};
use auth_events::{EventSink, SecurityEvent};
use auth_rbac::{Permission, PermissionTable, Role};
use auth_session::{
    FailedAttemptTracker, Session, SessionRequest, SessionStatus, SessionStore, SessionType,
    StoreError,
};
use chrono::Utc;
use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// AuthManager orchestrates the authentication core
///
/// It runs the authentication state machine, enforces lockout before any
/// provider is consulted, owns session minting and validation, resolves
/// permissions fail-closed, and drives the two background reclamation
/// sweeps. Construct one per isolated deployment and share it by handle;
/// there are no process-wide singletons.
pub struct AuthManager {
    config: RwLock<AuthConfig>,
    providers: ProviderSet,
    sessions: Arc<SessionStore>,
    tracker: Arc<FailedAttemptTracker>,
    permissions: PermissionTable,
    events: Arc<dyn EventSink>,

    // Most recently minted session id: a lookup key, not ownership
    current_session: RwLock<Option<String>>,
}

impl AuthManager {
    pub fn new(
        config: AuthConfig,
        directory: Arc<dyn UserDirectory>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self> {
        let providers = ProviderSet::new(directory, &config.providers)?;
        let sessions = Arc::new(SessionStore::new().with_session_cap(config.max_sessions_per_user));
        let tracker = Arc::new(FailedAttemptTracker::new(
            config.max_failed_attempts,
            config.lockout_duration(),
            events.clone(),
        ));

        Ok(Self {
            config: RwLock::new(config),
            providers,
            sessions,
            tracker,
            permissions: PermissionTable::builtin(),
            events,
            current_session: RwLock::new(None),
        })
    }

    /// Replace the built-in permission table
    pub fn with_permission_table(mut self, permissions: PermissionTable) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn permission_table(&self) -> &PermissionTable {
        &self.permissions
    }

    /// Authenticate a credential payload with the named provider
    ///
    /// The provider call runs without holding any table lock; only the
    /// bookkeeping before and after it touches the tracker and the store.
    pub async fn authenticate(
        &self,
        provider_name: &str,
        credentials: &Credentials,
    ) -> Result<AuthSession> {
        let identity = credentials.identity_key();

        // Lockout gate before any credential work
        if let Some(identity) = identity.as_deref() {
            if self.with_retry(|| self.tracker.is_locked(identity)).await? {
                let lockout_expires_at = self
                    .with_retry(|| self.tracker.lockout_expires_at(identity))
                    .await?
                    .unwrap_or_else(Utc::now);
                debug!(
                    identity,
                    state = %AuthState::Locked,
                    "authentication refused while locked"
                );
                return Err(AuthError::AccountLocked { lockout_expires_at });
            }
        }

        let kind = ProviderKind::parse(provider_name)?;

        debug!(provider = %kind, state = %AuthState::Authenticating, "invoking provider");
        match self.providers.authenticate(kind, credentials).await {
            Ok(user) => {
                if let Some(identity) = identity.as_deref() {
                    self.with_retry(|| self.tracker.clear(identity)).await?;
                }

                let request = SessionRequest::new(
                    &user.id,
                    kind.as_str(),
                    session_type_for(kind, &user.role),
                    self.config.read().session_timeout(),
                );
                let session = self
                    .with_retry(|| self.sessions.create(request.clone()))
                    .await?;

                *self.current_session.write() = Some(session.id.clone());

                info!(
                    user_id = %user.id,
                    provider = %kind,
                    session_id = %session.id,
                    state = %AuthState::Authenticated,
                    "authentication succeeded"
                );
                self.events.emit(SecurityEvent::AuthenticationSuccess {
                    user_id: user.id.clone(),
                    provider: kind.as_str().to_string(),
                    session_id: session.id.clone(),
                });

                Ok(AuthSession { user, session })
            }
            Err(err) if err.is_credential_failure() => {
                if let Some(identity) = identity.as_deref() {
                    self.with_retry(|| self.tracker.record_failure(identity))
                        .await?;
                }

                debug!(
                    provider = %kind,
                    reason = err.reason(),
                    state = %AuthState::from_failure(&err),
                    "authentication failed"
                );
                self.events.emit(SecurityEvent::AuthenticationFailed {
                    identity: identity.unwrap_or_else(|| "unknown".to_string()),
                    provider: kind.as_str().to_string(),
                    reason: err.reason().to_string(),
                });

                Err(err)
            }
            // Infrastructure failures deny access without touching the
            // lockout accounting
            Err(err) => Err(err),
        }
    }

    /// Resolve a session id to its live session, updating activity
    pub async fn validate_session(&self, session_id: &str) -> Result<Session> {
        match self.with_retry(|| self.sessions.validate(session_id)).await? {
            SessionStatus::Valid(session) => Ok(session),
            SessionStatus::Expired(session) => {
                self.events.emit(SecurityEvent::SessionExpired {
                    user_id: session.user_id.clone(),
                    session_id: session.id.clone(),
                });
                Err(AuthError::SessionExpired)
            }
            SessionStatus::NotFound => Err(AuthError::SessionNotFound),
        }
    }

    /// Check a single permission for `user`
    ///
    /// Side-effect free on success; denial emits `permission_denied` and
    /// fails. Roles missing from the table grant nothing.
    pub fn check_permission(&self, user: &User, permission: &Permission) -> Result<()> {
        if self.permissions.has_permission(&user.role, permission) {
            return Ok(());
        }

        self.events.emit(SecurityEvent::PermissionDenied {
            user_id: user.id.clone(),
            permission: permission.to_string(),
            role: user.role.to_string(),
        });
        Err(AuthError::PermissionDenied {
            permission: permission.to_string(),
            role: user.role.to_string(),
        })
    }

    /// Destroy a session and run the owning provider's cleanup hook
    ///
    /// Logging out a session that does not exist is a no-op, and the second
    /// call emits no duplicate event.
    pub async fn logout(&self, session_id: &str) -> Result<()> {
        let Some(session) = self.with_retry(|| self.sessions.destroy(session_id)).await? else {
            return Ok(());
        };

        if let Ok(kind) = ProviderKind::parse(&session.provider_name) {
            self.providers.logout(kind, &session).await;
        }

        {
            let mut current = self.current_session.write();
            if current.as_deref() == Some(session_id) {
                *current = None;
            }
        }

        self.events.emit(SecurityEvent::Logout {
            user_id: session.user_id.clone(),
            session_id: session.id.clone(),
        });
        Ok(())
    }

    /// Counters over the auth tables
    pub async fn stats(&self) -> Result<AuthStats> {
        let window = self.config.read().recent_session_window();
        Ok(AuthStats {
            total_sessions: self.with_retry(|| self.sessions.count()).await?,
            recent_sessions: self
                .with_retry(|| self.sessions.recent_count(window))
                .await?,
            locked_accounts: self.with_retry(|| self.tracker.locked_count()).await?,
        })
    }

    /// Most recently minted session id for this manager, if any
    pub fn current_session(&self) -> Option<String> {
        self.current_session.read().clone()
    }

    /// Adjust the session ttl; only newly created sessions are affected
    pub fn set_session_timeout(&self, timeout: std::time::Duration) {
        self.config.write().session_timeout_ms = timeout.as_millis() as u64;
        info!(timeout_ms = timeout.as_millis() as u64, "session timeout updated");
    }

    /// Spawn the two background reclamation sweeps
    ///
    /// The returned handle aborts both tasks on drop.
    pub fn spawn_reclaim_tasks(&self) -> ReclaimTasks {
        let (session_interval, lockout_interval) = {
            let config = self.config.read();
            (
                config.session_reclaim_interval(),
                config.lockout_reclaim_interval(),
            )
        };

        let sessions = Arc::clone(&self.sessions);
        let events = Arc::clone(&self.events);
        let session_sweep = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(session_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match sessions.reclaim().await {
                    Ok(reaped) => {
                        for session in reaped {
                            events.emit(SecurityEvent::SessionExpired {
                                user_id: session.user_id,
                                session_id: session.id,
                            });
                        }
                    }
                    Err(err) => warn!(error = %err, "session reclaim sweep failed"),
                }
            }
        });

        let tracker = Arc::clone(&self.tracker);
        let lockout_sweep = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(lockout_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(err) = tracker.reclaim().await {
                    warn!(error = %err, "lockout reclaim sweep failed");
                }
            }
        });

        ReclaimTasks {
            tasks: vec![session_sweep, lockout_sweep],
        }
    }

    /// Retry a bookkeeping operation once on transient store failure, then
    /// fail closed
    async fn with_retry<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = std::result::Result<T, StoreError>>,
    {
        match op().await {
            Err(err) if err.is_transient() => {
                warn!(error = %err, "transient store failure, retrying once");
                Ok(op().await?)
            }
            other => Ok(other?),
        }
    }
}

fn session_type_for(kind: ProviderKind, role: &Role) -> SessionType {
    match kind {
        ProviderKind::Local => SessionType::User,
        ProviderKind::System => SessionType::System,
        ProviderKind::Token => {
            if *role == Role::agent() {
                SessionType::Agent
            } else {
                SessionType::External
            }
        }
    }
}

/// Handles for the background sweeps; aborts them on drop
pub struct ReclaimTasks {
    tasks: Vec<JoinHandle<()>>,
}

impl ReclaimTasks {
    pub fn shutdown(&self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

impl Drop for ReclaimTasks {
    fn drop(&mut self) {
        self.shutdown();
    }
}

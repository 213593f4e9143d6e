use crate::{
    backing::{InMemoryBacking, RecordBacking},
    error::{Result, StoreError},
    models::{Session, SessionRequest, SessionStatus},
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// SessionStore owns the mapping from session identifier to session record
///
/// Every mutating sequence (create, validate, destroy, reclaim) runs under
/// one store-level mutex so a reclaim sweep cannot race an in-flight
/// validation into a lost update. Expiry is lazy on read; `reclaim` is the
/// safety net for sessions nobody validates again.
pub struct SessionStore {
    backing: Arc<dyn RecordBacking<Session>>,

    // Serializes all mutating sequences against the backing
    op_lock: Mutex<()>,

    // 0 disables the cap
    max_sessions_per_user: usize,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_backing(Arc::new(InMemoryBacking::new()))
    }

    pub fn with_backing(backing: Arc<dyn RecordBacking<Session>>) -> Self {
        Self {
            backing,
            op_lock: Mutex::new(()),
            max_sessions_per_user: 0,
        }
    }

    /// Cap concurrent sessions per user; the least-recently-active session
    /// is evicted to make room
    pub fn with_session_cap(mut self, max_sessions_per_user: usize) -> Self {
        self.max_sessions_per_user = max_sessions_per_user;
        self
    }

    /// Mint a session for `request.user_id` expiring after `request.ttl`
    pub async fn create(&self, request: SessionRequest) -> Result<Session> {
        if request.ttl <= Duration::zero() {
            return Err(StoreError::InvalidTtl);
        }

        let _guard = self.op_lock.lock().await;

        if self.max_sessions_per_user > 0 {
            self.evict_for_cap(&request.user_id).await?;
        }

        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id: request.user_id,
            provider_name: request.provider_name,
            session_type: request.session_type,
            created_at: now,
            expires_at: now + request.ttl,
            last_activity_at: now,
            origin_address: request.origin_address,
            client_agent: request.client_agent,
        };

        self.backing.put(&session.id, session.clone()).await?;
        debug!(
            session_id = %session.id,
            user_id = %session.user_id,
            session_type = %session.session_type,
            "session created"
        );
        Ok(session)
    }

    /// Look up a session, updating its activity timestamp when valid
    ///
    /// An expired record is removed here rather than waiting for the sweep.
    pub async fn validate(&self, session_id: &str) -> Result<SessionStatus> {
        let _guard = self.op_lock.lock().await;

        let Some(mut session) = self.backing.get(session_id).await? else {
            return Ok(SessionStatus::NotFound);
        };

        if !session.is_valid() {
            self.backing.delete(session_id).await?;
            debug!(session_id, user_id = %session.user_id, "session expired on read");
            return Ok(SessionStatus::Expired(session));
        }

        session.last_activity_at = Utc::now();
        self.backing.put(session_id, session.clone()).await?;
        Ok(SessionStatus::Valid(session))
    }

    /// Remove a session; idempotent, returns the record if one existed
    pub async fn destroy(&self, session_id: &str) -> Result<Option<Session>> {
        let _guard = self.op_lock.lock().await;

        let session = self.backing.get(session_id).await?;
        if session.is_some() {
            self.backing.delete(session_id).await?;
            debug!(session_id, "session destroyed");
        }
        Ok(session)
    }

    /// Sweep out sessions whose expiry has passed, returning the reaped
    /// records so the caller can emit expiry events
    pub async fn reclaim(&self) -> Result<Vec<Session>> {
        let _guard = self.op_lock.lock().await;

        let mut reaped = Vec::new();
        for (key, session) in self.backing.scan().await? {
            if !session.is_valid() {
                self.backing.delete(&key).await?;
                reaped.push(session);
            }
        }

        if !reaped.is_empty() {
            info!(count = reaped.len(), "reclaimed expired sessions");
        }
        Ok(reaped)
    }

    /// Peek at a session without touching its activity timestamp
    pub async fn get(&self, session_id: &str) -> Result<Option<Session>> {
        self.backing.get(session_id).await
    }

    /// Number of stored sessions, expired stragglers included
    pub async fn count(&self) -> Result<usize> {
        Ok(self.backing.scan().await?.len())
    }

    /// Number of unexpired sessions with activity inside `window`
    pub async fn recent_count(&self, window: Duration) -> Result<usize> {
        Ok(self
            .backing
            .scan()
            .await?
            .iter()
            .filter(|(_, session)| session.is_valid() && session.is_active_within(window))
            .count())
    }

    async fn evict_for_cap(&self, user_id: &str) -> Result<()> {
        let mut owned: Vec<Session> = self
            .backing
            .scan()
            .await?
            .into_iter()
            .map(|(_, session)| session)
            .filter(|session| session.user_id == user_id && session.is_valid())
            .collect();

        if owned.len() < self.max_sessions_per_user {
            return Ok(());
        }

        owned.sort_by_key(|session| session.last_activity_at);
        let surplus = owned.len() + 1 - self.max_sessions_per_user;
        for session in owned.iter().take(surplus) {
            info!(
                session_id = %session.id,
                user_id,
                "evicting least-recently-active session for concurrent cap"
            );
            self.backing.delete(&session.id).await?;
        }
        Ok(())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

use crate::{
    backing::{InMemoryBacking, RecordBacking},
    error::Result,
};
use auth_events::{EventSink, SecurityEvent};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Per-identity failure counter with lockout expiry
///
/// Invariant: `lockout_expires_at` is only ever set once the counter has
/// reached the configured threshold; the identity is locked iff it is set
/// and in the future.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedAttemptRecord {
    pub identity: String,
    pub count: u32,
    pub first_attempt_at: DateTime<Utc>,
    pub last_attempt_at: DateTime<Utc>,
    pub lockout_expires_at: Option<DateTime<Utc>>,
}

impl FailedAttemptRecord {
    fn new(identity: &str) -> Self {
        let now = Utc::now();
        Self {
            identity: identity.to_string(),
            count: 0,
            first_attempt_at: now,
            last_attempt_at: now,
            lockout_expires_at: None,
        }
    }

    pub fn is_locked(&self) -> bool {
        if let Some(lockout_expires_at) = self.lockout_expires_at {
            lockout_expires_at > Utc::now()
        } else {
            false
        }
    }
}

/// FailedAttemptTracker throttles repeated credential failures per identity
///
/// Lockout policy is fixed-window: once a lockout is in effect its expiry is
/// never pushed out by further failures. Those failures still increment the
/// counter, since every attempt against a locked account is itself a
/// security-relevant observation.
pub struct FailedAttemptTracker {
    backing: Arc<dyn RecordBacking<FailedAttemptRecord>>,
    op_lock: Mutex<()>,
    max_failed_attempts: u32,
    lockout_duration: Duration,
    events: Arc<dyn EventSink>,
}

impl FailedAttemptTracker {
    pub fn new(
        max_failed_attempts: u32,
        lockout_duration: Duration,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self::with_backing(
            Arc::new(InMemoryBacking::new()),
            max_failed_attempts,
            lockout_duration,
            events,
        )
    }

    pub fn with_backing(
        backing: Arc<dyn RecordBacking<FailedAttemptRecord>>,
        max_failed_attempts: u32,
        lockout_duration: Duration,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            backing,
            op_lock: Mutex::new(()),
            max_failed_attempts,
            lockout_duration,
            events,
        }
    }

    /// Record one failed attempt against `identity`
    ///
    /// Returns the updated record. Emits `account_locked` when this failure
    /// crosses the threshold (or re-arms an already-expired lockout).
    pub async fn record_failure(&self, identity: &str) -> Result<FailedAttemptRecord> {
        let _guard = self.op_lock.lock().await;

        let mut record = self
            .backing
            .get(identity)
            .await?
            .unwrap_or_else(|| FailedAttemptRecord::new(identity));

        record.count += 1;
        record.last_attempt_at = Utc::now();

        if record.count >= self.max_failed_attempts && !record.is_locked() {
            let lockout_expires_at = Utc::now() + self.lockout_duration;
            record.lockout_expires_at = Some(lockout_expires_at);
            warn!(
                identity,
                failed_attempts = record.count,
                %lockout_expires_at,
                "account locked after repeated failures"
            );
            self.events.emit(SecurityEvent::AccountLocked {
                identity: identity.to_string(),
                failed_attempts: record.count,
                lockout_expires_at,
            });
        }

        self.backing.put(identity, record.clone()).await?;
        Ok(record)
    }

    pub async fn is_locked(&self, identity: &str) -> Result<bool> {
        Ok(self
            .backing
            .get(identity)
            .await?
            .map(|record| record.is_locked())
            .unwrap_or(false))
    }

    /// Expiry of the active lockout, if any
    pub async fn lockout_expires_at(&self, identity: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .backing
            .get(identity)
            .await?
            .filter(FailedAttemptRecord::is_locked)
            .and_then(|record| record.lockout_expires_at))
    }

    /// Drop the record entirely; called on successful authentication
    pub async fn clear(&self, identity: &str) -> Result<()> {
        let _guard = self.op_lock.lock().await;
        self.backing.delete(identity).await?;
        Ok(())
    }

    /// Sweep out records whose lockout has expired, emitting
    /// `lockout_expired` per removed identity
    pub async fn reclaim(&self) -> Result<Vec<String>> {
        let _guard = self.op_lock.lock().await;

        let now = Utc::now();
        let mut released = Vec::new();
        for (key, record) in self.backing.scan().await? {
            let lockout_over = record
                .lockout_expires_at
                .map(|expires_at| expires_at <= now)
                .unwrap_or(false);
            if lockout_over {
                self.backing.delete(&key).await?;
                self.events.emit(SecurityEvent::LockoutExpired {
                    identity: record.identity.clone(),
                });
                released.push(record.identity);
            }
        }

        if !released.is_empty() {
            info!(count = released.len(), "released expired lockouts");
        }
        Ok(released)
    }

    /// Number of identities currently locked
    pub async fn locked_count(&self) -> Result<usize> {
        Ok(self
            .backing
            .scan()
            .await?
            .iter()
            .filter(|(_, record)| record.is_locked())
            .count())
    }
}

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main authentication configuration
///
/// All intervals are milliseconds. `session_timeout_ms` may be changed at
/// runtime through the manager; a change affects only newly created sessions.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Lifetime of newly minted sessions (default: 1 hour)
    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,

    /// Failed attempts per identity before lockout (default: 5)
    #[serde(default = "default_max_failed_attempts")]
    pub max_failed_attempts: u32,

    /// Lockout duration after the threshold is crossed (default: 15 minutes)
    #[serde(default = "default_lockout_duration_ms")]
    pub lockout_duration_ms: u64,

    /// Cadence of the expired-session sweep (default: 5 minutes)
    #[serde(default = "default_session_reclaim_interval_ms")]
    pub session_reclaim_interval_ms: u64,

    /// Cadence of the expired-lockout sweep (default: 60 seconds)
    #[serde(default = "default_lockout_reclaim_interval_ms")]
    pub lockout_reclaim_interval_ms: u64,

    /// Activity window counted as "recent" in auth statistics (default: 1 hour)
    #[serde(default = "default_recent_session_window_ms")]
    pub recent_session_window_ms: u64,

    /// Concurrent sessions per user; 0 disables the cap
    #[serde(default)]
    pub max_sessions_per_user: usize,

    /// Provider enablement and secrets
    #[serde(default)]
    pub providers: ProviderConfig,
}

/// Provider configuration
///
/// A provider whose secret is absent is not registered; asking for it fails
/// as an unknown provider.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// HMAC secret for verifying bearer tokens
    pub token_secret: Option<String>,

    /// Shared key for internal service-to-service authentication
    pub system_key: Option<String>,
}

// Default value functions

fn default_session_timeout_ms() -> u64 {
    3_600_000 // 1 hour
}
fn default_max_failed_attempts() -> u32 {
    5
}
fn default_lockout_duration_ms() -> u64 {
    900_000 // 15 minutes
}
fn default_session_reclaim_interval_ms() -> u64 {
    300_000 // 5 minutes
}
fn default_lockout_reclaim_interval_ms() -> u64 {
    60_000 // 60 seconds
}
fn default_recent_session_window_ms() -> u64 {
    3_600_000 // 1 hour
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_timeout_ms: default_session_timeout_ms(),
            max_failed_attempts: default_max_failed_attempts(),
            lockout_duration_ms: default_lockout_duration_ms(),
            session_reclaim_interval_ms: default_session_reclaim_interval_ms(),
            lockout_reclaim_interval_ms: default_lockout_reclaim_interval_ms(),
            recent_session_window_ms: default_recent_session_window_ms(),
            max_sessions_per_user: 0,
            providers: ProviderConfig::default(),
        }
    }
}

impl AuthConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AuthConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Get session ttl as a chrono duration
    pub fn session_timeout(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.session_timeout_ms as i64)
    }

    /// Get lockout duration as a chrono duration
    pub fn lockout_duration(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.lockout_duration_ms as i64)
    }

    /// Get session sweep cadence
    pub fn session_reclaim_interval(&self) -> Duration {
        Duration::from_millis(self.session_reclaim_interval_ms.max(1))
    }

    /// Get lockout sweep cadence
    pub fn lockout_reclaim_interval(&self) -> Duration {
        Duration::from_millis(self.lockout_reclaim_interval_ms.max(1))
    }

    /// Get the statistics activity window
    pub fn recent_session_window(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.recent_session_window_ms as i64)
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a role in the authorization system
///
/// Roles are compact string keys. The built-in constructors cover the roles
/// every deployment ships with; additional roles come from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
}

impl Role {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    /// Full access, superset of every permission defined in the table
    pub fn admin() -> Self {
        Self::new("admin")
    }

    /// Standard interactive user
    pub fn user() -> Self {
        Self::new("user")
    }

    /// Autonomous agent acting on behalf of a user
    pub fn agent() -> Self {
        Self::new("agent")
    }

    /// Read-only access
    pub fn viewer() -> Self {
        Self::new("viewer")
    }

    /// Internal service-to-service operations
    pub fn system() -> Self {
        Self::new("system")
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Represents a single grantable capability, e.g. `vault:write`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    pub name: String,
}

impl Permission {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Permission tokens used by the built-in table
pub mod permissions {
    pub const VAULT_READ: &str = "vault:read";
    pub const VAULT_WRITE: &str = "vault:write";
    pub const VAULT_DELETE: &str = "vault:delete";
    pub const AGENT_INVOKE: &str = "agent:invoke";
    pub const CONFIG_READ: &str = "config:read";
    pub const CONFIG_WRITE: &str = "config:write";
    pub const SESSION_LIST: &str = "session:list";
    pub const SYSTEM_MAINTAIN: &str = "system:maintain";
}

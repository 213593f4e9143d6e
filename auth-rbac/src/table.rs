use crate::{
    error::{RbacError, Result},
    models::{permissions, Permission, Role},
};
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Static mapping from role to the set of permissions that role grants
///
/// Resolution is fail-closed: roles without an entry resolve to the empty
/// set. `admin` is always the superset of every permission defined anywhere
/// in the map; this invariant is restored at load time.
#[derive(Debug, Clone)]
pub struct RolePermissionMap {
    grants: HashMap<Role, HashSet<Permission>>,
}

/// On-disk role map format
#[derive(Debug, Deserialize)]
struct RoleMapFile {
    grants: HashMap<String, Vec<String>>,
}

impl RolePermissionMap {
    /// Built-in table with the five required roles
    pub fn builtin() -> Self {
        let mut grants: HashMap<Role, HashSet<Permission>> = HashMap::new();

        grants.insert(
            Role::user(),
            to_set(&[
                permissions::VAULT_READ,
                permissions::VAULT_WRITE,
                permissions::AGENT_INVOKE,
                permissions::CONFIG_READ,
                permissions::SESSION_LIST,
            ]),
        );
        grants.insert(
            Role::agent(),
            to_set(&[
                permissions::VAULT_READ,
                permissions::VAULT_WRITE,
                permissions::AGENT_INVOKE,
            ]),
        );
        grants.insert(
            Role::viewer(),
            to_set(&[permissions::VAULT_READ, permissions::CONFIG_READ]),
        );
        grants.insert(
            Role::system(),
            to_set(&[
                permissions::VAULT_READ,
                permissions::SESSION_LIST,
                permissions::SYSTEM_MAINTAIN,
            ]),
        );
        // Placeholder entry; restore_admin_superset widens it below.
        grants.insert(Role::admin(), to_set(&[permissions::VAULT_DELETE]));

        let mut map = Self { grants };
        map.restore_admin_superset();
        map
    }

    /// Build from explicit grants, validating tokens and restoring the admin
    /// superset invariant
    pub fn from_grants(raw: HashMap<String, Vec<String>>) -> Result<Self> {
        let mut grants: HashMap<Role, HashSet<Permission>> = HashMap::new();

        for (role_name, tokens) in raw {
            if role_name.trim().is_empty() {
                return Err(RbacError::MalformedRoleMap(
                    "empty role name".to_string(),
                ));
            }
            let mut set = HashSet::new();
            for token in tokens {
                if token.trim().is_empty() || token.contains(char::is_whitespace) {
                    return Err(RbacError::MalformedRoleMap(format!(
                        "invalid permission token {:?} for role {}",
                        token, role_name
                    )));
                }
                set.insert(Permission::new(&token));
            }
            grants.insert(Role::new(&role_name), set);
        }

        let mut map = Self { grants };
        map.restore_admin_superset();
        Ok(map)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: RoleMapFile = toml::from_str(contents)?;
        Self::from_grants(file.grants)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Every permission token defined anywhere in the map
    pub fn all_permissions(&self) -> HashSet<Permission> {
        self.grants.values().flatten().cloned().collect()
    }

    /// Permissions granted to `role`; empty for unknown roles
    pub fn permissions_for(&self, role: &Role) -> HashSet<Permission> {
        self.grants.get(role).cloned().unwrap_or_default()
    }

    pub fn has_permission(&self, role: &Role, permission: &Permission) -> bool {
        self.grants
            .get(role)
            .map(|set| set.contains(permission))
            .unwrap_or(false)
    }

    pub fn roles(&self) -> Vec<Role> {
        self.grants.keys().cloned().collect()
    }

    fn restore_admin_superset(&mut self) {
        let all = self.all_permissions();
        self.grants.entry(Role::admin()).or_default().extend(all);
    }
}

fn to_set(tokens: &[&str]) -> HashSet<Permission> {
    tokens.iter().map(|token| Permission::new(token)).collect()
}

/// Shared handle over the active role map
///
/// Readers take a cheap snapshot `Arc`; `reload` swaps the pointer so
/// request traffic never observes a partially updated table.
pub struct PermissionTable {
    snapshot: RwLock<Arc<RolePermissionMap>>,
}

impl PermissionTable {
    pub fn new(map: RolePermissionMap) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(map)),
        }
    }

    /// Table with the built-in five-role map
    pub fn builtin() -> Self {
        Self::new(RolePermissionMap::builtin())
    }

    pub fn snapshot(&self) -> Arc<RolePermissionMap> {
        self.snapshot.read().clone()
    }

    /// Replace the active map
    pub fn reload(&self, map: RolePermissionMap) {
        info!(roles = map.roles().len(), "reloading role permission map");
        *self.snapshot.write() = Arc::new(map);
    }

    pub fn reload_from_file(&self, path: &Path) -> Result<()> {
        let map = RolePermissionMap::from_file(path)?;
        self.reload(map);
        Ok(())
    }

    pub fn permissions_for(&self, role: &Role) -> HashSet<Permission> {
        self.snapshot().permissions_for(role)
    }

    pub fn has_permission(&self, role: &Role, permission: &Permission) -> bool {
        let allowed = self.snapshot().has_permission(role, permission);
        if !allowed {
            debug!(role = %role, permission = %permission, "permission not granted");
        }
        allowed
    }
}

impl Default for PermissionTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_is_superset_of_all_permissions() {
        let map = RolePermissionMap::builtin();
        for permission in map.all_permissions() {
            assert!(
                map.has_permission(&Role::admin(), &permission),
                "admin should hold {}",
                permission
            );
        }
    }

    #[test]
    fn test_viewer_is_read_only() {
        let map = RolePermissionMap::builtin();
        assert!(map.has_permission(&Role::viewer(), &Permission::new(permissions::VAULT_READ)));
        assert!(!map.has_permission(&Role::viewer(), &Permission::new(permissions::VAULT_WRITE)));
        assert!(!map.has_permission(&Role::viewer(), &Permission::new(permissions::VAULT_DELETE)));
    }

    #[test]
    fn test_unknown_role_resolves_to_empty_set() {
        let map = RolePermissionMap::builtin();
        let ghost = Role::new("ghost");

        assert!(map.permissions_for(&ghost).is_empty());
        for permission in map.all_permissions() {
            assert!(!map.has_permission(&ghost, &permission));
        }
        // Fail-closed even for tokens granted to no role at all
        assert!(!map.has_permission(&ghost, &Permission::new("nonexistent:permission")));
    }

    #[test]
    fn test_from_toml_and_reload() {
        let table = PermissionTable::builtin();
        assert!(!table.has_permission(&Role::new("auditor"), &Permission::new("audit:read")));

        let map = RolePermissionMap::from_toml_str(
            r#"
            [grants]
            auditor = ["audit:read"]
            admin = ["vault:delete"]
            "#,
        )
        .unwrap();
        table.reload(map);

        assert!(table.has_permission(&Role::new("auditor"), &Permission::new("audit:read")));
        // Admin superset is restored over loaded maps too
        assert!(table.has_permission(&Role::admin(), &Permission::new("audit:read")));
        // Built-in grants are gone after the swap
        assert!(!table.has_permission(&Role::user(), &Permission::new(permissions::VAULT_READ)));
    }

    #[test]
    fn test_malformed_role_map_is_rejected() {
        let result = RolePermissionMap::from_toml_str(
            r#"
            [grants]
            user = ["vault read"]
            "#,
        );
        assert!(matches!(result, Err(RbacError::MalformedRoleMap(_))));

        let result = RolePermissionMap::from_toml_str("grants = 3");
        assert!(matches!(result, Err(RbacError::Parse(_))));
    }

    #[test]
    fn test_reload_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [grants]
            operator = ["system:maintain"]
            "#
        )
        .unwrap();

        let table = PermissionTable::builtin();
        table.reload_from_file(file.path()).unwrap();
        assert!(table.has_permission(
            &Role::new("operator"),
            &Permission::new(permissions::SYSTEM_MAINTAIN)
        ));
    }
}

//! Role-based permission resolution for the Beacon auth core
//!
//! Maps roles to sets of permission tokens. Resolution is fail-closed: a role
//! with no entry in the table grants nothing. The table is read-only under
//! request traffic; changing it requires an explicit reload, which swaps the
//! whole snapshot atomically.
//!
//! Roles are open-ended strings so that adding a role is a configuration
//! change, not a code change; the five built-in roles (`admin`, `user`,
//! `agent`, `viewer`, `system`) are always present in the default table.

pub mod error;
pub mod models;
pub mod table;

pub use error::RbacError;
pub use models::{permissions, Permission, Role};
pub use table::{PermissionTable, RolePermissionMap};

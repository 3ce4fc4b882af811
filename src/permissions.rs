/// Workspace permission gate
///
/// Pure role-to-capability evaluation consulted before every mutating
/// operation and membership-scoped read. The capability table is explicit
/// per role: member-only `crud_own_items` means the roles do not form a
/// strict superset chain, so nothing here is derived from role ordering.
use crate::error::{CaptureError, CaptureResult};
use serde::{Deserialize, Serialize};

/// Workspace member roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }

    pub fn from_str(s: &str) -> CaptureResult<Self> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            "member" => Ok(Role::Member),
            _ => Err(CaptureError::Validation(format!("Invalid role: {}", s))),
        }
    }
}

/// Capabilities a role may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ViewItems,
    CrudOwnItems,
    CrudAllItems,
    ManageMembers,
    ManageWorkspace,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ViewItems => "view_items",
            Capability::CrudOwnItems => "crud_own_items",
            Capability::CrudAllItems => "crud_all_items",
            Capability::ManageMembers => "manage_members",
            Capability::ManageWorkspace => "manage_workspace",
        }
    }
}

/// The capability table, spelled out per role
pub fn allowed(role: Role, capability: Capability) -> bool {
    use Capability::*;

    match role {
        Role::Owner => matches!(
            capability,
            ViewItems | CrudAllItems | ManageMembers | ManageWorkspace
        ),
        Role::Admin => matches!(capability, ViewItems | CrudAllItems | ManageMembers),
        Role::Member => matches!(capability, ViewItems | CrudOwnItems),
    }
}

/// Check a capability, naming it in the rejection
pub fn check(role: Role, capability: Capability) -> CaptureResult<()> {
    if allowed(role, capability) {
        Ok(())
    } else {
        Err(CaptureError::Forbidden {
            capability: capability.as_str(),
        })
    }
}

/// Item-level check: acting on your own item needs `crud_own_items`,
/// acting on anyone else's needs `crud_all_items`
pub fn check_item_access(role: Role, is_item_owner: bool) -> CaptureResult<()> {
    if is_item_owner && allowed(role, Capability::CrudOwnItems) {
        return Ok(());
    }
    check(role, Capability::CrudAllItems)
}

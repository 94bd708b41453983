//! Access checks over an effective permission set.
//!
//! - No IO
//! - No panics
//! - Denial is a `false`, never an error

use crate::{Permission, PermissionSet, Role};

/// Borrowed view of what a user may do: the effective permission set plus the
/// primary role consulted by legacy role gates.
#[derive(Debug, Clone, Copy)]
pub struct Access<'a> {
    permissions: &'a PermissionSet,
    primary_role: Option<&'a Role>,
}

impl<'a> Access<'a> {
    pub fn new(permissions: &'a PermissionSet) -> Self {
        Self {
            permissions,
            primary_role: None,
        }
    }

    pub fn with_primary_role(mut self, role: Option<&'a Role>) -> Self {
        self.primary_role = role;
        self
    }

    pub fn permissions(&self) -> &'a PermissionSet {
        self.permissions
    }

    pub fn primary_role(&self) -> Option<&'a Role> {
        self.primary_role
    }

    pub fn can(&self, permission: &Permission) -> bool {
        self.permissions.contains(permission)
    }

    pub fn can_any(&self, permissions: &[Permission]) -> bool {
        self.permissions.contains_any(permissions)
    }

    pub fn can_all(&self, permissions: &[Permission]) -> bool {
        self.permissions.contains_all(permissions)
    }

    /// Exact membership of the primary role in `roles`.
    pub fn has_primary_role_in(&self, roles: &[Role]) -> bool {
        self.primary_role.is_some_and(|role| roles.contains(role))
    }
}

/// Whether a UI element guarded by `required` should be constructed at all.
///
/// True iff `required` and `effective` share a code. An empty requirement
/// shares nothing, so the element is left out.
pub fn is_visible(required: &[Permission], effective: &PermissionSet) -> bool {
    effective.contains_any(required)
}

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Permission, PermissionSet, Role, RoleTable};

/// Identity of an authenticated user, as issued by the auth backend.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(Uuid);

impl PrincipalId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for PrincipalId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for PrincipalId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// What a user has been granted: role assignments and/or explicit permissions.
///
/// The first role is the user's primary role (used by legacy role gates).
/// Explicit permissions, when present, are authoritative and bypass the role
/// table entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationState {
    #[serde(default)]
    roles: Vec<Role>,
    #[serde(default)]
    permissions: PermissionSet,
}

impl AuthorizationState {
    /// Build a state, dropping repeated roles while keeping first-seen order.
    pub fn new<R, P>(roles: R, permissions: P) -> Self
    where
        R: IntoIterator<Item = Role>,
        P: IntoIterator<Item = Permission>,
    {
        let mut deduped: Vec<Role> = Vec::new();
        for role in roles {
            if !deduped.contains(&role) {
                deduped.push(role);
            }
        }
        Self {
            roles: deduped,
            permissions: permissions.into_iter().collect(),
        }
    }

    pub fn from_roles<R>(roles: R) -> Self
    where
        R: IntoIterator<Item = Role>,
    {
        Self::new(roles, std::iter::empty())
    }

    pub fn from_permissions<P>(permissions: P) -> Self
    where
        P: IntoIterator<Item = Permission>,
    {
        Self::new(std::iter::empty(), permissions)
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn primary_role(&self) -> Option<&Role> {
        self.roles.first()
    }

    /// Explicitly issued permissions (may be empty).
    pub fn explicit_permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    /// Effective permissions against the standard role table.
    pub fn effective_permissions(&self) -> PermissionSet {
        self.effective_permissions_with(RoleTable::standard())
    }

    /// Effective permissions against `table`.
    pub fn effective_permissions_with(&self, table: &RoleTable) -> PermissionSet {
        if !self.permissions.is_empty() {
            return self.permissions.clone();
        }
        table.resolve(&self.roles)
    }
}

/// Effective permission set of `state` under the standard role table.
///
/// Explicit permissions win; the role union is only a fallback. No roles and
/// no permissions yields the empty set.
pub fn resolve_effective_permissions(state: &AuthorizationState) -> PermissionSet {
    state.effective_permissions()
}

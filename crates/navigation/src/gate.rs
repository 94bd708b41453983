use serde::{Deserialize, Serialize};
use serde_json::Value;

use erpgate_auth::{Access, Permission, Role};

use crate::error::{NavigationError, NavigationResult};

/// JSON names a gate is read from, including the older `requires*` spellings.
const GATE_FIELDS: &[&str] = &[
    "requiredPermissions",
    "requiresPermissions",
    "requiredRole",
    "requiresRole",
];

/// Access predicate attached to a menu node or route.
///
/// - `required_permissions` non-empty: the user must hold at least one (OR).
///   `required_role` is ignored in that case.
/// - otherwise `required_role` non-empty: the user's primary role must be one
///   of the listed roles. This is the legacy form kept for older configs.
/// - otherwise the gate is open.
///
/// An absent list and an empty list mean the same thing. JSON accepts both
/// `requiredPermissions`/`requiredRole` and `requiresPermissions`/`requiresRole`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gate {
    #[serde(default, alias = "requiresPermissions", skip_serializing_if = "Vec::is_empty")]
    pub required_permissions: Vec<Permission>,

    #[serde(default, alias = "requiresRole", skip_serializing_if = "Vec::is_empty")]
    pub required_role: Vec<Role>,
}

impl Gate {
    pub fn open() -> Self {
        Self::default()
    }

    pub fn any_of<I>(permissions: I) -> Self
    where
        I: IntoIterator<Item = Permission>,
    {
        Self {
            required_permissions: permissions.into_iter().collect(),
            required_role: Vec::new(),
        }
    }

    pub fn primary_role_in<I>(roles: I) -> Self
    where
        I: IntoIterator<Item = Role>,
    {
        Self {
            required_permissions: Vec::new(),
            required_role: roles.into_iter().collect(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.required_permissions.is_empty() && self.required_role.is_empty()
    }

    pub fn admits(&self, access: &Access<'_>) -> bool {
        if !self.required_permissions.is_empty() {
            return access.can_any(&self.required_permissions);
        }
        if !self.required_role.is_empty() {
            return access.has_primary_role_in(&self.required_role);
        }
        true
    }
}

/// Reject keys of a JSON object that are neither in `own` nor, when `gated`,
/// a gate field. Non-objects are left for serde to report.
pub(crate) fn check_fields(
    value: &Value,
    own: &[&str],
    gated: bool,
    location: &str,
) -> NavigationResult<()> {
    let Some(object) = value.as_object() else {
        return Ok(());
    };
    for field in object.keys() {
        let known = own.contains(&field.as_str())
            || (gated && GATE_FIELDS.contains(&field.as_str()));
        if !known {
            tracing::warn!(location, field = %field, "unknown navigation config field");
            return Err(NavigationError::UnknownField {
                location: location.to_string(),
                field: field.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use erpgate_auth::PermissionSet;

    fn perms(codes: &[&'static str]) -> PermissionSet {
        codes.iter().map(|c| Permission::from_static(*c)).collect()
    }

    #[test]
    fn open_gate_admits_everyone() {
        let none = PermissionSet::new();
        assert!(Gate::open().admits(&Access::new(&none)));
        assert!(Gate::open().is_open());
    }

    #[test]
    fn permission_list_is_or() {
        let gate = Gate::any_of([Permission::new("a.x.read"), Permission::new("b.x.read")]);

        assert!(gate.admits(&Access::new(&perms(&["a.x.read"]))));
        assert!(gate.admits(&Access::new(&perms(&["b.x.read"]))));
        assert!(gate.admits(&Access::new(&perms(&["a.x.read", "b.x.read"]))));
        assert!(!gate.admits(&Access::new(&perms(&["c.x.read"]))));
    }

    #[test]
    fn permissions_take_precedence_over_role() {
        let gate = Gate {
            required_permissions: vec![Permission::new("admin.user.manage")],
            required_role: vec![Role::new("super_admin")],
        };
        let none = PermissionSet::new();
        let super_admin = Role::new("super_admin");
        let access = Access::new(&none).with_primary_role(Some(&super_admin));
        assert!(!gate.admits(&access));
    }

    #[test]
    fn legacy_role_gate_checks_primary_role() {
        let gate = Gate::primary_role_in([Role::new("super_admin")]);
        let none = PermissionSet::new();

        let super_admin = Role::new("super_admin");
        assert!(gate.admits(&Access::new(&none).with_primary_role(Some(&super_admin))));

        let staff = Role::new("staff");
        assert!(!gate.admits(&Access::new(&none).with_primary_role(Some(&staff))));
        assert!(!gate.admits(&Access::new(&none)));
    }

    #[test]
    fn unknown_codes_never_match() {
        let gate = Gate::any_of([Permission::new("no.such.code")]);
        let everything: PermissionSet = erpgate_auth::codes::ALL.iter().cloned().collect();
        assert!(!gate.admits(&Access::new(&everything)));
    }

    #[test]
    fn older_spellings_are_read() {
        let gate: Gate = serde_json::from_str(
            r#"{"requiresPermissions":["admin.user.manage"],"requiresRole":["super_admin"]}"#,
        )
        .unwrap();
        assert_eq!(gate.required_permissions, vec![Permission::new("admin.user.manage")]);
        assert_eq!(gate.required_role, vec![Role::new("super_admin")]);
    }

    #[test]
    fn unknown_fields_are_reported_with_location() {
        let value = serde_json::json!({"key": "/x", "requiredPermission": ["a.b.read"]});
        let err = check_fields(&value, &["key"], true, "menu node '/x'").unwrap_err();
        assert!(matches!(
            err,
            NavigationError::UnknownField { ref field, ref location }
                if field == "requiredPermission" && location == "menu node '/x'"
        ));

        let gated = serde_json::json!({"key": "/x", "requiresRole": ["super_admin"]});
        assert!(check_fields(&gated, &["key"], true, "here").is_ok());
        assert!(check_fields(&gated, &["key"], false, "here").is_err());
    }

    #[test]
    fn empty_lists_are_omitted_when_serialized() {
        assert_eq!(serde_json::to_string(&Gate::open()).unwrap(), "{}");
        let gate: Gate = serde_json::from_str(r#"{"requiredRole":["super_admin"]}"#).unwrap();
        assert_eq!(gate, Gate::primary_role_in([Role::new("super_admin")]));
    }
}

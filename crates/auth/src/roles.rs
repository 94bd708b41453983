use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::permissions::codes::*;
use crate::{Permission, PermissionSet};

/// Role code used for RBAC (e.g. `"sales.manager"`).
///
/// Roles are opaque strings; what a role grants is decided by a [`RoleTable`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Role {
    fn from(value: &'static str) -> Self {
        Self::from_static(value)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

/// Role codes issued by the ERP backend.
pub mod names {
    use super::Role;

    pub const PLATFORM_OWNER: Role = Role::from_static("platform.owner");
    pub const PLATFORM_ADMIN: Role = Role::from_static("platform.admin");
    pub const SALES_MANAGER: Role = Role::from_static("sales.manager");
    pub const SALES_OPERATOR: Role = Role::from_static("sales.operator");
    pub const PRICING_OPERATOR: Role = Role::from_static("pricing.operator");
    pub const CONTRACTS_OPERATOR: Role = Role::from_static("contracts.operator");
    pub const FINANCE_MANAGER: Role = Role::from_static("finance.manager");
    pub const FINANCE_OPERATOR: Role = Role::from_static("finance.operator");
    pub const FINANCE_RECEIPT_OPERATOR: Role = Role::from_static("finance.receipt.operator");
    pub const HR_UZ_ADMIN: Role = Role::from_static("hr.uz.admin");
    pub const HR_CN_ADMIN: Role = Role::from_static("hr.cn.admin");
    pub const BIZ_VIEWER: Role = Role::from_static("biz.viewer");
    pub const AUDIT_VIEWER: Role = Role::from_static("audit.viewer");
}

// ─────────────────────────────────────────────────────────────────────────────
// Role table
// ─────────────────────────────────────────────────────────────────────────────

/// Fixed role → permissions mapping.
///
/// Lookups of unknown roles yield nothing: an unrecognized role is powerless.
#[derive(Debug, Clone, Default)]
pub struct RoleTable {
    grants: HashMap<Role, PermissionSet>,
}

impl RoleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the grant list of `role`.
    pub fn with_role<I>(mut self, role: Role, permissions: I) -> Self
    where
        I: IntoIterator<Item = Permission>,
    {
        self.grants.insert(role, permissions.into_iter().collect());
        self
    }

    /// The ERP's built-in table, shared for the process lifetime.
    pub fn standard() -> &'static RoleTable {
        &STANDARD_TABLE
    }

    pub fn permissions_of(&self, role: &Role) -> Option<&PermissionSet> {
        self.grants.get(role)
    }

    pub fn contains_role(&self, role: &Role) -> bool {
        self.grants.contains_key(role)
    }

    /// Union of the grants of every role in `roles`.
    ///
    /// Pure and infallible; unknown roles contribute the empty set.
    pub fn resolve<'a, I>(&self, roles: I) -> PermissionSet
    where
        I: IntoIterator<Item = &'a Role>,
    {
        let mut resolved = PermissionSet::new();
        for role in roles {
            match self.grants.get(role) {
                Some(grants) => resolved.extend_from(grants),
                None => tracing::debug!(role = %role, "role has no permission mapping"),
            }
        }
        resolved
    }
}

/// Resolve roles against the standard table.
pub fn resolve_permissions<'a, I>(roles: I) -> PermissionSet
where
    I: IntoIterator<Item = &'a Role>,
{
    RoleTable::standard().resolve(roles)
}

static STANDARD_TABLE: LazyLock<RoleTable> = LazyLock::new(|| {
    let platform_admin = ALL
        .iter()
        .filter(|p| p.module() != "admin")
        .cloned()
        .chain([ADMIN_AUDITLOG_READ]);

    RoleTable::new()
        .with_role(names::PLATFORM_OWNER, ALL.iter().cloned())
        .with_role(names::PLATFORM_ADMIN, platform_admin)
        .with_role(
            names::SALES_MANAGER,
            [
                DASHBOARD_READ,
                SALES_RECORD_READ,
                SALES_RECORD_CREATE,
                SALES_RECORD_UPDATE,
                SALES_RECORD_DELETE,
                SALES_RECORD_IMPORT,
                SALES_RECORD_EXPORT,
                RECEIPT_RECORD_READ,
                RECEIPT_RECORD_CREATE,
                RECEIPT_RECORD_UPDATE,
                RECEIPT_RECORD_IMPORT,
                RECEIPT_RECORD_EXPORT,
                PRICING_PRICE_READ,
                PRICING_PRICE_UPDATE,
                PRICING_PRICE_EXPORT,
                CONTRACTS_FILE_READ,
                CONTRACTS_FILE_CREATE,
                CONTRACTS_FILE_UPDATE,
                CONTRACTS_FILE_UPLOAD,
                MASTER_CUSTOMER_READ,
                MASTER_CUSTOMER_CREATE,
                MASTER_CUSTOMER_UPDATE,
                MASTER_PRODUCT_READ,
                MASTER_PRODUCT_CREATE,
                MASTER_PRODUCT_UPDATE,
                HR_EMPLOYEE_UZ_READ,
                HR_EMPLOYEE_UZ_MANAGE,
            ],
        )
        .with_role(
            names::SALES_OPERATOR,
            [
                DASHBOARD_READ,
                SALES_RECORD_READ,
                SALES_RECORD_CREATE,
                SALES_RECORD_UPDATE,
                SALES_RECORD_IMPORT,
                SALES_RECORD_EXPORT,
                RECEIPT_RECORD_READ,
                RECEIPT_RECORD_CREATE,
                RECEIPT_RECORD_UPDATE,
                RECEIPT_RECORD_IMPORT,
                RECEIPT_RECORD_EXPORT,
                PRICING_PRICE_READ,
                CONTRACTS_FILE_READ,
                MASTER_CUSTOMER_READ,
                MASTER_PRODUCT_READ,
                HR_EMPLOYEE_UZ_READ,
            ],
        )
        .with_role(
            names::PRICING_OPERATOR,
            [
                DASHBOARD_READ,
                PRICING_PRICE_READ,
                PRICING_PRICE_UPDATE,
                PRICING_PRICE_EXPORT,
                MASTER_CUSTOMER_READ,
                MASTER_PRODUCT_READ,
            ],
        )
        .with_role(
            names::CONTRACTS_OPERATOR,
            [
                DASHBOARD_READ,
                CONTRACTS_FILE_READ,
                CONTRACTS_FILE_CREATE,
                CONTRACTS_FILE_UPDATE,
                CONTRACTS_FILE_UPLOAD,
                CONTRACTS_FILE_DELETE,
                MASTER_CUSTOMER_READ,
            ],
        )
        .with_role(
            names::FINANCE_RECEIPT_OPERATOR,
            [
                DASHBOARD_READ,
                RECEIPT_RECORD_READ,
                RECEIPT_RECORD_CREATE,
                RECEIPT_RECORD_UPDATE,
                RECEIPT_RECORD_IMPORT,
                RECEIPT_RECORD_EXPORT,
                SALES_RECORD_READ,
                MASTER_CUSTOMER_READ,
            ],
        )
        .with_role(
            names::HR_UZ_ADMIN,
            [
                DASHBOARD_READ,
                HR_EMPLOYEE_UZ_READ,
                HR_EMPLOYEE_UZ_MANAGE,
                HR_EMPLOYEE_UZ_CREATE,
                HR_EMPLOYEE_UZ_UPDATE,
                HR_EMPLOYEE_UZ_DELETE,
                HR_EMPLOYEE_UZ_EXPORT,
            ],
        )
        .with_role(
            names::HR_CN_ADMIN,
            [
                DASHBOARD_READ,
                HR_EMPLOYEE_CN_READ,
                HR_EMPLOYEE_CN_MANAGE,
                HR_EMPLOYEE_CN_PROCESS,
                HR_EMPLOYEE_UZ_READ,
                HR_EMPLOYEE_UZ_MANAGE,
            ],
        )
        .with_role(
            names::BIZ_VIEWER,
            [
                DASHBOARD_READ,
                SALES_RECORD_READ,
                RECEIPT_RECORD_READ,
                PRICING_PRICE_READ,
                CONTRACTS_FILE_READ,
                MASTER_CUSTOMER_READ,
                MASTER_PRODUCT_READ,
                HR_EMPLOYEE_UZ_READ,
            ],
        )
        .with_role(names::AUDIT_VIEWER, [DASHBOARD_READ, ADMIN_AUDITLOG_READ])
});

// ─────────────────────────────────────────────────────────────────────────────
// Role catalogue (for display / listing)
// ─────────────────────────────────────────────────────────────────────────────

/// Tone of the tag used to render a role badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleTone {
    Danger,
    Warning,
    Success,
    Info,
    Default,
}

/// Role definition with its display metadata and granted permissions.
#[derive(Debug, Clone, Serialize)]
pub struct RoleDefinition {
    pub name: Role,
    pub label: &'static str,
    pub tone: RoleTone,
    pub permissions: Vec<String>,
}

const CATALOGUE: &[(Role, &str, RoleTone)] = &[
    (names::PLATFORM_OWNER, "Platform owner", RoleTone::Danger),
    (names::PLATFORM_ADMIN, "System administrator", RoleTone::Danger),
    (names::SALES_MANAGER, "Sales manager", RoleTone::Warning),
    (names::SALES_OPERATOR, "Sales specialist", RoleTone::Success),
    (names::PRICING_OPERATOR, "Pricing administrator", RoleTone::Default),
    (names::CONTRACTS_OPERATOR, "Contracts administrator", RoleTone::Default),
    (names::FINANCE_MANAGER, "Finance manager", RoleTone::Default),
    (names::FINANCE_OPERATOR, "Finance specialist", RoleTone::Default),
    (names::FINANCE_RECEIPT_OPERATOR, "Receipts clerk", RoleTone::Warning),
    (names::HR_UZ_ADMIN, "Local staff administrator", RoleTone::Warning),
    (names::HR_CN_ADMIN, "Expatriate staff administrator", RoleTone::Danger),
    (names::BIZ_VIEWER, "Business viewer", RoleTone::Info),
    (names::AUDIT_VIEWER, "Audit viewer", RoleTone::Info),
];

/// Display label for a role, if it is a known ERP role.
pub fn role_label(role: &Role) -> Option<&'static str> {
    CATALOGUE
        .iter()
        .find(|(name, _, _)| name == role)
        .map(|(_, label, _)| *label)
}

/// Every catalogued role, with permissions resolved against `table`.
pub fn role_definitions(table: &RoleTable) -> Vec<RoleDefinition> {
    CATALOGUE
        .iter()
        .map(|(name, label, tone)| RoleDefinition {
            name: name.clone(),
            label: *label,
            tone: *tone,
            permissions: table
                .permissions_of(name)
                .map(PermissionSet::to_codes)
                .unwrap_or_default(),
        })
        .collect()
}

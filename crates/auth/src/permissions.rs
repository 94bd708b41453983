use std::borrow::{Borrow, Cow};
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Permission code.
///
/// Permissions are opaque strings of the form `{module}.{resource}.{action}`
/// (e.g. `"hr.employee_cn.read"`). Matching is exact string equality; there is
/// no wildcard and no hierarchy between codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(code: impl Into<Cow<'static, str>>) -> Self {
        Self(code.into())
    }

    pub const fn from_static(code: &'static str) -> Self {
        Self(Cow::Borrowed(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading segment of the code (`"sales"` for `"sales.record.read"`).
    pub fn module(&self) -> &str {
        self.as_str().split('.').next().unwrap_or_default()
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

// Ordering and hashing are those of the code string, so sets can be queried by `&str`.
impl Borrow<str> for Permission {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for Permission {
    fn from(value: &'static str) -> Self {
        Self::from_static(value)
    }
}

impl From<String> for Permission {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

/// A set of permission codes.
///
/// Membership is the only question consumers ask of it. Backed by an ordered
/// set so two sets with the same members compare and serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, permission: Permission) -> bool {
        self.0.insert(permission)
    }

    pub fn contains(&self, permission: &Permission) -> bool {
        self.0.contains(permission)
    }

    /// Lookup by raw code, for callers holding a `&str`.
    pub fn contains_code(&self, code: &str) -> bool {
        self.0.contains(code)
    }

    /// True if at least one of `required` is held. An empty list holds nothing.
    pub fn contains_any<'a, I>(&self, required: I) -> bool
    where
        I: IntoIterator<Item = &'a Permission>,
    {
        required.into_iter().any(|p| self.contains(p))
    }

    /// True if every one of `required` is held (vacuously true when empty).
    pub fn contains_all<'a, I>(&self, required: I) -> bool
    where
        I: IntoIterator<Item = &'a Permission>,
    {
        required.into_iter().all(|p| self.contains(p))
    }

    pub fn is_subset(&self, other: &PermissionSet) -> bool {
        self.0.is_subset(&other.0)
    }

    pub fn extend_from(&mut self, other: &PermissionSet) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn union(&self, other: &PermissionSet) -> PermissionSet {
        Self(self.0.union(&other.0).cloned().collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }

    pub fn to_codes(&self) -> Vec<String> {
        self.0.iter().map(|p| p.as_str().to_string()).collect()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Permission> for PermissionSet {
    fn extend<T: IntoIterator<Item = Permission>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl<'a> IntoIterator for &'a PermissionSet {
    type Item = &'a Permission;
    type IntoIter = std::collections::btree_set::Iter<'a, Permission>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for PermissionSet {
    type Item = Permission;
    type IntoIter = std::collections::btree_set::IntoIter<Permission>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Permission catalogue
// ─────────────────────────────────────────────────────────────────────────────

/// Every permission code known to the ERP.
///
/// Action vocabulary: read / create / update / delete / import / export /
/// upload / process / manage.
pub mod codes {
    use super::Permission;

    // Sales ledger
    pub const SALES_RECORD_READ: Permission = Permission::from_static("sales.record.read");
    pub const SALES_RECORD_CREATE: Permission = Permission::from_static("sales.record.create");
    pub const SALES_RECORD_UPDATE: Permission = Permission::from_static("sales.record.update");
    pub const SALES_RECORD_DELETE: Permission = Permission::from_static("sales.record.delete");
    pub const SALES_RECORD_IMPORT: Permission = Permission::from_static("sales.record.import");
    pub const SALES_RECORD_EXPORT: Permission = Permission::from_static("sales.record.export");

    // Receipts
    pub const RECEIPT_RECORD_READ: Permission = Permission::from_static("receipt.record.read");
    pub const RECEIPT_RECORD_CREATE: Permission = Permission::from_static("receipt.record.create");
    pub const RECEIPT_RECORD_UPDATE: Permission = Permission::from_static("receipt.record.update");
    pub const RECEIPT_RECORD_DELETE: Permission = Permission::from_static("receipt.record.delete");
    pub const RECEIPT_RECORD_IMPORT: Permission = Permission::from_static("receipt.record.import");
    pub const RECEIPT_RECORD_EXPORT: Permission = Permission::from_static("receipt.record.export");

    // Pricing
    pub const PRICING_PRICE_READ: Permission = Permission::from_static("pricing.price.read");
    pub const PRICING_PRICE_UPDATE: Permission = Permission::from_static("pricing.price.update");
    pub const PRICING_PRICE_EXPORT: Permission = Permission::from_static("pricing.price.export");

    // Contracts
    pub const CONTRACTS_FILE_READ: Permission = Permission::from_static("contracts.file.read");
    pub const CONTRACTS_FILE_CREATE: Permission = Permission::from_static("contracts.file.create");
    pub const CONTRACTS_FILE_UPDATE: Permission = Permission::from_static("contracts.file.update");
    pub const CONTRACTS_FILE_DELETE: Permission = Permission::from_static("contracts.file.delete");
    pub const CONTRACTS_FILE_UPLOAD: Permission = Permission::from_static("contracts.file.upload");

    // Master data
    pub const MASTER_CUSTOMER_READ: Permission = Permission::from_static("master.customer.read");
    pub const MASTER_CUSTOMER_CREATE: Permission = Permission::from_static("master.customer.create");
    pub const MASTER_CUSTOMER_UPDATE: Permission = Permission::from_static("master.customer.update");
    pub const MASTER_CUSTOMER_DELETE: Permission = Permission::from_static("master.customer.delete");

    pub const MASTER_PRODUCT_READ: Permission = Permission::from_static("master.product.read");
    pub const MASTER_PRODUCT_CREATE: Permission = Permission::from_static("master.product.create");
    pub const MASTER_PRODUCT_UPDATE: Permission = Permission::from_static("master.product.update");
    pub const MASTER_PRODUCT_DELETE: Permission = Permission::from_static("master.product.delete");

    // HR: local staff
    pub const HR_EMPLOYEE_UZ_READ: Permission = Permission::from_static("hr.employee_uz.read");
    pub const HR_EMPLOYEE_UZ_MANAGE: Permission = Permission::from_static("hr.employee_uz.manage");
    pub const HR_EMPLOYEE_UZ_CREATE: Permission = Permission::from_static("hr.employee_uz.create");
    pub const HR_EMPLOYEE_UZ_UPDATE: Permission = Permission::from_static("hr.employee_uz.update");
    pub const HR_EMPLOYEE_UZ_DELETE: Permission = Permission::from_static("hr.employee_uz.delete");
    pub const HR_EMPLOYEE_UZ_EXPORT: Permission = Permission::from_static("hr.employee_uz.export");

    // HR: expatriate staff
    pub const HR_EMPLOYEE_CN_READ: Permission = Permission::from_static("hr.employee_cn.read");
    pub const HR_EMPLOYEE_CN_MANAGE: Permission = Permission::from_static("hr.employee_cn.manage");
    pub const HR_EMPLOYEE_CN_PROCESS: Permission = Permission::from_static("hr.employee_cn.process");

    // Administration
    pub const ADMIN_USER_MANAGE: Permission = Permission::from_static("admin.user.manage");
    pub const ADMIN_AUDITLOG_READ: Permission = Permission::from_static("admin.auditlog.read");

    pub const DASHBOARD_READ: Permission = Permission::from_static("dashboard.read");

    /// The whole catalogue, in declaration order.
    pub const ALL: &[Permission] = &[
        SALES_RECORD_READ,
        SALES_RECORD_CREATE,
        SALES_RECORD_UPDATE,
        SALES_RECORD_DELETE,
        SALES_RECORD_IMPORT,
        SALES_RECORD_EXPORT,
        RECEIPT_RECORD_READ,
        RECEIPT_RECORD_CREATE,
        RECEIPT_RECORD_UPDATE,
        RECEIPT_RECORD_DELETE,
        RECEIPT_RECORD_IMPORT,
        RECEIPT_RECORD_EXPORT,
        PRICING_PRICE_READ,
        PRICING_PRICE_UPDATE,
        PRICING_PRICE_EXPORT,
        CONTRACTS_FILE_READ,
        CONTRACTS_FILE_CREATE,
        CONTRACTS_FILE_UPDATE,
        CONTRACTS_FILE_DELETE,
        CONTRACTS_FILE_UPLOAD,
        MASTER_CUSTOMER_READ,
        MASTER_CUSTOMER_CREATE,
        MASTER_CUSTOMER_UPDATE,
        MASTER_CUSTOMER_DELETE,
        MASTER_PRODUCT_READ,
        MASTER_PRODUCT_CREATE,
        MASTER_PRODUCT_UPDATE,
        MASTER_PRODUCT_DELETE,
        HR_EMPLOYEE_UZ_READ,
        HR_EMPLOYEE_UZ_MANAGE,
        HR_EMPLOYEE_UZ_CREATE,
        HR_EMPLOYEE_UZ_UPDATE,
        HR_EMPLOYEE_UZ_DELETE,
        HR_EMPLOYEE_UZ_EXPORT,
        HR_EMPLOYEE_CN_READ,
        HR_EMPLOYEE_CN_MANAGE,
        HR_EMPLOYEE_CN_PROCESS,
        ADMIN_USER_MANAGE,
        ADMIN_AUDITLOG_READ,
        DASHBOARD_READ,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(codes: &[&'static str]) -> PermissionSet {
        codes.iter().map(|c| Permission::from_static(*c)).collect()
    }

    #[test]
    fn catalogue_codes_are_unique() {
        let unique: PermissionSet = codes::ALL.iter().cloned().collect();
        assert_eq!(unique.len(), codes::ALL.len());
    }

    #[test]
    fn module_is_leading_segment() {
        assert_eq!(codes::HR_EMPLOYEE_CN_READ.module(), "hr");
        assert_eq!(codes::DASHBOARD_READ.module(), "dashboard");
        assert_eq!(Permission::new("").module(), "");
    }

    #[test]
    fn owned_and_static_codes_compare_equal() {
        let owned = Permission::from("sales.record.read".to_string());
        assert_eq!(owned, codes::SALES_RECORD_READ);
        assert!(set(&["sales.record.read"]).contains(&owned));
    }

    #[test]
    fn any_and_all_semantics() {
        let held = set(&["a.b.read", "a.b.update"]);
        let read = Permission::from_static("a.b.read");
        let delete = Permission::from_static("a.b.delete");

        assert!(held.contains_any([&read, &delete]));
        assert!(!held.contains_any([&delete]));
        assert!(!held.contains_any(std::iter::empty()));

        assert!(!held.contains_all([&read, &delete]));
        assert!(held.contains_all([&read]));
        assert!(held.contains_all(std::iter::empty()));
    }

    #[test]
    fn no_wildcard_matching() {
        let held = set(&["*", "hr.*"]);
        assert!(!held.contains(&codes::HR_EMPLOYEE_CN_READ));
        assert!(held.contains_code("*"));
    }

    #[test]
    fn code_lookup_matches_owned_and_static_codes() {
        let mut held = set(&["sales.record.read"]);
        held.insert(Permission::new(String::from("pricing.price.read")));

        assert!(held.contains_code("sales.record.read"));
        assert!(held.contains_code(&String::from("pricing.price.read")));
        assert!(!held.contains_code("sales.record"));
        assert!(!held.contains_code("sales.record.read "));
    }

    #[test]
    fn union_collapses_duplicates() {
        let a = set(&["x.y.read", "x.y.update"]);
        let b = set(&["x.y.update", "z.w.read"]);
        let u = a.union(&b);
        assert_eq!(u.len(), 3);
        assert!(a.is_subset(&u) && b.is_subset(&u));
    }

    #[test]
    fn serializes_as_sorted_list() {
        let json = serde_json::to_string(&set(&["b.b.read", "a.a.read"])).unwrap();
        assert_eq!(json, r#"["a.a.read","b.b.read"]"#);
    }
}

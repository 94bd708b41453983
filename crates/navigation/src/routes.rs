//! Route table: nested route records flattened into navigable full paths.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use erpgate_auth::{Role, codes};

use crate::error::{NavigationError, NavigationResult};
use crate::gate::{Gate, check_fields};

const RECORD_FIELDS: &[&str] = &["path", "name", "redirect", "meta", "children"];
const META_FIELDS: &[&str] = &["requiresAuth", "module", "title"];

/// Redirect chains longer than this are treated as loops.
const MAX_REDIRECT_HOPS: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMeta {
    #[serde(default)]
    pub requires_auth: bool,
    #[serde(flatten)]
    pub gate: Gate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// One route as authored. Child paths are relative to the parent unless they
/// start with `/`. A record with children is a layout and is not itself a
/// navigation target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(default)]
    pub meta: RouteMeta,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteRecord>,
}

impl RouteRecord {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: Some(name.into()),
            redirect: None,
            meta: RouteMeta::default(),
            children: Vec::new(),
        }
    }

    pub fn redirect(path: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: None,
            redirect: Some(to.into()),
            meta: RouteMeta::default(),
            children: Vec::new(),
        }
    }

    pub fn layout(path: impl Into<String>, children: Vec<RouteRecord>) -> Self {
        Self {
            path: path.into(),
            name: None,
            redirect: None,
            meta: RouteMeta::default(),
            children,
        }
    }

    pub fn requires_auth(mut self) -> Self {
        self.meta.requires_auth = true;
        self
    }

    pub fn gated(mut self, gate: Gate) -> Self {
        self.meta.gate = gate;
        self
    }

    pub fn titled(mut self, module: impl Into<String>, title: impl Into<String>) -> Self {
        self.meta.module = Some(module.into());
        self.meta.title = Some(title.into());
        self
    }
}

/// A navigable route with the metadata of its whole ancestor chain folded in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRoute {
    pub path: String,
    pub name: Option<String>,
    pub redirect: Option<String>,
    /// True if any record on the chain requires authentication.
    pub requires_auth: bool,
    /// Gate of the deepest record on the chain that declares one.
    pub gate: Gate,
    pub module: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<ResolvedRoute>,
    by_path: HashMap<String, usize>,
}

impl RouteTable {
    pub fn new(records: Vec<RouteRecord>) -> NavigationResult<Self> {
        let mut table = Self::default();
        for record in &records {
            table.register(record, "/", &Inherited::default())?;
        }
        Ok(table)
    }

    /// Parse a JSON array of route records. Unknown record or `meta` fields
    /// are rejected; gate fields are read from `meta` only.
    pub fn from_json(text: &str) -> NavigationResult<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        check_route_fields(&value)?;
        let records: Vec<RouteRecord> = serde_json::from_value(value)?;
        Self::new(records)
    }

    pub fn routes(&self) -> &[ResolvedRoute] {
        &self.routes
    }

    /// Exact lookup, without following redirects.
    pub fn get(&self, path: &str) -> Option<&ResolvedRoute> {
        self.by_path.get(&normalize_path(path)).map(|&idx| &self.routes[idx])
    }

    /// Look up `path`, following redirect records to their final target.
    ///
    /// Returns `None` for unknown paths and for redirect loops.
    pub fn resolve(&self, path: &str) -> Option<&ResolvedRoute> {
        let mut current = self.get(path)?;
        for _ in 0..MAX_REDIRECT_HOPS {
            match &current.redirect {
                None => return Some(current),
                Some(target) => current = self.get(target)?,
            }
        }
        tracing::warn!(path, "redirect chain too long; treating route as unmatched");
        None
    }

    /// The ERP's routes.
    pub fn standard() -> Self {
        let records = vec![
            RouteRecord::new("/login", "login"),
            RouteRecord::layout(
                "/",
                vec![
                    RouteRecord::redirect("", "/dashboard"),
                    RouteRecord::new("dashboard", "dashboard").titled("dashboard", "Dashboard"),
                    RouteRecord::new("pricing/prices", "pricing-prices").titled("pricing", "Prices"),
                    RouteRecord::new("master/customers", "master-customers")
                        .titled("master", "Customers"),
                    RouteRecord::new("master/products", "master-products")
                        .titled("master", "Products"),
                    RouteRecord::new("contracts", "contracts").titled("contracts", "Contracts"),
                    RouteRecord::new("sales", "sales").titled("sales", "Sales"),
                    RouteRecord::new("hr/employees-uz", "hr-employees-uz")
                        .titled("hr", "Local staff"),
                    RouteRecord::layout(
                        "hr/employees-cn",
                        vec![
                            RouteRecord::redirect("", "/hr/employees-cn/archives"),
                            RouteRecord::new("archives", "hr-cn-archives").titled("hr", "Archives"),
                            RouteRecord::new("process", "hr-cn-process")
                                .titled("hr", "Process center"),
                            RouteRecord::new("attendance", "hr-cn-attendance")
                                .titled("hr", "Attendance"),
                            RouteRecord::new("todos", "hr-cn-todos").titled("hr", "To-do center"),
                            RouteRecord::new("operation-log", "hr-cn-operation-log")
                                .titled("hr", "Operation log")
                                .gated(Gate::any_of([codes::ADMIN_AUDITLOG_READ])),
                        ],
                    )
                    .gated(Gate::any_of([codes::HR_EMPLOYEE_CN_READ])),
                    RouteRecord::new("admin/users", "admin-users")
                        .titled("admin", "Users and roles")
                        .gated(Gate::primary_role_in([Role::from_static("super_admin")])),
                ],
            )
            .requires_auth(),
        ];

        // An empty table denies every navigation, which is the safe failure.
        Self::new(records).unwrap_or_else(|err| {
            tracing::error!(error = %err, "standard route table rejected");
            Self::default()
        })
    }

    fn register(
        &mut self,
        record: &RouteRecord,
        parent_path: &str,
        inherited: &Inherited,
    ) -> NavigationResult<()> {
        let path = join_paths(parent_path, &record.path);
        let inherited = inherited.extend(&record.meta);

        if !record.children.is_empty() {
            for child in &record.children {
                self.register(child, &path, &inherited)?;
            }
            return Ok(());
        }

        if self.by_path.contains_key(&path) {
            return Err(NavigationError::DuplicateRoute(path));
        }

        self.by_path.insert(path.clone(), self.routes.len());
        self.routes.push(ResolvedRoute {
            path,
            name: record.name.clone(),
            redirect: record.redirect.as_deref().map(normalize_path),
            requires_auth: inherited.requires_auth,
            gate: inherited.gate.clone(),
            module: record.meta.module.clone(),
            title: record.meta.title.clone(),
        });
        Ok(())
    }
}

fn check_route_fields(records: &serde_json::Value) -> NavigationResult<()> {
    let Some(records) = records.as_array() else {
        return Ok(());
    };
    for record in records {
        let path = record.get("path").and_then(serde_json::Value::as_str).unwrap_or("?");
        check_fields(record, RECORD_FIELDS, false, &format!("route '{path}'"))?;
        if let Some(meta) = record.get("meta") {
            check_fields(meta, META_FIELDS, true, &format!("meta of route '{path}'"))?;
        }
        if let Some(children) = record.get("children") {
            check_route_fields(children)?;
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
struct Inherited {
    requires_auth: bool,
    gate: Gate,
}

impl Inherited {
    fn extend(&self, meta: &RouteMeta) -> Self {
        Self {
            requires_auth: self.requires_auth || meta.requires_auth,
            gate: if meta.gate.is_open() {
                self.gate.clone()
            } else {
                meta.gate.clone()
            },
        }
    }
}

/// Canonical form: leading `/`, no trailing `/` (except root), no query or
/// fragment.
pub fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_matches('/');
    let mut out = String::with_capacity(trimmed.len() + 1);
    out.push('/');
    out.push_str(trimmed);
    out
}

fn join_paths(parent: &str, child: &str) -> String {
    if child.starts_with('/') {
        return normalize_path(child);
    }
    normalize_path(&format!("{}/{}", parent.trim_end_matches('/'), child))
}

#[cfg(test)]
mod tests {
    use super::*;
    use erpgate_auth::Permission;

    #[test]
    fn normalizes_paths() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("sales"), "/sales");
        assert_eq!(normalize_path("/sales/"), "/sales");
        assert_eq!(normalize_path("/sales?tab=receipts#top"), "/sales");
    }

    #[test]
    fn joins_child_paths() {
        assert_eq!(join_paths("/", ""), "/");
        assert_eq!(join_paths("/", "dashboard"), "/dashboard");
        assert_eq!(join_paths("/hr", "employees-cn"), "/hr/employees-cn");
        assert_eq!(join_paths("/hr", "/login"), "/login");
    }

    #[test]
    fn standard_table_flattens_layout_children() {
        let table = RouteTable::standard();
        let sales = table.get("/sales").unwrap();
        assert!(sales.requires_auth);
        assert!(sales.gate.is_open());
        assert_eq!(sales.name.as_deref(), Some("sales"));

        let login = table.get("/login").unwrap();
        assert!(!login.requires_auth);
    }

    #[test]
    fn root_redirects_to_dashboard() {
        let table = RouteTable::standard();
        assert_eq!(table.get("/").unwrap().redirect.as_deref(), Some("/dashboard"));
        assert_eq!(table.resolve("/").unwrap().path, "/dashboard");
    }

    #[test]
    fn expatriate_staff_section_is_gated_throughout() {
        let table = RouteTable::standard();
        let landing = table.resolve("/hr/employees-cn").unwrap();
        assert_eq!(landing.path, "/hr/employees-cn/archives");
        assert_eq!(landing.gate, Gate::any_of([codes::HR_EMPLOYEE_CN_READ]));

        let log = table.get("/hr/employees-cn/operation-log").unwrap();
        assert_eq!(log.gate, Gate::any_of([codes::ADMIN_AUDITLOG_READ]));
    }

    #[test]
    fn unknown_paths_do_not_resolve() {
        assert!(RouteTable::standard().resolve("/nowhere").is_none());
    }

    #[test]
    fn redirect_loops_do_not_resolve() {
        let table = RouteTable::new(vec![
            RouteRecord::redirect("/a", "/b"),
            RouteRecord::redirect("/b", "/a"),
        ])
        .unwrap();
        assert!(table.resolve("/a").is_none());
    }

    #[test]
    fn deepest_gate_wins_and_auth_is_inherited() {
        let table = RouteTable::new(vec![
            RouteRecord::layout(
                "/hr",
                vec![
                    RouteRecord::new("archives", "archives"),
                    RouteRecord::new("log", "log")
                        .gated(Gate::any_of([Permission::new("admin.auditlog.read")])),
                ],
            )
            .requires_auth()
            .gated(Gate::any_of([Permission::new("hr.employee_cn.read")])),
        ])
        .unwrap();

        let archives = table.get("/hr/archives").unwrap();
        assert!(archives.requires_auth);
        assert_eq!(archives.gate, Gate::any_of([Permission::new("hr.employee_cn.read")]));

        let log = table.get("/hr/log").unwrap();
        assert_eq!(log.gate, Gate::any_of([Permission::new("admin.auditlog.read")]));
    }

    #[test]
    fn duplicate_paths_are_rejected() {
        let err = RouteTable::new(vec![
            RouteRecord::new("/sales", "sales"),
            RouteRecord::layout("/", vec![RouteRecord::new("sales", "sales-again")]),
        ])
        .unwrap_err();
        assert!(matches!(err, NavigationError::DuplicateRoute(path) if path == "/sales"));
    }

    #[test]
    fn loads_from_json() {
        let table = RouteTable::from_json(
            r#"[
                {"path": "/login", "name": "login"},
                {"path": "/", "meta": {"requiresAuth": true}, "children": [
                    {"path": "admin/users", "name": "admin-users",
                     "meta": {"requiredRole": ["super_admin"], "module": "admin"}}
                ]}
            ]"#,
        )
        .unwrap();

        let admin = table.get("/admin/users").unwrap();
        assert!(admin.requires_auth);
        assert_eq!(admin.gate, Gate::primary_role_in([Role::new("super_admin")]));
        assert_eq!(admin.module.as_deref(), Some("admin"));
    }

    #[test]
    fn older_gate_spelling_in_meta_is_read() {
        let table = RouteTable::from_json(
            r#"[{"path": "/admin/users", "name": "admin-users",
                 "meta": {"requiresAuth": true, "requiresRole": ["super_admin"]}}]"#,
        )
        .unwrap();
        let admin = table.get("/admin/users").unwrap();
        assert_eq!(admin.gate, Gate::primary_role_in([Role::new("super_admin")]));
    }

    #[test]
    fn unknown_route_fields_are_rejected() {
        let misspelled_meta = RouteTable::from_json(
            r#"[{"path": "/admin/users", "meta": {"requiredRoles": ["super_admin"]}}]"#,
        )
        .unwrap_err();
        assert!(matches!(
            misspelled_meta,
            NavigationError::UnknownField { ref field, .. } if field == "requiredRoles"
        ));

        let gate_outside_meta = RouteTable::from_json(
            r#"[{"path": "/", "children": [
                {"path": "admin/users", "requiredRole": ["super_admin"]}
            ]}]"#,
        )
        .unwrap_err();
        assert!(matches!(
            gate_outside_meta,
            NavigationError::UnknownField { ref location, .. } if location == "route 'admin/users'"
        ));
    }
}

//! Sidebar menu tree and its permission filter.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use erpgate_auth::{Access, PermissionSet, Role, codes};

use crate::error::{NavigationError, NavigationResult};
use crate::gate::{Gate, check_fields};

const ITEM_FIELDS: &[&str] = &["kind", "key", "title", "icon"];
const GROUP_FIELDS: &[&str] = &["kind", "key", "title", "icon", "children"];

/// Leaf entry; `key` is the route path it opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub key: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(flatten)]
    pub gate: Gate,
}

/// Collapsible group of entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuGroup {
    pub key: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(flatten)]
    pub gate: Gate,
    pub children: Vec<MenuNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MenuNode {
    Item(MenuItem),
    Group(MenuGroup),
}

impl MenuNode {
    pub fn item(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self::Item(MenuItem {
            key: key.into(),
            title: title.into(),
            icon: None,
            gate: Gate::open(),
        })
    }

    pub fn group(key: impl Into<String>, title: impl Into<String>, children: Vec<MenuNode>) -> Self {
        Self::Group(MenuGroup {
            key: key.into(),
            title: title.into(),
            icon: None,
            gate: Gate::open(),
            children,
        })
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        match &mut self {
            Self::Item(item) => item.icon = Some(icon.into()),
            Self::Group(group) => group.icon = Some(icon.into()),
        }
        self
    }

    pub fn gated(mut self, gate: Gate) -> Self {
        match &mut self {
            Self::Item(item) => item.gate = gate,
            Self::Group(group) => group.gate = gate,
        }
        self
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Item(item) => &item.key,
            Self::Group(group) => &group.key,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Item(item) => &item.title,
            Self::Group(group) => &group.title,
        }
    }

    pub fn gate(&self) -> &Gate {
        match self {
            Self::Item(item) => &item.gate,
            Self::Group(group) => &group.gate,
        }
    }

    pub fn children(&self) -> &[MenuNode] {
        match self {
            Self::Item(_) => &[],
            Self::Group(group) => &group.children,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Filter
// ─────────────────────────────────────────────────────────────────────────────

/// Visible subset of `tree` for a user holding `permissions`.
///
/// Depth-first and order-preserving. Leaves survive when their gate admits
/// the user. Groups survive when their own gate admits the user *and* at
/// least one child survives; a surviving group is a fresh copy carrying only
/// the surviving children. The input is left untouched.
pub fn filter_menu(tree: &[MenuNode], permissions: &PermissionSet) -> Vec<MenuNode> {
    filter_nodes(tree, &Access::new(permissions))
}

/// [`filter_menu`] with the primary role available to legacy role gates.
pub fn filter_menu_with_role(
    tree: &[MenuNode],
    permissions: &PermissionSet,
    primary_role: Option<&Role>,
) -> Vec<MenuNode> {
    filter_nodes(tree, &Access::new(permissions).with_primary_role(primary_role))
}

pub fn filter_nodes(tree: &[MenuNode], access: &Access<'_>) -> Vec<MenuNode> {
    tree.iter()
        .filter_map(|node| match node {
            MenuNode::Item(item) => item.gate.admits(access).then(|| node.clone()),
            MenuNode::Group(group) => {
                if !group.gate.admits(access) {
                    return None;
                }
                let children = filter_nodes(&group.children, access);
                if children.is_empty() {
                    return None;
                }
                Some(MenuNode::Group(MenuGroup {
                    key: group.key.clone(),
                    title: group.title.clone(),
                    icon: group.icon.clone(),
                    gate: group.gate.clone(),
                    children,
                }))
            }
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tree
// ─────────────────────────────────────────────────────────────────────────────

/// Immutable menu configuration with keys unique across the whole tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MenuTree {
    nodes: Vec<MenuNode>,
}

impl MenuTree {
    pub fn new(nodes: Vec<MenuNode>) -> NavigationResult<Self> {
        let mut seen = HashSet::new();
        check_unique_keys(&nodes, &mut seen)?;
        Ok(Self { nodes })
    }

    /// Parse a JSON array of nodes. Fields nothing reads are rejected, so a
    /// misspelled gate cannot load as an open one.
    pub fn from_json(text: &str) -> NavigationResult<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        check_menu_fields(&value)?;
        let nodes: Vec<MenuNode> = serde_json::from_value(value)?;
        Self::new(nodes)
    }

    pub fn nodes(&self) -> &[MenuNode] {
        &self.nodes
    }

    pub fn visible_for(&self, access: &Access<'_>) -> Vec<MenuNode> {
        let visible = filter_nodes(&self.nodes, access);
        tracing::debug!(
            top_level = visible.len(),
            primary_role = access.primary_role().map(Role::as_str),
            "menu filtered"
        );
        visible
    }

    /// Depth-first search by key.
    pub fn find(&self, key: &str) -> Option<&MenuNode> {
        find_in(&self.nodes, key)
    }

    /// The ERP sidebar.
    pub fn standard() -> Self {
        let nodes = vec![
            MenuNode::item("/dashboard", "Dashboard").with_icon("Odometer"),
            MenuNode::group(
                "master",
                "Master data",
                vec![
                    MenuNode::item("/master/customers", "Customers"),
                    MenuNode::item("/master/products", "Products"),
                ],
            )
            .with_icon("FolderOpened"),
            MenuNode::group(
                "business",
                "Business",
                vec![
                    MenuNode::item("/pricing/prices", "Prices"),
                    MenuNode::item("/contracts", "Contracts"),
                    MenuNode::item("/sales", "Sales"),
                ],
            )
            .with_icon("Document"),
            MenuNode::group(
                "hr",
                "Staff",
                vec![
                    MenuNode::item("/hr/employees-uz", "Local staff"),
                    MenuNode::group(
                        "hr-employees-cn",
                        "Expatriate staff",
                        vec![
                            MenuNode::item("/hr/employees-cn/archives", "Archives"),
                            MenuNode::item("/hr/employees-cn/process", "Process center"),
                            MenuNode::item("/hr/employees-cn/attendance", "Attendance"),
                            MenuNode::item("/hr/employees-cn/todos", "To-do center"),
                            MenuNode::item("/hr/employees-cn/operation-log", "Operation log")
                                .gated(Gate::any_of([codes::ADMIN_AUDITLOG_READ])),
                        ],
                    )
                    .gated(Gate::any_of([codes::HR_EMPLOYEE_CN_READ])),
                ],
            )
            .with_icon("User"),
            MenuNode::group(
                "admin",
                "Administration",
                vec![MenuNode::item("/admin/users", "Users and roles")],
            )
            .with_icon("Tools")
            .gated(Gate::any_of([codes::ADMIN_USER_MANAGE])),
        ];

        Self { nodes }
    }
}

fn check_unique_keys<'a>(nodes: &'a [MenuNode], seen: &mut HashSet<&'a str>) -> NavigationResult<()> {
    for node in nodes {
        if !seen.insert(node.key()) {
            tracing::warn!(key = node.key(), "duplicate menu key");
            return Err(NavigationError::DuplicateMenuKey(node.key().to_string()));
        }
        check_unique_keys(node.children(), seen)?;
    }
    Ok(())
}

fn check_menu_fields(nodes: &serde_json::Value) -> NavigationResult<()> {
    let Some(nodes) = nodes.as_array() else {
        return Ok(());
    };
    for node in nodes {
        let key = node.get("key").and_then(serde_json::Value::as_str).unwrap_or("?");
        let is_group = node.get("kind").and_then(serde_json::Value::as_str) == Some("group");
        let own = if is_group { GROUP_FIELDS } else { ITEM_FIELDS };
        check_fields(node, own, true, &format!("menu node '{key}'"))?;
        if let Some(children) = node.get("children") {
            check_menu_fields(children)?;
        }
    }
    Ok(())
}

fn find_in<'a>(nodes: &'a [MenuNode], key: &str) -> Option<&'a MenuNode> {
    nodes.iter().find_map(|node| {
        if node.key() == key {
            Some(node)
        } else {
            find_in(node.children(), key)
        }
    })
}

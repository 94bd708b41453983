//! `erpgate-navigation`: permission-aware menus and route guarding.
//!
//! Everything here is a pure function of the session snapshot handed in,
//! except [`NavigationGuard::before_each`], which first makes sure the session
//! has been loaded.

pub mod config;
pub mod error;
pub mod gate;
pub mod guard;
pub mod menu;
pub mod routes;

pub use config::NavigationConfig;
pub use error::{NavigationError, NavigationResult};
pub use gate::Gate;
pub use guard::{NavigationDecision, NavigationGuard, RedirectReason};
pub use menu::{
    MenuGroup, MenuItem, MenuNode, MenuTree, filter_menu, filter_menu_with_role, filter_nodes,
};
pub use routes::{ResolvedRoute, RouteMeta, RouteRecord, RouteTable, normalize_path};

pub use erpgate_auth::is_visible;

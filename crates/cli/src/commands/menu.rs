use anyhow::{Context, Result};
use std::path::Path;

use erpgate_auth::RoleTable;
use erpgate_navigation::MenuTree;

use super::{print_json, read_file};
use crate::Identity;

pub fn execute(identity: &Identity, menu: Option<&Path>) -> Result<()> {
    let tree = match menu {
        Some(path) => MenuTree::from_json(&read_file(path)?)
            .with_context(|| format!("invalid menu tree in {}", path.display()))?,
        None => MenuTree::standard(),
    };

    let authorization = identity.authorization();
    let effective = authorization.effective_permissions_with(RoleTable::standard());
    let access = erpgate_auth::Access::new(&effective)
        .with_primary_role(authorization.primary_role());

    print_json(&tree.visible_for(&access))
}

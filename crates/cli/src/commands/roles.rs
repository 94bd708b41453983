use anyhow::Result;

use erpgate_auth::{RoleTable, role_definitions};

use super::print_json;

pub fn execute() -> Result<()> {
    print_json(&role_definitions(RoleTable::standard()))
}

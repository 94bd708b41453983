pub mod check;
pub mod menu;
pub mod roles;

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use erpgate_auth::{AuthorizationState, Permission, Role};

use crate::Identity;

impl Identity {
    pub fn authorization(&self) -> AuthorizationState {
        AuthorizationState::new(
            self.roles.iter().cloned().map(Role::new),
            self.permissions.iter().cloned().map(Permission::new),
        )
    }
}

pub(crate) fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

//! `erpgate-auth`: permission resolution and session state for the ERP client.
//!
//! Pure access checks live next to the async session holder; nothing here
//! talks to a backend directly.

pub mod authorize;
pub mod claims;
pub mod context;
pub mod error;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{Access, is_visible};
pub use claims::{SessionClaims, TokenValidationError, validate_claims};
pub use context::{AuthContext, AuthSnapshot, AuthSource, StaticAuthSource};
pub use error::{AuthError, AuthResult};
pub use permissions::{Permission, PermissionSet, codes};
pub use principal::{AuthorizationState, PrincipalId, resolve_effective_permissions};
pub use roles::{
    Role, RoleDefinition, RoleTable, RoleTone, names, resolve_permissions, role_definitions,
    role_label,
};

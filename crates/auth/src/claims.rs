use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AuthorizationState, Permission, PrincipalId, Role};

/// Session claims as handed over by the auth backend once a session is
/// established or refreshed.
///
/// Token decoding and signature checks happen upstream; this crate only looks
/// at the decoded claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject / principal identifier.
    pub sub: PrincipalId,

    /// Login email, shown as the acting user on edits.
    #[serde(default)]
    pub email: String,

    /// Assigned role codes; the first one is the primary role.
    #[serde(default)]
    pub roles: Vec<Role>,

    /// Explicitly issued permission codes (may be empty).
    #[serde(default)]
    pub permissions: Vec<Permission>,

    pub issued_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,
}

impl SessionClaims {
    pub fn authorization(&self) -> AuthorizationState {
        AuthorizationState::new(self.roles.iter().cloned(), self.permissions.iter().cloned())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("session has expired")]
    Expired,

    #[error("session not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid session time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Check the claims' validity window against `now`.
pub fn validate_claims(claims: &SessionClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

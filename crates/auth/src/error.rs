use thiserror::Error;

/// Failures talking to the auth backend.
///
/// Access decisions never produce these; only session refresh and sign-out do.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The backend could not be reached or returned an unusable answer.
    #[error("auth backend unavailable: {0}")]
    Unavailable(String),

    /// The backend refused to end the session.
    #[error("sign-out failed: {0}")]
    SignOut(String),
}

impl AuthError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn sign_out(msg: impl Into<String>) -> Self {
        Self::SignOut(msg.into())
    }
}

pub type AuthResult<T> = Result<T, AuthError>;

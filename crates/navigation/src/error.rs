use thiserror::Error;

/// Structural problems in navigation configuration.
///
/// These surface when a menu tree, route table or config is built. Unknown
/// permission or role codes are not errors: such gates simply never match.
#[derive(Debug, Error)]
pub enum NavigationError {
    /// Two menu nodes share a key.
    #[error("duplicate menu key '{0}'")]
    DuplicateMenuKey(String),

    /// Two navigable routes resolve to the same full path.
    #[error("duplicate route path '{0}'")]
    DuplicateRoute(String),

    /// A configuration object carries a field nothing reads, such as a
    /// misspelled gate. Loading it would silently drop the restriction.
    #[error("unknown field '{field}' in {location}")]
    UnknownField { location: String, field: String },

    /// Configuration text could not be parsed.
    #[error("invalid navigation config: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type NavigationResult<T> = Result<T, NavigationError>;

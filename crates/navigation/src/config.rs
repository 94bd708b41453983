use serde::{Deserialize, Serialize};

use crate::error::NavigationResult;
use crate::routes::normalize_path;

pub const ENV_LOGIN_ROUTE: &str = "ERPGATE_LOGIN_ROUTE";
pub const ENV_FALLBACK_ROUTE: &str = "ERPGATE_FALLBACK_ROUTE";
pub const ENV_HOME_ROUTE: &str = "ERPGATE_HOME_ROUTE";

/// Where the navigation guard sends users it turns away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NavigationConfig {
    /// Target for anonymous users hitting protected routes.
    pub login_route: String,
    /// Target for signed-in users lacking access.
    pub fallback_route: String,
    /// Target for signed-in users opening the login page.
    pub home_route: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            login_route: "/login".to_string(),
            fallback_route: "/pricing/prices".to_string(),
            home_route: "/".to_string(),
        }
    }
}

impl NavigationConfig {
    /// Defaults, overridden by `ERPGATE_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Parse JSON; missing fields keep their defaults.
    pub fn from_json(text: &str) -> NavigationResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        Ok(config.normalized())
    }

    /// Apply overrides from `lookup` (keyed by the `ERPGATE_*` names). Blank
    /// values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let fields = [
            (ENV_LOGIN_ROUTE, &mut self.login_route),
            (ENV_FALLBACK_ROUTE, &mut self.fallback_route),
            (ENV_HOME_ROUTE, &mut self.home_route),
        ];
        for (key, field) in fields {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                tracing::debug!(key, value = %value, "navigation config override");
                *field = value;
            }
        }
        self.normalized()
    }

    fn normalized(self) -> Self {
        Self {
            login_route: normalize_path(&self.login_route),
            fallback_route: normalize_path(&self.fallback_route),
            home_route: normalize_path(&self.home_route),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_erp_routes() {
        let config = NavigationConfig::default();
        assert_eq!(config.login_route, "/login");
        assert_eq!(config.fallback_route, "/pricing/prices");
        assert_eq!(config.home_route, "/");
    }

    #[test]
    fn overrides_replace_and_normalize() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_FALLBACK_ROUTE, "dashboard/"),
            (ENV_LOGIN_ROUTE, "  "),
        ]);
        let config = NavigationConfig::default()
            .with_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.fallback_route, "/dashboard");
        assert_eq!(config.login_route, "/login");
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let config = NavigationConfig::from_json(r#"{"fallbackRoute": "/sales"}"#).unwrap();
        assert_eq!(config.fallback_route, "/sales");
        assert_eq!(config.login_route, "/login");
    }

    #[test]
    fn invalid_json_is_reported() {
        assert!(NavigationConfig::from_json("{").is_err());
    }
}

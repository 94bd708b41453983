use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use std::path::Path;

use erpgate_auth::{AuthContext, PrincipalId, SessionClaims, StaticAuthSource};
use erpgate_navigation::{NavigationConfig, NavigationGuard, RouteTable};

use super::{print_json, read_file};
use crate::Identity;

const SESSION_LIFETIME_MINUTES: i64 = 30;

pub async fn execute(
    path: &str,
    identity: &Identity,
    anonymous: bool,
    routes: Option<&Path>,
    config: Option<&Path>,
) -> Result<()> {
    let routes = match routes {
        Some(file) => RouteTable::from_json(&read_file(file)?)
            .with_context(|| format!("invalid route table in {}", file.display()))?,
        None => RouteTable::standard(),
    };
    let config = match config {
        Some(file) => NavigationConfig::from_json(&read_file(file)?)
            .with_context(|| format!("invalid navigation config in {}", file.display()))?
            .with_overrides(|key| std::env::var(key).ok()),
        None => NavigationConfig::from_env(),
    };

    let claims = (!anonymous).then(|| session_claims(identity));
    let context = AuthContext::new(StaticAuthSource::new(claims));
    let guard = NavigationGuard::new(routes, config);

    let decision = guard.before_each(&context, path).await;
    tracing::debug!(path, allowed = decision.is_allowed(), "navigation checked");
    print_json(&decision)
}

fn session_claims(identity: &Identity) -> SessionClaims {
    let now = Utc::now();
    let authorization = identity.authorization();
    SessionClaims {
        sub: PrincipalId::new(),
        email: String::from("cli@erpgate.local"),
        roles: authorization.roles().to_vec(),
        permissions: authorization.explicit_permissions().iter().cloned().collect(),
        issued_at: now - Duration::seconds(1),
        expires_at: now + Duration::minutes(SESSION_LIFETIME_MINUTES),
    }
}

//! Navigation guard: decides, before every navigation, whether to let it
//! through or where to send the user instead.
//!
//! Denials are ordinary values. Nothing here returns an error to the router.

use serde::Serialize;

use erpgate_auth::{AuthContext, AuthSnapshot};

use crate::config::NavigationConfig;
use crate::routes::{RouteTable, normalize_path};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectReason {
    /// Signed-in user opened the login page.
    AlreadySignedIn,
    /// Anonymous user opened a route that requires a session.
    Unauthenticated,
    /// Signed-in user lacks the route's permissions or role.
    Forbidden,
    /// No route matches the path.
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum NavigationDecision {
    /// Render `path` (the final target after route redirects).
    Allow { path: String },
    Redirect { to: String, reason: RedirectReason },
}

impl NavigationDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }

    /// Path the router ends up on.
    pub fn target(&self) -> &str {
        match self {
            Self::Allow { path } => path,
            Self::Redirect { to, .. } => to,
        }
    }
}

pub struct NavigationGuard {
    routes: RouteTable,
    config: NavigationConfig,
}

impl NavigationGuard {
    pub fn new(routes: RouteTable, config: NavigationConfig) -> Self {
        Self { routes, config }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    /// Decide against a fixed session snapshot.
    ///
    /// Signed-in users are only redirected to a page they can enter: a denied
    /// navigation goes to the fallback route, else the home route, else login.
    /// The login page sends them home, else to the fallback, and lets them
    /// stay when neither admits them. Every redirect chain therefore ends.
    pub fn check(&self, path: &str, session: &AuthSnapshot) -> NavigationDecision {
        let path = normalize_path(path);
        let signed_in = session.is_authenticated();

        if path == self.config.login_route {
            if signed_in {
                let landing = [&self.config.home_route, &self.config.fallback_route];
                if let Some(to) = self.first_enterable(landing, session) {
                    return self.redirect(&path, to, RedirectReason::AlreadySignedIn);
                }
                tracing::warn!(path = %path, "no enterable landing page; staying on login");
            }
            return NavigationDecision::Allow { path };
        }

        let Some(route) = self.routes.resolve(&path) else {
            let to = if signed_in {
                self.denied_landing(session)
            } else {
                self.config.login_route.as_str()
            };
            return self.redirect(&path, to, RedirectReason::NotFound);
        };

        if route.requires_auth && !signed_in {
            return self.redirect(&path, &self.config.login_route, RedirectReason::Unauthenticated);
        }

        if !route.gate.admits(&session.access()) {
            let to = self.denied_landing(session);
            return self.redirect(&path, to, RedirectReason::Forbidden);
        }

        tracing::debug!(path = %path, target = %route.path, "navigation allowed");
        NavigationDecision::Allow {
            path: route.path.clone(),
        }
    }

    /// Decide against the context's session, loading it first if it has never
    /// been loaded. A failed load is treated as signed out.
    pub async fn before_each(&self, context: &AuthContext, path: &str) -> NavigationDecision {
        let session = match context.ensure_ready().await {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(error = %err, "session unavailable; guarding as signed out");
                context.snapshot()
            }
        };
        self.check(path, &session)
    }

    fn enterable(&self, path: &str, session: &AuthSnapshot) -> bool {
        self.routes.resolve(path).is_some_and(|route| {
            (!route.requires_auth || session.is_authenticated())
                && route.gate.admits(&session.access())
        })
    }

    fn first_enterable<'a>(
        &self,
        candidates: [&'a String; 2],
        session: &AuthSnapshot,
    ) -> Option<&'a str> {
        candidates
            .into_iter()
            .find(|path| self.enterable(path, session))
            .map(String::as_str)
    }

    fn denied_landing(&self, session: &AuthSnapshot) -> &str {
        let landing = [&self.config.fallback_route, &self.config.home_route];
        self.first_enterable(landing, session)
            .unwrap_or(&self.config.login_route)
    }

    fn redirect(&self, from: &str, to: &str, reason: RedirectReason) -> NavigationDecision {
        tracing::debug!(from, to, ?reason, "navigation redirected");
        NavigationDecision::Redirect {
            to: to.to_string(),
            reason,
        }
    }
}

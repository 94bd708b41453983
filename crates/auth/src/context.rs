//! Authorization context: the injected holder of the current session snapshot.
//!
//! Readers take an `Arc<AuthSnapshot>` and see either the state before or the
//! state after a refresh, never a mix. Concurrent `refresh()` calls collapse
//! onto a single backend fetch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, watch};

use crate::{
    Access, AuthResult, AuthorizationState, PermissionSet, PrincipalId, RoleTable,
    SessionClaims, validate_claims,
};

/// Auth backend collaborator.
#[async_trait]
pub trait AuthSource: Send + Sync {
    /// Current session claims, or `None` when nobody is signed in.
    async fn fetch(&self) -> AuthResult<Option<SessionClaims>>;

    /// End the backend session.
    async fn sign_out(&self) -> AuthResult<()> {
        Ok(())
    }
}

/// In-memory auth source holding a fixed session.
#[derive(Debug, Default)]
pub struct StaticAuthSource {
    claims: StdMutex<Option<SessionClaims>>,
}

impl StaticAuthSource {
    pub fn new(claims: Option<SessionClaims>) -> Self {
        Self {
            claims: StdMutex::new(claims),
        }
    }

    pub fn set(&self, claims: Option<SessionClaims>) {
        let mut guard = self.claims.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = claims;
    }
}

#[async_trait]
impl AuthSource for StaticAuthSource {
    async fn fetch(&self) -> AuthResult<Option<SessionClaims>> {
        let guard = self.claims.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(guard.clone())
    }

    async fn sign_out(&self) -> AuthResult<()> {
        self.set(None);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Snapshot
// ─────────────────────────────────────────────────────────────────────────────

/// Immutable view of the session at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSnapshot {
    principal: Option<PrincipalId>,
    email: String,
    authorization: AuthorizationState,
    effective: PermissionSet,
    initialized: bool,
}

impl AuthSnapshot {
    /// State before the first refresh: not signed in, not yet known.
    pub fn uninitialized() -> Self {
        Self {
            principal: None,
            email: String::new(),
            authorization: AuthorizationState::default(),
            effective: PermissionSet::new(),
            initialized: false,
        }
    }

    /// Known to be signed out.
    pub fn anonymous() -> Self {
        Self {
            initialized: true,
            ..Self::uninitialized()
        }
    }

    /// Signed-in snapshot, with effective permissions computed once.
    pub fn authenticated(
        principal: PrincipalId,
        email: impl Into<String>,
        authorization: AuthorizationState,
        table: &RoleTable,
    ) -> Self {
        let effective = authorization.effective_permissions_with(table);
        Self {
            principal: Some(principal),
            email: email.into(),
            authorization,
            effective,
            initialized: true,
        }
    }

    pub fn from_claims(claims: &SessionClaims, table: &RoleTable) -> Self {
        Self::authenticated(claims.sub, claims.email.clone(), claims.authorization(), table)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    pub fn principal(&self) -> Option<PrincipalId> {
        self.principal
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn authorization(&self) -> &AuthorizationState {
        &self.authorization
    }

    pub fn effective_permissions(&self) -> &PermissionSet {
        &self.effective
    }

    pub fn access(&self) -> Access<'_> {
        Access::new(&self.effective).with_primary_role(self.authorization.primary_role())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Context
// ─────────────────────────────────────────────────────────────────────────────

/// Holder of the current [`AuthSnapshot`], created at bootstrap and passed to
/// guards and menu rendering explicitly.
pub struct AuthContext {
    source: Box<dyn AuthSource>,
    roles: RoleTable,
    state: watch::Sender<Arc<AuthSnapshot>>,
    /// Outcome of the most recent fetch; the lock serializes fetches.
    last_outcome: Mutex<Option<AuthResult<()>>>,
    /// Number of completed fetches.
    completed: AtomicU64,
    /// Bumped by every logout; a fetch started in an older epoch is discarded.
    epoch: AtomicU64,
}

impl AuthContext {
    pub fn new(source: impl AuthSource + 'static) -> Self {
        Self::with_role_table(source, RoleTable::standard().clone())
    }

    pub fn with_role_table(source: impl AuthSource + 'static, roles: RoleTable) -> Self {
        let (state, _) = watch::channel(Arc::new(AuthSnapshot::uninitialized()));
        Self {
            source: Box::new(source),
            roles,
            state,
            last_outcome: Mutex::new(None),
            completed: AtomicU64::new(0),
            epoch: AtomicU64::new(0),
        }
    }

    pub fn role_table(&self) -> &RoleTable {
        &self.roles
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<AuthSnapshot> {
        self.state.borrow().clone()
    }

    /// Change notifications; the receiver always holds the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<AuthSnapshot>> {
        self.state.subscribe()
    }

    /// Reload the session from the backend.
    ///
    /// A caller arriving while a fetch is in flight waits for it and shares
    /// its outcome instead of issuing another fetch. On failure the previous
    /// snapshot stays in place.
    pub async fn refresh(&self) -> AuthResult<Arc<AuthSnapshot>> {
        let observed = self.completed.load(Ordering::Acquire);
        let mut last = self.last_outcome.lock().await;

        if self.completed.load(Ordering::Acquire) != observed {
            tracing::debug!("joined in-flight session refresh");
            return match last.as_ref() {
                Some(Err(err)) => Err(err.clone()),
                _ => Ok(self.snapshot()),
            };
        }

        let outcome = self.fetch_and_publish().await;
        *last = Some(outcome.as_ref().map(|_| ()).map_err(|err| err.clone()));
        self.completed.fetch_add(1, Ordering::AcqRel);
        outcome
    }

    /// Refresh only if the session has never been loaded.
    pub async fn ensure_ready(&self) -> AuthResult<Arc<AuthSnapshot>> {
        let current = self.snapshot();
        if current.is_initialized() {
            return Ok(current);
        }
        self.refresh().await
    }

    /// Resolve once the first refresh has published a snapshot.
    pub async fn wait_ready(&self) -> Arc<AuthSnapshot> {
        let mut rx = self.state.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here.
        let _ = rx.wait_for(|snapshot| snapshot.is_initialized()).await;
        self.snapshot()
    }

    /// End the session. Local state is cleared even if the backend call fails.
    ///
    /// A refresh still in flight when this is called does not publish its
    /// result, so the session stays cleared.
    pub async fn logout(&self) -> AuthResult<()> {
        self.clear_local_session();
        let result = self.source.sign_out().await;
        if let Err(err) = &result {
            tracing::warn!(error = %err, "backend sign-out failed; local session already cleared");
        }
        // A refresh that started during sign-out may have seen the old session.
        self.clear_local_session();
        tracing::info!("session cleared");
        result
    }

    fn clear_local_session(&self) {
        self.state.send_modify(|current| {
            self.epoch.fetch_add(1, Ordering::AcqRel);
            *current = Arc::new(AuthSnapshot::anonymous());
        });
    }

    async fn fetch_and_publish(&self) -> AuthResult<Arc<AuthSnapshot>> {
        let started = self.epoch.load(Ordering::Acquire);
        let claims = self.source.fetch().await.inspect_err(|err| {
            tracing::warn!(error = %err, "session refresh failed");
        })?;

        let snapshot = match claims {
            None => AuthSnapshot::anonymous(),
            Some(claims) => match validate_claims(&claims, Utc::now()) {
                Ok(()) => AuthSnapshot::from_claims(&claims, &self.roles),
                Err(err) => {
                    tracing::warn!(
                        principal = %claims.sub,
                        error = %err,
                        "session claims rejected; treating as signed out"
                    );
                    AuthSnapshot::anonymous()
                }
            },
        };

        let snapshot = Arc::new(snapshot);
        // The epoch check and the publish happen under the channel's write
        // lock, which `clear_local_session` also holds while bumping the epoch.
        let published = self.state.send_if_modified(|current| {
            if self.epoch.load(Ordering::Acquire) != started {
                return false;
            }
            *current = snapshot.clone();
            true
        });
        if !published {
            tracing::debug!("session refresh overtaken by logout; result discarded");
            return Ok(self.snapshot());
        }
        tracing::info!(
            authenticated = snapshot.is_authenticated(),
            roles = snapshot.authorization().roles().len(),
            permissions = snapshot.effective_permissions().len(),
            "session refreshed"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use chrono::Duration as ChronoDuration;

    use crate::permissions::codes;
    use crate::roles::names;
    use crate::{AuthError, Permission, Role};

    fn claims(roles: Vec<Role>, permissions: Vec<Permission>) -> SessionClaims {
        let now = Utc::now();
        SessionClaims {
            sub: PrincipalId::new(),
            email: "hr@example.com".to_string(),
            roles,
            permissions,
            issued_at: now - ChronoDuration::minutes(1),
            expires_at: now + ChronoDuration::minutes(30),
        }
    }

    /// Counts fetches and holds each one open for a while.
    struct SlowSource {
        fetches: Arc<AtomicUsize>,
        claims: Option<SessionClaims>,
        fail: bool,
    }

    #[async_trait]
    impl AuthSource for SlowSource {
        async fn fetch(&self) -> AuthResult<Option<SessionClaims>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.fail {
                return Err(AuthError::unavailable("connection refused"));
            }
            Ok(self.claims.clone())
        }

        async fn sign_out(&self) -> AuthResult<()> {
            Err(AuthError::sign_out("network down"))
        }
    }

    #[tokio::test]
    async fn starts_uninitialized_and_anonymous() {
        let ctx = AuthContext::new(StaticAuthSource::default());
        let snapshot = ctx.snapshot();
        assert!(!snapshot.is_initialized());
        assert!(!snapshot.is_authenticated());
        assert!(snapshot.effective_permissions().is_empty());
    }

    #[tokio::test]
    async fn refresh_publishes_role_derived_permissions() {
        let source = StaticAuthSource::new(Some(claims(vec![names::HR_CN_ADMIN], vec![])));
        let ctx = AuthContext::new(source);

        let snapshot = ctx.refresh().await.unwrap();
        assert!(snapshot.is_authenticated());
        assert_eq!(snapshot.email(), "hr@example.com");
        assert!(snapshot.access().can(&codes::HR_EMPLOYEE_CN_READ));
        assert_eq!(ctx.snapshot(), snapshot);
    }

    #[tokio::test]
    async fn explicit_permissions_override_roles() {
        let source = StaticAuthSource::new(Some(claims(
            vec![names::PLATFORM_OWNER],
            vec![Permission::new("x.y.read")],
        )));
        let ctx = AuthContext::new(source);

        let snapshot = ctx.refresh().await.unwrap();
        assert_eq!(snapshot.effective_permissions().len(), 1);
        assert!(!snapshot.access().can(&codes::ADMIN_USER_MANAGE));
    }

    #[tokio::test]
    async fn expired_claims_are_treated_as_signed_out() {
        let mut expired = claims(vec![names::SALES_MANAGER], vec![]);
        expired.issued_at = Utc::now() - ChronoDuration::hours(2);
        expired.expires_at = Utc::now() - ChronoDuration::hours(1);
        let ctx = AuthContext::new(StaticAuthSource::new(Some(expired)));

        let snapshot = ctx.refresh().await.unwrap();
        assert!(snapshot.is_initialized());
        assert!(!snapshot.is_authenticated());
        assert!(snapshot.effective_permissions().is_empty());
    }

    #[tokio::test]
    async fn concurrent_refreshes_share_one_fetch() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let ctx = AuthContext::new(SlowSource {
            fetches: fetches.clone(),
            claims: Some(claims(vec![names::BIZ_VIEWER], vec![])),
            fail: false,
        });

        let (a, b, c) = tokio::join!(ctx.refresh(), ctx.refresh(), ctx.refresh());
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
        assert!(Arc::ptr_eq(&a, &b) && Arc::ptr_eq(&b, &c));

        // A refresh after the first one completed fetches again.
        ctx.refresh().await.unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_refresh_is_shared_and_keeps_previous_snapshot() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let ctx = AuthContext::new(SlowSource {
            fetches: fetches.clone(),
            claims: None,
            fail: true,
        });

        let (a, b) = tokio::join!(ctx.refresh(), ctx.refresh());
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap_err(), AuthError::unavailable("connection refused"));
        assert!(b.is_err());
        assert!(!ctx.snapshot().is_initialized());
    }

    #[tokio::test]
    async fn ensure_ready_fetches_only_once() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let ctx = AuthContext::new(SlowSource {
            fetches: fetches.clone(),
            claims: None,
            fail: false,
        });

        ctx.ensure_ready().await.unwrap();
        ctx.ensure_ready().await.unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert!(ctx.snapshot().is_initialized());
    }

    #[tokio::test]
    async fn wait_ready_resolves_after_first_refresh() {
        let ctx = Arc::new(AuthContext::new(StaticAuthSource::new(Some(claims(
            vec![names::AUDIT_VIEWER],
            vec![],
        )))));

        let waiter = {
            let ctx = ctx.clone();
            tokio::spawn(async move { ctx.wait_ready().await })
        };
        ctx.refresh().await.unwrap();

        let ready = waiter.await.unwrap();
        assert!(ready.is_authenticated());
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let source = StaticAuthSource::new(Some(claims(vec![names::SALES_OPERATOR], vec![])));
        let ctx = AuthContext::new(source);
        let mut rx = ctx.subscribe();

        ctx.refresh().await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_authenticated());
    }

    #[tokio::test]
    async fn logout_clears_even_when_backend_fails() {
        let ctx = AuthContext::new(SlowSource {
            fetches: Arc::new(AtomicUsize::new(0)),
            claims: Some(claims(vec![names::SALES_MANAGER], vec![])),
            fail: false,
        });
        ctx.refresh().await.unwrap();
        assert!(ctx.snapshot().is_authenticated());

        assert!(ctx.logout().await.is_err());
        let snapshot = ctx.snapshot();
        assert!(snapshot.is_initialized());
        assert!(!snapshot.is_authenticated());
    }

    #[tokio::test]
    async fn logout_during_refresh_keeps_session_cleared() {
        let ctx = AuthContext::new(SlowSource {
            fetches: Arc::new(AtomicUsize::new(0)),
            claims: Some(claims(vec![names::SALES_MANAGER], vec![])),
            fail: false,
        });
        let mut rx = ctx.subscribe();

        let (refreshed, logged_out) = tokio::join!(ctx.refresh(), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            ctx.logout().await
        });

        assert!(logged_out.is_err());
        assert!(!refreshed.unwrap().is_authenticated());
        let snapshot = ctx.snapshot();
        assert!(snapshot.is_initialized());
        assert!(!snapshot.is_authenticated());
        assert!(!rx.borrow_and_update().is_authenticated());

        // A refresh after logout is honoured again.
        assert!(ctx.refresh().await.unwrap().is_authenticated());
    }

    #[tokio::test]
    async fn static_source_sign_out_ends_session() {
        let ctx = AuthContext::new(StaticAuthSource::new(Some(claims(
            vec![names::SALES_MANAGER],
            vec![],
        ))));
        ctx.refresh().await.unwrap();
        ctx.logout().await.unwrap();

        let snapshot = ctx.refresh().await.unwrap();
        assert!(!snapshot.is_authenticated());
    }
}

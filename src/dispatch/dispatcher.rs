//! Request dispatcher.
//!
//! # Responsibilities
//! - Resolve the domain, build the routing context, rewrite, match, guard
//! - Fold every per-request failure into a [`DispatchOutcome`]
//! - Emit one structured log line and one metric sample per decision
//!
//! # Design Decisions
//! - Stages run strictly in sequence; each consumes the previous output
//! - Internal redirects re-enter on the same domain and are bounded
//! - Terminal redirects stop evaluation before any route or guard runs

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast::{self, error::RecvError};

use crate::config::schema::DispatchConfig;
use crate::context::{OrganizationInfo, RoutingContext, UserIdentity};
use crate::directory::OrganizationDirectory;
use crate::dispatch::{DispatchOutcome, RoutingError};
use crate::domain::{normalize_hostname, DomainConfig, DomainRegistry};
use crate::guard::{ChainOptions, Rejection, Verdict};
use crate::observability::metrics;
use crate::routing::{normalize_path, RouteEntry};

const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

/// One inbound `(hostname, pathname, identity)` triple.
#[derive(Debug, Clone, Default)]
pub struct DispatchRequest {
    pub hostname: String,
    pub pathname: String,
    pub user: Option<UserIdentity>,
    /// Pre-resolved organization. When set the directory is not consulted.
    pub organization: Option<OrganizationInfo>,
}

impl DispatchRequest {
    pub fn new(hostname: impl Into<String>, pathname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            pathname: pathname.into(),
            ..Default::default()
        }
    }

    pub fn with_user(mut self, user: UserIdentity) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_organization(mut self, organization: OrganizationInfo) -> Self {
        self.organization = Some(organization);
        self
    }
}

/// Orchestrates resolution, redirects, route matching and guards.
pub struct Dispatcher {
    registry: Arc<DomainRegistry>,
    directory: Arc<dyn OrganizationDirectory>,
    chain_options: ChainOptions,
    max_internal_redirects: usize,
    lookup_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<DomainRegistry>,
        directory: Arc<dyn OrganizationDirectory>,
        config: &DispatchConfig,
    ) -> Self {
        Self {
            registry,
            directory,
            chain_options: ChainOptions {
                timeout: Duration::from_millis(config.guard_timeout_ms),
                prefetch: config.prefetch_guards,
            },
            max_internal_redirects: config.max_internal_redirects,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    /// Upper bound for one organization lookup.
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Arc<DomainRegistry> {
        &self.registry
    }

    /// Dispatch a request to a final outcome.
    pub async fn dispatch(&self, request: &DispatchRequest) -> DispatchOutcome {
        let started = Instant::now();
        let outcome = self.evaluate(request).await;
        metrics::record_dispatch(&outcome, started.elapsed());
        outcome
    }

    /// Like [`dispatch`](Self::dispatch), but gives up as soon as `abort`
    /// fires. Nothing is applied for an aborted request.
    pub async fn dispatch_until(
        &self,
        request: &DispatchRequest,
        abort: broadcast::Receiver<()>,
    ) -> DispatchOutcome {
        let started = Instant::now();
        let outcome = tokio::select! {
            biased;
            _ = aborted(abort) => {
                tracing::debug!(
                    hostname = %request.hostname,
                    pathname = %request.pathname,
                    "Dispatch aborted"
                );
                DispatchOutcome::Aborted
            }
            outcome = self.evaluate(request) => outcome,
        };
        metrics::record_dispatch(&outcome, started.elapsed());
        outcome
    }

    async fn evaluate(&self, request: &DispatchRequest) -> DispatchOutcome {
        let domain = match self.registry.resolve(&request.hostname) {
            Ok(domain) => Arc::clone(domain),
            Err(err) => return err.into(),
        };

        let hostname = normalize_hostname(&request.hostname);
        let slug = if domain.settings.is_dynamic_subdomain {
            domain.tenant_slug(&hostname)
        } else {
            None
        };

        let organization = match (&request.organization, &slug) {
            (Some(org), _) => Some(org.clone()),
            (None, Some(slug)) => self.lookup_organization(&domain.id, slug).await,
            (None, None) => None,
        };

        let mut ctx = RoutingContext::new(hostname, normalize_path(&request.pathname))
            .with_user(request.user.clone())
            .with_slug(slug)
            .with_organization(organization);

        let mut applied = Vec::new();
        while let Some(redirect) = domain.redirects.evaluate(&ctx.pathname, &ctx) {
            tracing::info!(
                domain = %domain.id,
                rule = %redirect.from,
                kind = redirect.kind.as_str(),
                pathname = %ctx.pathname,
                target = %redirect.target,
                "Redirect applied"
            );
            metrics::record_redirect(redirect.kind);

            if redirect.kind.is_terminal() {
                return DispatchOutcome::Navigate {
                    domain: domain.id.clone(),
                    rule: redirect.from,
                    url: redirect.target,
                };
            }

            if applied.len() >= self.max_internal_redirects {
                tracing::warn!(
                    domain = %domain.id,
                    hops = applied.len(),
                    pathname = %ctx.pathname,
                    "Internal redirect limit exceeded"
                );
                return RoutingError::RedirectLoop {
                    domain: domain.id.clone(),
                    hops: applied.len(),
                }
                .into();
            }

            ctx = ctx.with_pathname(normalize_path(&redirect.target));
            applied.push(redirect);
        }

        let Some(matched) = domain.routes.lookup(&ctx.pathname) else {
            tracing::info!(domain = %domain.id, pathname = %ctx.pathname, "No matching route");
            return RoutingError::NoMatchingRoute {
                domain: domain.id.clone(),
                pathname: ctx.pathname,
            }
            .into();
        };

        match domain.guards.evaluate(&ctx, matched.entry, self.chain_options).await {
            Verdict::Permitted => {
                tracing::info!(
                    domain = %domain.id,
                    route = %matched.entry.path,
                    pathname = %ctx.pathname,
                    redirects = applied.len(),
                    "Route permitted"
                );
                DispatchOutcome::Permitted {
                    domain: domain.id.clone(),
                    route: matched.entry.path.clone(),
                    handler: matched.entry.handler.clone(),
                    pathname: ctx.pathname,
                    params: matched.params,
                    slug: ctx.slug,
                    redirects: applied,
                }
            }
            Verdict::Rejected(rejection) => {
                let target = rejection_target(&domain, matched.entry, &ctx, &rejection);
                tracing::info!(
                    domain = %domain.id,
                    route = %matched.entry.path,
                    guard = %rejection.guard,
                    reason = rejection.reason.as_deref().unwrap_or(""),
                    target = %target,
                    "Guard rejected request"
                );
                metrics::record_guard_rejection(&rejection.guard);
                DispatchOutcome::Redirect {
                    domain: domain.id.clone(),
                    guard: rejection.guard,
                    reason: rejection.reason,
                    target,
                }
            }
        }
    }

    async fn lookup_organization(&self, domain: &str, slug: &str) -> Option<OrganizationInfo> {
        match tokio::time::timeout(self.lookup_timeout, self.directory.find_by_slug(slug)).await {
            Ok(Ok(Some(org))) => Some(org),
            Ok(Ok(None)) => {
                tracing::debug!(domain, slug, "Organization not found");
                None
            }
            Ok(Err(e)) => {
                tracing::warn!(domain, slug, error = %e, "Organization lookup failed");
                None
            }
            Err(_) => {
                tracing::warn!(
                    domain,
                    slug,
                    timeout_ms = self.lookup_timeout.as_millis() as u64,
                    "Organization lookup timed out"
                );
                None
            }
        }
    }
}

/// Guard target, then route fallback, then the domain's login or
/// unauthorized page depending on whether anyone is signed in.
/// Guard target, then route fallback, then login or unauthorized route.
/// A target pointing back at the rejected pathname becomes the domain's
/// default route.
fn rejection_target(
    domain: &DomainConfig,
    route: &RouteEntry,
    ctx: &RoutingContext,
    rejection: &Rejection,
) -> String {
    let target = rejection
        .redirect_to
        .clone()
        .or_else(|| route.fallback_route.clone())
        .unwrap_or_else(|| {
            if ctx.is_authenticated() {
                domain.unauthorized_route.clone()
            } else {
                domain.login_route.clone()
            }
        });

    if normalize_path(&target) == ctx.pathname {
        domain.default_route.clone()
    } else {
        target
    }
}

/// Resolves when the abort channel fires. A dropped sender never aborts.
async fn aborted(mut abort: broadcast::Receiver<()>) {
    if let Err(RecvError::Closed) = abort.recv().await {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::config::schema::{DomainRecord, RedirectRecord, RouteRecord};
    use crate::directory::{DirectoryError, MemoryDirectory};
    use crate::domain::HostnamePredicate;
    use crate::guard::{Guard, GuardError, GuardResult};

    #[derive(Debug)]
    struct Stalled;

    #[async_trait]
    impl Guard for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn validate(
            &self,
            _ctx: &RoutingContext,
            _route: &RouteEntry,
        ) -> Result<GuardResult, GuardError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(GuardResult::allow())
        }
    }

    struct SlowDirectory;

    #[async_trait]
    impl OrganizationDirectory for SlowDirectory {
        async fn find_by_slug(&self, slug: &str) -> Result<Option<OrganizationInfo>, DirectoryError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Some(OrganizationInfo::new("org", slug, true)))
        }
    }

    fn record() -> DomainRecord {
        let mut d = DomainRecord::new("portal", HostnamePredicate::catch_all());
        d.settings.dynamic_subdomain = true;
        d.routes = vec![
            RouteRecord::new("/", "portal.home"),
            RouteRecord::new("/a", "portal.a"),
            RouteRecord::new("/painel", "portal.panel").authenticated(),
            RouteRecord::new("/config", "portal.settings").roles(["admin"]),
        ];
        d
    }

    fn dispatcher(domain: DomainConfig, config: &DispatchConfig) -> Dispatcher {
        let registry = DomainRegistry::build(vec![domain], true).unwrap();
        Dispatcher::new(Arc::new(registry), Arc::new(MemoryDirectory::new()), config)
    }

    #[tokio::test]
    async fn test_internal_redirect_loop_is_bounded() {
        let mut r = record();
        r.redirects = vec![
            RedirectRecord::internal("/a", "/b"),
            RedirectRecord::internal("/b", "/a"),
        ];
        let config = DispatchConfig {
            max_internal_redirects: 3,
            ..Default::default()
        };
        let d = dispatcher(DomainConfig::from_record(&r).unwrap(), &config);

        let outcome = d.dispatch(&DispatchRequest::new("acme.example.com", "/a")).await;
        assert_eq!(
            outcome,
            DispatchOutcome::RedirectLoop {
                domain: "portal".into(),
                hops: 3
            }
        );
    }

    #[tokio::test]
    async fn test_rejection_falls_back_to_login_then_unauthorized() {
        let d = dispatcher(
            DomainConfig::from_record(&record()).unwrap(),
            &DispatchConfig::default(),
        );

        let anonymous = d.dispatch(&DispatchRequest::new("acme.example.com", "/painel")).await;
        assert!(matches!(
            anonymous,
            DispatchOutcome::Redirect { ref target, ref guard, .. }
                if target == "/login" && guard == "require-auth"
        ));

        let member = d
            .dispatch(&DispatchRequest::new("acme.example.com", "/config").with_user(UserIdentity::new("u1")))
            .await;
        assert!(matches!(
            member,
            DispatchOutcome::Redirect { ref target, ref guard, .. }
                if target == "/unauthorized" && guard == "allowed-roles"
        ));
    }

    #[tokio::test]
    async fn test_self_targeting_rejection_uses_default_route() {
        let mut r = record();
        r.routes.push(RouteRecord::new("/login", "portal.login").roles(["staff"]));
        r.routes.push(RouteRecord::new("/inicio", "portal.start"));
        r.default_route = "/inicio".into();
        let d = dispatcher(DomainConfig::from_record(&r).unwrap(), &DispatchConfig::default());

        let outcome = d.dispatch(&DispatchRequest::new("acme.example.com", "/login/")).await;
        assert!(
            matches!(
                outcome,
                DispatchOutcome::Redirect { ref target, ref guard, .. }
                    if target == "/inicio" && guard == "allowed-roles"
            ),
            "{outcome:?}"
        );
    }

    #[tokio::test]
    async fn test_abort_abandons_pending_guard() {
        let domain = DomainConfig::from_record(&record())
            .unwrap()
            .with_guard(Arc::new(Stalled));
        let config = DispatchConfig {
            guard_timeout_ms: 60_000,
            ..Default::default()
        };
        let d = dispatcher(domain, &config);

        let (tx, rx) = broadcast::channel(1);
        let request = DispatchRequest::new("acme.example.com", "/");
        let handle = tokio::spawn(async move { d.dispatch_until(&request, rx).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(()).unwrap();
        assert_eq!(handle.await.unwrap(), DispatchOutcome::Aborted);
    }

    #[tokio::test]
    async fn test_dropped_abort_sender_does_not_abort() {
        let d = dispatcher(
            DomainConfig::from_record(&record()).unwrap(),
            &DispatchConfig::default(),
        );
        let (tx, rx) = broadcast::channel::<()>(1);
        drop(tx);

        let outcome = d
            .dispatch_until(&DispatchRequest::new("acme.example.com", "/"), rx)
            .await;
        assert!(outcome.is_permitted());
    }

    #[tokio::test]
    async fn test_slow_directory_leaves_organization_unset() {
        let registry = DomainRegistry::build(
            vec![DomainConfig::from_record(&record()).unwrap()],
            true,
        )
        .unwrap();
        let d = Dispatcher::new(
            Arc::new(registry),
            Arc::new(SlowDirectory),
            &DispatchConfig::default(),
        )
        .with_lookup_timeout(Duration::from_millis(20));

        let outcome = d.dispatch(&DispatchRequest::new("acme.example.com", "/")).await;
        assert!(matches!(
            outcome,
            DispatchOutcome::Permitted { ref slug, .. } if slug.as_deref() == Some("acme")
        ));
    }

    #[tokio::test]
    async fn test_pathname_is_normalized() {
        let d = dispatcher(
            DomainConfig::from_record(&record()).unwrap(),
            &DispatchConfig::default(),
        );
        let outcome = d.dispatch(&DispatchRequest::new("acme.example.com", "/a/?x=1")).await;
        assert!(matches!(
            outcome,
            DispatchOutcome::Permitted { ref pathname, ref route, .. } if pathname == "/a" && route == "/a"
        ));
    }
}

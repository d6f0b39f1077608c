//! Compiled tenant surface.

use std::sync::Arc;

use regex::Regex;
use thiserror::Error;

use crate::config::schema::DomainRecord;
use crate::domain::hostname::HostnamePredicate;
use crate::domain::slug::{compile_slug_pattern, extract_slug, SlugPatternError};
use crate::guard::{Guard, GuardChain};
use crate::redirect::{RedirectError, RedirectRule, RedirectRuleSet};
use crate::routing::matcher::InvalidPath;
use crate::routing::{normalize_path, RouteEntry, RouteTable, RouteTableError};

/// Errors compiling a single domain record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    Routes(#[from] RouteTableError),

    #[error(transparent)]
    Redirect(#[from] RedirectError),

    #[error(transparent)]
    SlugPattern(#[from] SlugPatternError),

    #[error("`{field}` must be an absolute path, got `{value}`")]
    InvalidPath { field: &'static str, value: String },
}

/// Compiled per-domain switches.
#[derive(Debug, Clone)]
pub struct DomainSettings {
    pub active: bool,
    pub allow_anonymous: bool,
    pub is_dynamic_subdomain: bool,
    pub slug_pattern: Option<Regex>,
}

/// One tenant surface: hostname predicate, routes, redirects and guards.
#[derive(Debug, Clone)]
pub struct DomainConfig {
    pub id: String,
    pub hostname: HostnamePredicate,
    pub routes: RouteTable,
    pub redirects: RedirectRuleSet,
    pub guards: GuardChain,
    pub default_route: String,
    pub login_route: String,
    pub unauthorized_route: String,
    pub settings: DomainSettings,
}

impl DomainConfig {
    /// Compile a configuration record.
    ///
    /// When the domain disallows anonymous access every route except the
    /// login route is compiled with `require_auth` set.
    pub fn from_record(record: &DomainRecord) -> Result<Self, DomainError> {
        let fallbacks = [
            ("default_route", &record.default_route),
            ("login_route", &record.login_route),
            ("unauthorized_route", &record.unauthorized_route),
        ];
        for (field, value) in fallbacks {
            ensure_path(field, value)?;
        }
        for route in &record.routes {
            if let Some(fallback) = &route.fallback_route {
                ensure_path("fallback_route", fallback)?;
            }
        }
        for guard in &record.guards {
            if let Some(target) = &guard.redirect_to {
                ensure_path("redirect_to", target)?;
            }
        }

        let slug_pattern = record
            .settings
            .slug_pattern
            .as_deref()
            .map(compile_slug_pattern)
            .transpose()?;

        let login_route = normalize_path(&record.login_route);
        let mut entries = record
            .routes
            .iter()
            .map(RouteEntry::from_record)
            .collect::<Result<Vec<_>, _>>()?;
        if !record.settings.allow_anonymous {
            for entry in entries.iter_mut() {
                if entry.normalized_path() != login_route {
                    entry.require_auth = true;
                }
            }
        }
        let routes = RouteTable::new(entries)?;

        let redirects = record
            .redirects
            .iter()
            .map(RedirectRule::from_record)
            .collect::<Result<Vec<_>, _>>()?;

        let guards = record
            .guards
            .iter()
            .map(|spec| {
                spec.build()
                    .map(|guard| Arc::new(guard) as Arc<dyn Guard>)
                    .map_err(|InvalidPath(value)| DomainError::InvalidPath {
                        field: "except",
                        value,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: record.id.clone(),
            hostname: record.hostname.clone(),
            routes,
            redirects: RedirectRuleSet::new(redirects),
            guards: GuardChain::new(guards),
            default_route: record.default_route.clone(),
            login_route: record.login_route.clone(),
            unauthorized_route: record.unauthorized_route.clone(),
            settings: DomainSettings {
                active: record.settings.active,
                allow_anonymous: record.settings.allow_anonymous,
                is_dynamic_subdomain: record.settings.dynamic_subdomain,
                slug_pattern,
            },
        })
    }

    /// Append a guard implemented in code after the configured ones.
    pub fn with_guard(mut self, guard: Arc<dyn Guard>) -> Self {
        self.guards.push(guard);
        self
    }

    /// Append a redirect rule built in code after the configured ones.
    pub fn with_redirect(mut self, rule: RedirectRule) -> Self {
        self.redirects.push(rule);
        self
    }

    pub fn is_catch_all(&self) -> bool {
        self.hostname.is_catch_all()
    }

    /// Predicates this domain excludes (catch-all domains only).
    pub fn exclusions(&self) -> &[HostnamePredicate] {
        match &self.hostname {
            HostnamePredicate::CatchAll { excluded } => excluded,
            _ => &[],
        }
    }

    /// Tenant slug for a hostname. Only meaningful when
    /// `settings.is_dynamic_subdomain` is set; callers check that first.
    pub fn tenant_slug(&self, hostname: &str) -> Option<String> {
        extract_slug(self.settings.slug_pattern.as_ref(), hostname)
    }
}

fn ensure_path(field: &'static str, value: &str) -> Result<(), DomainError> {
    if value.starts_with('/') {
        Ok(())
    } else {
        Err(DomainError::InvalidPath {
            field,
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{RedirectRecord, RouteRecord};
    use crate::guard::{BuiltinGuard, GuardSpec};

    fn record() -> DomainRecord {
        let mut r = DomainRecord::new("supplier", HostnamePredicate::prefix(["fornecedores"]));
        r.routes = vec![
            RouteRecord::new("/", "supplier.home"),
            RouteRecord::new("/login", "supplier.login"),
            RouteRecord::new("/pedidos/:id", "supplier.order"),
        ];
        r.guards = vec![GuardSpec::new(BuiltinGuard::SupplierOnly).except(["/login"])];
        r
    }

    #[test]
    fn test_compile_record() {
        let domain = DomainConfig::from_record(&record()).unwrap();
        assert_eq!(domain.id, "supplier");
        assert_eq!(domain.routes.len(), 3);
        assert_eq!(domain.guards.names(), vec!["supplier-only"]);
        assert!(!domain.is_catch_all());
        assert!(domain.exclusions().is_empty());
    }

    #[test]
    fn test_disallowing_anonymous_forces_auth_except_login() {
        let mut r = record();
        r.settings.allow_anonymous = false;
        let domain = DomainConfig::from_record(&r).unwrap();

        assert!(domain.routes.get("/").unwrap().require_auth);
        assert!(!domain.routes.get("/login").unwrap().require_auth);
        let order = domain.routes.lookup("/pedidos/7").unwrap();
        assert!(order.entry.require_auth);
    }

    #[test]
    fn test_malformed_cross_domain_target_fails_at_build() {
        let mut r = record();
        r.redirects = vec![RedirectRecord::cross_domain("/admin/*", "admin.example.com")];
        assert!(matches!(
            DomainConfig::from_record(&r),
            Err(DomainError::Redirect(RedirectError::MalformedTarget { .. }))
        ));
    }

    #[test]
    fn test_invalid_fallback_paths() {
        let mut r = record();
        r.login_route = "login".into();
        assert_eq!(
            DomainConfig::from_record(&r).unwrap_err(),
            DomainError::InvalidPath {
                field: "login_route",
                value: "login".into()
            }
        );
    }

    #[test]
    fn test_malformed_guard_except_fails_at_build() {
        let mut r = record();
        r.guards = vec![GuardSpec::new(BuiltinGuard::SupplierOnly).except(["pedidos/:id"])];
        assert_eq!(
            DomainConfig::from_record(&r).unwrap_err(),
            DomainError::InvalidPath {
                field: "except",
                value: "pedidos/:id".into()
            }
        );
    }

    #[test]
    fn test_slug_pattern_compiled() {
        let mut r = record();
        r.settings.dynamic_subdomain = true;
        r.settings.slug_pattern = Some(r"^([a-z0-9-]+)\.example\.com$".into());
        let domain = DomainConfig::from_record(&r).unwrap();
        assert_eq!(domain.tenant_slug("acme.example.com").as_deref(), Some("acme"));

        r.settings.slug_pattern = Some(r"^[a-z]+$".into());
        assert!(matches!(
            DomainConfig::from_record(&r),
            Err(DomainError::SlugPattern(_))
        ));
    }
}

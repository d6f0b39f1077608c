//! Built-in guards.
//!
//! [`RouteGuard`] holds the checks implied by a route entry
//! (`require_auth`, `allowed_roles`, `required_permissions`).
//! [`NamedGuard`] holds the domain-level checks selectable from
//! configuration by name.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::RoutingContext;
use crate::guard::{Guard, GuardError, GuardResult};
use crate::routing::matcher::{InvalidPath, PathPattern};
use crate::routing::RouteEntry;

/// Implicit per-route checks, always evaluated before domain guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGuard {
    RequireAuth,
    AllowedRoles,
    RequiredPermissions,
}

impl RouteGuard {
    /// Fixed evaluation order.
    pub const ORDER: [RouteGuard; 3] = [
        RouteGuard::RequireAuth,
        RouteGuard::AllowedRoles,
        RouteGuard::RequiredPermissions,
    ];

    fn check(&self, ctx: &RoutingContext, route: &RouteEntry) -> GuardResult {
        match self {
            Self::RequireAuth => {
                if route.require_auth && ctx.user.is_none() {
                    GuardResult::deny("authentication required")
                } else {
                    GuardResult::allow()
                }
            }
            Self::AllowedRoles => {
                if route.allowed_roles.is_empty() {
                    return GuardResult::allow();
                }
                match &ctx.user {
                    // superuser bypasses role checks, not authentication
                    Some(user) if user.is_super_admin => GuardResult::allow(),
                    Some(user) if route.allowed_roles.iter().any(|r| user.has_role(r)) => {
                        GuardResult::allow()
                    }
                    _ => GuardResult::deny("role not allowed"),
                }
            }
            Self::RequiredPermissions => {
                if route.required_permissions.is_empty() {
                    return GuardResult::allow();
                }
                match &ctx.user {
                    Some(user) if user.is_super_admin => GuardResult::allow(),
                    Some(user)
                        if route
                            .required_permissions
                            .iter()
                            .all(|p| user.has_permission(p)) =>
                    {
                        GuardResult::allow()
                    }
                    _ => GuardResult::deny("missing permission"),
                }
            }
        }
    }
}

#[async_trait]
impl Guard for RouteGuard {
    fn name(&self) -> &str {
        match self {
            Self::RequireAuth => "require-auth",
            Self::AllowedRoles => "allowed-roles",
            Self::RequiredPermissions => "required-permissions",
        }
    }

    async fn validate(
        &self,
        ctx: &RoutingContext,
        route: &RouteEntry,
    ) -> Result<GuardResult, GuardError> {
        Ok(self.check(ctx, route))
    }
}

/// Domain guards available from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuiltinGuard {
    /// Any signed-in user.
    Authenticated,
    /// Supplier portal users (super-admins pass).
    SupplierOnly,
    SuperAdminOnly,
    /// Organization resolved from the slug exists and is active.
    OrganizationActive,
    /// User belongs to the organization resolved from the slug (super-admins pass).
    OrganizationMember,
}

impl BuiltinGuard {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authenticated => "authenticated",
            Self::SupplierOnly => "supplier-only",
            Self::SuperAdminOnly => "super-admin-only",
            Self::OrganizationActive => "organization-active",
            Self::OrganizationMember => "organization-member",
        }
    }

    fn check(&self, ctx: &RoutingContext) -> GuardResult {
        match self {
            Self::Authenticated => match ctx.user {
                Some(_) => GuardResult::allow(),
                None => GuardResult::deny("authentication required"),
            },
            Self::SupplierOnly => match &ctx.user {
                Some(user) if user.is_supplier || user.is_super_admin => GuardResult::allow(),
                Some(_) => GuardResult::deny("supplier access required"),
                None => GuardResult::deny("authentication required"),
            },
            Self::SuperAdminOnly => match &ctx.user {
                Some(user) if user.is_super_admin => GuardResult::allow(),
                Some(_) => GuardResult::deny("super admin access required"),
                None => GuardResult::deny("authentication required"),
            },
            Self::OrganizationActive => match &ctx.organization {
                Some(org) if org.is_active => GuardResult::allow(),
                Some(_) => GuardResult::deny("organization inactive"),
                None => GuardResult::deny("organization not found"),
            },
            Self::OrganizationMember => {
                let Some(user) = &ctx.user else {
                    return GuardResult::deny("authentication required");
                };
                if user.is_super_admin {
                    return GuardResult::allow();
                }
                match &ctx.organization {
                    Some(org) if user.organization_id.as_deref() == Some(org.id.as_str()) => {
                        GuardResult::allow()
                    }
                    Some(_) => GuardResult::deny("not a member of this organization"),
                    None => GuardResult::deny("organization not found"),
                }
            }
        }
    }
}

/// Configuration entry for a domain guard.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GuardSpec {
    pub kind: BuiltinGuard,

    /// Redirect target on rejection; falls back to route/domain routes.
    #[serde(default)]
    pub redirect_to: Option<String>,

    /// Route paths this guard does not apply to (e.g. the login page).
    #[serde(default)]
    pub except: Vec<String>,
}

impl GuardSpec {
    pub fn new(kind: BuiltinGuard) -> Self {
        Self {
            kind,
            redirect_to: None,
            except: Vec::new(),
        }
    }

    pub fn redirecting_to(mut self, path: impl Into<String>) -> Self {
        self.redirect_to = Some(path.into());
        self
    }

    pub fn except<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.except.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Compile the guard. `except` entries are stored by route shape, so
    /// `/pedidos/:id` also exempts a route declared as `/pedidos/:pedido`.
    pub fn build(&self) -> Result<NamedGuard, InvalidPath> {
        let except = self
            .except
            .iter()
            .map(|p| PathPattern::parse(p).map(|pattern| pattern.shape()))
            .collect::<Result<_, _>>()?;

        Ok(NamedGuard {
            kind: self.kind,
            redirect_to: self.redirect_to.clone(),
            except,
        })
    }
}

/// A configured domain guard.
#[derive(Debug, Clone)]
pub struct NamedGuard {
    kind: BuiltinGuard,
    redirect_to: Option<String>,
    except: BTreeSet<String>,
}

impl NamedGuard {
    pub fn kind(&self) -> BuiltinGuard {
        self.kind
    }
}

#[async_trait]
impl Guard for NamedGuard {
    fn name(&self) -> &str {
        self.kind.as_str()
    }

    async fn validate(
        &self,
        ctx: &RoutingContext,
        route: &RouteEntry,
    ) -> Result<GuardResult, GuardError> {
        if self.except.contains(&route.pattern().shape()) {
            return Ok(GuardResult::allow());
        }
        Ok(self
            .kind
            .check(ctx)
            .redirect_to(self.redirect_to.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{OrganizationInfo, UserIdentity};

    fn route(path: &str) -> RouteEntry {
        RouteEntry::new(path).unwrap()
    }

    fn ctx(user: Option<UserIdentity>) -> RoutingContext {
        RoutingContext::new("acme-app.example.com", "/").with_user(user)
    }

    #[tokio::test]
    async fn test_require_auth() {
        let mut r = route("/");
        r.require_auth = true;

        let denied = RouteGuard::RequireAuth.validate(&ctx(None), &r).await.unwrap();
        assert!(!denied.allowed);
        assert_eq!(denied.reason.as_deref(), Some("authentication required"));

        let ok = RouteGuard::RequireAuth
            .validate(&ctx(Some(UserIdentity::new("u"))), &r)
            .await
            .unwrap();
        assert!(ok.allowed);
    }

    #[tokio::test]
    async fn test_roles_and_permissions_bypassed_by_super_admin() {
        let mut r = route("/configuracoes");
        r.allowed_roles.insert("admin".into());
        r.required_permissions.insert("config:write".into());

        let member = ctx(Some(UserIdentity::new("u").with_roles(["viewer"])));
        assert!(!RouteGuard::AllowedRoles.validate(&member, &r).await.unwrap().allowed);
        assert!(!RouteGuard::RequiredPermissions.validate(&member, &r).await.unwrap().allowed);

        let root = ctx(Some(UserIdentity::new("root").super_admin()));
        assert!(RouteGuard::AllowedRoles.validate(&root, &r).await.unwrap().allowed);
        assert!(RouteGuard::RequiredPermissions.validate(&root, &r).await.unwrap().allowed);

        let admin = ctx(Some(
            UserIdentity::new("a")
                .with_roles(["admin"])
                .with_permissions(["config:write"]),
        ));
        assert!(RouteGuard::AllowedRoles.validate(&admin, &r).await.unwrap().allowed);
        assert!(RouteGuard::RequiredPermissions.validate(&admin, &r).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_supplier_only_carries_redirect() {
        let guard = GuardSpec::new(BuiltinGuard::SupplierOnly)
            .redirecting_to("/login")
            .build()
            .unwrap();

        let result = guard
            .validate(&ctx(Some(UserIdentity::new("u"))), &route("/"))
            .await
            .unwrap();
        assert!(!result.allowed);
        assert_eq!(result.redirect_to.as_deref(), Some("/login"));

        let supplier = ctx(Some(UserIdentity::new("s").supplier()));
        assert!(guard.validate(&supplier, &route("/")).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_except_paths_skip_guard() {
        let guard = GuardSpec::new(BuiltinGuard::SuperAdminOnly)
            .except(["/login/"])
            .build()
            .unwrap();

        assert!(guard.validate(&ctx(None), &route("/login")).await.unwrap().allowed);
        assert!(!guard.validate(&ctx(None), &route("/")).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_except_matches_parameterized_routes() {
        let guard = GuardSpec::new(BuiltinGuard::SuperAdminOnly)
            .except(["/publico/:id"])
            .build()
            .unwrap();

        assert!(guard.validate(&ctx(None), &route("/publico/:id")).await.unwrap().allowed);
        assert!(guard.validate(&ctx(None), &route("/publico/:slug")).await.unwrap().allowed);
        assert!(!guard.validate(&ctx(None), &route("/publico/:id/itens")).await.unwrap().allowed);
        assert!(!guard.validate(&ctx(None), &route("/publico")).await.unwrap().allowed);
    }

    #[test]
    fn test_malformed_except_rejected_at_build() {
        let err = GuardSpec::new(BuiltinGuard::SupplierOnly)
            .except(["login"])
            .build()
            .unwrap_err();
        assert_eq!(err, InvalidPath("login".into()));
    }

    #[tokio::test]
    async fn test_organization_guards() {
        let active = OrganizationInfo::new("org-1", "acme", true);
        let inactive = OrganizationInfo::new("org-2", "zeta", false);
        let member = UserIdentity::new("u").member_of("org-1");

        let org_active = GuardSpec::new(BuiltinGuard::OrganizationActive).build().unwrap();
        let with_active = ctx(None).with_organization(Some(active.clone()));
        let with_inactive = ctx(None).with_organization(Some(inactive));
        assert!(org_active.validate(&with_active, &route("/")).await.unwrap().allowed);
        let denied = org_active.validate(&with_inactive, &route("/")).await.unwrap();
        assert_eq!(denied.reason.as_deref(), Some("organization inactive"));
        let missing = org_active.validate(&ctx(None), &route("/")).await.unwrap();
        assert_eq!(missing.reason.as_deref(), Some("organization not found"));

        let org_member = GuardSpec::new(BuiltinGuard::OrganizationMember).build().unwrap();
        let ok = ctx(Some(member)).with_organization(Some(active.clone()));
        assert!(org_member.validate(&ok, &route("/")).await.unwrap().allowed);

        let outsider = ctx(Some(UserIdentity::new("x").member_of("org-9")))
            .with_organization(Some(active.clone()));
        assert!(!org_member.validate(&outsider, &route("/")).await.unwrap().allowed);

        let root = ctx(Some(UserIdentity::new("r").super_admin())).with_organization(Some(active));
        assert!(org_member.validate(&root, &route("/")).await.unwrap().allowed);
    }

    #[test]
    fn test_guard_spec_from_toml() {
        let spec: GuardSpec = toml::from_str(
            r#"
            kind = "supplier-only"
            redirect_to = "/login"
            except = ["/login"]
            "#,
        )
        .unwrap();
        assert_eq!(spec.kind, BuiltinGuard::SupplierOnly);
        assert_eq!(spec.redirect_to.as_deref(), Some("/login"));
        assert_eq!(spec.except, vec!["/login".to_string()]);
    }
}

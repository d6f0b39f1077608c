//! Built-in tenant surfaces.
//!
//! Used when the configuration file declares no domains. The order below is
//! the resolution order: allow-list surfaces first, the exclusion-based
//! landing page last.

use crate::config::schema::{DomainRecord, RedirectRecord, RouteRecord};
use crate::domain::hostname::HostnamePredicate;
use crate::guard::{BuiltinGuard, GuardSpec};
use crate::redirect::RedirectCondition;

pub const MARKETING: &str = "marketing";
pub const SUPER_ADMIN: &str = "super-admin";
pub const SUPPLIER: &str = "supplier";
pub const APP_TENANT: &str = "app-tenant";
pub const LANDING_ORG: &str = "landing-org";

/// Landing page shown for unknown or inactive organizations.
pub const ORGANIZATION_UNAVAILABLE: &str = "/indisponivel";

/// The five standard surfaces for `base_domain`.
pub fn standard(base_domain: &str) -> Vec<DomainRecord> {
    vec![
        marketing(base_domain),
        super_admin(base_domain),
        supplier(),
        app_tenant(base_domain),
        landing_org(base_domain),
    ]
}

fn marketing(base: &str) -> DomainRecord {
    let mut d = DomainRecord::new(
        MARKETING,
        HostnamePredicate::exact([
            base.to_string(),
            format!("www.{base}"),
            "localhost".to_string(),
            "127.0.0.1".to_string(),
        ]),
    );
    d.routes = vec![
        RouteRecord::new("/", "marketing.home"),
        RouteRecord::new("/login", "auth.login"),
        RouteRecord::new("/cadastro", "auth.signup"),
        RouteRecord::new("/precos", "marketing.pricing"),
        RouteRecord::new("/gerarorcamento", "quotes.public_builder").authenticated(),
    ];
    d.redirects = vec![
        RedirectRecord::internal("/gerarorcamento", "/login").when(RedirectCondition::Anonymous),
        RedirectRecord::cross_domain("/admin/*", format!("https://admin.{base}")).preserving_path(),
    ];
    d
}

fn super_admin(base: &str) -> DomainRecord {
    let mut d = DomainRecord::new(SUPER_ADMIN, HostnamePredicate::prefix(["admin"]));
    d.settings.allow_anonymous = false;
    d.routes = vec![
        RouteRecord::new("/", "admin.dashboard"),
        RouteRecord::new("/login", "auth.login"),
        RouteRecord::new("/organizacoes", "admin.organizations"),
        RouteRecord::new("/organizacoes/:id", "admin.organization"),
        RouteRecord::new("/usuarios", "admin.users"),
        RouteRecord::new("/planos", "admin.plans"),
    ];
    d.redirects = vec![
        RedirectRecord::internal("/orcamentos/*", "/"),
        RedirectRecord::internal("/financeiro/*", "/"),
        RedirectRecord::cross_domain("/site/*", format!("https://{base}")).preserving_path(),
    ];
    d.guards = vec![GuardSpec::new(BuiltinGuard::SuperAdminOnly).except(["/login"])];
    d
}

fn supplier() -> DomainRecord {
    let mut d = DomainRecord::new(SUPPLIER, HostnamePredicate::prefix(["fornecedores"]));
    d.settings.allow_anonymous = false;
    d.routes = vec![
        RouteRecord::new("/", "supplier.dashboard"),
        RouteRecord::new("/login", "auth.login"),
        RouteRecord::new("/pedidos", "supplier.orders"),
        RouteRecord::new("/pedidos/:id", "supplier.order"),
        RouteRecord::new("/cotacoes", "supplier.quotes"),
    ];
    d.guards = vec![GuardSpec::new(BuiltinGuard::SupplierOnly)
        .redirecting_to("/login")
        .except(["/login"])];
    d
}

fn app_tenant(base: &str) -> DomainRecord {
    let mut d = DomainRecord::new(APP_TENANT, HostnamePredicate::label_suffix("-app"));
    d.settings.dynamic_subdomain = true;
    d.settings.slug_pattern = Some(format!(r"^([a-z0-9-]+)-app\.{}$", regex::escape(base)));
    d.unauthorized_route = "/sem-permissao".to_string();
    d.routes = vec![
        RouteRecord::new("/", "app.dashboard").authenticated(),
        RouteRecord::new("/login", "auth.login"),
        RouteRecord::new("/sem-permissao", "app.forbidden"),
        RouteRecord::new("/orcamentos", "quotes.list").authenticated(),
        RouteRecord::new("/orcamentos/:id", "quotes.detail").authenticated(),
        RouteRecord::new("/financeiro", "finance.overview")
            .authenticated()
            .permissions(["financeiro:read"]),
        RouteRecord::new("/financeiro/liberacoes", "finance.releases")
            .authenticated()
            .roles(["admin", "financeiro"])
            .permissions(["financeiro:release"])
            .fallback("/financeiro"),
        RouteRecord::new("/producao", "production.board")
            .authenticated()
            .roles(["admin", "producao"]),
        RouteRecord::new("/configuracoes", "app.settings")
            .authenticated()
            .roles(["admin"]),
    ];
    d.redirects = vec![RedirectRecord::internal("/orcamento/*", "/orcamentos").preserving_path()];
    d.guards = vec![
        GuardSpec::new(BuiltinGuard::OrganizationActive).except(["/login"]),
        GuardSpec::new(BuiltinGuard::OrganizationMember).except(["/login", "/sem-permissao"]),
    ];
    d
}

fn landing_org(base: &str) -> DomainRecord {
    let mut d = DomainRecord::new(LANDING_ORG, HostnamePredicate::catch_all());
    d.settings.dynamic_subdomain = true;
    d.settings.slug_pattern = Some(format!(r"^([a-z0-9-]+)\.{}$", regex::escape(base)));
    d.routes = vec![
        RouteRecord::new("/", "landing.home"),
        RouteRecord::new("/sobre", "landing.about"),
        RouteRecord::new("/contato", "landing.contact"),
        RouteRecord::new("/catalogo", "landing.catalog"),
        RouteRecord::new("/catalogo/:produto", "landing.product"),
        RouteRecord::new(ORGANIZATION_UNAVAILABLE, "landing.unavailable"),
    ];
    d.redirects = vec![
        RedirectRecord::cross_domain("/admin/*", format!("https://admin.{base}")).preserving_path(),
    ];
    // Anonymous visitors have no login page here; send them somewhere routed
    // that the guard itself lets through.
    d.guards = vec![GuardSpec::new(BuiltinGuard::OrganizationActive)
        .redirecting_to(ORGANIZATION_UNAVAILABLE)
        .except([ORGANIZATION_UNAVAILABLE])];
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::registry::DomainRegistry;

    #[test]
    fn test_standard_preset_builds() {
        let registry = DomainRegistry::from_records(&standard("example.com"), true).unwrap();
        let ids: Vec<&str> = registry.domains().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec![MARKETING, SUPER_ADMIN, SUPPLIER, APP_TENANT, LANDING_ORG]);
    }

    #[test]
    fn test_preset_follows_base_domain() {
        let registry = DomainRegistry::from_records(&standard("acme.test"), true).unwrap();
        assert_eq!(registry.resolve("acme.test").unwrap().id, MARKETING);
        assert_eq!(registry.resolve("admin.acme.test").unwrap().id, SUPER_ADMIN);

        let app = registry.resolve("loja-app.acme.test").unwrap();
        assert_eq!(app.tenant_slug("loja-app.acme.test").as_deref(), Some("loja"));
    }

    #[test]
    fn test_every_guard_redirect_is_routed() {
        let registry = DomainRegistry::from_records(&standard("example.com"), true).unwrap();
        for record in standard("example.com") {
            let domain = registry.get(&record.id).unwrap();
            for guard in &record.guards {
                if let Some(target) = &guard.redirect_to {
                    assert!(domain.routes.lookup(target).is_some(), "{}: {target}", record.id);
                }
            }
        }
    }

    #[test]
    fn test_super_admin_login_reachable() {
        let registry = DomainRegistry::from_records(&standard("example.com"), true).unwrap();
        let admin = registry.get(SUPER_ADMIN).unwrap();
        assert!(!admin.routes.get("/login").unwrap().require_auth);
        assert!(admin.routes.get("/usuarios").unwrap().require_auth);
    }
}

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::context::OrganizationInfo;
use crate::domain::hostname::HostnamePredicate;
use crate::domain::presets;
use crate::guard::GuardSpec;
use crate::redirect::{RedirectCondition, RedirectKind};

/// Root configuration for the tenant router.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Base domain used by the built-in domain preset.
    pub base_domain: String,

    /// Dispatch engine settings.
    pub dispatch: DispatchConfig,

    /// Organization directory (data store) settings.
    pub directory: DirectoryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Tenant surfaces, in resolution order. Empty selects the preset.
    pub domains: Vec<DomainRecord>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            base_domain: "example.com".to_string(),
            dispatch: DispatchConfig::default(),
            directory: DirectoryConfig::default(),
            observability: ObservabilityConfig::default(),
            domains: Vec::new(),
        }
    }
}

impl RouterConfig {
    /// Domains in resolution order, falling back to the standard preset.
    pub fn effective_domains(&self) -> Vec<DomainRecord> {
        if self.domains.is_empty() {
            presets::standard(&self.base_domain)
        } else {
            self.domains.clone()
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Total request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Dispatch engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Deadline for each guard, in milliseconds.
    pub guard_timeout_ms: u64,

    /// Maximum internal redirects followed for one request.
    pub max_internal_redirects: usize,

    /// Evaluate guards concurrently (first failure by position still wins).
    pub prefetch_guards: bool,

    /// Reject registries without an exclusion-based catch-all domain.
    pub require_catch_all: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            guard_timeout_ms: 3000,
            max_internal_redirects: 5,
            prefetch_guards: false,
            require_catch_all: true,
        }
    }
}

/// Directory backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryKind {
    Memory,
    Http,
}

/// Organization directory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub kind: DirectoryKind,

    /// Base URL of the data store API (http directory only).
    pub base_url: String,

    /// Lookup timeout in milliseconds.
    pub timeout_ms: u64,

    /// Seed records for the memory directory.
    pub organizations: Vec<OrganizationInfo>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            kind: DirectoryKind::Memory,
            base_url: "http://localhost:3000".to_string(),
            timeout_ms: 2000,
            organizations: Vec::new(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// One tenant surface.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DomainRecord {
    /// Unique identifier for lookup and logging.
    pub id: String,

    /// Which hostnames this surface owns.
    pub hostname: HostnamePredicate,

    #[serde(default)]
    pub routes: Vec<RouteRecord>,

    #[serde(default)]
    pub redirects: Vec<RedirectRecord>,

    #[serde(default)]
    pub guards: Vec<GuardSpec>,

    #[serde(default = "default_route")]
    pub default_route: String,

    #[serde(default = "default_login_route")]
    pub login_route: String,

    #[serde(default = "default_unauthorized_route")]
    pub unauthorized_route: String,

    #[serde(default)]
    pub settings: DomainSettingsRecord,
}

fn default_route() -> String {
    "/".to_string()
}

fn default_login_route() -> String {
    "/login".to_string()
}

fn default_unauthorized_route() -> String {
    "/unauthorized".to_string()
}

impl DomainRecord {
    pub fn new(id: impl Into<String>, hostname: HostnamePredicate) -> Self {
        Self {
            id: id.into(),
            hostname,
            routes: Vec::new(),
            redirects: Vec::new(),
            guards: Vec::new(),
            default_route: default_route(),
            login_route: default_login_route(),
            unauthorized_route: default_unauthorized_route(),
            settings: DomainSettingsRecord::default(),
        }
    }
}

/// Per-domain switches.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DomainSettingsRecord {
    /// Inactive domains never match a hostname.
    pub active: bool,

    /// When false, every route except the login route requires auth.
    pub allow_anonymous: bool,

    /// Tenant slug is encoded in the hostname.
    pub dynamic_subdomain: bool,

    /// Regex with exactly one capture group yielding the slug.
    pub slug_pattern: Option<String>,
}

impl Default for DomainSettingsRecord {
    fn default() -> Self {
        Self {
            active: true,
            allow_anonymous: true,
            dynamic_subdomain: false,
            slug_pattern: None,
        }
    }
}

/// Route definition.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RouteRecord {
    /// Literal path, `/segment/:param` pattern, or `*`.
    pub path: String,

    /// Handler reference for the outbound renderer.
    pub handler: Option<String>,

    pub require_auth: bool,
    pub allowed_roles: Vec<String>,
    pub required_permissions: Vec<String>,
    pub fallback_route: Option<String>,
}

impl RouteRecord {
    pub fn new(path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            handler: Some(handler.into()),
            ..Self::default()
        }
    }

    pub fn authenticated(mut self) -> Self {
        self.require_auth = true;
        self
    }

    pub fn roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_roles.extend(roles.into_iter().map(Into::into));
        self
    }

    pub fn permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    pub fn fallback(mut self, path: impl Into<String>) -> Self {
        self.fallback_route = Some(path.into());
        self
    }
}

/// Redirect rule definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedirectRecord {
    /// Literal path, or `prefix/*`.
    pub from: String,

    /// Internal path or absolute URL.
    pub to: String,

    #[serde(default)]
    pub kind: RedirectKind,

    #[serde(default)]
    pub preserve_path: bool,

    #[serde(default)]
    pub condition: Option<RedirectCondition>,
}

impl RedirectRecord {
    pub fn internal(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind: RedirectKind::Internal,
            preserve_path: false,
            condition: None,
        }
    }

    pub fn cross_domain(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            kind: RedirectKind::CrossDomain,
            ..Self::internal(from, to)
        }
    }

    pub fn preserving_path(mut self) -> Self {
        self.preserve_path = true;
        self
    }

    pub fn when(mut self, condition: RedirectCondition) -> Self {
        self.condition = Some(condition);
        self
    }
}

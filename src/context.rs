//! Request-scoped routing context.
//!
//! # Lifecycle
//! ```text
//! inbound (hostname, pathname, identity)
//!     → dispatcher resolves domain + tenant slug + organization
//!     → RoutingContext (frozen)
//!     → redirect conditions / guards borrow it read-only
//!     → dropped when dispatch completes
//! ```
//!
//! # Design Decisions
//! - Built fresh per request, never shared between requests
//! - Handed out as `&RoutingContext` only; an internal redirect produces a
//!   new context through [`RoutingContext::with_pathname`]
//! - Identity is already resolved upstream; the router only reads it

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// An authenticated principal as seen by the router.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserIdentity {
    pub id: String,
    pub roles: BTreeSet<String>,
    pub permissions: BTreeSet<String>,
    pub is_super_admin: bool,
    pub is_supplier: bool,
    pub organization_id: Option<String>,
}

impl UserIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    pub fn super_admin(mut self) -> Self {
        self.is_super_admin = true;
        self
    }

    pub fn supplier(mut self) -> Self {
        self.is_supplier = true;
        self
    }

    pub fn member_of(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

/// Organization record as returned by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationInfo {
    pub id: String,
    pub slug: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl OrganizationInfo {
    pub fn new(id: impl Into<String>, slug: impl Into<String>, is_active: bool) -> Self {
        Self {
            id: id.into(),
            slug: slug.into(),
            is_active,
        }
    }
}

/// Immutable snapshot handed to redirect conditions and guards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingContext {
    pub hostname: String,
    pub pathname: String,
    /// Tenant slug, only set for dynamic-subdomain domains.
    pub slug: Option<String>,
    pub user: Option<UserIdentity>,
    pub organization: Option<OrganizationInfo>,
}

impl RoutingContext {
    pub fn new(hostname: impl Into<String>, pathname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            pathname: pathname.into(),
            slug: None,
            user: None,
            organization: None,
        }
    }

    pub fn with_user(mut self, user: Option<UserIdentity>) -> Self {
        self.user = user;
        self
    }

    pub fn with_slug(mut self, slug: Option<String>) -> Self {
        self.slug = slug;
        self
    }

    pub fn with_organization(mut self, organization: Option<OrganizationInfo>) -> Self {
        self.organization = organization;
        self
    }

    /// Copy of this context pointing at a rewritten pathname.
    pub fn with_pathname(&self, pathname: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            ..self.clone()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_super_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_super_admin)
    }
}

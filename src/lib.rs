//! Multi-domain request router.
//!
//! Given a hostname, a pathname and an already-resolved identity, decide
//! which tenant surface owns the request, which redirects rewrite it, which
//! route applies and whether guards let it through.

// Engine
pub mod context;
pub mod dispatch;
pub mod domain;
pub mod guard;
pub mod redirect;
pub mod routing;

// Collaborators
pub mod config;
pub mod directory;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::RouterConfig;
pub use context::{OrganizationInfo, RoutingContext, UserIdentity};
pub use dispatch::{DispatchOutcome, DispatchRequest, Dispatcher, RoutingError};
pub use domain::{DomainConfig, DomainRegistry};
pub use http::HttpServer;
pub use lifecycle::Shutdown;

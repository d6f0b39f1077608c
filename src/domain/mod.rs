//! Tenant surface (domain) subsystem.
//!
//! # Data Flow
//! ```text
//! DomainRecord[] (config file or presets.rs)
//!     → config.rs (compile routes, redirects, guards, slug pattern)
//!     → registry.rs (check ordering, derive catch-all exclusions)
//!     → DomainRegistry (immutable, shared via Arc)
//!
//! Per request:
//!     hostname
//!     → hostname.rs (normalize, evaluate predicates in registry order)
//!     → slug.rs (tenant slug for dynamic-subdomain domains)
//! ```
//!
//! # Design Decisions
//! - Predicates are data, evaluated without external state
//! - First match wins; catch-all surfaces are forced to the end
//! - Configuration errors surface at build time, never per request

pub mod config;
pub mod hostname;
pub mod presets;
pub mod registry;
pub mod slug;

pub use config::{DomainConfig, DomainError, DomainSettings};
pub use hostname::{normalize_hostname, HostnamePredicate};
pub use registry::{DomainRegistry, RegistryError};
pub use slug::{compile_slug_pattern, extract_slug, SlugPatternError};

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, all errors collected)
//!     → RouterConfig (validated, immutable)
//!     → lifecycle::startup builds the DomainRegistry once
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - An empty domain list selects the built-in preset for `base_domain`
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    DirectoryConfig, DirectoryKind, DispatchConfig, DomainRecord, DomainSettingsRecord,
    ListenerConfig, ObservabilityConfig, RedirectRecord, RouteRecord, RouterConfig,
};
pub use validation::{validate_config, ValidationError};

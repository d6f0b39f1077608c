//! Subsystem initialization.
//!
//! Order: domain registry (fails fast on any configuration error), then the
//! organization directory, then the dispatcher that ties them together.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::RouterConfig;
use crate::directory::{self, DirectoryError};
use crate::dispatch::Dispatcher;
use crate::domain::{DomainRegistry, RegistryError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// Compile the configured (or preset) domains into a registry.
pub fn build_registry(config: &RouterConfig) -> Result<DomainRegistry, RegistryError> {
    let records = config.effective_domains();
    let registry = DomainRegistry::from_records(&records, config.dispatch.require_catch_all)?;
    tracing::info!(
        domains = registry.len(),
        preset = config.domains.is_empty(),
        base_domain = %config.base_domain,
        "Domain registry built"
    );
    Ok(registry)
}

/// Build the dispatcher with its registry and directory.
pub fn build_dispatcher(config: &RouterConfig) -> Result<Dispatcher, StartupError> {
    let registry = build_registry(config)?;
    let directory = directory::from_config(&config.directory)?;
    tracing::info!(kind = ?config.directory.kind, "Organization directory ready");

    Ok(Dispatcher::new(Arc::new(registry), directory, &config.dispatch)
        .with_lookup_timeout(Duration::from_millis(config.directory.timeout_ms)))
}

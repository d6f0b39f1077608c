//! Semantic configuration checks.
//!
//! Serde guarantees the shape; this module checks meaning. Every problem is
//! collected so an operator sees the full list at once.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{DirectoryKind, RouterConfig};
use crate::domain::registry::layout_errors;
use crate::domain::{DomainConfig, DomainError, RegistryError};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("domain `{domain}`: {source}")]
    Domain {
        domain: String,
        #[source]
        source: DomainError,
    },

    #[error(transparent)]
    Layout(#[from] RegistryError),

    #[error("`{0}` must be greater than zero")]
    Zero(&'static str),

    #[error("`{field}` is not a socket address: `{value}`")]
    Address { field: &'static str, value: String },

    #[error("directory base url `{0}` is not an absolute http(s) url")]
    DirectoryUrl(String),
}

/// Check the whole configuration, returning every problem found.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    let numbers = [
        ("listener.request_timeout_secs", config.listener.request_timeout_secs),
        ("dispatch.guard_timeout_ms", config.dispatch.guard_timeout_ms),
        ("directory.timeout_ms", config.directory.timeout_ms),
    ];
    for (field, value) in numbers {
        if value == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }

    if config.directory.kind == DirectoryKind::Http {
        let valid = Url::parse(&config.directory.base_url)
            .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
            .unwrap_or(false);
        if !valid {
            errors.push(ValidationError::DirectoryUrl(config.directory.base_url.clone()));
        }
    }

    let records = config.effective_domains();
    let layout: Vec<(&str, bool)> = records
        .iter()
        .map(|r| (r.id.as_str(), r.hostname.is_catch_all()))
        .collect();
    errors.extend(
        layout_errors(&layout, config.dispatch.require_catch_all)
            .into_iter()
            .map(ValidationError::Layout),
    );

    for record in &records {
        if let Err(source) = DomainConfig::from_record(record) {
            errors.push(ValidationError::Domain {
                domain: record.id.clone(),
                source,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::Address {
            field,
            value: value.to_string(),
        });
    }
}

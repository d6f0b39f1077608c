//! Domain registry: hostname → tenant surface resolution.
//!
//! # Responsibilities
//! - Hold every compiled domain in resolution order
//! - Resolve a hostname to exactly one domain (first match wins)
//! - Derive catch-all exclusion lists from the other domains at build time
//!
//! # Design Decisions
//! - Built once at startup, read-only afterwards (shared via Arc)
//! - Allow-list domains must precede any catch-all; enforced, not assumed
//! - No match is an error, never a silent fallback to some domain

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use thiserror::Error;

use crate::config::schema::DomainRecord;
use crate::dispatch::RoutingError;
use crate::domain::config::{DomainConfig, DomainError};
use crate::domain::hostname::{normalize_hostname, HostnamePredicate};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("registry has no domains")]
    Empty,

    #[error("duplicate domain id `{0}`")]
    DuplicateId(String),

    #[error("catch-all domain `{catch_all}` must come after specific domain `{specific}`")]
    CatchAllBeforeSpecific { catch_all: String, specific: String },

    #[error("no catch-all domain configured")]
    MissingCatchAll,

    #[error("domain `{id}`: {source}")]
    Domain {
        id: String,
        #[source]
        source: DomainError,
    },
}

/// Ordering and uniqueness problems of a domain list, given as
/// `(id, is_catch_all)` pairs in resolution order.
pub fn layout_errors(layout: &[(&str, bool)], require_catch_all: bool) -> Vec<RegistryError> {
    let mut errors = Vec::new();

    if layout.is_empty() {
        errors.push(RegistryError::Empty);
        return errors;
    }

    let mut seen = HashSet::new();
    for (id, _) in layout {
        if !seen.insert(*id) {
            errors.push(RegistryError::DuplicateId(id.to_string()));
        }
    }

    let mut first_catch_all: Option<&str> = None;
    for &(id, is_catch_all) in layout {
        match (is_catch_all, first_catch_all) {
            (true, None) => first_catch_all = Some(id),
            (false, Some(earlier)) => errors.push(RegistryError::CatchAllBeforeSpecific {
                catch_all: earlier.to_string(),
                specific: id.to_string(),
            }),
            _ => {}
        }
    }

    if require_catch_all && first_catch_all.is_none() {
        errors.push(RegistryError::MissingCatchAll);
    }

    errors
}

/// Ordered, immutable collection of tenant surfaces.
#[derive(Debug, Clone)]
pub struct DomainRegistry {
    domains: Vec<Arc<DomainConfig>>,
    by_id: HashMap<String, usize>,
}

impl DomainRegistry {
    /// Build the registry from compiled domains, in resolution order.
    pub fn build(
        mut domains: Vec<DomainConfig>,
        require_catch_all: bool,
    ) -> Result<Self, RegistryError> {
        let layout: Vec<(&str, bool)> = domains
            .iter()
            .map(|d| (d.id.as_str(), d.is_catch_all()))
            .collect();
        if let Some(err) = layout_errors(&layout, require_catch_all).into_iter().next() {
            return Err(err);
        }

        let predicates: Vec<HostnamePredicate> =
            domains.iter().map(|d| d.hostname.clone()).collect();
        for (idx, domain) in domains.iter_mut().enumerate() {
            if !domain.is_catch_all() {
                continue;
            }
            let others = predicates
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != idx)
                .map(|(_, p)| p.clone())
                .collect();
            domain.hostname = domain.hostname.clone().with_exclusions(others);
        }

        let by_id = domains
            .iter()
            .enumerate()
            .map(|(idx, d)| (d.id.clone(), idx))
            .collect();

        for domain in &domains {
            tracing::debug!(
                domain = %domain.id,
                routes = domain.routes.len(),
                redirects = domain.redirects.len(),
                guards = domain.guards.len(),
                catch_all = domain.is_catch_all(),
                active = domain.settings.active,
                "Domain registered"
            );
        }

        Ok(Self {
            domains: domains.into_iter().map(Arc::new).collect(),
            by_id,
        })
    }

    /// Compile configuration records and build the registry.
    pub fn from_records(
        records: &[DomainRecord],
        require_catch_all: bool,
    ) -> Result<Self, RegistryError> {
        let domains = records
            .iter()
            .map(|record| {
                DomainConfig::from_record(record).map_err(|source| RegistryError::Domain {
                    id: record.id.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::build(domains, require_catch_all)
    }

    /// First active domain, in registry order, whose predicate accepts the
    /// hostname.
    pub fn resolve(&self, hostname: &str) -> Result<&Arc<DomainConfig>, RoutingError> {
        let host = normalize_hostname(hostname);

        match self
            .domains
            .iter()
            .find(|d| d.settings.active && d.hostname.matches(&host))
        {
            Some(domain) => {
                tracing::debug!(domain = %domain.id, hostname = %host, "Domain resolved");
                Ok(domain)
            }
            None => {
                tracing::warn!(hostname = %host, "Unresolved hostname");
                Err(RoutingError::UnresolvedHostname { hostname: host })
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Arc<DomainConfig>> {
        self.by_id.get(id).map(|&idx| &self.domains[idx])
    }

    pub fn domains(&self) -> &[Arc<DomainConfig>] {
        &self.domains
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

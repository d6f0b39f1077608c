//! Route table lookup.
//!
//! # Responsibilities
//! - Store the compiled routes of one domain
//! - Look up the route for a (possibly rewritten) pathname
//! - Return the matched route or an explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) literal lookup via HashMap
//! - Parameterized patterns scanned longest static prefix first
//! - Wildcard only when nothing else matched

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use thiserror::Error;

use crate::config::schema::RouteRecord;
use crate::routing::matcher::{normalize_path, InvalidPath, PathParams, PathPattern};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteTableError {
    #[error("{0}")]
    InvalidPath(String),

    #[error("duplicate route path `{0}`")]
    DuplicatePath(String),
}

impl From<InvalidPath> for RouteTableError {
    fn from(e: InvalidPath) -> Self {
        Self::InvalidPath(e.to_string())
    }
}

/// One routable path inside a domain.
#[derive(Debug, Clone, Serialize)]
pub struct RouteEntry {
    /// Path as declared (`/`, `/orcamentos/:id`, `*`).
    pub path: String,
    /// Handler reference passed to the outbound renderer.
    pub handler: Option<String>,
    pub require_auth: bool,
    pub allowed_roles: BTreeSet<String>,
    pub required_permissions: BTreeSet<String>,
    pub fallback_route: Option<String>,
    #[serde(skip)]
    pattern: PathPattern,
}

impl RouteEntry {
    pub fn new(path: impl Into<String>) -> Result<Self, RouteTableError> {
        let path = path.into();
        let pattern = PathPattern::parse(&path)?;
        Ok(Self {
            path,
            handler: None,
            require_auth: false,
            allowed_roles: BTreeSet::new(),
            required_permissions: BTreeSet::new(),
            fallback_route: None,
            pattern,
        })
    }

    pub fn from_record(record: &RouteRecord) -> Result<Self, RouteTableError> {
        let mut entry = Self::new(record.path.clone())?;
        entry.handler = record.handler.clone();
        entry.require_auth = record.require_auth;
        entry.allowed_roles = record.allowed_roles.iter().cloned().collect();
        entry.required_permissions = record.required_permissions.iter().cloned().collect();
        entry.fallback_route = record.fallback_route.clone();
        Ok(entry)
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self.pattern, PathPattern::Wildcard)
    }

    /// Normalized form used for comparisons with pathnames.
    pub fn normalized_path(&self) -> String {
        match &self.pattern {
            PathPattern::Literal(p) => p.clone(),
            other => other.shape(),
        }
    }
}

/// A route selected for a pathname.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    pub entry: &'a RouteEntry,
    pub params: PathParams,
}

/// Compiled, immutable route table for one domain.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
    literals: HashMap<String, usize>,
    /// Indices of parameterized routes, most specific first.
    parameterized: Vec<usize>,
    wildcard: Option<usize>,
}

impl RouteTable {
    pub fn new(entries: Vec<RouteEntry>) -> Result<Self, RouteTableError> {
        let mut literals = HashMap::new();
        let mut parameterized = Vec::new();
        let mut wildcard = None;
        let mut shapes = BTreeSet::new();

        for (idx, entry) in entries.iter().enumerate() {
            let shape = entry.pattern.shape();
            if !shapes.insert(shape.clone()) {
                return Err(RouteTableError::DuplicatePath(entry.path.clone()));
            }

            match &entry.pattern {
                PathPattern::Literal(p) => {
                    literals.insert(p.clone(), idx);
                }
                PathPattern::Parameterized { .. } => parameterized.push(idx),
                PathPattern::Wildcard => wildcard = Some(idx),
            }
        }

        // Stable sort keeps declaration order for equal prefixes
        parameterized.sort_by_key(|&idx| std::cmp::Reverse(entries[idx].pattern.static_prefix()));

        Ok(Self {
            entries,
            literals,
            parameterized,
            wildcard,
        })
    }

    pub fn from_records(records: &[RouteRecord]) -> Result<Self, RouteTableError> {
        let entries = records
            .iter()
            .map(RouteEntry::from_record)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(entries)
    }

    /// Find the route for a pathname: exact, then parameterized, then wildcard.
    pub fn lookup(&self, pathname: &str) -> Option<RouteMatch<'_>> {
        let path = normalize_path(pathname);

        if let Some(&idx) = self.literals.get(&path) {
            return Some(RouteMatch {
                entry: &self.entries[idx],
                params: PathParams::new(),
            });
        }

        for &idx in &self.parameterized {
            let entry = &self.entries[idx];
            if let Some(params) = entry.pattern.capture(&path) {
                return Some(RouteMatch { entry, params });
            }
        }

        self.wildcard.map(|idx| RouteMatch {
            entry: &self.entries[idx],
            params: PathParams::new(),
        })
    }

    pub fn get(&self, path: &str) -> Option<&RouteEntry> {
        let path = normalize_path(path);
        self.literals.get(&path).map(|&idx| &self.entries[idx])
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! A single redirect rule: source matching and target resolution.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::schema::RedirectRecord;
use crate::context::RoutingContext;
use crate::redirect::condition::RedirectCondition;
use crate::routing::normalize_path;

/// Where a redirect sends the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RedirectKind {
    /// Same domain; routing is re-evaluated with the new pathname.
    Internal,
    /// Another tenant surface of this deployment.
    CrossDomain,
    /// Outside the deployment entirely.
    External,
}

impl Default for RedirectKind {
    fn default() -> Self {
        Self::Internal
    }
}

impl RedirectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::CrossDomain => "cross-domain",
            Self::External => "external",
        }
    }

    /// Whether applying the redirect leaves the current domain.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Internal)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RedirectError {
    #[error("redirect source `{0}` must be an absolute path without trailing slash, query or fragment")]
    InvalidSource(String),

    #[error("redirect `{from}` has malformed target `{to}`: {reason}")]
    MalformedTarget {
        from: String,
        to: String,
        reason: String,
    },
}

/// Parsed `from` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectSource {
    /// Literal pathname, exact equality.
    Exact(String),
    /// `prefix/*`: the prefix itself and everything beneath it.
    Prefix(String),
}

impl RedirectSource {
    /// Pathnames are normalized before matching, so a source that differs
    /// from its normalized form could never fire and is rejected.
    pub fn parse(from: &str) -> Result<Self, RedirectError> {
        let invalid = || RedirectError::InvalidSource(from.to_string());
        if !from.starts_with('/') {
            return Err(invalid());
        }
        match from.strip_suffix("/*") {
            Some("") => Ok(Self::Prefix(String::new())),
            Some(prefix) if normalize_path(prefix) == prefix => Ok(Self::Prefix(prefix.to_string())),
            Some(_) => Err(invalid()),
            None if normalize_path(from) == from => Ok(Self::Exact(from.to_string())),
            None => Err(invalid()),
        }
    }

    /// Returns the suffix consumed by the wildcard (empty for exact matches).
    pub fn matches<'p>(&self, pathname: &'p str) -> Option<&'p str> {
        match self {
            Self::Exact(path) => (pathname == path).then_some(""),
            Self::Prefix(prefix) => {
                if pathname == prefix {
                    return Some("");
                }
                pathname
                    .strip_prefix(prefix.as_str())
                    .filter(|rest| rest.starts_with('/'))
            }
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Prefix(_))
    }
}

/// Rewrites a pathname before route matching.
#[derive(Debug, Clone)]
pub struct RedirectRule {
    /// `from` as configured, kept for diagnostics.
    pub from: String,
    pub source: RedirectSource,
    pub to: String,
    pub kind: RedirectKind,
    pub preserve_path: bool,
    pub condition: Option<RedirectCondition>,
}

impl RedirectRule {
    /// Build and validate a rule. Malformed targets are rejected here so
    /// they never reach request time.
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        kind: RedirectKind,
    ) -> Result<Self, RedirectError> {
        let from = from.into();
        let to = to.into();
        let source = RedirectSource::parse(&from)?;
        validate_target(&from, &to, kind)?;

        Ok(Self {
            from,
            source,
            to,
            kind,
            preserve_path: false,
            condition: None,
        })
    }

    pub fn from_record(record: &RedirectRecord) -> Result<Self, RedirectError> {
        let mut rule = Self::new(record.from.clone(), record.to.clone(), record.kind)?;
        rule.preserve_path = record.preserve_path;
        rule.condition = record.condition.clone();
        Ok(rule)
    }

    pub fn preserving_path(mut self) -> Self {
        self.preserve_path = true;
        self
    }

    pub fn when(mut self, condition: RedirectCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Resolve the target for a pathname, honoring source and condition.
    pub fn apply(&self, pathname: &str, ctx: &RoutingContext) -> Option<String> {
        let suffix = self.source.matches(pathname)?;

        if let Some(condition) = &self.condition {
            if !condition.evaluate(ctx) {
                return None;
            }
        }

        if self.preserve_path && self.source.is_wildcard() && !suffix.is_empty() {
            Some(join_target(&self.to, suffix))
        } else {
            Some(self.to.clone())
        }
    }
}

fn join_target(to: &str, suffix: &str) -> String {
    format!("{}{}", to.trim_end_matches('/'), suffix)
}

fn validate_target(from: &str, to: &str, kind: RedirectKind) -> Result<(), RedirectError> {
    let malformed = |reason: &str| RedirectError::MalformedTarget {
        from: from.to_string(),
        to: to.to_string(),
        reason: reason.to_string(),
    };

    match kind {
        RedirectKind::Internal => {
            if to.starts_with('/') && !to.starts_with("//") {
                Ok(())
            } else {
                Err(malformed("internal targets must be absolute paths"))
            }
        }
        RedirectKind::CrossDomain | RedirectKind::External => {
            let url = Url::parse(to).map_err(|e| malformed(&e.to_string()))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(malformed("scheme must be http or https"));
            }
            match url.host_str() {
                Some(host) if !host.is_empty() => Ok(()),
                _ => Err(malformed("missing host")),
            }
        }
    }
}

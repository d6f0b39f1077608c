//! Hostname predicates.
//!
//! # Responsibilities
//! - Normalize raw `Host` values (case, port, trailing dot)
//! - Decide whether a hostname belongs to a tenant surface
//!
//! # Design Decisions
//! - Predicates are plain data: no closures, no external state, so the
//!   same hostname always yields the same answer
//! - Host matching is case-insensitive (RFC 9110)
//! - The catch-all predicate matches by exclusion; its exclusion list is an
//!   explicit value filled in by the registry builder

use serde::{Deserialize, Serialize};

/// Pure `hostname -> bool` test, configured declaratively.
///
/// Deserialized values go through the same normalization as the
/// constructors, so `"Example.com."` in a config file matches `example.com`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case", from = "PredicateRecord")]
pub enum HostnamePredicate {
    /// Full-hostname allow-list.
    Exact { hosts: Vec<String> },

    /// First DNS label allow-list, e.g. `admin` for `admin.example.com`.
    Prefix { labels: Vec<String> },

    /// First DNS label ends with a suffix, e.g. `-app` for `acme-app.example.com`.
    LabelSuffix { suffix: String },

    /// Any dotted hostname that none of `excluded` accepts.
    CatchAll {
        #[serde(default, skip_serializing)]
        excluded: Vec<HostnamePredicate>,
    },
}

/// Wire form of [`HostnamePredicate`], before normalization.
#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum PredicateRecord {
    Exact {
        hosts: Vec<String>,
    },
    Prefix {
        labels: Vec<String>,
    },
    LabelSuffix {
        suffix: String,
    },
    CatchAll {
        #[serde(default)]
        excluded: Vec<HostnamePredicate>,
    },
}

impl From<PredicateRecord> for HostnamePredicate {
    fn from(record: PredicateRecord) -> Self {
        match record {
            PredicateRecord::Exact { hosts } => Self::exact(hosts),
            PredicateRecord::Prefix { labels } => Self::prefix(labels),
            PredicateRecord::LabelSuffix { suffix } => Self::label_suffix(suffix),
            PredicateRecord::CatchAll { excluded } => Self::CatchAll { excluded },
        }
    }
}

impl HostnamePredicate {
    pub fn exact<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Exact {
            hosts: hosts
                .into_iter()
                .map(|h| normalize_hostname(&Into::<String>::into(h)))
                .collect(),
        }
    }

    pub fn prefix<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Prefix {
            labels: labels.into_iter().map(|l| l.into().to_lowercase()).collect(),
        }
    }

    pub fn label_suffix(suffix: impl Into<String>) -> Self {
        Self::LabelSuffix {
            suffix: suffix.into().to_lowercase(),
        }
    }

    pub fn catch_all() -> Self {
        Self::CatchAll { excluded: Vec::new() }
    }

    pub fn is_catch_all(&self) -> bool {
        matches!(self, Self::CatchAll { .. })
    }

    /// Replace the exclusion list of a catch-all predicate. No-op otherwise.
    pub fn with_exclusions(self, exclusions: Vec<HostnamePredicate>) -> Self {
        match self {
            Self::CatchAll { .. } => Self::CatchAll {
                excluded: exclusions
                    .into_iter()
                    .filter(|p| !p.is_catch_all())
                    .collect(),
            },
            other => other,
        }
    }

    /// Evaluate against a hostname. The input is normalized first.
    pub fn matches(&self, hostname: &str) -> bool {
        let host = normalize_hostname(hostname);
        self.matches_normalized(&host)
    }

    fn matches_normalized(&self, host: &str) -> bool {
        match self {
            Self::Exact { hosts } => hosts.iter().any(|h| h.eq_ignore_ascii_case(host)),
            Self::Prefix { labels } => first_label(host)
                .map(|label| labels.iter().any(|l| l.eq_ignore_ascii_case(label)))
                .unwrap_or(false),
            Self::LabelSuffix { suffix } => first_label(host)
                .map(|label| label.len() > suffix.len() && label.ends_with(suffix.as_str()))
                .unwrap_or(false),
            Self::CatchAll { excluded } => {
                host.contains('.') && !excluded.iter().any(|p| p.matches_normalized(host))
            }
        }
    }
}

/// Lowercase, strip the port and any trailing dot.
pub fn normalize_hostname(raw: &str) -> String {
    let raw = raw.trim();
    let without_port = if let Some(rest) = raw.strip_prefix('[') {
        // IPv6 literal: keep the brackets, drop everything after `]`
        match rest.split_once(']') {
            Some((addr, _)) => return format!("[{}]", addr.to_lowercase()),
            None => raw,
        }
    } else {
        match raw.rsplit_once(':') {
            Some((host, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => host,
            _ => raw,
        }
    };

    without_port.trim_end_matches('.').to_lowercase()
}

/// Leading DNS label, only for hostnames that contain at least one dot.
pub fn first_label(host: &str) -> Option<&str> {
    host.split_once('.')
        .map(|(label, _)| label)
        .filter(|label| !label.is_empty())
}

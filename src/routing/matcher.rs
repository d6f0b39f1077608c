//! Path pattern matching.
//!
//! # Responsibilities
//! - Normalize pathnames before lookup
//! - Parse route paths into literal, parameterized or wildcard patterns
//! - Match a pathname against a parameterized pattern, capturing segments
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Trailing slashes are ignored, except for the root `/`
//! - No regex: segment-by-segment comparison only

use std::collections::BTreeMap;
use std::fmt;

/// Captured `:name` segments.
pub type PathParams = BTreeMap<String, String>;

/// Wildcard sentinel used in route tables.
pub const WILDCARD: &str = "*";

/// One `/`-separated piece of a parameterized path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Static(String),
    Param(String),
}

/// A compiled route path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    Literal(String),
    Parameterized {
        segments: Vec<Segment>,
        static_prefix: usize,
    },
    Wildcard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPath(pub String);

impl fmt::Display for InvalidPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "route path `{}` must be `*` or start with `/`", self.0)
    }
}

impl PathPattern {
    pub fn parse(path: &str) -> Result<Self, InvalidPath> {
        if path == WILDCARD {
            return Ok(Self::Wildcard);
        }
        if !path.starts_with('/') {
            return Err(InvalidPath(path.to_string()));
        }

        let normalized = normalize_path(path);
        let segments: Vec<Segment> = split_segments(&normalized)
            .map(|s| match s.strip_prefix(':') {
                Some(name) if !name.is_empty() => Segment::Param(name.to_string()),
                Some(_) => Segment::Static(s.to_string()),
                None => Segment::Static(s.to_string()),
            })
            .collect();

        if segments.iter().all(|s| matches!(s, Segment::Static(_))) {
            return Ok(Self::Literal(normalized));
        }

        let static_prefix = segments
            .iter()
            .take_while(|s| matches!(s, Segment::Static(_)))
            .count();

        Ok(Self::Parameterized {
            segments,
            static_prefix,
        })
    }

    /// Identity used for duplicate detection: parameter names are erased,
    /// so `/a/:id` and `/a/:slug` collide.
    pub fn shape(&self) -> String {
        match self {
            Self::Literal(p) => p.clone(),
            Self::Wildcard => WILDCARD.to_string(),
            Self::Parameterized { segments, .. } => {
                let mut out = String::new();
                for seg in segments {
                    out.push('/');
                    match seg {
                        Segment::Static(s) => out.push_str(s),
                        Segment::Param(_) => out.push(':'),
                    }
                }
                out
            }
        }
    }

    /// Number of leading static segments (0 for literals and the wildcard).
    pub fn static_prefix(&self) -> usize {
        match self {
            Self::Parameterized { static_prefix, .. } => *static_prefix,
            _ => 0,
        }
    }

    /// Match a normalized pathname against a parameterized pattern.
    pub fn capture(&self, pathname: &str) -> Option<PathParams> {
        let Self::Parameterized { segments, .. } = self else {
            return None;
        };

        let parts: Vec<&str> = split_segments(pathname).collect();
        if parts.len() != segments.len() {
            return None;
        }

        let mut params = PathParams::new();
        for (seg, part) in segments.iter().zip(parts) {
            match seg {
                Segment::Static(s) if s == part => {}
                Segment::Static(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(params)
    }
}

/// Ensure a leading `/`, drop query/fragment and trailing slashes.
pub fn normalize_path(raw: &str) -> String {
    let path = raw
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/orcamentos/"), "/orcamentos");
        assert_eq!(normalize_path("orcamentos"), "/orcamentos");
        assert_eq!(normalize_path("/login?next=/x#top"), "/login");
    }

    #[test]
    fn test_parse_literal_and_wildcard() {
        assert_eq!(PathPattern::parse("/").unwrap(), PathPattern::Literal("/".into()));
        assert_eq!(
            PathPattern::parse("/orcamentos/").unwrap(),
            PathPattern::Literal("/orcamentos".into())
        );
        assert_eq!(PathPattern::parse("*").unwrap(), PathPattern::Wildcard);
        assert!(PathPattern::parse("orcamentos").is_err());
    }

    #[test]
    fn test_parameterized_capture() {
        let p = PathPattern::parse("/orcamentos/:id/itens/:item").unwrap();
        assert_eq!(p.static_prefix(), 1);

        let params = p.capture("/orcamentos/42/itens/7").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("42"));
        assert_eq!(params.get("item").map(String::as_str), Some("7"));

        assert!(p.capture("/orcamentos/42").is_none());
        assert!(p.capture("/pedidos/42/itens/7").is_none());
    }

    #[test]
    fn test_shape_erases_param_names() {
        let a = PathPattern::parse("/pedidos/:id").unwrap();
        let b = PathPattern::parse("/pedidos/:numero").unwrap();
        assert_eq!(a.shape(), b.shape());
        assert_ne!(a.shape(), PathPattern::parse("/pedidos/novo").unwrap().shape());
    }
}

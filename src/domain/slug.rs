//! Tenant slug extraction for dynamic-subdomain domains.
//!
//! The slug pattern is tried first; when it is absent or does not match
//! (preview deployments, alternate base domains) the leading label of the
//! hostname is used instead. Callers check `is_dynamic_subdomain` before
//! calling in here.

use regex::Regex;
use thiserror::Error;

use crate::domain::hostname::{first_label, normalize_hostname};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SlugPatternError {
    #[error("slug pattern `{pattern}` does not compile: {message}")]
    Invalid { pattern: String, message: String },

    #[error("slug pattern `{pattern}` must have exactly one capture group, found {found}")]
    CaptureGroups { pattern: String, found: usize },
}

/// Compile a slug pattern, enforcing exactly one capture group.
pub fn compile_slug_pattern(pattern: &str) -> Result<Regex, SlugPatternError> {
    let regex = Regex::new(pattern).map_err(|e| SlugPatternError::Invalid {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;

    // captures_len counts the implicit whole-match group
    let found = regex.captures_len() - 1;
    if found != 1 {
        return Err(SlugPatternError::CaptureGroups {
            pattern: pattern.to_string(),
            found,
        });
    }

    Ok(regex)
}

/// Extract the tenant slug from a hostname.
pub fn extract_slug(pattern: Option<&Regex>, hostname: &str) -> Option<String> {
    let host = normalize_hostname(hostname);

    if let Some(captured) = pattern
        .and_then(|re| re.captures(&host))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|s| !s.is_empty())
    {
        return Some(captured.to_string());
    }

    first_label(&host).map(str::to_string)
}

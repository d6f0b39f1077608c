//! Dispatch results.

use serde::Serialize;
use thiserror::Error;

use crate::redirect::AppliedRedirect;
use crate::routing::PathParams;

/// Per-request routing failures.
///
/// None of these escape the dispatcher; each one is folded into a
/// [`DispatchOutcome`] so the caller always gets a deterministic answer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoutingError {
    #[error("no domain matches hostname `{hostname}`")]
    UnresolvedHostname { hostname: String },

    #[error("domain `{domain}` has no route for `{pathname}`")]
    NoMatchingRoute { domain: String, pathname: String },

    #[error("domain `{domain}` exceeded {hops} internal redirects")]
    RedirectLoop { domain: String, hops: usize },
}

/// Final decision for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Every guard passed; hand off to `handler`.
    Permitted {
        domain: String,
        /// Declared path of the matched route.
        route: String,
        handler: Option<String>,
        /// Pathname after internal redirects.
        pathname: String,
        params: PathParams,
        slug: Option<String>,
        redirects: Vec<AppliedRedirect>,
    },

    /// A guard rejected the request.
    Redirect {
        domain: String,
        guard: String,
        reason: Option<String>,
        target: String,
    },

    /// A cross-domain or external redirect rule fired.
    Navigate {
        domain: String,
        rule: String,
        url: String,
    },

    NotFound {
        domain: String,
        pathname: String,
    },

    Unresolved {
        hostname: String,
    },

    RedirectLoop {
        domain: String,
        hops: usize,
    },

    /// The originating request went away before a decision was reached.
    Aborted,
}

impl DispatchOutcome {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Permitted { .. } => "permitted",
            Self::Redirect { .. } => "redirect",
            Self::Navigate { .. } => "navigate",
            Self::NotFound { .. } => "not_found",
            Self::Unresolved { .. } => "unresolved",
            Self::RedirectLoop { .. } => "redirect_loop",
            Self::Aborted => "aborted",
        }
    }

    /// Id of the resolved domain, if resolution got that far.
    pub fn domain(&self) -> Option<&str> {
        match self {
            Self::Permitted { domain, .. }
            | Self::Redirect { domain, .. }
            | Self::Navigate { domain, .. }
            | Self::NotFound { domain, .. }
            | Self::RedirectLoop { domain, .. } => Some(domain),
            Self::Unresolved { .. } | Self::Aborted => None,
        }
    }

    pub fn is_permitted(&self) -> bool {
        matches!(self, Self::Permitted { .. })
    }
}

impl From<RoutingError> for DispatchOutcome {
    fn from(err: RoutingError) -> Self {
        match err {
            RoutingError::UnresolvedHostname { hostname } => Self::Unresolved { hostname },
            RoutingError::NoMatchingRoute { domain, pathname } => Self::NotFound { domain, pathname },
            RoutingError::RedirectLoop { domain, hops } => Self::RedirectLoop { domain, hops },
        }
    }
}

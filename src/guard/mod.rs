//! Authorization guard subsystem.
//!
//! # Data Flow
//! ```text
//! (RoutingContext, matched RouteEntry)
//!     → chain.rs: implicit route guards (auth → role → permission)
//!     → chain.rs: domain guards in declaration order
//!     → builtin.rs provides the concrete checks
//!     → Verdict::Permitted | Verdict::Rejected(first failure)
//! ```
//!
//! # Design Decisions
//! - One trait, one capability: `validate`. Sync and async checks share it
//! - Sequential, short-circuit evaluation; optional prefetch still reports
//!   the lowest-index failure
//! - Every guard call has a deadline; timeouts and errors reject, never allow
//! - Guards read the context, they never mutate it

pub mod builtin;
pub mod chain;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::context::RoutingContext;
use crate::routing::RouteEntry;

pub use builtin::{BuiltinGuard, GuardSpec, NamedGuard, RouteGuard};
pub use chain::{ChainOptions, GuardChain, Rejection, Verdict};

/// Reason reported when a guard times out or fails internally.
pub const VALIDATION_ERROR: &str = "validation error";

/// Result of one guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardResult {
    pub allowed: bool,
    pub reason: Option<String>,
    pub redirect_to: Option<String>,
}

impl GuardResult {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
            redirect_to: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            redirect_to: None,
        }
    }

    pub fn redirect_to(mut self, path: Option<String>) -> Self {
        if path.is_some() {
            self.redirect_to = path;
        }
        self
    }
}

/// Errors a guard may raise while checking. All of them reject the request.
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("lookup failed: {0}")]
    Lookup(String),

    #[error("guard `{guard}` timed out after {after_ms}ms")]
    Timeout { guard: String, after_ms: u64 },

    #[error("guard failure: {0}")]
    Internal(String),
}

/// An authorization check with a possible redirect outcome.
#[async_trait]
pub trait Guard: Send + Sync + std::fmt::Debug {
    /// Diagnostic identifier, used in logs and metrics.
    fn name(&self) -> &str;

    async fn validate(
        &self,
        ctx: &RoutingContext,
        route: &RouteEntry,
    ) -> Result<GuardResult, GuardError>;
}

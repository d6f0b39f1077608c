//! Ordered guard evaluation.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use serde::Serialize;

use crate::context::RoutingContext;
use crate::guard::{Guard, GuardError, RouteGuard, VALIDATION_ERROR};
use crate::routing::RouteEntry;

/// The first failing guard of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub guard: String,
    /// Position in the full chain (implicit route guards included).
    pub index: usize,
    pub reason: Option<String>,
    pub redirect_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Permitted,
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_permitted(&self) -> bool {
        matches!(self, Self::Permitted)
    }
}

/// Evaluation knobs, taken from the dispatch configuration.
#[derive(Debug, Clone, Copy)]
pub struct ChainOptions {
    /// Deadline for each individual guard.
    pub timeout: Duration,
    /// Run all guards concurrently, still reporting the lowest-index failure.
    pub prefetch: bool,
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            prefetch: false,
        }
    }
}

/// Domain-level guards of one domain, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct GuardChain {
    guards: Vec<Arc<dyn Guard>>,
}

impl GuardChain {
    pub fn new(guards: Vec<Arc<dyn Guard>>) -> Self {
        Self { guards }
    }

    pub fn push(&mut self, guard: Arc<dyn Guard>) {
        self.guards.push(guard);
    }

    pub fn names(&self) -> Vec<&str> {
        self.guards.iter().map(|g| g.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// Evaluate the implicit route guards followed by this chain.
    pub async fn evaluate(
        &self,
        ctx: &RoutingContext,
        route: &RouteEntry,
        options: ChainOptions,
    ) -> Verdict {
        let implicit = RouteGuard::ORDER;
        let full: Vec<&dyn Guard> = implicit
            .iter()
            .map(|g| g as &dyn Guard)
            .chain(self.guards.iter().map(|g| g.as_ref()))
            .collect();

        if options.prefetch {
            let results = join_all(
                full.iter()
                    .enumerate()
                    .map(|(idx, guard)| run_guard(*guard, idx, ctx, route, options.timeout)),
            )
            .await;

            return match results.into_iter().flatten().next() {
                Some(rejection) => Verdict::Rejected(rejection),
                None => Verdict::Permitted,
            };
        }

        for (idx, guard) in full.iter().enumerate() {
            if let Some(rejection) = run_guard(*guard, idx, ctx, route, options.timeout).await {
                return Verdict::Rejected(rejection);
            }
        }
        Verdict::Permitted
    }
}

async fn run_guard(
    guard: &dyn Guard,
    index: usize,
    ctx: &RoutingContext,
    route: &RouteEntry,
    timeout: Duration,
) -> Option<Rejection> {
    let outcome = match tokio::time::timeout(timeout, guard.validate(ctx, route)).await {
        Ok(result) => result,
        Err(_) => Err(GuardError::Timeout {
            guard: guard.name().to_string(),
            after_ms: timeout.as_millis() as u64,
        }),
    };

    match outcome {
        Ok(result) if result.allowed => {
            tracing::trace!(guard = guard.name(), index, "Guard passed");
            None
        }
        Ok(result) => Some(Rejection {
            guard: guard.name().to_string(),
            index,
            reason: result.reason,
            redirect_to: result.redirect_to,
        }),
        Err(e) => {
            tracing::warn!(guard = guard.name(), index, error = %e, "Guard evaluation failed");
            Some(Rejection {
                guard: guard.name().to_string(),
                index,
                reason: Some(VALIDATION_ERROR.to_string()),
                redirect_to: None,
            })
        }
    }
}

//! Redirect rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! (pathname, RoutingContext)
//!     → rule.rs (source match, condition, target resolution)
//!     → RedirectRuleSet::evaluate (first applicable rule wins)
//!     → None | AppliedRedirect { kind, target }
//! ```
//!
//! # Design Decisions
//! - Rules are evaluated in declaration order; later rules are not consulted
//!   once one applies
//! - Targets are validated when the rule is built, never at request time
//! - Each domain owns its own rule set; no cross-domain conflict resolution

pub mod condition;
pub mod rule;

use serde::Serialize;

use crate::context::RoutingContext;

pub use condition::{ConditionFn, RedirectCondition};
pub use rule::{RedirectError, RedirectKind, RedirectRule, RedirectSource};

/// Outcome of a rule that fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedRedirect {
    /// Position of the rule in its set.
    pub rule: usize,
    pub from: String,
    pub kind: RedirectKind,
    pub target: String,
}

/// Ordered redirect rules of one domain.
#[derive(Debug, Clone, Default)]
pub struct RedirectRuleSet {
    rules: Vec<RedirectRule>,
}

impl RedirectRuleSet {
    pub fn new(rules: Vec<RedirectRule>) -> Self {
        Self { rules }
    }

    pub fn evaluate(&self, pathname: &str, ctx: &RoutingContext) -> Option<AppliedRedirect> {
        self.rules.iter().enumerate().find_map(|(idx, rule)| {
            rule.apply(pathname, ctx).map(|target| AppliedRedirect {
                rule: idx,
                from: rule.from.clone(),
                kind: rule.kind,
                target,
            })
        })
    }

    pub fn push(&mut self, rule: RedirectRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[RedirectRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

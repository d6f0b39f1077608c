//! Redirect rule conditions.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::context::RoutingContext;

/// Caller-supplied condition for rules built in code.
pub type ConditionFn = Arc<dyn Fn(&RoutingContext) -> bool + Send + Sync>;

/// When a redirect rule applies. Absent condition means "always".
#[derive(Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectCondition {
    /// No user in the context.
    Anonymous,
    Authenticated,
    SuperAdmin,
    NotSuperAdmin,
    Supplier,
    #[serde(skip)]
    Custom(ConditionFn),
}

impl RedirectCondition {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&RoutingContext) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    pub fn evaluate(&self, ctx: &RoutingContext) -> bool {
        match self {
            Self::Anonymous => ctx.user.is_none(),
            Self::Authenticated => ctx.user.is_some(),
            Self::SuperAdmin => ctx.is_super_admin(),
            Self::NotSuperAdmin => !ctx.is_super_admin(),
            Self::Supplier => ctx.user.as_ref().is_some_and(|u| u.is_supplier),
            Self::Custom(f) => f(ctx),
        }
    }
}

impl fmt::Debug for RedirectCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => write!(f, "Anonymous"),
            Self::Authenticated => write!(f, "Authenticated"),
            Self::SuperAdmin => write!(f, "SuperAdmin"),
            Self::NotSuperAdmin => write!(f, "NotSuperAdmin"),
            Self::Supplier => write!(f, "Supplier"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

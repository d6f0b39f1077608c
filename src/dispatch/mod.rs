//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! DispatchRequest (hostname, pathname, identity)
//!     → DomainRegistry::resolve           (Unresolved)
//!     → tenant slug + organization lookup
//!     → RedirectRuleSet::evaluate         (Navigate | re-enter | RedirectLoop)
//!     → RouteTable::lookup                (NotFound)
//!     → GuardChain::evaluate              (Redirect)
//!     → DispatchOutcome::Permitted        → external handler
//! ```
//!
//! # Design Decisions
//! - One flow per request, no shared mutable state besides metrics
//! - Errors never escape: every request ends in a DispatchOutcome
//! - Aborting a request abandons in-flight guards without applying anything

pub mod dispatcher;
pub mod outcome;

pub use dispatcher::{DispatchRequest, Dispatcher};
pub use outcome::{DispatchOutcome, RoutingError};

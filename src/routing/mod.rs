//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Pathname (after redirect rewriting)
//!     → matcher.rs (normalize, parse/compare path patterns)
//!     → router.rs (per-domain route table lookup)
//!     → Return: matched RouteEntry + captured params, or NoMatch
//!
//! Route Compilation (at startup):
//!     RouteRecord[]
//!     → Parse path patterns
//!     → Reject duplicates
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (segment comparison only)
//! - Deterministic: same input always matches same route
//! - Literal beats parameterized beats wildcard

pub mod matcher;
pub mod router;

pub use matcher::{normalize_path, PathParams, PathPattern, WILDCARD};
pub use router::{RouteEntry, RouteMatch, RouteTable, RouteTableError};

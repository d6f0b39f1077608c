//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher decisions
//!     → logging.rs (structured events: domain, rule, guard, reason, target)
//!     → metrics.rs (counters and latency histogram, Prometheus scrape)
//!     → tracing.rs (one span per HTTP request, keyed by request id)
//! ```
//!
//! # Design Decisions
//! - Every decision is reconstructable from logs alone
//! - Metrics are cheap and optional; recording without an exporter is a no-op
//! - Request id flows from the HTTP layer into every span

pub mod logging;
pub mod metrics;
pub mod tracing;

pub use self::logging::init_logging;
pub use self::metrics::init_metrics;
pub use self::tracing::RequestSpan;

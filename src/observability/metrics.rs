//! Dispatch metrics.
//!
//! # Metrics
//! - `router_dispatch_total` (counter): decisions by outcome and domain
//! - `router_dispatch_duration_seconds` (histogram): time to a decision
//! - `router_guard_rejections_total` (counter): rejections by guard name
//! - `router_redirects_total` (counter): applied redirect rules by kind
//!
//! Recording is a no-op until a recorder is installed.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::dispatch::DispatchOutcome;
use crate::redirect::RedirectKind;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_dispatch(outcome: &DispatchOutcome, elapsed: Duration) {
    let domain = outcome.domain().unwrap_or("none").to_string();
    ::metrics::counter!(
        "router_dispatch_total",
        "outcome" => outcome.kind(),
        "domain" => domain
    )
    .increment(1);
    ::metrics::histogram!("router_dispatch_duration_seconds", "outcome" => outcome.kind())
        .record(elapsed.as_secs_f64());
}

pub fn record_guard_rejection(guard: &str) {
    ::metrics::counter!("router_guard_rejections_total", "guard" => guard.to_string()).increment(1);
}

pub fn record_redirect(kind: RedirectKind) {
    ::metrics::counter!("router_redirects_total", "kind" => kind.as_str()).increment(1);
}

//! Structured logging setup.
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies to this
//! crate and to the HTTP middleware.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
pub fn init_logging(level: &str) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()
}

fn default_directives(level: &str) -> String {
    format!("tenant_router={level},tower_http={level}")
}

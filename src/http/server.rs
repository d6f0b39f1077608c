//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all handler
//! - Wire up middleware (request id, tracing spans, timeout)
//! - Turn each request into a dispatch and the outcome into a response
//! - Stop accepting on shutdown and abort in-flight dispatches

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ListenerConfig;
use crate::dispatch::{DispatchRequest, Dispatcher};
use crate::http::request::{identity_from_headers, request_hostname, MakeRequestUuid};
use crate::lifecycle::Shutdown;
use crate::observability::RequestSpan;

/// State injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub shutdown: Arc<Shutdown>,
}

/// HTTP front of the dispatcher.
pub struct HttpServer {
    router: Router,
    shutdown: Arc<Shutdown>,
}

impl HttpServer {
    pub fn new(dispatcher: Arc<Dispatcher>, listener: &ListenerConfig, shutdown: Arc<Shutdown>) -> Self {
        let state = AppState {
            dispatcher,
            shutdown: Arc::clone(&shutdown),
        };
        let router = Self::build_router(
            state,
            Duration::from_secs(listener.request_timeout_secs),
        );
        Self { router, shutdown }
    }

    #[allow(deprecated)]
    fn build_router(state: AppState, request_timeout: Duration) -> Router {
        Router::new()
            .route("/", any(dispatch_handler))
            .route("/{*path}", any(dispatch_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(request_timeout))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(RequestSpan))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until shutdown is triggered.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(self.shutdown.signalled())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let headers = request.headers();
    let Some(hostname) = request_hostname(headers, request.uri()) else {
        tracing::warn!(path = %request.uri().path(), "Request without host");
        return (StatusCode::BAD_REQUEST, "missing Host header").into_response();
    };

    let dispatch = DispatchRequest {
        hostname,
        pathname: request.uri().path().to_string(),
        user: identity_from_headers(headers),
        organization: None,
    };

    state
        .dispatcher
        .dispatch_until(&dispatch, state.shutdown.subscribe())
        .await
        .into_response()
}

//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request id, hostname, identity headers)
//!     → Dispatcher::dispatch_until
//!     → response.rs (outcome → status, Location, JSON)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{identity_from_headers, request_hostname, MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer};

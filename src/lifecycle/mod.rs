//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build registry → Build directory → Dispatcher
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Abort pending dispatches → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then engine, then listeners
//! - Any configuration error aborts startup before the listener binds

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::{spawn_signal_handler, wait_for_termination};
pub use startup::{build_dispatcher, build_registry, StartupError};

//! Organization directory subsystem.
//!
//! # Data Flow
//! ```text
//! tenant slug (from hostname)
//!     → OrganizationDirectory::find_by_slug
//!         → memory.rs (DashMap seeded from config)
//!         → http.rs (remote data store, request/response)
//!     → Option<OrganizationInfo> placed into RoutingContext
//! ```
//!
//! # Design Decisions
//! - The data store is opaque: one read-only lookup, no schema knowledge
//! - Every remote lookup is bounded by a timeout
//! - Lookup failures never allow a request; they leave the organization
//!   unset and the organization guards reject

pub mod http;
pub mod memory;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::schema::{DirectoryConfig, DirectoryKind};
use crate::context::OrganizationInfo;

pub use self::http::HttpDirectory;
pub use self::memory::MemoryDirectory;

/// Errors that can occur during directory lookups.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Lookup did not complete in time.
    #[error("directory lookup timed out after {0}ms")]
    Timeout(u64),

    /// Connection or request failure.
    #[error("directory transport error: {0}")]
    Transport(String),

    /// Data store answered with an unexpected status.
    #[error("directory returned status {0}")]
    Status(u16),

    /// Response body could not be decoded.
    #[error("directory response could not be decoded: {0}")]
    Decode(String),

    #[error("invalid directory base url `{0}`")]
    InvalidBaseUrl(String),
}

/// Read-only organization lookup.
#[async_trait]
pub trait OrganizationDirectory: Send + Sync {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<OrganizationInfo>, DirectoryError>;
}

/// Build the directory selected by configuration.
pub fn from_config(config: &DirectoryConfig) -> Result<Arc<dyn OrganizationDirectory>, DirectoryError> {
    match config.kind {
        DirectoryKind::Memory => Ok(Arc::new(MemoryDirectory::from_organizations(
            config.organizations.iter().cloned(),
        ))),
        DirectoryKind::Http => Ok(Arc::new(HttpDirectory::new(
            &config.base_url,
            Duration::from_millis(config.timeout_ms),
        )?)),
    }
}

//! In-memory organization directory.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::context::OrganizationInfo;
use crate::directory::{DirectoryError, OrganizationDirectory};

/// A thread-safe slug → organization map.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    inner: Arc<DashMap<String, OrganizationInfo>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_organizations<I>(organizations: I) -> Self
    where
        I: IntoIterator<Item = OrganizationInfo>,
    {
        let directory = Self::new();
        for org in organizations {
            directory.insert(org);
        }
        directory
    }

    pub fn insert(&self, org: OrganizationInfo) {
        self.inner.insert(org.slug.to_lowercase(), org);
    }

    pub fn remove(&self, slug: &str) -> Option<OrganizationInfo> {
        self.inner.remove(&slug.to_lowercase()).map(|(_, org)| org)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl OrganizationDirectory for MemoryDirectory {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<OrganizationInfo>, DirectoryError> {
        Ok(self
            .inner
            .get(&slug.to_lowercase())
            .map(|entry| entry.value().clone()))
    }
}

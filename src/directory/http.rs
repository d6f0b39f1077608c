//! Organization directory backed by a remote data store.
//!
//! `GET {base_url}/organizations/{slug}` returns the organization as JSON;
//! 404 means "no such organization".

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::context::OrganizationInfo;
use crate::directory::{DirectoryError, OrganizationDirectory};

#[derive(Debug, Clone)]
pub struct HttpDirectory {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpDirectory {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DirectoryError> {
        let base_url =
            Url::parse(base_url).map_err(|_| DirectoryError::InvalidBaseUrl(base_url.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(DirectoryError::InvalidBaseUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    fn organization_url(&self, slug: &str) -> Result<Url, DirectoryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DirectoryError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("organizations")
            .push(slug);
        Ok(url)
    }
}

#[async_trait]
impl OrganizationDirectory for HttpDirectory {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<OrganizationInfo>, DirectoryError> {
        let url = self.organization_url(slug)?;

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                DirectoryError::Timeout(self.timeout.as_millis() as u64)
            } else {
                DirectoryError::Transport(e.to_string())
            }
        })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<OrganizationInfo>()
                .await
                .map(Some)
                .map_err(|e| DirectoryError::Decode(e.to_string())),
            status => Err(DirectoryError::Status(status.as_u16())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_organization_url() {
        let dir = HttpDirectory::new("http://store.internal/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            dir.organization_url("acme").unwrap().as_str(),
            "http://store.internal/api/organizations/acme"
        );

        let dir = HttpDirectory::new("http://store.internal", Duration::from_secs(1)).unwrap();
        assert_eq!(
            dir.organization_url("a b").unwrap().as_str(),
            "http://store.internal/organizations/a%20b"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpDirectory::new("not a url", Duration::from_secs(1)),
            Err(DirectoryError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            HttpDirectory::new("mailto:ops@example.com", Duration::from_secs(1)),
            Err(DirectoryError::InvalidBaseUrl(_))
        ));
    }
}

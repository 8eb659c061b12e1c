use reqwest::{Client, StatusCode};

use super::{PackageMetadata, RegistryClient, RegistryError};
use crate::config::Config;

/// npm registry for metadata, plus a CDN (unpkg by default) for files
/// inside published tarballs.
#[derive(Debug, Clone)]
pub struct NpmRegistry {
    registry_url: String,
    cdn_url: String,
    client: Client,
}

impl NpmRegistry {
    /// Every request made by the client is bounded by `config.fetch_timeout`.
    pub fn new(config: &Config) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent(concat!("wc-catalog/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            registry_url: config.registry_url.trim_end_matches('/').to_string(),
            cdn_url: config.cdn_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Scoped names keep their `@` but escape the `/`.
    fn package_url(&self, name: &str) -> String {
        format!("{}/{}", self.registry_url, name.replace('/', "%2f"))
    }

    fn file_url(&self, name: &str, version: &str, path: &str) -> String {
        let path = path.trim_start_matches("./").trim_start_matches('/');
        format!("{}/{}@{}/{}", self.cdn_url, name, version, path)
    }
}

impl RegistryClient for NpmRegistry {
    async fn fetch_package_metadata(&self, name: &str) -> Result<PackageMetadata, RegistryError> {
        let url = self.package_url(name);
        tracing::debug!("Fetching package metadata from {}", url);

        let response = self.client.get(&url).send().await?;
        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            StatusCode::NOT_FOUND => Err(RegistryError::PackageNotFound(name.to_string())),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(RegistryError::Unavailable(format!("{}: {}", status, body)))
            }
        }
    }

    async fn fetch_manifest(&self, name: &str, version: &str, path: &str) -> Option<String> {
        let url = self.file_url(name, version, path);
        tracing::debug!("Fetching custom elements manifest from {}", url);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Failed to fetch manifest {}: {}", url, e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!("Failed to fetch manifest {}: {}", url, response.status());
            return None;
        }

        match response.text().await {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!("Failed to read manifest {}: {}", url, e);
                None
            }
        }
    }
}

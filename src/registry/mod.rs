//! Package registry access.
//!
//! The import pipeline only talks to the registry through [`RegistryClient`],
//! so tests can substitute an in-memory registry for [`NpmRegistry`].

mod npm;

use std::collections::BTreeMap;
use std::future::Future;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub use npm::NpmRegistry;

#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error("package not found in registry: {0}")]
    PackageNotFound(String),

    #[error("registry unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for RegistryError {
    fn from(e: reqwest::Error) -> Self {
        Self::Unavailable(e.to_string())
    }
}

/// Fetches package metadata and manifest files.
pub trait RegistryClient: Send + Sync + 'static {
    /// Fetches the full metadata document (packument) of a package.
    fn fetch_package_metadata(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<PackageMetadata, RegistryError>> + Send;

    /// Fetches a file from a published version.
    ///
    /// Returns `None` on any failure; a missing manifest is not an error.
    fn fetch_manifest(
        &self,
        name: &str,
        version: &str,
        path: &str,
    ) -> impl Future<Output = Option<String>> + Send;
}

/// Registry metadata for a package.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(rename = "dist-tags", default)]
    pub dist_tags: BTreeMap<String, String>,
    #[serde(default)]
    pub versions: BTreeMap<String, VersionMetadata>,
    /// Publish time per version, plus `created` and `modified`.
    #[serde(default)]
    pub time: BTreeMap<String, String>,
}

impl PackageMetadata {
    /// Distribution tags that point at `version`.
    pub fn dist_tags_for(&self, version: &str) -> Vec<String> {
        self.dist_tags
            .iter()
            .filter(|(_, v)| v.as_str() == version)
            .map(|(tag, _)| tag.clone())
            .collect()
    }
}

/// The subset of a version's package.json the catalog uses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionMetadata {
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub module_type: Option<String>,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub homepage: Option<String>,
    /// Package-relative path of the custom elements manifest.
    #[serde(default, deserialize_with = "lenient_string")]
    pub custom_elements: Option<String>,
}

/// package.json allows both `"Name <email>"` and `{"name": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Author {
    Text(String),
    Person {
        #[serde(default)]
        name: Option<String>,
    },
    Other(serde_json::Value),
}

impl Author {
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Person { name } => name.as_deref(),
            Self::Other(_) => None,
        }
    }
}

/// Published package.json files are not validated by the registry, so
/// fields that should be strings sometimes aren't. Treat those as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}

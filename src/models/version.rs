use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::element::CustomElementRecord;

/// One published version of a package.
///
/// Registry versions are immutable, so a `Ready` version is never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub package: String,
    pub version: String,
    pub status: VersionStatus,
    pub last_update: DateTime<Utc>,
    pub description: String,
    pub module_type: ModuleType,
    /// Author name, empty when the registry has none.
    pub author: String,
    /// Publish time reported by the registry.
    pub time: Option<DateTime<Utc>>,
    pub homepage: Option<String>,
    /// Distribution tags pointing at this version.
    pub dist_tags: Vec<String>,
    /// The raw custom elements manifest, if one was found.
    pub custom_elements_manifest: Option<String>,
}

/// Import status of a version.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VersionStatus {
    Initializing,
    Ready,
}

impl VersionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Ready => "ready",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "initializing" => Some(Self::Initializing),
            "ready" => Some(Self::Ready),
            _ => None,
        }
    }
}

/// The `type` field of a version's package.json.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModuleType {
    Module,
    #[default]
    Commonjs,
}

impl ModuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Commonjs => "commonjs",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "module" => Some(Self::Module),
            "commonjs" => Some(Self::Commonjs),
            _ => None,
        }
    }
}

/// Fields written when a version finishes importing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetVersionInput {
    pub status: VersionStatus,
    pub description: String,
    pub module_type: ModuleType,
    pub author: String,
    pub time: Option<DateTime<Utc>>,
    pub homepage: Option<String>,
    pub dist_tags: Vec<String>,
    pub custom_elements_manifest: Option<String>,
}

/// A version with its custom elements, used for detailed responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageVersion {
    #[serde(flatten)]
    pub version: VersionRecord,
    pub custom_elements: Vec<CustomElementRecord>,
}

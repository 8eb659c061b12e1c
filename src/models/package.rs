use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::version::PackageVersion;

/// A package imported from the registry.
///
/// The record is created with status `Initializing` by the import that wins
/// the race to create it, and only that import moves it to `Ready`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: String,
    pub status: PackageStatus,
    pub last_update: DateTime<Utc>,
    pub description: Option<String>,
    /// Distribution tag (e.g. `latest`) to version string.
    pub dist_tags: BTreeMap<String, String>,
}

/// Import status of a package.
///
/// - `Initializing`: an import is writing the package and its versions
/// - `Ready`: every version has been imported
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PackageStatus {
    Initializing,
    Ready,
}

impl PackageStatus {
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

/// Final package fields written once all versions are imported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetPackageInput {
    pub status: PackageStatus,
    pub description: Option<String>,
    pub dist_tags: BTreeMap<String, String>,
}

/// A package with the version its `latest` tag points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageInfo {
    #[serde(flatten)]
    pub package: PackageRecord,
    pub version: Option<PackageVersion>,
}

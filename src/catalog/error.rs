use manifest_tools::{ManifestError, ReferenceError};
use thiserror::Error;

use crate::models::PackageStatus;
use crate::registry::RegistryError;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("package `{0}` already exists")]
    AlreadyExists(String),

    #[error("unhandled status `{}` for package `{package}`", .status.as_str())]
    UnhandledPackageStatus {
        package: String,
        status: PackageStatus,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("expected one result for {query}, found {count}")]
    AmbiguousResult { query: String, count: usize },

    #[error(transparent)]
    MalformedReference(#[from] ReferenceError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("import of `{package}` failed: {message}")]
    ImportFailed { package: String, message: String },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl CatalogError {
    /// Copies the error for another caller of the same import. Errors that
    /// can't be copied become [`CatalogError::ImportFailed`].
    pub(super) fn duplicate(&self, package: &str) -> Self {
        match self {
            Self::Registry(e) => Self::Registry(e.clone()),
            Self::AlreadyExists(name) => Self::AlreadyExists(name.clone()),
            Self::UnhandledPackageStatus { package, status } => Self::UnhandledPackageStatus {
                package: package.clone(),
                status: *status,
            },
            Self::NotFound(what) => Self::NotFound(what.clone()),
            Self::AmbiguousResult { query, count } => Self::AmbiguousResult {
                query: query.clone(),
                count: *count,
            },
            Self::MalformedReference(e) => Self::MalformedReference(e.clone()),
            Self::ImportFailed { package, message } => Self::ImportFailed {
                package: package.clone(),
                message: message.clone(),
            },
            Self::Manifest(_) | Self::Storage(_) => Self::ImportFailed {
                package: package.to_string(),
                message: self.to_string(),
            },
        }
    }
}

//! The catalog service: imports packages from the registry and answers
//! queries over what has been imported.
//!
//! # Import state machine
//!
//! Packages and versions are created `Initializing` and moved to `Ready`
//! once fully written. Creating a row is the mutual-exclusion primitive:
//! only the caller whose create succeeds continues the import.
//!
//! Within a process, at most one import per package name runs at a time.
//! Later callers for the same name wait for the running import and share its
//! outcome. The store's create-if-absent still guards against other
//! processes.
//!
//! An import that fails after creating its package row deletes what it
//! wrote, so no record stays `Initializing` and the next request can retry.

mod error;
mod import;
mod query;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

pub use error::CatalogError;

use crate::db::Database;
use crate::models::PackageInfo;
use crate::registry::RegistryClient;

/// Outcome of an import as seen by callers waiting on it.
type SharedOutcome = Option<Result<PackageInfo, Arc<CatalogError>>>;

type InFlight = Arc<Mutex<HashMap<String, watch::Receiver<SharedOutcome>>>>;

pub struct Catalog<R> {
    db: Database,
    registry: Arc<R>,
    in_flight: InFlight,
}

impl<R: RegistryClient> Catalog<R> {
    pub fn new(db: Database, registry: R) -> Self {
        Self {
            db,
            registry: Arc::new(registry),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Imports a package and all of its versions from the registry.
    ///
    /// Fails with [`CatalogError::AlreadyExists`] if the package is already
    /// stored. If an import of the same package is running in this process,
    /// waits for it instead of starting another.
    ///
    /// The import runs on its own task and completes even if the caller
    /// stops waiting.
    pub async fn import_package(&self, name: &str) -> Result<PackageInfo, CatalogError> {
        let slot = {
            let mut in_flight = self.in_flight.lock().expect("in-flight lock poisoned");
            match in_flight.get(name) {
                Some(running) => Err(running.clone()),
                None => {
                    let (tx, rx) = watch::channel(None);
                    in_flight.insert(name.to_string(), rx);
                    Ok(tx)
                }
            }
        };
        let tx = match slot {
            Ok(tx) => tx,
            Err(running) => return self.wait_for_import(name, running).await,
        };

        let catalog = self.clone();
        let package = name.to_string();
        let task = tokio::spawn(async move {
            let _guard = InFlightGuard {
                in_flight: catalog.in_flight.clone(),
                name: package.clone(),
            };
            let result = catalog.run_import(&package).await;
            let shared = match &result {
                Ok(info) => Ok(info.clone()),
                Err(e) => Err(Arc::new(e.duplicate(&package))),
            };
            // Waiters may all have gone away.
            let _ = tx.send(Some(shared));
            result
        });

        match task.await {
            Ok(result) => result,
            Err(e) => Err(CatalogError::ImportFailed {
                package: name.to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// Returns the stored package, importing it first if it is unknown.
    ///
    /// A package still `Initializing` because of an import running in this
    /// process is waited for; any other non-`Ready` package is an error.
    pub async fn get_or_import_package(&self, name: &str) -> Result<PackageInfo, CatalogError> {
        let stored = match self.get_package_info(name) {
            Err(CatalogError::UnhandledPackageStatus { .. }) => match self.running_import(name) {
                Some(rx) => return self.wait_for_import(name, rx).await,
                // The import may have finished between the read and the check.
                None => self.get_package_info(name)?,
            },
            stored => stored?,
        };
        if let Some(info) = stored {
            return Ok(info);
        }

        tracing::info!("Package {} not found in catalog, importing", name);
        match self.import_package(name).await {
            // Another process won the race to create the package.
            Err(CatalogError::AlreadyExists(_)) => self
                .get_package_info(name)?
                .ok_or_else(|| CatalogError::NotFound(format!("package {}", name))),
            result => result,
        }
    }

    fn running_import(&self, name: &str) -> Option<watch::Receiver<SharedOutcome>> {
        self.in_flight
            .lock()
            .expect("in-flight lock poisoned")
            .get(name)
            .cloned()
    }

    async fn wait_for_import(
        &self,
        name: &str,
        mut rx: watch::Receiver<SharedOutcome>,
    ) -> Result<PackageInfo, CatalogError> {
        tracing::debug!("Import of {} already running, waiting for it", name);

        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone(),
            Err(_) => None,
        };

        match outcome {
            Some(Ok(info)) => Ok(info),
            Some(Err(e)) => Err(e.duplicate(name)),
            None => Err(CatalogError::ImportFailed {
                package: name.to_string(),
                message: "import task ended without a result".to_string(),
            }),
        }
    }
}

impl<R> Clone for Catalog<R> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            registry: self.registry.clone(),
            in_flight: self.in_flight.clone(),
        }
    }
}

/// Removes a package from the in-flight map when its import task ends,
/// including by panic.
struct InFlightGuard {
    in_flight: InFlight,
    name: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Ok(mut in_flight) = self.in_flight.lock() {
            in_flight.remove(&self.name);
        }
    }
}

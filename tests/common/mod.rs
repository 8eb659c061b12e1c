//! Shared fixtures: an in-memory registry and a sample package.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use wc_catalog::db::Database;
use wc_catalog::registry::{PackageMetadata, RegistryClient, RegistryError};

pub const FOO_MANIFEST: &str = r#"{
    "schemaVersion": "1.0.0",
    "modules": [
        {
            "path": "foo.js",
            "declarations": [
                {
                    "kind": "class",
                    "name": "FooElement",
                    "description": "A foo.",
                    "members": [
                        {"kind": "field", "name": "size", "description": "How big."},
                        {"kind": "method", "name": "grow"},
                        {"kind": "field", "name": "color"}
                    ]
                }
            ],
            "exports": [
                {"kind": "js", "name": "FooElement", "declaration": {"name": "FooElement"}},
                {"kind": "custom-element-definition", "name": "FooElement",
                 "declaration": {"name": "FooElement"}}
            ]
        }
    ]
}"#;

#[derive(Clone, Default)]
pub struct FakeRegistry {
    packages: HashMap<String, PackageMetadata>,
    /// Keyed by `name@version`.
    manifests: HashMap<String, String>,
    delay: Option<Duration>,
    pub metadata_calls: Arc<AtomicUsize>,
    /// Version whose manifest fetch panics.
    panicking_version: Arc<Mutex<Option<String>>>,
}

impl FakeRegistry {
    pub fn with_package(mut self, packument: serde_json::Value) -> Self {
        let metadata: PackageMetadata =
            serde_json::from_value(packument).expect("Invalid packument");
        self.packages.insert(metadata.name.clone(), metadata);
        self
    }

    pub fn with_manifest(mut self, package: &str, version: &str, manifest: &str) -> Self {
        self.manifests
            .insert(format!("{}@{}", package, version), manifest.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_panicking_manifest(self, version: &str) -> Self {
        *self.panicking_version.lock().unwrap() = Some(version.to_string());
        self
    }

    pub fn stop_panicking(&self) {
        *self.panicking_version.lock().unwrap() = None;
    }
}

impl RegistryClient for FakeRegistry {
    async fn fetch_package_metadata(&self, name: &str) -> Result<PackageMetadata, RegistryError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if name == "down" {
            return Err(RegistryError::Unavailable("503 Service Unavailable".to_string()));
        }
        self.packages
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::PackageNotFound(name.to_string()))
    }

    async fn fetch_manifest(&self, name: &str, version: &str, _path: &str) -> Option<String> {
        let panicking = self.panicking_version.lock().unwrap().clone();
        if panicking.as_deref() == Some(version) {
            panic!("manifest fetch for {}@{} blew up", name, version);
        }
        self.manifests.get(&format!("{}@{}", name, version)).cloned()
    }
}

pub fn foo_registry() -> FakeRegistry {
    FakeRegistry::default()
        .with_package(serde_json::json!({
            "name": "foo",
            "description": "Foo elements",
            "dist-tags": {"latest": "1.0.0"},
            "versions": {
                "1.0.0": {
                    "type": "module",
                    "author": {"name": "Ada"},
                    "customElements": "custom-elements.json"
                },
                "0.9.0": {"customElements": "custom-elements.json"}
            },
            "time": {"1.0.0": "2021-02-01T00:00:00.000Z"}
        }))
        .with_manifest("foo", "1.0.0", FOO_MANIFEST)
}

pub fn memory_db() -> Database {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    db
}

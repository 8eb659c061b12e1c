use chrono::{DateTime, Utc};
use manifest_tools::{custom_elements, reference, Manifest, ResolveContext};
use tokio::task::JoinSet;

use super::{Catalog, CatalogError};
use crate::models::*;
use crate::registry::{Author, PackageMetadata, RegistryClient, VersionMetadata};

impl<R: RegistryClient> Catalog<R> {
    /// Body of an import task. Removes everything it wrote if it fails after
    /// creating the package row.
    pub(super) async fn run_import(&self, name: &str) -> Result<PackageInfo, CatalogError> {
        tracing::info!("Importing package {}", name);

        let (created, metadata) = tokio::join!(
            async { self.db.create_package_if_absent(name, PackageStatus::Initializing) },
            self.registry.fetch_package_metadata(name),
        );

        if !created? {
            return Err(CatalogError::AlreadyExists(name.to_string()));
        }

        let result = match metadata {
            Ok(metadata) => self.import_versions(name, metadata).await,
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(info) => {
                tracing::info!("Imported package {}", name);
                Ok(info)
            }
            Err(e) => {
                tracing::error!("Import of {} failed: {}", name, e);
                if let Err(cleanup) = self.delete_package(name) {
                    tracing::error!("Failed to clean up package {}: {}", name, cleanup);
                }
                Err(e)
            }
        }
    }

    async fn import_versions(
        &self,
        name: &str,
        metadata: PackageMetadata,
    ) -> Result<PackageInfo, CatalogError> {
        let mut tasks = JoinSet::new();
        for (version, version_metadata) in &metadata.versions {
            let catalog = self.clone();
            let package = name.to_string();
            let version = version.clone();
            let version_metadata = version_metadata.clone();
            let dist_tags = metadata.dist_tags_for(&version);
            let time = metadata.time.get(&version).and_then(|t| parse_time(t));

            tasks.spawn(async move {
                catalog
                    .import_version(&package, &version, version_metadata, dist_tags, time)
                    .await
            });
        }

        let mut imported = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let version = joined.map_err(|e| CatalogError::ImportFailed {
                package: name.to_string(),
                message: e.to_string(),
            });
            match version.and_then(|v| v) {
                Ok(version) => imported.extend(version),
                Err(e) => {
                    // Stop the siblings before cleanup reads what they wrote.
                    tasks.shutdown().await;
                    return Err(e);
                }
            }
        }
        tracing::debug!("Imported {} new versions of {}", imported.len(), name);

        let PackageMetadata {
            description,
            dist_tags,
            ..
        } = metadata;
        let latest = dist_tags.get("latest").cloned();

        let package = self.db.set_package(
            name,
            SetPackageInput {
                status: PackageStatus::Ready,
                description,
                dist_tags,
            },
        )?;

        let version = match latest {
            Some(latest) => match imported.into_iter().find(|v| v.version.version == latest) {
                Some(version) => Some(version),
                None => self.load_package_version(name, &latest)?,
            },
            None => None,
        };

        Ok(PackageInfo { package, version })
    }

    /// Imports one version. Returns `None` if the version was already stored.
    async fn import_version(
        &self,
        package: &str,
        version: &str,
        metadata: VersionMetadata,
        dist_tags: Vec<String>,
        time: Option<DateTime<Utc>>,
    ) -> Result<Option<PackageVersion>, CatalogError> {
        if !self
            .db
            .create_version_if_absent(package, version, VersionStatus::Initializing)?
        {
            tracing::debug!("Version {}@{} already imported, skipping", package, version);
            return Ok(None);
        }

        let manifest = match &metadata.custom_elements {
            Some(path) => self.fetch_valid_manifest(package, version, path).await,
            None => None,
        };

        let elements = match &manifest {
            Some((manifest, _)) => index_manifest(manifest, package, version),
            None => Vec::new(),
        };

        let record = self.db.set_version(
            package,
            version,
            SetVersionInput {
                status: VersionStatus::Ready,
                description: metadata.description.unwrap_or_default(),
                module_type: metadata
                    .module_type
                    .as_deref()
                    .and_then(ModuleType::from_str)
                    .unwrap_or_default(),
                author: metadata
                    .author
                    .as_ref()
                    .and_then(Author::name)
                    .unwrap_or_default()
                    .to_string(),
                time,
                homepage: metadata.homepage,
                dist_tags,
                custom_elements_manifest: manifest.map(|(_, source)| source),
            },
        )?;

        let mut custom_elements = Vec::with_capacity(elements.len());
        for element in elements {
            custom_elements.push(self.db.add_custom_element(package, version, element)?);
        }

        tracing::debug!(
            "Imported {}@{} with {} custom elements",
            package,
            version,
            custom_elements.len()
        );

        Ok(Some(PackageVersion {
            version: record,
            custom_elements,
        }))
    }

    /// Fetches and validates a manifest. Any failure means "no manifest".
    async fn fetch_valid_manifest(
        &self,
        package: &str,
        version: &str,
        path: &str,
    ) -> Option<(Manifest, String)> {
        let source = self.registry.fetch_manifest(package, version, path).await?;
        match Manifest::from_json(&source) {
            Ok(manifest) => Some((manifest, source)),
            Err(e) => {
                tracing::warn!("Ignoring invalid manifest of {}@{}: {}", package, version, e);
                None
            }
        }
    }
}

/// Builds the element rows for a manifest. Reference strings always use the
/// importing package's name.
fn index_manifest(manifest: &Manifest, package: &str, version: &str) -> Vec<NewCustomElement> {
    let ctx = ResolveContext {
        package_name: package,
        version,
    };

    custom_elements(manifest, &ctx)
        .into_iter()
        .map(|info| NewCustomElement {
            tag_name: info.tag_name().to_string(),
            class_name: info.class_name().to_string(),
            custom_element_export: reference::encode(package, &info.module.path, &info.export.name),
            declaration: reference::encode(
                package,
                &info.declaration_module.path,
                &info.declaration.name,
            ),
        })
        .collect()
}

fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_builds_reference_strings() {
        let manifest = Manifest::from_json(
            r#"{"modules":[
                {"path":"define.js","exports":[
                    {"kind":"custom-element-definition","name":"x-foo",
                     "declaration":{"name":"XFoo","module":"src/x-foo.js"}}
                ]},
                {"path":"src/x-foo.js","declarations":[{"kind":"class","name":"XFoo"}]}
            ]}"#,
        )
        .unwrap();

        let elements = index_manifest(&manifest, "@scope/foo", "1.0.0");
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].tag_name, "x-foo");
        assert_eq!(elements[0].class_name, "XFoo");
        assert_eq!(elements[0].custom_element_export, "@scope/foo/define.js#x-foo");
        assert_eq!(elements[0].declaration, "@scope/foo/src/x-foo.js#XFoo");
    }

    #[test]
    fn parses_registry_times() {
        assert!(parse_time("2021-02-01T00:00:00.000Z").is_some());
        assert!(parse_time("yesterday").is_none());
    }
}

use manifest_tools::{find_module, reference, resolve, Manifest, Reference, ResolveContext};

use super::{Catalog, CatalogError};
use crate::models::*;
use crate::registry::RegistryClient;

/// Distribution tag used when an element lookup names none.
const DEFAULT_DIST_TAG: &str = "latest";

impl<R: RegistryClient> Catalog<R> {
    // ============================================================
    // Packages
    // ============================================================

    /// Returns a `Ready` package with its `latest` version.
    ///
    /// Any other stored status is an error, not an absent package.
    pub fn get_package_info(&self, name: &str) -> Result<Option<PackageInfo>, CatalogError> {
        let package = match self.db.get_package(name)? {
            Some(package) => package,
            None => return Ok(None),
        };

        match package.status {
            PackageStatus::Ready => {
                let version = match package.dist_tags.get(DEFAULT_DIST_TAG) {
                    Some(latest) => self.load_package_version(name, latest)?,
                    None => None,
                };
                Ok(Some(PackageInfo { package, version }))
            }
            status @ PackageStatus::Initializing => Err(CatalogError::UnhandledPackageStatus {
                package: name.to_string(),
                status,
            }),
        }
    }

    pub fn list_packages(&self) -> Result<Vec<PackageRecord>, CatalogError> {
        Ok(self.db.get_all_packages()?)
    }

    /// Deletes a package, its versions and their custom elements.
    ///
    /// Versions go one by one before the package row; a failure part way
    /// leaves the package partially deleted. Returns whether the package
    /// existed.
    pub fn delete_package(&self, name: &str) -> Result<bool, CatalogError> {
        for version in self.db.get_versions(name)? {
            self.db.delete_version(name, &version.version)?;
        }
        let deleted = self.db.delete_package(name)?;
        if deleted {
            tracing::info!("Deleted package {}", name);
        }
        Ok(deleted)
    }

    // ============================================================
    // Versions
    // ============================================================

    /// Returns a stored version with all of its custom elements.
    pub fn get_package_version(
        &self,
        name: &str,
        version: &str,
    ) -> Result<Option<PackageVersion>, CatalogError> {
        self.load_package_version(name, version)
    }

    pub fn get_custom_elements(
        &self,
        name: &str,
        version: &str,
        tag_name: Option<&str>,
    ) -> Result<Vec<CustomElementRecord>, CatalogError> {
        Ok(self.db.get_custom_elements(name, version, tag_name)?)
    }

    pub(super) fn load_package_version(
        &self,
        name: &str,
        version: &str,
    ) -> Result<Option<PackageVersion>, CatalogError> {
        let record = match self.db.get_version(name, version)? {
            Some(record) => record,
            None => return Ok(None),
        };
        let custom_elements = self.db.get_custom_elements(name, version, None)?;
        Ok(Some(PackageVersion {
            version: record,
            custom_elements,
        }))
    }

    // ============================================================
    // Elements
    // ============================================================

    /// Lists custom elements across all packages, optionally only those of
    /// versions carrying the distribution tag `tag`.
    pub fn get_elements(
        &self,
        tag: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<CustomElementRecord>, CatalogError> {
        Ok(self.db.query_elements(&ElementQuery {
            dist_tag: tag.map(str::to_string),
            limit,
            ..Default::default()
        })?)
    }

    /// Finds exactly one element by package, tag name and distribution tag
    /// (default `latest`).
    pub fn get_element(
        &self,
        package: &str,
        tag_name: &str,
        dist_tag: Option<&str>,
    ) -> Result<CustomElementRecord, CatalogError> {
        let dist_tag = dist_tag.unwrap_or(DEFAULT_DIST_TAG);
        let mut elements = self.db.query_elements(&ElementQuery {
            package: Some(package.to_string()),
            tag_name: Some(tag_name.to_string()),
            dist_tag: Some(dist_tag.to_string()),
            ..Default::default()
        })?;

        match elements.len() {
            0 => Err(CatalogError::NotFound(format!(
                "element <{}> in {}@{}",
                tag_name, package, dist_tag
            ))),
            1 => Ok(elements.remove(0)),
            count => Err(CatalogError::AmbiguousResult {
                query: format!("element <{}> in {}@{}", tag_name, package, dist_tag),
                count,
            }),
        }
    }

    /// Finds an element and documents its class from the stored manifest.
    pub fn get_element_detail(
        &self,
        package: &str,
        tag_name: &str,
        dist_tag: Option<&str>,
    ) -> Result<ElementDetail, CatalogError> {
        let element = self.get_element(package, tag_name, dist_tag)?;
        let not_found =
            |what: &str| CatalogError::NotFound(format!("{} for element <{}>", what, tag_name));

        let source = self
            .db
            .get_version(&element.package, &element.version)?
            .and_then(|v| v.custom_elements_manifest)
            .ok_or_else(|| not_found("manifest"))?;
        let manifest = Manifest::from_json(&source)?;

        let declaration_ref = reference::decode(&element.declaration)?;
        let module_path = declaration_ref.module.as_deref().unwrap_or_default();
        let module = find_module(&manifest, module_path)
            .ok_or_else(|| not_found(&format!("module `{}`", module_path)))?;

        // The stored string names the module explicitly; resolve locally.
        let local = Reference::local(declaration_ref.name.clone());
        let ctx = ResolveContext {
            package_name: &element.package,
            version: &element.version,
        };
        let declaration = match resolve(&manifest, module, &local, &ctx) {
            Ok(declaration) => declaration,
            Err(e) => {
                tracing::warn!("{}", e);
                return Err(not_found(&format!("declaration `{}`", declaration_ref.name)));
            }
        };
        let class = declaration
            .as_class()
            .ok_or_else(|| not_found(&format!("class `{}`", declaration_ref.name)))?;

        let summarize = |name: &str, description: Option<&str>| MemberSummary {
            name: name.to_string(),
            description: description.map(str::to_string),
        };

        Ok(ElementDetail {
            description: class.description.clone(),
            fields: class
                .fields()
                .map(|f| summarize(&f.name, f.description.as_deref()))
                .collect(),
            methods: class
                .methods()
                .map(|m| summarize(&m.name, m.description.as_deref()))
                .collect(),
            element,
        })
    }
}

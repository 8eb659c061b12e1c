use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::catalog::{Catalog, CatalogError};
use crate::models::*;
use crate::registry::{RegistryClient, RegistryError};

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// Maps catalog errors onto status codes. Storage, manifest and import
/// failures are hidden from the client.
fn catalog_error(e: CatalogError) -> (StatusCode, String) {
    let status = match &e {
        CatalogError::NotFound(_) | CatalogError::Registry(RegistryError::PackageNotFound(_)) => {
            StatusCode::NOT_FOUND
        }
        CatalogError::AmbiguousResult { .. } | CatalogError::AlreadyExists(_) => {
            StatusCode::CONFLICT
        }
        CatalogError::UnhandledPackageStatus { .. } => StatusCode::SERVICE_UNAVAILABLE,
        CatalogError::Registry(RegistryError::Unavailable(_)) => StatusCode::BAD_GATEWAY,
        CatalogError::MalformedReference(_) => StatusCode::BAD_REQUEST,
        CatalogError::Manifest(_) | CatalogError::ImportFailed { .. } | CatalogError::Storage(_) => {
            return internal_error(&e)
        }
    };

    tracing::warn!("Request failed: {}", e);
    (status, e.to_string())
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Packages
// ============================================================

pub async fn list_packages<R: RegistryClient>(
    State(catalog): State<Catalog<R>>,
) -> ApiResult<Vec<PackageRecord>> {
    catalog.list_packages().map(Json).map_err(catalog_error)
}

/// Returns a package, importing it from the registry on first request.
pub async fn get_package<R: RegistryClient>(
    State(catalog): State<Catalog<R>>,
    Path(name): Path<String>,
) -> ApiResult<PackageInfo> {
    catalog
        .get_or_import_package(&name)
        .await
        .map(Json)
        .map_err(catalog_error)
}

pub async fn import_package<R: RegistryClient>(
    State(catalog): State<Catalog<R>>,
    Path(name): Path<String>,
) -> Result<(StatusCode, Json<PackageInfo>), (StatusCode, String)> {
    catalog
        .import_package(&name)
        .await
        .map(|info| (StatusCode::CREATED, Json(info)))
        .map_err(catalog_error)
}

pub async fn delete_package<R: RegistryClient>(
    State(catalog): State<Catalog<R>>,
    Path(name): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    if catalog.delete_package(&name).map_err(catalog_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Package not found".to_string()))
    }
}

// ============================================================
// Versions
// ============================================================

pub async fn get_package_version<R: RegistryClient>(
    State(catalog): State<Catalog<R>>,
    Path((name, version)): Path<(String, String)>,
) -> ApiResult<PackageVersion> {
    catalog
        .get_package_version(&name, &version)
        .map_err(catalog_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Version not found".to_string()))
}

#[derive(Debug, Deserialize)]
pub struct CustomElementsQuery {
    pub tag_name: Option<String>,
}

pub async fn get_custom_elements<R: RegistryClient>(
    State(catalog): State<Catalog<R>>,
    Path((name, version)): Path<(String, String)>,
    Query(query): Query<CustomElementsQuery>,
) -> ApiResult<Vec<CustomElementRecord>> {
    catalog
        .get_custom_elements(&name, &version, query.tag_name.as_deref())
        .map(Json)
        .map_err(catalog_error)
}

// ============================================================
// Elements
// ============================================================

#[derive(Debug, Deserialize)]
pub struct ListElementsQuery {
    /// Distribution tag the element's version must carry.
    pub tag: Option<String>,
    pub limit: Option<u32>,
}

pub async fn list_elements<R: RegistryClient>(
    State(catalog): State<Catalog<R>>,
    Query(query): Query<ListElementsQuery>,
) -> ApiResult<Vec<CustomElementRecord>> {
    catalog
        .get_elements(query.tag.as_deref(), query.limit)
        .map(Json)
        .map_err(catalog_error)
}

#[derive(Debug, Deserialize)]
pub struct ElementQueryParams {
    pub package: String,
    /// Tag name of the element, e.g. `my-button`.
    pub name: String,
    /// Distribution tag, `latest` when omitted.
    pub tag: Option<String>,
}

pub async fn get_element<R: RegistryClient>(
    State(catalog): State<Catalog<R>>,
    Query(query): Query<ElementQueryParams>,
) -> ApiResult<CustomElementRecord> {
    catalog
        .get_element(&query.package, &query.name, query.tag.as_deref())
        .map(Json)
        .map_err(catalog_error)
}

pub async fn get_element_detail<R: RegistryClient>(
    State(catalog): State<Catalog<R>>,
    Query(query): Query<ElementQueryParams>,
) -> ApiResult<ElementDetail> {
    catalog
        .get_element_detail(&query.package, &query.name, query.tag.as_deref())
        .map(Json)
        .map_err(catalog_error)
}

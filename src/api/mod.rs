mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::catalog::Catalog;
use crate::registry::RegistryClient;

/// Builds the HTTP API. Scoped package names travel as one path segment
/// with the `/` percent-encoded (`@scope%2Fname`).
pub fn create_router<R: RegistryClient>(catalog: Catalog<R>) -> Router {
    let api = Router::new()
        // Packages
        .route("/packages", get(handlers::list_packages::<R>))
        .route(
            "/packages/{name}",
            get(handlers::get_package::<R>).delete(handlers::delete_package::<R>),
        )
        .route("/packages/{name}/import", post(handlers::import_package::<R>))
        .route(
            "/packages/{name}/versions/{version}",
            get(handlers::get_package_version::<R>),
        )
        .route(
            "/packages/{name}/versions/{version}/elements",
            get(handlers::get_custom_elements::<R>),
        )
        // Elements
        .route("/elements", get(handlers::list_elements::<R>))
        .route("/element", get(handlers::get_element::<R>))
        .route("/element/detail", get(handlers::get_element_detail::<R>))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(catalog)
}

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use common::{foo_registry, memory_db, FakeRegistry};
use wc_catalog::api::create_router;
use wc_catalog::catalog::Catalog;
use wc_catalog::models::*;

fn setup_with(registry: FakeRegistry) -> (TestServer, Catalog<FakeRegistry>) {
    let catalog = Catalog::new(memory_db(), registry);
    let app = create_router(catalog.clone());
    let server = TestServer::new(app).expect("Failed to create test server");
    (server, catalog)
}

fn setup() -> TestServer {
    setup_with(scoped_registry()).0
}

/// The foo package plus a scoped package without custom elements.
fn scoped_registry() -> FakeRegistry {
    foo_registry().with_package(serde_json::json!({
        "name": "@acme/widgets",
        "dist-tags": {"latest": "0.1.0"},
        "versions": {"0.1.0": {}}
    }))
}

async fn import_foo(server: &TestServer) -> PackageInfo {
    server
        .post("/api/v1/packages/foo/import")
        .await
        .json::<PackageInfo>()
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let server = setup();

        let response = server.get("/api/v1/health").await;

        response.assert_status_ok();
        response.assert_json(&serde_json::json!({ "status": "ok" }));
    }
}

mod packages {
    use super::*;

    #[tokio::test]
    async fn import_returns_created() {
        let server = setup();

        let response = server.post("/api/v1/packages/foo/import").await;

        response.assert_status(StatusCode::CREATED);
        let info: PackageInfo = response.json();
        assert_eq!(info.package.name, "foo");
        assert_eq!(info.version.unwrap().custom_elements.len(), 1);
    }

    #[tokio::test]
    async fn second_import_conflicts() {
        let server = setup();
        import_foo(&server).await;

        server
            .post("/api/v1/packages/foo/import")
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn get_imports_unknown_packages() {
        let server = setup();

        let response = server.get("/api/v1/packages/foo").await;

        response.assert_status_ok();
        let info: PackageInfo = response.json();
        assert_eq!(info.package.status, PackageStatus::Ready);

        let listed: Vec<PackageRecord> = server.get("/api/v1/packages").await.json();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn get_accepts_encoded_scoped_names() {
        let server = setup();

        let response = server.get("/api/v1/packages/@acme%2Fwidgets").await;

        response.assert_status_ok();
        let info: PackageInfo = response.json();
        assert_eq!(info.package.name, "@acme/widgets");
        assert_eq!(info.version.unwrap().version.version, "0.1.0");
    }

    #[tokio::test]
    async fn unknown_registry_package_is_not_found() {
        let server = setup();

        server
            .get("/api/v1/packages/nope")
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn concurrent_gets_of_an_unknown_package_are_not_found() {
        let (server, _) = setup_with(scoped_registry().with_delay(Duration::from_millis(30)));

        let (a, b) = tokio::join!(
            server.get("/api/v1/packages/nope"),
            server.get("/api/v1/packages/nope"),
        );

        a.assert_status_not_found();
        b.assert_status_not_found();
    }

    #[tokio::test]
    async fn unavailable_registry_is_bad_gateway() {
        let server = setup();

        server
            .get("/api/v1/packages/down")
            .await
            .assert_status(StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn initializing_package_is_unavailable() {
        let (server, catalog) = setup_with(scoped_registry());
        catalog
            .db()
            .create_package_if_absent("foo", PackageStatus::Initializing)
            .unwrap();

        server
            .get("/api/v1/packages/foo")
            .await
            .assert_status(StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn delete_removes_the_package() {
        let server = setup();
        import_foo(&server).await;

        server
            .delete("/api/v1/packages/foo")
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .delete("/api/v1/packages/foo")
            .await
            .assert_status_not_found();

        let listed: Vec<PackageRecord> = server.get("/api/v1/packages").await.json();
        assert!(listed.is_empty());
    }
}

mod versions {
    use super::*;

    #[tokio::test]
    async fn returns_a_version_with_elements() {
        let server = setup();
        import_foo(&server).await;

        let response = server.get("/api/v1/packages/foo/versions/1.0.0").await;

        response.assert_status_ok();
        let version: PackageVersion = response.json();
        assert_eq!(version.version.author, "Ada");
        assert_eq!(version.custom_elements[0].tag_name, "FooElement");
    }

    #[tokio::test]
    async fn unknown_version_is_not_found() {
        let server = setup();
        import_foo(&server).await;

        server
            .get("/api/v1/packages/foo/versions/9.9.9")
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn filters_elements_by_tag_name() {
        let server = setup();
        import_foo(&server).await;

        let found: Vec<CustomElementRecord> = server
            .get("/api/v1/packages/foo/versions/1.0.0/elements")
            .add_query_param("tag_name", "FooElement")
            .await
            .json();
        assert_eq!(found.len(), 1);

        let missing: Vec<CustomElementRecord> = server
            .get("/api/v1/packages/foo/versions/1.0.0/elements")
            .add_query_param("tag_name", "bar-element")
            .await
            .json();
        assert!(missing.is_empty());
    }
}

mod elements {
    use super::*;

    #[tokio::test]
    async fn lists_elements_by_dist_tag() {
        let server = setup();
        import_foo(&server).await;

        let latest: Vec<CustomElementRecord> = server
            .get("/api/v1/elements")
            .add_query_param("tag", "latest")
            .await
            .json();
        assert_eq!(latest.len(), 1);

        let next: Vec<CustomElementRecord> = server
            .get("/api/v1/elements")
            .add_query_param("tag", "next")
            .add_query_param("limit", 5)
            .await
            .json();
        assert!(next.is_empty());
    }

    #[tokio::test]
    async fn finds_one_element() {
        let server = setup();
        import_foo(&server).await;

        let response = server
            .get("/api/v1/element")
            .add_query_param("package", "foo")
            .add_query_param("name", "FooElement")
            .await;

        response.assert_status_ok();
        let element: CustomElementRecord = response.json();
        assert_eq!(element.declaration, "foo/foo.js#FooElement");
    }

    #[tokio::test]
    async fn missing_element_is_not_found() {
        let server = setup();
        import_foo(&server).await;

        server
            .get("/api/v1/element")
            .add_query_param("package", "foo")
            .add_query_param("name", "FooElement")
            .add_query_param("tag", "next")
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn ambiguous_element_conflicts() {
        let duplicate = r#"{"modules":[{"path":"a.js",
            "declarations":[{"kind":"class","name":"A"}],
            "exports":[
                {"kind":"custom-element-definition","name":"FooElement","declaration":{"name":"A"}},
                {"kind":"custom-element-definition","name":"FooElement","declaration":{"name":"A"}}
            ]}]}"#;
        let (server, _) = setup_with(foo_registry().with_manifest("foo", "1.0.0", duplicate));
        import_foo(&server).await;

        server
            .get("/api/v1/element")
            .add_query_param("package", "foo")
            .add_query_param("name", "FooElement")
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn detail_documents_the_class() {
        let server = setup();
        import_foo(&server).await;

        let response = server
            .get("/api/v1/element/detail")
            .add_query_param("package", "foo")
            .add_query_param("name", "FooElement")
            .await;

        response.assert_status_ok();
        let detail: ElementDetail = response.json();
        assert_eq!(detail.element.class_name, "FooElement");
        assert_eq!(detail.fields.len(), 2);
        assert_eq!(detail.methods.len(), 1);
    }
}

//! REST integration test macro for record stores.
//!
//! The `rest_listing_tests!` macro generates HTTP-level tests that validate
//! a `RecordStore` through full REST round-trips:
//! query string → extractor → listing → store → JSON response.

/// Generate a REST integration test suite for a record store.
///
/// `$store_factory` must produce an `impl RecordStore + 'static` seeded with
/// `course_fixtures()`. The store is served as `courses` under the default
/// configuration: strict schema, `limit` capped to 100, nested under
/// `bootcamps` through the `bootcamp` field.
///
/// # Generated Tests
///
/// ## Listing (6 tests)
/// - `test_rest_filtered_page` — filter + sort + page 2 with filtered total
/// - `test_rest_defaults` — no parameters
/// - `test_rest_limit_capped` — `limit=1000` → 100
/// - `test_rest_select` — projection through the query string
/// - `test_rest_select_exclusion` — `select=-tuition`
/// - `test_rest_date_filter` — typed `createdAt[lt]`
///
/// ## Nested (2 tests)
/// - `test_rest_nested_listing` — `/bootcamps/{id}/courses`
/// - `test_rest_nested_scope_not_overridden`
///
/// ## Error handling (5 tests)
/// - `test_rest_unknown_field` → 400 `UNKNOWN_FILTER_FIELD`
/// - `test_rest_invalid_value` → 400 `INVALID_FILTER_VALUE`
/// - `test_rest_disallowed_operator` → 400 `UNSUPPORTED_OPERATOR`
/// - `test_rest_unknown_resource` → 404 `UNKNOWN_RESOURCE`
/// - `test_rest_unknown_parent` → 404 `UNKNOWN_RESOURCE`
#[macro_export]
macro_rules! rest_listing_tests {
    ($store_factory:expr) => {
        mod rest_listing_tests {
            use super::*;
            use axum::http::StatusCode;
            use axum_test::TestServer;
            use listing::core::RecordStore;
            use serde_json::Value;
            use std::sync::Arc;

            async fn make_server() -> TestServer {
                let store: Arc<dyn RecordStore> = Arc::new($store_factory);
                let router = store_harness::integration::build_test_router(store);
                TestServer::new(router)
            }

            fn body_ids(body: &Value) -> Vec<String> {
                ids(body["data"].as_array().unwrap())
            }

            // ==============================================================
            // Listing
            // ==============================================================

            #[tokio::test]
            async fn test_rest_filtered_page() {
                let server = make_server().await;

                let response = server
                    .get("/courses")
                    .add_query_param("tuition[gte]", "500")
                    .add_query_param("sort", "-weeks")
                    .add_query_param("page", "2")
                    .add_query_param("limit", "5")
                    .await;

                response.assert_status(StatusCode::OK);

                let body: Value = response.json();
                assert_eq!(body["success"], true);
                assert_eq!(body["count"], 5);
                assert_eq!(body["total"], 12);
                assert_eq!(body["page"], 2);
                assert_eq!(body["limit"], 5);
                assert_eq!(body["totalPages"], 3);
                assert_eq!(body["hasNext"], true);
                assert_eq!(body["hasPrev"], true);
                assert_eq!(body_ids(&body), vec!["c07", "c06", "c05", "c04", "c03"]);
            }

            #[tokio::test]
            async fn test_rest_defaults() {
                let server = make_server().await;

                let body: Value = server.get("/courses").await.json();
                assert_eq!(body["count"], 10);
                assert_eq!(body["total"], FIXTURE_COUNT);
                assert_eq!(body["page"], 1);
                assert_eq!(body["limit"], 10);
                assert_eq!(body_ids(&body)[0], "x15");
            }

            #[tokio::test]
            async fn test_rest_limit_capped() {
                let server = make_server().await;

                let body: Value = server
                    .get("/courses")
                    .add_query_param("limit", "1000")
                    .await
                    .json();
                assert_eq!(body["limit"], 100);
                assert_eq!(body["count"], FIXTURE_COUNT);
                assert_eq!(body["totalPages"], 1);
            }

            #[tokio::test]
            async fn test_rest_select() {
                let server = make_server().await;

                let body: Value = server
                    .get("/courses")
                    .add_query_param("select", "title")
                    .add_query_param("sort", "weeks")
                    .await
                    .json();

                let first = body["data"][0].as_object().unwrap();
                assert_eq!(first.len(), 2);
                assert_eq!(first["title"], "Course 01");
            }

            #[tokio::test]
            async fn test_rest_select_exclusion() {
                let server = make_server().await;

                let body: Value = server
                    .get("/courses")
                    .add_query_param("select", "-tuition")
                    .add_query_param("sort", "weeks")
                    .await
                    .json();

                let first = body["data"][0].as_object().unwrap();
                assert!(!first.contains_key("tuition"));
                assert_eq!(first["title"], "Course 01");
                assert_eq!(first["weeks"], 1);
            }

            #[tokio::test]
            async fn test_rest_date_filter() {
                let server = make_server().await;

                let response = server
                    .get("/courses")
                    .add_query_param("createdAt[lt]", "2024-01-03")
                    .await;

                response.assert_status(StatusCode::OK);
                let body: Value = response.json();
                assert_eq!(body["total"], 2);
                assert_eq!(body_ids(&body), vec!["c02", "c01"]);
            }

            // ==============================================================
            // Nested
            // ==============================================================

            #[tokio::test]
            async fn test_rest_nested_listing() {
                let server = make_server().await;

                let response = server
                    .get(&format!("/bootcamps/{}/courses", BOOTCAMP_ODD))
                    .add_query_param("limit", "20")
                    .await;

                response.assert_status(StatusCode::OK);
                let body: Value = response.json();
                assert_eq!(body["total"], 6);
                assert!(
                    body["data"]
                        .as_array()
                        .unwrap()
                        .iter()
                        .all(|r| r["bootcamp"] == BOOTCAMP_ODD)
                );
            }

            #[tokio::test]
            async fn test_rest_nested_scope_not_overridden() {
                let server = make_server().await;

                let body: Value = server
                    .get(&format!("/bootcamps/{}/courses", BOOTCAMP_ODD))
                    .add_query_param("bootcamp", BOOTCAMP_EVEN)
                    .await
                    .json();
                assert_eq!(body["total"], 6);
            }

            // ==============================================================
            // Error handling
            // ==============================================================

            #[tokio::test]
            async fn test_rest_unknown_field() {
                let server = make_server().await;

                let response = server
                    .get("/courses")
                    .add_query_param("password", "hunter2")
                    .await;

                response.assert_status(StatusCode::BAD_REQUEST);
                let body: Value = response.json();
                assert_eq!(body["code"], "UNKNOWN_FILTER_FIELD");
                assert_eq!(body["details"]["field"], "password");
            }

            #[tokio::test]
            async fn test_rest_invalid_value() {
                let server = make_server().await;

                let response = server
                    .get("/courses")
                    .add_query_param("weeks", "ten")
                    .await;

                response.assert_status(StatusCode::BAD_REQUEST);
                let body: Value = response.json();
                assert_eq!(body["code"], "INVALID_FILTER_VALUE");
                assert_eq!(body["details"]["expected"], "number");
            }

            #[tokio::test]
            async fn test_rest_disallowed_operator() {
                let server = make_server().await;

                let response = server
                    .get("/courses")
                    .add_query_param("minimumSkill[gte]", "beginner")
                    .await;

                response.assert_status(StatusCode::BAD_REQUEST);
                let body: Value = response.json();
                assert_eq!(body["code"], "UNSUPPORTED_OPERATOR");
            }

            #[tokio::test]
            async fn test_rest_unknown_resource() {
                let server = make_server().await;

                let response = server.get("/widgets").await;

                response.assert_status(StatusCode::NOT_FOUND);
                let body: Value = response.json();
                assert_eq!(body["code"], "UNKNOWN_RESOURCE");
            }

            #[tokio::test]
            async fn test_rest_unknown_parent() {
                let server = make_server().await;

                let response = server
                    .get(&format!("/users/{}/courses", BOOTCAMP_ODD))
                    .await;

                response.assert_status(StatusCode::NOT_FOUND);
            }
        }
    };
}

//! Integration test infrastructure for record stores.
//!
//! Builds a listing router around a seeded store so the REST layer can be
//! validated end to end (HTTP → extractor → Filters → RecordStore → JSON).
//!
//! # Architecture
//!
//! ```text
//! axum_test::TestServer
//!     └─ Router (built by build_test_router)
//!         ├─ GET /courses                       → list_resource
//!         └─ GET /bootcamps/{id}/courses        → list_nested_resource
//! ```

#[macro_use]
pub mod rest_tests;

use axum::Router;
use listing::config::ListingConfig;
use listing::core::RecordStore;
use listing::server::ListingServer;
use std::sync::Arc;

/// Router exposing `store` as `courses` with the default strict schema
pub fn build_test_router(store: Arc<dyn RecordStore>) -> Router {
    let config = ListingConfig::default_config();
    let courses = config
        .resource("courses")
        .cloned()
        .expect("default configuration declares courses");

    ListingServer::new()
        .register_shared(courses, store)
        .build()
        .expect("router with one resource")
}

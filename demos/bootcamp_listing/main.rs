//! Bootcamp directory listing API served from in-memory stores
//!
//! ```text
//! cargo run --example bootcamp_listing
//! curl 'http://127.0.0.1:3000/courses?tuition[gte]=8000&sort=-weeks&select=title,weeks'
//! curl 'http://127.0.0.1:3000/bootcamps/5d713995b721c3bb38c1f5d0/courses?page=1&limit=2'
//! ```
//!
//! Set `LISTING_CONFIG=path/to/listing.yaml` to replace the built-in resource
//! configuration and `RUST_LOG=listing=debug` to see dropped parameters.

use axum::{Json, Router, routing::get};
use listing::prelude::*;
use tracing_subscriber::EnvFilter;

const DEVWORKS: &str = "5d713995b721c3bb38c1f5d0";
const CODEMASTERS: &str = "5d713a66ec8f2b88b8f830b8";

fn seed(config: &ListingConfig) -> Result<ListingServer> {
    let bootcamps = InMemoryStore::new("bootcamps");
    bootcamps.insert_many([
        json!({"_id": DEVWORKS, "name": "Devworks Bootcamp", "careers": ["Web Development", "UI/UX"],
               "housing": true, "averageCost": 10000, "averageRating": 8,
               "createdAt": "2024-01-10T09:00:00.000Z"}),
        json!({"_id": CODEMASTERS, "name": "Codemasters", "careers": ["Web Development", "Data Science"],
               "housing": false, "averageCost": 12000, "averageRating": 6,
               "createdAt": "2024-02-14T09:00:00.000Z"}),
    ])?;

    let courses = InMemoryStore::new("courses");
    courses.insert_many([
        json!({"title": "Front End Web Development", "weeks": 8, "tuition": 8000,
               "minimumSkill": "beginner", "scholarshipAvailable": true, "bootcamp": DEVWORKS}),
        json!({"title": "Full Stack Web Development", "weeks": 12, "tuition": 10000,
               "minimumSkill": "intermediate", "scholarshipAvailable": false, "bootcamp": DEVWORKS}),
        json!({"title": "UI/UX", "weeks": 12, "tuition": 6000,
               "minimumSkill": "beginner", "scholarshipAvailable": true, "bootcamp": DEVWORKS}),
        json!({"title": "Data Science Program", "weeks": 10, "tuition": 12000,
               "minimumSkill": "advanced", "scholarshipAvailable": false, "bootcamp": CODEMASTERS}),
        json!({"title": "Web Design & Development", "weeks": 10, "tuition": 9000,
               "minimumSkill": "intermediate", "scholarshipAvailable": true, "bootcamp": CODEMASTERS}),
    ])?;

    let reviews = InMemoryStore::new("reviews");
    reviews.insert_many([
        json!({"title": "Learned a ton!", "rating": 8, "bootcamp": DEVWORKS}),
        json!({"title": "Great bootcamp", "rating": 10, "bootcamp": DEVWORKS}),
        json!({"title": "Got me a developer job", "rating": 7, "bootcamp": CODEMASTERS}),
    ])?;

    let users = InMemoryStore::new("users");
    users.insert_many([
        json!({"name": "Admin Account", "email": "admin@devcamper.io", "role": "admin"}),
        json!({"name": "John Doe", "email": "john@devcamper.io", "role": "publisher"}),
        json!({"name": "Jane Doe", "email": "jane@devcamper.io", "role": "user"}),
    ])?;

    let mut server = ListingServer::new();
    for (name, store) in [
        ("bootcamps", bootcamps),
        ("courses", courses),
        ("reviews", reviews),
        ("users", users),
    ] {
        match config.resource(name) {
            Some(resource) => server = server.register(resource.clone(), store),
            None => tracing::warn!(resource = name, "Resource missing from configuration"),
        }
    }

    Ok(server)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::var("LISTING_CONFIG") {
        Ok(path) => ListingConfig::from_yaml_file(&path)?,
        Err(_) => ListingConfig::default_config(),
    };
    tracing::info!("Loaded configuration with {} resources", config.resources.len());

    let health = Router::new().route("/health", get(|| async { Json(json!({"status": "ok"})) }));

    seed(&config)?
        .with_custom_routes(health)
        .serve("127.0.0.1:3000")
        .await
}

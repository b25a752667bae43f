//! Server module exposing resources through the listing routes
//!
//! - [`ListingServer`]: registers resources and their stores, builds the router
//! - [`listing`]: the generic listing operation and its handlers

pub mod builder;
pub mod listing;

pub use builder::ListingServer;
pub use listing::{ListingResponse, Scope, build_listing_routes, list_records};

//! Axum extractor for listing query strings
//!
//! [`QueryMap`] decodes the request's query string into `(key, value)` pairs
//! and normalizes them into a [`RawQueryMap`]. Extraction never rejects a
//! request: an undecodable query string yields an empty map.

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use std::convert::Infallible;

use crate::core::raw_query::RawQueryMap;

/// Normalized query string of the current request
///
/// # Example
/// ```rust,ignore
/// async fn list_courses(QueryMap(raw): QueryMap) -> impl IntoResponse {
///     // GET /courses?tuition[gte]=500&sort=-weeks&page=2
///     let query = Filters::new(&raw, &options).filter()?.sort().paginate();
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryMap(pub RawQueryMap);

impl<S> FromRequestParts<S> for QueryMap
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pairs = match Query::<Vec<(String, String)>>::from_request_parts(parts, state).await {
            Ok(Query(pairs)) => pairs,
            Err(rejection) => {
                tracing::debug!(error = %rejection, "Undecodable query string, ignoring it");
                Vec::new()
            }
        };

        Ok(QueryMap(RawQueryMap::from_pairs(pairs)))
    }
}

//! Generic listing operation and its HTTP handlers
//!
//! [`list_records`] runs the whole pipeline for one request: filter, select,
//! sort, paginate, then the filtered count and the page read side by side.
//! The handlers resolve the resource from the path and delegate to it.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{QueryOptions, ResourceConfig};
use crate::core::{
    Filters, PaginationMeta, QueryError, QueryMap, RawQueryMap, RecordStore, count_matching,
    execute, pagination_meta,
};

/// Body of a successful listing
///
/// ```json
/// { "success": true, "count": 5, "page": 2, "limit": 5, "total": 12,
///   "totalPages": 3, "hasNext": true, "hasPrev": true, "data": [...] }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ListingResponse {
    pub success: bool,

    /// Number of records in `data`
    pub count: usize,

    #[serde(flatten)]
    pub meta: PaginationMeta,

    pub data: Vec<Value>,
}

/// Equality restriction coming from the path of a nested listing
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub field: &'a str,
    pub value: &'a str,
}

/// List the records of `store` matching the request's query string
///
/// `total` is the number of records matching the filters (scope included),
/// not the size of the whole collection.
pub async fn list_records(
    store: &dyn RecordStore,
    raw: &RawQueryMap,
    options: &QueryOptions,
    scope: Option<Scope<'_>>,
) -> Result<ListingResponse, QueryError> {
    let mut filters = Filters::new(raw, options);
    if let Some(scope) = scope {
        filters = filters.scoped(scope.field, scope.value);
    }

    let query = filters.filter()?.select().sort().paginate().into_query();

    let (total, data) = tokio::try_join!(count_matching(&query, store), execute(&query, store))?;

    Ok(ListingResponse {
        success: true,
        count: data.len(),
        meta: pagination_meta(total, raw, options),
        data,
    })
}

/// A resource registered for listing
#[derive(Clone)]
pub struct ListedResource {
    pub config: ResourceConfig,
    pub store: Arc<dyn RecordStore>,
}

/// Shared state of the listing routes
#[derive(Clone, Default)]
pub struct ListingState {
    pub resources: Arc<HashMap<String, ListedResource>>,
}

impl ListingState {
    fn resource(&self, name: &str) -> Result<&ListedResource, QueryError> {
        self.resources
            .get(name)
            .ok_or_else(|| QueryError::UnknownResource {
                resource: name.to_string(),
            })
    }
}

/// Build the listing routes
///
/// - GET /{resource} - List a resource
/// - GET /{parent}/{parent_id}/{resource} - List the records of one parent
pub fn build_listing_routes(state: ListingState) -> Router {
    Router::new()
        .route("/{resource}", get(list_resource))
        .route("/{parent}/{parent_id}/{resource}", get(list_nested_resource))
        .with_state(state)
}

/// GET /{resource}
pub async fn list_resource(
    State(state): State<ListingState>,
    Path(resource): Path<String>,
    QueryMap(raw): QueryMap,
) -> Result<Json<ListingResponse>, QueryError> {
    let listed = state.resource(&resource)?;

    let response = list_records(listed.store.as_ref(), &raw, &listed.config.options, None).await?;
    Ok(Json(response))
}

/// GET /{parent}/{parent_id}/{resource}
///
/// Only routes for parents the resource is declared nested under.
pub async fn list_nested_resource(
    State(state): State<ListingState>,
    Path((parent, parent_id, resource)): Path<(String, String, String)>,
    QueryMap(raw): QueryMap,
) -> Result<Json<ListingResponse>, QueryError> {
    let listed = state.resource(&resource)?;
    let field = listed
        .config
        .parent_field(&parent)
        .ok_or_else(|| QueryError::UnknownResource {
            resource: format!("{}/{}", parent, resource),
        })?;

    let scope = Scope {
        field,
        value: &parent_id,
    };
    let response = list_records(
        listed.store.as_ref(),
        &raw,
        &listed.config.options,
        Some(scope),
    )
    .await?;
    Ok(Json(response))
}

//! Store trait for executing composed listing queries

use async_trait::async_trait;
use serde_json::Value;

use crate::core::error::{QueryError, StoreError};
use crate::core::predicate::Predicate;
use crate::core::query::ListingQuery;

/// Trait for stores that can run listing queries
///
/// A store receives the whole composed query and applies, in order:
/// the predicate, the sort, skip/limit, then the projection. Records are
/// JSON objects; identifiers (`id`/`_id`) survive any projection.
///
/// Implementations decide how to evaluate operators. Operators a store does
/// not understand must be reported as [`StoreError::UnsupportedOperator`],
/// never silently ignored.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Collection the store reads from
    fn collection(&self) -> &str;

    /// Matching records, sorted, paginated and projected
    async fn find(&self, query: &ListingQuery) -> Result<Vec<Value>, StoreError>;

    /// Number of records matching `predicate`, ignoring pagination
    async fn count(&self, predicate: &Predicate) -> Result<u64, StoreError>;
}

/// Run a composed query against a store
///
/// One read, no retries: a store failure is returned unchanged as
/// [`QueryError::Store`]. Dropping the returned future cancels the read.
pub async fn execute<S: RecordStore + ?Sized>(
    query: &ListingQuery,
    store: &S,
) -> Result<Vec<Value>, QueryError> {
    tracing::debug!(
        collection = store.collection(),
        clauses = query.predicate.len(),
        "Executing listing query"
    );

    Ok(store.find(query).await?)
}

/// Count the records matching the query's predicate
///
/// This is the `total` pagination metadata should be computed from.
pub async fn count_matching<S: RecordStore + ?Sized>(
    query: &ListingQuery,
    store: &S,
) -> Result<u64, QueryError> {
    Ok(store.count(&query.predicate).await?)
}

//! Core module containing the query filter engine and its building blocks

pub mod error;
pub mod extractors;
pub mod filters;
pub mod operator;
pub mod predicate;
pub mod query;
pub mod raw_query;
pub mod store;

pub use error::{ErrorResponse, QueryError, StoreError};
pub use extractors::QueryMap;
pub use filters::Filters;
pub use operator::Operator;
pub use predicate::{Condition, FilterClause, Predicate};
pub use query::{
    ListingQuery, Pagination, PaginationMeta, Projection, ProjectionMode, SortDirection, SortKey,
    SortSpec, pagination_meta,
};
pub use raw_query::{RESERVED_KEYS, RawQueryMap, RawValue};
pub use store::{RecordStore, count_matching, execute};

//! # listing-query
//!
//! Query-string driven filtering, projection, sorting and pagination for
//! resource listing APIs.
//!
//! ## Features
//!
//! - **Bracket operators**: `?tuition[gte]=500&weeks[lt]=12&careers[in]=Web,Mobile`
//! - **Projection**: `?select=title,weeks`, or `?select=-password` to drop a field
//! - **Multi-key sort**: `?sort=-weeks,title`, newest-first by default
//! - **Pagination**: `?page=2&limit=5` with `total`/`totalPages` metadata
//! - **Strict mode**: per-resource field allow-list with typed values
//! - **Nested listings**: `/bootcamps/{id}/courses` scoped to one parent
//! - **Stores**: in-memory, MongoDB (`mongodb_backend` feature)
//! - **Configuration-Based**: describe resources via YAML configuration
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use listing::prelude::*;
//!
//! let raw = RawQueryMap::from_pairs([("tuition[gte]", "500"), ("sort", "-weeks")]);
//! let options = QueryOptions::default();
//!
//! let records = Filters::new(&raw, &options)
//!     .filter()?
//!     .select()
//!     .sort()
//!     .paginate()
//!     .exec(&store)
//!     .await?;
//! ```

pub mod config;
pub mod core;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Engine ===
    pub use crate::core::{
        Condition, ErrorResponse, FilterClause, Filters, ListingQuery, Operator, Pagination,
        PaginationMeta, Predicate, Projection, ProjectionMode, QueryError, QueryMap, RawQueryMap,
        RawValue, RecordStore, SortDirection, SortKey, SortSpec, StoreError, count_matching,
        execute, pagination_meta,
    };

    // === Storage ===
    pub use crate::storage::InMemoryStore;
    #[cfg(feature = "mongodb_backend")]
    pub use crate::storage::MongoStore;

    // === Config ===
    pub use crate::config::{
        FieldKind, FieldRule, FilterSchema, ListingConfig, OperatorPolicy, ParentScope,
        QueryOptions, ResourceConfig,
    };

    // === Server ===
    pub use crate::server::{ListingResponse, ListingServer, Scope, list_records};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use serde_json::{Value, json};
}

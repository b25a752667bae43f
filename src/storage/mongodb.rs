//! MongoDB record store using the official MongoDB async driver.
//!
//! # Feature flag
//!
//! This module is gated behind the `mongodb_backend` feature flag:
//! ```toml
//! [dependencies]
//! listing-query = { version = "0.1", features = ["mongodb_backend"] }
//! ```
//!
//! # Storage model
//!
//! One `MongoStore` per collection. Records are stored as BSON documents and
//! returned as JSON through relaxed extended JSON; an `ObjectId` identifier
//! is returned as its hex string and top-level dates as RFC 3339 strings
//! (`2024-01-01T00:00:00.000Z`). `insert_many` stores top-level RFC 3339
//! strings as BSON dates, the way timestamp fields are kept.
//!
//! # Value casting
//!
//! Permissive listings hand the store untyped strings. Since MongoDB compares
//! values with their native BSON types, a string filter value is widened to
//! every type it could stand for: equality becomes `$in` over the variants
//! (`"8"` matches `"8"` and `8`) and comparison operands use the numeric form
//! when the string is a number, or a BSON date when it reads as a date.
//! Numbers and booleans are sent unchanged.
//!
//! Operators outside the known comparison set are forwarded as-is; the
//! server rejects those it does not know.

use crate::core::filters::parse_date;
use crate::core::{
    Condition, ListingQuery, Operator, Predicate, Projection, ProjectionMode, RecordStore,
    SortSpec, StoreError,
};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use futures::TryStreamExt;
use mongodb::Database;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document, doc};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// Convert a JSON object into a BSON Document, renaming `id` → `_id`.
fn json_to_document(json: &Value) -> Result<Document, StoreError> {
    let bson_val =
        mongodb::bson::to_bson(json).map_err(|e| StoreError::Serialization(e.to_string()))?;

    let mut doc = match bson_val {
        Bson::Document(d) => d,
        _ => {
            return Err(StoreError::Serialization(
                "expected a JSON object, got non-object".to_string(),
            ));
        }
    };

    if let Some(id) = doc.remove("id") {
        doc.insert("_id", id);
    }

    Ok(doc)
}

/// Convert a BSON Document back into JSON.
fn document_to_json(mut doc: Document) -> Value {
    if let Ok(oid) = doc.get_object_id("_id") {
        doc.insert("_id", oid.to_hex());
    }

    for (_, value) in doc.iter_mut() {
        if let Bson::DateTime(date) = value
            && let Some(date) = DateTime::<Utc>::from_timestamp_millis(date.timestamp_millis())
        {
            *value = Bson::String(date.to_rfc3339_opts(SecondsFormat::Millis, true));
        }
    }

    Bson::Document(doc).into_relaxed_extjson()
}

/// Store top-level RFC 3339 strings as BSON dates
fn store_dates(doc: &mut Document) {
    for (_, value) in doc.iter_mut() {
        if let Bson::String(text) = value
            && let Ok(date) = DateTime::parse_from_rfc3339(text)
        {
            *value = Bson::DateTime(date_bson(date.with_timezone(&Utc)));
        }
    }
}

fn date_bson(date: DateTime<Utc>) -> mongodb::bson::DateTime {
    mongodb::bson::DateTime::from_millis(date.timestamp_millis())
}

fn to_bson(value: &Value) -> Result<Bson, StoreError> {
    mongodb::bson::to_bson(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn stored_field(field: &str) -> &str {
    if field == "id" { "_id" } else { field }
}

/// Every BSON value a query-string value could stand for.
fn string_variants(value: &str) -> Vec<Bson> {
    let mut variants: Vec<Bson> = vec![Bson::String(value.to_string())];

    match value {
        "true" => variants.push(Bson::Boolean(true)),
        "false" => variants.push(Bson::Boolean(false)),
        _ => {
            if let Ok(i) = value.parse::<i64>() {
                variants.push(Bson::Int64(i));
            } else if let Ok(f) = value.parse::<f64>()
                && f.is_finite()
            {
                variants.push(Bson::Double(f));
            }
            if let Ok(oid) = ObjectId::parse_str(value) {
                variants.push(Bson::ObjectId(oid));
            }
            if let Some(date) = parse_date(value) {
                variants.push(Bson::DateTime(date_bson(date)));
            }
        }
    }

    variants
}

fn expand_items(items: &[Value]) -> Result<Vec<Bson>, StoreError> {
    let mut expanded = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) => expanded.extend(string_variants(s)),
            other => expanded.push(to_bson(other)?),
        }
    }
    Ok(expanded)
}

fn equality_bson(value: &Value) -> Result<Bson, StoreError> {
    match value {
        Value::String(s) => {
            let mut variants = string_variants(s);
            if variants.len() == 1 {
                Ok(variants.remove(0))
            } else {
                Ok(Bson::Document(doc! { "$in": variants }))
            }
        }
        Value::Array(items) => Ok(Bson::Document(doc! { "$in": expand_items(items)? })),
        other => to_bson(other),
    }
}

fn operand_bson(op: &Operator, operand: &Value) -> Result<Bson, StoreError> {
    match (op, operand) {
        (Operator::In, Value::Array(items)) => Ok(Bson::Array(expand_items(items)?)),
        (Operator::In, single) => Ok(Bson::Array(expand_items(std::slice::from_ref(single))?)),
        (Operator::Gte | Operator::Gt | Operator::Lte | Operator::Lt, Value::String(s)) => {
            if let Ok(i) = s.parse::<i64>() {
                Ok(Bson::Int64(i))
            } else if let Ok(f) = s.parse::<f64>()
                && f.is_finite()
            {
                Ok(Bson::Double(f))
            } else if let Some(date) = parse_date(s.trim()) {
                Ok(Bson::DateTime(date_bson(date)))
            } else {
                Ok(Bson::String(s.clone()))
            }
        }
        (_, other) => to_bson(other),
    }
}

/// Render a predicate as a MongoDB filter document.
fn predicate_to_document(predicate: &Predicate) -> Result<Document, StoreError> {
    let mut filter = Document::new();

    for clause in predicate.clauses() {
        if clause.is_top_level_operator() {
            return Err(StoreError::UnsupportedOperator(clause.field.clone()));
        }

        let value = match &clause.condition {
            Condition::Equals(value) => equality_bson(value)?,
            Condition::Compare(ops) => {
                let mut operators = Document::new();
                for (op, operand) in ops {
                    operators.insert(op.store_token(), operand_bson(op, operand)?);
                }
                Bson::Document(operators)
            }
        };

        filter.insert(stored_field(&clause.field), value);
    }

    Ok(filter)
}

/// Sort document with `_id` appended as tiebreaker so pages never overlap.
fn sort_document(sort: &SortSpec) -> Document {
    let mut document = Document::new();
    for key in sort.keys() {
        document.insert(stored_field(&key.field), key.direction.as_i32());
    }
    if !document.contains_key("_id") {
        document.insert("_id", 1);
    }
    document
}

fn projection_document(projection: &Projection) -> Document {
    let flag = match projection.mode() {
        ProjectionMode::Include => 1,
        ProjectionMode::Exclude => 0,
    };
    let mut document = Document::new();
    for field in projection.fields() {
        document.insert(stored_field(field), flag);
    }
    document
}

// ---------------------------------------------------------------------------
// MongoStore
// ---------------------------------------------------------------------------

/// Record store backed by one MongoDB collection.
///
/// # Example
///
/// ```rust,ignore
/// use mongodb::Client;
/// use listing::storage::MongoStore;
///
/// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
/// let store = MongoStore::new(client.database("devcamper"), "courses");
/// let records = execute(&query, &store).await?;
/// ```
#[derive(Clone, Debug)]
pub struct MongoStore {
    database: Database,
    collection: String,
}

impl MongoStore {
    /// Create a store reading `collection` from `database`.
    pub fn new(database: Database, collection: impl Into<String>) -> Self {
        Self {
            database,
            collection: collection.into(),
        }
    }

    /// Get a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    fn handle(&self) -> mongodb::Collection<Document> {
        self.database.collection(&self.collection)
    }

    /// Insert JSON records; returns how many were written.
    pub async fn insert_many(
        &self,
        records: impl IntoIterator<Item = Value>,
    ) -> Result<usize, StoreError> {
        let docs = records
            .into_iter()
            .map(|record| {
                let mut doc = json_to_document(&record)?;
                store_dates(&mut doc);
                Ok(doc)
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        if docs.is_empty() {
            return Ok(0);
        }

        let result = self
            .handle()
            .insert_many(docs)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to insert records: {}", e)))?;

        Ok(result.inserted_ids.len())
    }
}

#[async_trait]
impl RecordStore for MongoStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn find(&self, query: &ListingQuery) -> Result<Vec<Value>, StoreError> {
        let filter = predicate_to_document(&query.predicate)?;

        let collection = self.handle();
        let mut find = collection.find(filter);
        if !query.sort.is_empty() {
            find = find.sort(sort_document(&query.sort));
        }
        if !query.projection.is_empty() {
            find = find.projection(projection_document(&query.projection));
        }
        if let Some(pagination) = query.pagination {
            find = find
                .skip(pagination.skip() as u64)
                .limit(i64::try_from(pagination.limit).unwrap_or(i64::MAX));
        }

        let cursor = find
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to find records: {}", e)))?;

        let docs: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to collect records: {}", e)))?;

        Ok(docs.into_iter().map(document_to_json).collect())
    }

    async fn count(&self, predicate: &Predicate) -> Result<u64, StoreError> {
        let filter = predicate_to_document(predicate)?;

        self.handle()
            .count_documents(filter)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to count records: {}", e)))
    }
}

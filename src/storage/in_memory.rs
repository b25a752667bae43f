//! In-memory implementation of RecordStore for testing and development
//!
//! Filter values are cast toward the type stored in the record before
//! comparing, so the untyped strings produced in permissive mode still match
//! numeric and boolean fields (`tuition[gte]=500` matches `"tuition": 8000`).
//! Two strings that both read as dates compare as instants, whatever their
//! offset or precision.
//! Equality against an array field matches when any element is equal.
//! Projections apply to top-level fields only.

use crate::core::filters::parse_date;
use crate::core::{
    Condition, ListingQuery, Operator, Predicate, Projection, RecordStore, SortDirection, SortSpec,
    StoreError,
};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// In-memory record store
///
/// Useful for testing and development. Uses RwLock for thread-safe access.
#[derive(Clone)]
pub struct InMemoryStore {
    collection: String,
    records: Arc<RwLock<Vec<Value>>>,
}

impl InMemoryStore {
    /// Create an empty store for `collection`
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Insert a record
    ///
    /// The record must be a JSON object. `_id` (UUID) and `createdAt`
    /// (RFC 3339, milliseconds) are filled in when missing.
    pub fn insert(&self, record: Value) -> Result<Value, StoreError> {
        let Value::Object(mut fields) = record else {
            return Err(StoreError::Serialization(
                "record must be a JSON object".to_string(),
            ));
        };

        fields
            .entry("_id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        fields.entry("createdAt").or_insert_with(|| {
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
        });

        let record = Value::Object(fields);
        let mut records = self
            .records
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        records.push(record.clone());

        Ok(record)
    }

    /// Insert several records in order
    pub fn insert_many(
        &self,
        records: impl IntoIterator<Item = Value>,
    ) -> Result<Vec<Value>, StoreError> {
        records.into_iter().map(|r| self.insert(r)).collect()
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        self.records
            .read()
            .map(|records| records.len())
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        self.len().map(|len| len == 0)
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn find(&self, query: &ListingQuery) -> Result<Vec<Value>, StoreError> {
        check_supported(&query.predicate)?;

        let records = self
            .records
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;

        let mut matched: Vec<Value> = records
            .iter()
            .filter(|record| matches(record, &query.predicate))
            .cloned()
            .collect();

        sort_records(&mut matched, &query.sort);

        let (skip, take) = query
            .pagination
            .map_or((0, usize::MAX), |p| (p.skip(), p.limit));

        Ok(matched
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|record| project(record, &query.projection))
            .collect())
    }

    async fn count(&self, predicate: &Predicate) -> Result<u64, StoreError> {
        check_supported(predicate)?;

        let records = self
            .records
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;

        Ok(records.iter().filter(|record| matches(record, predicate)).count() as u64)
    }
}

/// Reject top-level and unrecognized operators before touching any record
fn check_supported(predicate: &Predicate) -> Result<(), StoreError> {
    for clause in predicate.clauses() {
        if clause.is_top_level_operator() {
            return Err(StoreError::UnsupportedOperator(clause.field.clone()));
        }
        if let Condition::Compare(ops) = &clause.condition
            && let Some((op, _)) = ops.iter().find(|(op, _)| !op.is_known())
        {
            return Err(StoreError::UnsupportedOperator(op.store_token()));
        }
    }
    Ok(())
}

/// Resolve a dotted path; `id` falls back to `_id`
fn lookup<'v>(record: &'v Value, path: &str) -> Option<&'v Value> {
    if path == "id" {
        return record.get("id").or_else(|| record.get("_id"));
    }
    path.split('.')
        .try_fold(record, |current, segment| current.get(segment))
}

fn matches(record: &Value, predicate: &Predicate) -> bool {
    predicate.clauses().iter().all(|clause| {
        let actual = lookup(record, &clause.field);
        match &clause.condition {
            Condition::Equals(expected) => equals(actual, expected),
            Condition::Compare(ops) => ops
                .iter()
                .all(|(op, operand)| compare(actual, op, operand)),
        }
    })
}

fn equals(actual: Option<&Value>, expected: &Value) -> bool {
    match (actual, expected) {
        (None | Some(Value::Null), Value::Null) => true,
        (None, _) => false,
        (Some(Value::Array(items)), Value::Array(wanted)) => {
            items.len() == wanted.len() && items.iter().zip(wanted).all(|(a, w)| scalar_eq(a, w))
        }
        (Some(Value::Array(items)), _) => items.iter().any(|item| scalar_eq(item, expected)),
        // a list filter on a scalar field means membership
        (Some(actual), Value::Array(wanted)) => wanted.iter().any(|w| scalar_eq(actual, w)),
        (Some(actual), _) => scalar_eq(actual, expected),
    }
}

fn compare(actual: Option<&Value>, op: &Operator, operand: &Value) -> bool {
    let Some(actual) = actual else {
        return false;
    };

    if *op == Operator::In {
        let wanted = match operand {
            Value::Array(items) => items.as_slice(),
            other => std::slice::from_ref(other),
        };
        return match actual {
            Value::Array(items) => items
                .iter()
                .any(|item| wanted.iter().any(|w| scalar_eq(item, w))),
            _ => wanted.iter().any(|w| scalar_eq(actual, w)),
        };
    }

    if let Value::Array(items) = actual {
        return items.iter().any(|item| compare(Some(item), op, operand));
    }

    let ordering = order(actual, operand);
    match op {
        Operator::Gte => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        Operator::Gt => ordering == Some(Ordering::Greater),
        Operator::Lte => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        Operator::Lt => ordering == Some(Ordering::Less),
        Operator::In | Operator::Other(_) => false,
    }
}

fn scalar_eq(actual: &Value, expected: &Value) -> bool {
    order(actual, expected) == Some(Ordering::Equal)
}

/// Order `actual` against a filter value cast toward the stored type
fn order(actual: &Value, expected: &Value) -> Option<Ordering> {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::Number(a), Value::String(b)) => a.as_f64()?.partial_cmp(&b.trim().parse::<f64>().ok()?),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::String(b)) => b.parse::<bool>().ok().map(|b| a.cmp(&b)),
        (Value::String(a), Value::String(b)) => Some(text_order(a, b)),
        (Value::String(a), Value::Number(b)) => Some(a.as_str().cmp(b.to_string().as_str())),
        (Value::String(a), Value::Bool(b)) => Some(a.as_str().cmp(if *b { "true" } else { "false" })),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Dates compare as instants, other text lexically
fn text_order(a: &str, b: &str) -> Ordering {
    match (parse_date(a), parse_date(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

/// Cross-type order used for sorting: missing/null, numbers, strings,
/// objects, arrays, booleans
fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

fn sort_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            x.as_f64().partial_cmp(&y.as_f64()).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => text_order(x, y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Stable multi-key sort
fn sort_records(records: &mut [Value], sort: &SortSpec) {
    if sort.is_empty() {
        return;
    }

    records.sort_by(|a, b| {
        for key in sort.keys() {
            let ordering = sort_order(lookup(a, &key.field), lookup(b, &key.field));
            let ordering = match key.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

fn project(record: Value, projection: &Projection) -> Value {
    if projection.is_empty() {
        return record;
    }

    match record {
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .filter(|(key, _)| projection.keeps(key))
                .collect(),
        ),
        other => other,
    }
}

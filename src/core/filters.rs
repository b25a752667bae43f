//! Query filter engine
//!
//! [`Filters`] turns a [`RawQueryMap`] into a [`ListingQuery`] in four steps,
//! applied in this order:
//!
//! 1. [`filter`](Filters::filter): every non-reserved key becomes a clause,
//!    bracket operators become sigil-prefixed store operators
//! 2. [`select`](Filters::select): `select=name,slug` restricts the fields
//! 3. [`sort`](Filters::sort): `sort=name,-rating`, newest-first by default
//! 4. [`paginate`](Filters::paginate): `page`/`limit` become skip/limit
//!
//! Each step consumes the builder and returns it, so the chain reads like the
//! listing it builds:
//!
//! ```
//! use listing::config::QueryOptions;
//! use listing::core::filters::Filters;
//! use listing::core::raw_query::RawQueryMap;
//!
//! let raw = RawQueryMap::from_pairs([("tuition[gte]", "500"), ("sort", "-weeks")]);
//! let options = QueryOptions::default();
//!
//! let query = Filters::new(&raw, &options)
//!     .filter()?
//!     .select()
//!     .sort()
//!     .paginate()
//!     .into_query();
//!
//! assert_eq!(
//!     serde_json::to_value(&query.predicate)?,
//!     serde_json::json!({"tuition": {"$gte": "500"}})
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::config::{FieldKind, FieldRule, OperatorPolicy, QueryOptions};
use crate::core::error::QueryError;
use crate::core::operator::Operator;
use crate::core::predicate::{FilterClause, Predicate};
use crate::core::query::{ListingQuery, Pagination, Projection, SortKey, SortSpec, split_tokens};
use crate::core::raw_query::{RawQueryMap, RawValue};
use crate::core::store::{RecordStore, execute};

/// Chainable builder composing a [`ListingQuery`]
///
/// One instance per request. The builder never touches the store;
/// [`exec`](Filters::exec) hands the finished query to [`execute`].
#[derive(Debug, Clone)]
pub struct Filters<'a> {
    raw: &'a RawQueryMap,
    options: &'a QueryOptions,
    scope: Vec<FilterClause>,
    query: ListingQuery,
}

impl<'a> Filters<'a> {
    pub fn new(raw: &'a RawQueryMap, options: &'a QueryOptions) -> Self {
        Self {
            raw,
            options,
            scope: Vec::new(),
            query: ListingQuery::default(),
        }
    }

    /// Restrict the listing to records where `field` equals `value`
    ///
    /// Used for nested listings (`/bootcamps/{id}/courses`). Scope clauses
    /// come first in the predicate and a query parameter on the same field
    /// cannot override them.
    pub fn scoped(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let clause = FilterClause::equals(field, value);
        self.query.predicate.push(clause.clone());
        self.scope.retain(|c| c.field != clause.field);
        self.scope.push(clause);
        self
    }

    /// Build the predicate from the non-reserved query parameters
    ///
    /// Only fails under [`OperatorPolicy::Strict`].
    pub fn filter(mut self) -> Result<Self, QueryError> {
        let mut predicate: Predicate = self.scope.iter().cloned().collect();

        for (key, value) in self.raw.without_reserved().iter() {
            if self.scope.iter().any(|c| &c.field == key) {
                tracing::debug!(field = %key, "Ignoring filter on a scoped field");
                continue;
            }

            let clause = match self.options.policy {
                OperatorPolicy::Permissive => permissive_clause(key, value),
                OperatorPolicy::Strict => strict_clause(key, value, self.options)?,
            };
            predicate.push(clause);
        }

        self.query.predicate = predicate;
        Ok(self)
    }

    /// Restrict the returned fields to `select`
    ///
    /// `select=name,slug` keeps those fields, `select=-password` drops one.
    pub fn select(mut self) -> Self {
        let tokens = self.raw.get("select").map(split_tokens).unwrap_or_default();
        let mut projection = Projection::parse(tokens.iter().map(String::as_str));
        projection.retain(|field| self.keep_field(field, "select"));

        self.query.projection = projection;
        self
    }

    /// Apply `sort`, or the newest-first default when absent
    pub fn sort(mut self) -> Self {
        let keys: Vec<SortKey> = self
            .raw
            .get("sort")
            .map(split_tokens)
            .unwrap_or_default()
            .iter()
            .filter_map(|token| SortKey::parse(token))
            .filter(|key| self.keep_field(&key.field, "sort"))
            .collect();

        self.query.sort = if keys.is_empty() {
            SortSpec::new(vec![SortKey::desc(&self.options.default_sort_field)])
        } else {
            SortSpec::new(keys)
        };
        self
    }

    /// Apply `page` and `limit`; never fails
    pub fn paginate(mut self) -> Self {
        self.query.pagination = Some(Pagination::from_query(self.raw, self.options));
        self
    }

    /// The query composed so far
    pub fn query(&self) -> &ListingQuery {
        &self.query
    }

    pub fn into_query(self) -> ListingQuery {
        self.query
    }

    /// Run the composed query against `store`
    pub async fn exec<S: RecordStore + ?Sized>(self, store: &S) -> Result<Vec<Value>, QueryError> {
        execute(&self.query, store).await
    }

    fn keep_field(&self, field: &str, step: &str) -> bool {
        let known = self.options.is_known_field(field);
        if !known {
            tracing::debug!(field = %field, step = %step, "Dropping field outside the schema");
        }
        known
    }
}

/// Untyped text form of a raw value
fn text_value(value: &RawValue) -> Value {
    match value {
        RawValue::Single(s) => Value::String(s.clone()),
        RawValue::Many(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
        RawValue::Nested(ops) => Value::Object(
            ops.iter()
                .map(|(op, v)| (Operator::parse(op).store_token(), text_value(v)))
                .collect(),
        ),
    }
}

/// Textual items of an `in` operand: repeated values, or one comma-separated value
fn membership_items(value: &RawValue) -> Vec<String> {
    match value {
        RawValue::Single(s) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        other => other.values().into_iter().map(str::to_string).collect(),
    }
}

fn permissive_operand(op: &Operator, value: &RawValue) -> Value {
    if *op == Operator::In {
        Value::Array(membership_items(value).into_iter().map(Value::String).collect())
    } else {
        text_value(value)
    }
}

fn permissive_clause(key: &str, value: &RawValue) -> FilterClause {
    if let RawValue::Nested(ops) = value {
        let ops = ops
            .iter()
            .map(|(token, operand)| {
                let op = Operator::parse(token);
                if !op.is_known() {
                    tracing::debug!(field = %key, operator = %token, "Forwarding unrecognized operator");
                }
                let operand = permissive_operand(&op, operand);
                (op, operand)
            })
            .collect();
        return FilterClause::compare(key, ops);
    }

    match Operator::known(key) {
        Some(op) => FilterClause::equals(op.store_token(), permissive_operand(&op, value)),
        None => FilterClause::equals(key, text_value(value)),
    }
}

fn strict_clause(key: &str, value: &RawValue, options: &QueryOptions) -> Result<FilterClause, QueryError> {
    let rule = options.field_rule(key).ok_or_else(|| QueryError::UnknownField {
        field: key.to_string(),
    })?;

    match value {
        RawValue::Single(text) => Ok(FilterClause::equals(key, coerce(rule, text)?)),
        RawValue::Many(_) => {
            ensure_allowed(rule, &Operator::In)?;
            Ok(FilterClause::compare(key, vec![(Operator::In, typed_list(rule, value)?)]))
        }
        RawValue::Nested(ops) => {
            let mut compared = Vec::with_capacity(ops.len());
            for (token, operand) in ops {
                let op = Operator::known(token).ok_or_else(|| QueryError::UnsupportedOperator {
                    field: key.to_string(),
                    operator: token.clone(),
                })?;
                ensure_allowed(rule, &op)?;

                let operand = if op == Operator::In {
                    typed_list(rule, operand)?
                } else {
                    match operand {
                        RawValue::Single(text) => coerce(rule, text)?,
                        other => {
                            return Err(QueryError::InvalidValue {
                                field: key.to_string(),
                                expected: format!("a single {}", rule.kind.as_str()),
                                value: other.values().join(","),
                            });
                        }
                    }
                };
                compared.push((op, operand));
            }
            Ok(FilterClause::compare(key, compared))
        }
    }
}

fn ensure_allowed(rule: &FieldRule, op: &Operator) -> Result<(), QueryError> {
    if rule.allows(op) {
        Ok(())
    } else {
        Err(QueryError::UnsupportedOperator {
            field: rule.name.clone(),
            operator: op.token().to_string(),
        })
    }
}

fn typed_list(rule: &FieldRule, value: &RawValue) -> Result<Value, QueryError> {
    membership_items(value)
        .iter()
        .map(|item| coerce(rule, item))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

/// Convert query text into the field's declared type
fn coerce(rule: &FieldRule, text: &str) -> Result<Value, QueryError> {
    let invalid = || QueryError::InvalidValue {
        field: rule.name.clone(),
        expected: rule.kind.as_str().to_string(),
        value: text.to_string(),
    };
    let trimmed = text.trim();

    match rule.kind {
        FieldKind::String => Ok(Value::String(text.to_string())),
        FieldKind::Number => {
            if let Ok(int) = trimmed.parse::<i64>() {
                return Ok(Value::from(int));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(invalid)
        }
        FieldKind::Boolean => match trimmed {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(invalid()),
        },
        FieldKind::Date => parse_date(trimmed)
            .map(|date| Value::String(date.to_rfc3339_opts(SecondsFormat::Millis, true)))
            .ok_or_else(invalid),
        FieldKind::ObjectId => {
            let is_hex_id = trimmed.len() == 24 && trimmed.bytes().all(|b| b.is_ascii_hexdigit());
            if is_hex_id || Uuid::parse_str(trimmed).is_ok() {
                Ok(Value::String(trimmed.to_string()))
            } else {
                Err(invalid())
            }
        }
    }
}

/// Read an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC)
pub(crate) fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

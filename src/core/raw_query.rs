//! Normalized query-string map
//!
//! The HTTP layer hands over either decoded `(key, value)` pairs or an already
//! parsed structure. Both are flattened into a [`RawQueryMap`] whose values are
//! a single string, a list of strings, or an operator map produced by bracket
//! syntax (`tuition[gte]=500`).
//!
//! Normalization never fails: anything that cannot be represented is dropped
//! and reported through a `tracing` debug event.

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::LazyLock;

/// Query parameters consumed structurally, never treated as filters
pub const RESERVED_KEYS: [&str; 4] = ["select", "sort", "page", "limit"];

/// A single normalized query-string value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    /// `key=value`
    Single(String),

    /// `key=a&key=b` or `key[]=a&key[]=b`
    Many(Vec<String>),

    /// `key[op]=value`, keyed by the bare operator token
    Nested(IndexMap<String, RawValue>),
}

impl RawValue {
    /// First textual value, if any
    pub fn first(&self) -> Option<&str> {
        match self {
            RawValue::Single(s) => Some(s),
            RawValue::Many(items) => items.first().map(String::as_str),
            RawValue::Nested(_) => None,
        }
    }

    /// All textual values in order
    pub fn values(&self) -> Vec<&str> {
        match self {
            RawValue::Single(s) => vec![s.as_str()],
            RawValue::Many(items) => items.iter().map(String::as_str).collect(),
            RawValue::Nested(_) => Vec::new(),
        }
    }

    pub fn is_nested(&self) -> bool {
        matches!(self, RawValue::Nested(_))
    }

    /// Append a value, promoting `Single` to `Many`.
    ///
    /// Nested values are left untouched.
    fn push(&mut self, value: String) {
        match self {
            RawValue::Single(existing) => {
                let first = std::mem::take(existing);
                *self = RawValue::Many(vec![first, value]);
            }
            RawValue::Many(items) => items.push(value),
            RawValue::Nested(_) => {}
        }
    }
}

/// Shape of a raw query key
enum KeyShape {
    Plain,
    Append(String),
    Operator(String, String),
    Unsupported,
}

/// `field[op]` or `field[]`
static BRACKET_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^\[\]]+)\[([^\[\]]*)\]$").unwrap());

/// `field[a][b]` and deeper
static DEEP_BRACKET_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\[\]]+(?:\[[^\[\]]*\]){2,}$").unwrap());

fn key_shape(key: &str) -> KeyShape {
    if let Some(caps) = BRACKET_KEY.captures(key) {
        let field = caps[1].to_string();
        let op = &caps[2];
        if op.is_empty() {
            KeyShape::Append(field)
        } else {
            KeyShape::Operator(field, op.to_string())
        }
    } else if DEEP_BRACKET_KEY.is_match(key) {
        KeyShape::Unsupported
    } else {
        KeyShape::Plain
    }
}

/// Ordered map from query parameter name to [`RawValue`]
///
/// Keys are case-sensitive and kept in first-seen order, so two identical
/// query strings always produce identical maps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawQueryMap(IndexMap<String, RawValue>);

impl RawQueryMap {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Build a map from decoded query-string pairs
    ///
    /// # Example
    /// ```
    /// use listing::core::raw_query::{RawQueryMap, RawValue};
    ///
    /// let raw = RawQueryMap::from_pairs([("tuition[gte]", "500"), ("sort", "-weeks")]);
    /// assert!(raw.get("tuition").is_some_and(RawValue::is_nested));
    /// assert_eq!(raw.first("sort"), Some("-weeks"));
    /// ```
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = Self::new();
        for (key, value) in pairs {
            map.push_pair(key.into(), value.into());
        }
        map
    }

    /// Build a map from an already-parsed query structure
    ///
    /// Strings, numbers and booleans become `Single`, arrays keep their scalar
    /// items, objects become operator maps (one level deep). Everything else
    /// is dropped. A non-object root yields an empty map.
    pub fn from_json(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::new();
        };

        let mut map = Self::new();
        for (key, value) in obj {
            match json_to_raw(value, true) {
                Some(raw) => {
                    map.0.insert(key.clone(), raw);
                }
                None => {
                    tracing::debug!(key = %key, "Dropping query parameter without a string form");
                }
            }
        }
        map
    }

    fn push_pair(&mut self, key: String, value: String) {
        match key_shape(&key) {
            KeyShape::Plain => self.push_plain(key, value),
            KeyShape::Append(field) => self.push_plain(field, value),
            KeyShape::Operator(field, op) => self.push_operator(field, op, value),
            KeyShape::Unsupported => {
                tracing::debug!(key = %key, "Dropping query parameter with nested brackets");
            }
        }
    }

    fn push_plain(&mut self, key: String, value: String) {
        match self.0.get_mut(&key) {
            None => {
                self.0.insert(key, RawValue::Single(value));
            }
            Some(RawValue::Nested(_)) => {
                tracing::debug!(key = %key, "Operator entries take precedence over a plain value");
            }
            Some(existing) => existing.push(value),
        }
    }

    fn push_operator(&mut self, field: String, op: String, value: String) {
        let entry = self
            .0
            .entry(field)
            .or_insert_with(|| RawValue::Nested(IndexMap::new()));

        if !entry.is_nested() {
            tracing::debug!("Operator entries replace a plain value for the same field");
            *entry = RawValue::Nested(IndexMap::new());
        }

        if let RawValue::Nested(ops) = entry {
            match ops.get_mut(&op) {
                Some(existing) => existing.push(value),
                None => {
                    ops.insert(op, RawValue::Single(value));
                }
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.0.get(key)
    }

    /// First textual value of a parameter
    pub fn first(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(RawValue::first)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: RawValue) -> Option<RawValue> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<RawValue> {
        self.0.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RawValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy of the map without the reserved structural keys
    pub fn without_reserved(&self) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawQueryMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn json_to_raw(value: &Value, allow_nested: bool) -> Option<RawValue> {
    match value {
        Value::Array(items) => {
            let strings: Vec<String> = items.iter().filter_map(scalar_to_string).collect();
            (!strings.is_empty()).then_some(RawValue::Many(strings))
        }
        Value::Object(obj) if allow_nested => {
            let ops: IndexMap<String, RawValue> = obj
                .iter()
                .filter_map(|(op, v)| json_to_raw(v, false).map(|raw| (op.clone(), raw)))
                .collect();
            (!ops.is_empty()).then_some(RawValue::Nested(ops))
        }
        other => scalar_to_string(other).map(RawValue::Single),
    }
}

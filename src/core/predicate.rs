//! Filter predicate model
//!
//! A [`Predicate`] is an ordered list of [`FilterClause`]s, rendered as a flat
//! document where several keys mean an implicit conjunction:
//!
//! ```text
//! { "housing": "true", "tuition": { "$gte": "500", "$lt": "9000" } }
//! ```

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::core::operator::Operator;

/// Condition applied to a single field
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Field equals the value (or contains it, for array fields)
    Equals(Value),

    /// One or more comparisons, all of which must hold
    Compare(Vec<(Operator, Value)>),
}

impl Condition {
    /// Store-native form of the condition
    pub fn to_json(&self) -> Value {
        match self {
            Condition::Equals(value) => value.clone(),
            Condition::Compare(ops) => Value::Object(
                ops.iter()
                    .map(|(op, value)| (op.store_token(), value.clone()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }
}

/// A field paired with its condition
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub field: String,
    pub condition: Condition,
}

impl FilterClause {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            condition: Condition::Equals(value.into()),
        }
    }

    pub fn compare(field: impl Into<String>, ops: Vec<(Operator, Value)>) -> Self {
        Self {
            field: field.into(),
            condition: Condition::Compare(ops),
        }
    }

    /// Whether the clause key is itself an operator (`$gte` at the top level)
    pub fn is_top_level_operator(&self) -> bool {
        self.field.starts_with(crate::core::operator::OPERATOR_SIGIL)
    }
}

/// Conjunction of filter clauses
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    clauses: Vec<FilterClause>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a clause, replacing any clause on the same field in place
    pub fn push(&mut self, clause: FilterClause) {
        match self.clauses.iter_mut().find(|c| c.field == clause.field) {
            Some(existing) => *existing = clause,
            None => self.clauses.push(clause),
        }
    }

    pub fn get(&self, field: &str) -> Option<&FilterClause> {
        self.clauses.iter().find(|c| c.field == field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// An empty predicate matches every record
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Flat document form handed to the store
    pub fn to_document(&self) -> Map<String, Value> {
        self.clauses
            .iter()
            .map(|c| (c.field.clone(), c.condition.to_json()))
            .collect()
    }
}

impl Serialize for Predicate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.clauses.len()))?;
        for clause in &self.clauses {
            map.serialize_entry(&clause.field, &clause.condition.to_json())?;
        }
        map.end()
    }
}

impl FromIterator<FilterClause> for Predicate {
    fn from_iter<I: IntoIterator<Item = FilterClause>>(iter: I) -> Self {
        let mut predicate = Predicate::new();
        for clause in iter {
            predicate.push(clause);
        }
        predicate
    }
}

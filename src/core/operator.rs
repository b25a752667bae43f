//! Comparison operator vocabulary
//!
//! Operators arrive as bare tokens (`gte`) from bracket syntax and leave as
//! sigil-prefixed store operators (`$gte`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker distinguishing store operators from field names
pub const OPERATOR_SIGIL: char = '$';

/// A comparison operator inside a filter clause
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Gte,
    Gt,
    Lte,
    Lt,
    In,
    /// Unrecognized token, forwarded only in permissive mode
    Other(String),
}

impl Operator {
    /// The recognized operators
    pub const KNOWN: [Operator; 5] = [
        Operator::Gte,
        Operator::Gt,
        Operator::Lte,
        Operator::Lt,
        Operator::In,
    ];

    /// Parse a bare token, keeping unknown tokens as [`Operator::Other`]
    pub fn parse(token: &str) -> Self {
        Self::known(token).unwrap_or_else(|| Operator::Other(token.to_string()))
    }

    /// Parse a bare token, returning `None` for anything outside the vocabulary
    pub fn known(token: &str) -> Option<Self> {
        match token {
            "gte" => Some(Operator::Gte),
            "gt" => Some(Operator::Gt),
            "lte" => Some(Operator::Lte),
            "lt" => Some(Operator::Lt),
            "in" => Some(Operator::In),
            _ => None,
        }
    }

    /// Bare token as written in the query string
    pub fn token(&self) -> &str {
        match self {
            Operator::Gte => "gte",
            Operator::Gt => "gt",
            Operator::Lte => "lte",
            Operator::Lt => "lt",
            Operator::In => "in",
            Operator::Other(token) => token,
        }
    }

    /// Sigil-prefixed token handed to the store
    pub fn store_token(&self) -> String {
        format!("{}{}", OPERATOR_SIGIL, self.token())
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Operator::Other(_))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.store_token())
    }
}

impl From<String> for Operator {
    fn from(token: String) -> Self {
        let bare = token.strip_prefix(OPERATOR_SIGIL).unwrap_or(&token);
        Operator::parse(bare)
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.token().to_string()
    }
}

//! Configuration loading and management
//!
//! A [`ListingConfig`] describes every listable resource: its default sort
//! field, page-size bounds, operator policy, filterable fields and the parent
//! resources it can be listed under (`/bootcamps/{id}/courses`).

use crate::core::operator::Operator;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

fn default_sort_field() -> String {
    "createdAt".to_string()
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    10
}

/// How the filter step treats fields and operators it does not know
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorPolicy {
    /// Every non-reserved key is a filter; unknown operators are forwarded
    /// to the store with the sigil prefix. Values stay strings.
    #[default]
    Permissive,

    /// Only fields declared in the [`FilterSchema`] are accepted, only
    /// recognized operators are allowed and values are typed.
    Strict,
}

/// Expected type of a filterable field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    /// RFC 3339 timestamp or `YYYY-MM-DD`
    Date,
    /// Record identifier (24 hex characters or a UUID)
    ObjectId,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Date => "date",
            FieldKind::ObjectId => "object id",
        }
    }
}

/// A field that may appear in filters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    pub name: String,

    pub kind: FieldKind,

    /// Allowed operators; `None` allows the whole vocabulary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operators: Option<Vec<Operator>>,
}

impl FieldRule {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            operators: None,
        }
    }

    pub fn with_operators(mut self, operators: impl IntoIterator<Item = Operator>) -> Self {
        self.operators = Some(operators.into_iter().collect());
        self
    }

    /// Whether `op` may be used on this field
    pub fn allows(&self, op: &Operator) -> bool {
        op.is_known()
            && self
                .operators
                .as_ref()
                .is_none_or(|allowed| allowed.contains(op))
    }
}

/// Allow-list of filterable fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSchema {
    fields: Vec<FieldRule>,
}

impl FilterSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field rule (builder style)
    pub fn field(mut self, rule: FieldRule) -> Self {
        self.fields.retain(|f| f.name != rule.name);
        self.fields.push(rule);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn fields(&self) -> &[FieldRule] {
        &self.fields
    }
}

/// Options driving one listing
///
/// # Example
/// ```
/// use listing::config::QueryOptions;
///
/// let options = QueryOptions::default();
/// assert_eq!(options.default_sort_field, "createdAt");
/// assert_eq!(options.default_limit, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Field sorted newest-first when no `sort` parameter is given
    #[serde(default = "default_sort_field")]
    pub default_sort_field: String,

    #[serde(default = "default_page")]
    pub default_page: usize,

    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Upper bound for `limit`, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_limit: Option<usize>,

    #[serde(default)]
    pub policy: OperatorPolicy,

    /// Filterable fields, required by [`OperatorPolicy::Strict`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<FilterSchema>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            default_sort_field: default_sort_field(),
            default_page: default_page(),
            default_limit: default_limit(),
            max_limit: None,
            policy: OperatorPolicy::Permissive,
            schema: None,
        }
    }
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_sort(mut self, field: impl Into<String>) -> Self {
        self.default_sort_field = field.into();
        self
    }

    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn with_max_limit(mut self, max: usize) -> Self {
        self.max_limit = Some(max);
        self
    }

    /// Switch to strict mode with the given allow-list
    pub fn strict(mut self, schema: FilterSchema) -> Self {
        self.policy = OperatorPolicy::Strict;
        self.schema = Some(schema);
        self
    }

    /// Schema field lookup, `None` when no schema is configured
    pub fn field_rule(&self, name: &str) -> Option<&FieldRule> {
        self.schema.as_ref().and_then(|s| s.get(name))
    }

    /// Whether `name` may be used in projections and sorts
    ///
    /// Always true in permissive mode. Identifiers are always allowed.
    pub fn is_known_field(&self, name: &str) -> bool {
        match self.policy {
            OperatorPolicy::Permissive => true,
            OperatorPolicy::Strict => {
                name == "id" || name == "_id" || self.field_rule(name).is_some()
            }
        }
    }
}

/// Parent resource a listing can be nested under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentScope {
    /// Parent resource name in the route (e.g., "bootcamps")
    pub resource: String,

    /// Field of the child record holding the parent id (e.g., "bootcamp")
    pub field: String,
}

/// Configuration for a listable resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Collection and route name (e.g., "courses")
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<ParentScope>,

    #[serde(flatten)]
    pub options: QueryOptions,
}

impl ResourceConfig {
    pub fn new(name: impl Into<String>, options: QueryOptions) -> Self {
        Self {
            name: name.into(),
            parents: Vec::new(),
            options,
        }
    }

    pub fn nested_under(mut self, resource: impl Into<String>, field: impl Into<String>) -> Self {
        self.parents.push(ParentScope {
            resource: resource.into(),
            field: field.into(),
        });
        self
    }

    /// Scope field used when listing under `parent`
    pub fn parent_field(&self, parent: &str) -> Option<&str> {
        self.parents
            .iter()
            .find(|p| p.resource == parent)
            .map(|p| p.field.as_str())
    }
}

/// Complete configuration for the listing layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingConfig {
    pub resources: Vec<ResourceConfig>,
}

impl ListingConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that resource names are unique and strict resources have a schema
    pub fn validate(&self) -> Result<()> {
        for (i, resource) in self.resources.iter().enumerate() {
            if self.resources[..i].iter().any(|r| r.name == resource.name) {
                return Err(anyhow!("Resource '{}' is declared twice", resource.name));
            }
            if resource.options.policy == OperatorPolicy::Strict && resource.options.schema.is_none() {
                return Err(anyhow!(
                    "Resource '{}' uses the strict policy without a schema",
                    resource.name
                ));
            }
        }
        Ok(())
    }

    /// Find a resource by name
    pub fn resource(&self, name: &str) -> Option<&ResourceConfig> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Bootcamps, courses, reviews and users with strict schemas
    pub fn default_config() -> Self {
        let range = [Operator::Gte, Operator::Gt, Operator::Lte, Operator::Lt];
        let membership = [Operator::In];

        let bootcamps = FilterSchema::new()
            .field(FieldRule::new("name", FieldKind::String))
            .field(FieldRule::new("careers", FieldKind::String).with_operators(membership.clone()))
            .field(FieldRule::new("housing", FieldKind::Boolean))
            .field(FieldRule::new("jobAssistance", FieldKind::Boolean))
            .field(FieldRule::new("jobGuarantee", FieldKind::Boolean))
            .field(FieldRule::new("acceptGi", FieldKind::Boolean))
            .field(FieldRule::new("averageCost", FieldKind::Number).with_operators(range.clone()))
            .field(FieldRule::new("averageRating", FieldKind::Number).with_operators(range.clone()))
            .field(FieldRule::new("user", FieldKind::ObjectId))
            .field(FieldRule::new("createdAt", FieldKind::Date).with_operators(range.clone()));

        let courses = FilterSchema::new()
            .field(FieldRule::new("title", FieldKind::String))
            .field(FieldRule::new("weeks", FieldKind::Number))
            .field(FieldRule::new("tuition", FieldKind::Number))
            .field(FieldRule::new("minimumSkill", FieldKind::String).with_operators(membership))
            .field(FieldRule::new("scholarshipAvailable", FieldKind::Boolean))
            .field(FieldRule::new("bootcamp", FieldKind::ObjectId))
            .field(FieldRule::new("user", FieldKind::ObjectId))
            .field(FieldRule::new("createdAt", FieldKind::Date).with_operators(range.clone()));

        let reviews = FilterSchema::new()
            .field(FieldRule::new("title", FieldKind::String))
            .field(FieldRule::new("rating", FieldKind::Number))
            .field(FieldRule::new("bootcamp", FieldKind::ObjectId))
            .field(FieldRule::new("user", FieldKind::ObjectId))
            .field(FieldRule::new("createdAt", FieldKind::Date).with_operators(range.clone()));

        let users = FilterSchema::new()
            .field(FieldRule::new("name", FieldKind::String))
            .field(FieldRule::new("email", FieldKind::String))
            .field(FieldRule::new("role", FieldKind::String).with_operators([Operator::In]))
            .field(FieldRule::new("createdAt", FieldKind::Date).with_operators(range));

        let options = |schema| QueryOptions::new().with_max_limit(100).strict(schema);

        Self {
            resources: vec![
                ResourceConfig::new("bootcamps", options(bootcamps)),
                ResourceConfig::new("courses", options(courses)).nested_under("bootcamps", "bootcamp"),
                ResourceConfig::new("reviews", options(reviews)).nested_under("bootcamps", "bootcamp"),
                ResourceConfig::new("users", options(users)),
            ],
        }
    }
}

//! Composed listing query and pagination utilities

use serde::Serialize;

use crate::config::QueryOptions;
use crate::core::predicate::Predicate;
use crate::core::raw_query::{RawQueryMap, RawValue};

/// Split comma-separated parameter values into trimmed, non-empty tokens
pub(crate) fn split_tokens(value: &RawValue) -> Vec<String> {
    value
        .values()
        .into_iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether a projection lists the fields to keep or the fields to drop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionMode {
    #[default]
    Include,
    Exclude,
}

/// Fields a listing is restricted to (sparse fieldset)
///
/// `select=title,weeks` keeps only those fields, `select=-password` drops
/// that field and keeps the rest. An empty projection returns every field;
/// record identifiers always survive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Projection {
    fields: Vec<String>,
    mode: ProjectionMode,
}

impl Projection {
    /// Build an inclusion projection, dropping duplicates but keeping first-seen order
    pub fn new(fields: impl IntoIterator<Item = String>) -> Self {
        Self::with_mode(fields, ProjectionMode::Include)
    }

    /// Build an exclusion projection
    pub fn excluding(fields: impl IntoIterator<Item = String>) -> Self {
        Self::with_mode(fields, ProjectionMode::Exclude)
    }

    fn with_mode(fields: impl IntoIterator<Item = String>, mode: ProjectionMode) -> Self {
        let mut unique: Vec<String> = Vec::new();
        for field in fields {
            if !unique.contains(&field) {
                unique.push(field);
            }
        }
        Self {
            fields: unique,
            mode,
        }
    }

    /// Parse `select` tokens: `name` includes, `-name` excludes
    ///
    /// The first token decides the mode. Tokens of the other mode are
    /// dropped, as are exclusions of the identifier.
    ///
    /// # Example
    /// ```
    /// use listing::core::query::{Projection, ProjectionMode};
    ///
    /// let projection = Projection::parse(["-password", "title", "-resetToken"]);
    /// assert_eq!(projection.mode(), ProjectionMode::Exclude);
    /// assert_eq!(projection.fields(), &["password".to_string(), "resetToken".to_string()]);
    /// ```
    pub fn parse<'t>(tokens: impl IntoIterator<Item = &'t str>) -> Self {
        let mut mode = None;
        let mut fields = Vec::new();

        for token in tokens {
            let token = token.trim();
            let (field, token_mode) = match token.strip_prefix('-') {
                Some(rest) => (rest.trim(), ProjectionMode::Exclude),
                None => (token, ProjectionMode::Include),
            };
            if field.is_empty() {
                continue;
            }

            let mode = *mode.get_or_insert(token_mode);
            if token_mode != mode {
                tracing::debug!(field = %field, "Dropping projection field that mixes include and exclude");
                continue;
            }
            if mode == ProjectionMode::Exclude && is_identifier(field) {
                tracing::debug!(field = %field, "Identifiers cannot be excluded");
                continue;
            }
            fields.push(field.to_string());
        }

        Self::with_mode(fields, mode.unwrap_or_default())
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn mode(&self) -> ProjectionMode {
        self.mode
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Whether `field` is part of the projected record
    pub fn keeps(&self, field: &str) -> bool {
        if self.is_empty() || is_identifier(field) {
            return true;
        }
        match self.mode {
            ProjectionMode::Include => self.contains(field),
            ProjectionMode::Exclude => !self.contains(field),
        }
    }

    /// Drop the fields `keep` rejects, keeping the mode
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.fields.retain(|field| keep(field));
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn is_identifier(field: &str) -> bool {
    field == "_id" || field == "id"
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortDirection {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    /// Store convention: `1` ascending, `-1` descending
    pub fn as_i32(&self) -> i32 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }
}

/// One sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }

    /// Parse `name` or `-name`; returns `None` for a bare `-`
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        let (field, direction) = match token.strip_prefix('-') {
            Some(rest) => (rest.trim(), SortDirection::Descending),
            None => (token, SortDirection::Ascending),
        };

        (!field.is_empty()).then(|| Self {
            field: field.to_string(),
            direction,
        })
    }
}

/// Multi-key sort, first key has the highest priority
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    pub fn new(keys: Vec<SortKey>) -> Self {
        Self { keys }
    }

    /// Parse a `sort` value such as `name,-rating`
    ///
    /// # Example
    /// ```
    /// use listing::core::query::{SortKey, SortSpec};
    ///
    /// let sort = SortSpec::parse("name,-rating");
    /// assert_eq!(sort.keys(), &[SortKey::asc("name"), SortKey::desc("rating")]);
    /// ```
    pub fn parse(text: &str) -> Self {
        Self::new(text.split(',').filter_map(SortKey::parse).collect())
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Parse the leading integer of a string
///
/// Accepts optional leading whitespace and sign, then reads digits until the
/// first non-digit (`"12abc"` → 12). Returns `None` when no digit is found.
pub fn parse_leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    let magnitude: i64 = rest[..digits_len].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Offset pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Page number (starts at 1)
    pub page: usize,

    /// Number of items per page (at least 1)
    pub limit: usize,
}

impl Pagination {
    /// Build pagination, clamping both values to a minimum of 1
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    /// Read `page` and `limit` from the query
    ///
    /// Missing, non-numeric, zero or negative values fall back to the
    /// configured defaults; `limit` is capped by `max_limit` when set.
    pub fn from_query(raw: &RawQueryMap, options: &QueryOptions) -> Self {
        let page = positive_param(raw, "page").unwrap_or(options.default_page);
        let mut limit = positive_param(raw, "limit").unwrap_or(options.default_limit);

        if let Some(max) = options.max_limit {
            limit = limit.min(max.max(1));
        }

        Self::new(page, limit)
    }

    /// Number of records skipped before this page
    pub fn skip(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::from_query(&RawQueryMap::new(), &QueryOptions::default())
    }
}

fn positive_param(raw: &RawQueryMap, key: &str) -> Option<usize> {
    raw.first(key)
        .and_then(parse_leading_int)
        .filter(|n| *n >= 1)
        .and_then(|n| usize::try_from(n).ok())
}

/// Fully composed listing query
///
/// Built by [`Filters`](crate::core::filters::Filters) and handed to a
/// [`RecordStore`](crate::core::store::RecordStore). `pagination` is `None`
/// until the paginate step ran, in which case every match is returned.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListingQuery {
    pub predicate: Predicate,
    pub projection: Projection,
    pub sort: SortSpec,
    pub pagination: Option<Pagination>,
}

/// Pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    /// Current page number (starts at 1)
    pub page: usize,

    /// Number of items per page
    pub limit: usize,

    /// Total number of items (after filters)
    pub total: u64,

    /// Total number of pages
    pub total_pages: u64,

    /// Whether there is a next page
    pub has_next: bool,

    /// Whether there is a previous page
    pub has_prev: bool,
}

impl PaginationMeta {
    /// Create pagination metadata from calculation
    pub fn new(page: usize, limit: usize, total: u64) -> Self {
        let Pagination { page, limit } = Pagination::new(page, limit);
        let total_pages = total.div_ceil(limit as u64);
        let end = (page as u64).saturating_mul(limit as u64);

        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: end < total,
            has_prev: page > 1,
        }
    }
}

/// Pagination metadata for `total` matching records
///
/// Uses the same page/limit parsing as the paginate step, so both always
/// agree on what page 1 and the default limit are.
pub fn pagination_meta(total: u64, raw: &RawQueryMap, options: &QueryOptions) -> PaginationMeta {
    let pagination = Pagination::from_query(raw, options);
    PaginationMeta::new(pagination.page, pagination.limit, total)
}

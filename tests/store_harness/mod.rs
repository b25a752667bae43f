//! Shared test harness for record store testing
//!
//! Provides a course catalogue fixture and helpers running the full listing
//! pipeline against any `RecordStore`.
//!
//! # Fixture
//!
//! 15 courses:
//! - `c01`..`c12`: `weeks = i`, `tuition = 400 + 100 * i` (500..=1600)
//! - `x13`..`x15`: `weeks = i`, `tuition` 100..=300 (below every range test)
//! - `bootcamp`: [`BOOTCAMP_EVEN`] for even `i` and the `x` courses,
//!   [`BOOTCAMP_ODD`] otherwise
//! - `minimumSkill`: `i % 3` → advanced / beginner / intermediate
//! - `scholarshipAvailable`: even `i`
//! - `createdAt`: 2024-01-`i`, so `x15` is the newest
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod store_harness;
//! use store_harness::*;
//!
//! record_store_tests!(seeded_store());
//! rest_listing_tests!(seeded_store());
//! ```

#![allow(dead_code)]

#[macro_use]
pub mod record_store_tests;

#[macro_use]
pub mod integration;

use listing::config::QueryOptions;
use listing::core::{
    Filters, PaginationMeta, QueryError, RawQueryMap, RecordStore, count_matching, execute,
    pagination_meta,
};
use serde_json::{Value, json};

pub const BOOTCAMP_EVEN: &str = "5d713995b721c3bb38c1f5d0";
pub const BOOTCAMP_ODD: &str = "5d713a66ec8f2b88b8f830b8";

/// Number of records in [`course_fixtures`]
pub const FIXTURE_COUNT: u64 = 15;

fn skill(i: u32) -> &'static str {
    match i % 3 {
        0 => "advanced",
        1 => "beginner",
        _ => "intermediate",
    }
}

/// The course catalogue described in the module docs
pub fn course_fixtures() -> Vec<Value> {
    (1..=15u32)
        .map(|i| {
            let cheap = i > 12;
            let id = if cheap {
                format!("x{}", i)
            } else {
                format!("c{:02}", i)
            };
            let tuition = if cheap { (i - 12) * 100 } else { 400 + i * 100 };
            let bootcamp = if cheap || i % 2 == 0 {
                BOOTCAMP_EVEN
            } else {
                BOOTCAMP_ODD
            };

            json!({
                "_id": id,
                "title": format!("Course {:02}", i),
                "weeks": i,
                "tuition": tuition,
                "minimumSkill": skill(i),
                "scholarshipAvailable": i % 2 == 0,
                "bootcamp": bootcamp,
                "createdAt": format!("2024-01-{:02}T00:00:00.000Z", i),
            })
        })
        .collect()
}

/// Build query map from literal pairs
pub fn raw(pairs: &[(&str, &str)]) -> RawQueryMap {
    RawQueryMap::from_pairs(pairs.iter().copied())
}

/// Identifiers of the records, in order
pub fn ids(records: &[Value]) -> Vec<String> {
    records
        .iter()
        .map(|r| {
            r.get("_id")
                .or_else(|| r.get("id"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

/// Run filter → select → sort → paginate against `store`
///
/// Returns the page, the filtered total and the pagination metadata.
pub async fn run_listing<S: RecordStore + ?Sized>(
    store: &S,
    pairs: &[(&str, &str)],
    options: &QueryOptions,
) -> Result<(Vec<Value>, PaginationMeta), QueryError> {
    let raw = raw(pairs);
    let query = Filters::new(&raw, options)
        .filter()?
        .select()
        .sort()
        .paginate()
        .into_query();

    let records = execute(&query, store).await?;
    let total = count_matching(&query, store).await?;

    Ok((records, pagination_meta(total, &raw, options)))
}

//! Macro-generated test suite for `RecordStore` contract validation.
//!
//! The `record_store_tests!` macro runs the complete listing pipeline
//! (`Filters` → `execute` / `count_matching` → `pagination_meta`) against a
//! store seeded with [`course_fixtures`](super::course_fixtures).
//!
//! # Generated Tests
//!
//! ## Pipeline
//! - `test_filtered_sorted_second_page` — range filter, descending sort, page 2
//! - `test_defaults_newest_first` — no parameters: newest first, 10 per page
//! - `test_page_beyond_range` — empty page, metadata still reports the total
//!
//! ## Filters
//! - `test_equality_on_number_field` — `weeks=7` against numeric values
//! - `test_boolean_field` — `scholarshipAvailable=true`
//! - `test_in_operator` — comma-separated `in` operand
//! - `test_repeated_values` — `minimumSkill=a&minimumSkill=b`
//! - `test_range_pair` — `gt` and `lte` on the same field
//! - `test_date_range` — `createdAt[gte]` with a bare date
//! - `test_top_level_operator_rejected` — `gte=5` never reaches the records
//! - `test_scope_wins_over_query`
//! - `test_strict_typed_values`
//!
//! ## Projection / Sort
//! - `test_projection_keeps_identifier`
//! - `test_exclusion_projection` — `select=-tuition,-weeks`
//! - `test_multi_key_sort`
//!
//! ## Concurrency
//! - `test_concurrent_pages` — parallel listings from spawned tasks

/// Generate a full `RecordStore` conformance test suite.
///
/// `$factory` must be an expression evaluating to a `RecordStore` seeded with
/// `course_fixtures()`. It is re-evaluated for each test. For the concurrent
/// test the store must also be `'static`.
#[macro_export]
macro_rules! record_store_tests {
    ($factory:expr) => {
        mod record_store_contract_tests {
            use super::*;
            use listing::config::{FieldKind, FieldRule, FilterSchema, QueryOptions};
            use listing::core::{
                Filters, QueryError, StoreError, count_matching, execute,
            };
            use std::collections::HashSet;
            use std::sync::Arc;

            fn options() -> QueryOptions {
                QueryOptions::default()
            }

            // ==================================================================
            // Pipeline
            // ==================================================================

            #[tokio::test]
            async fn test_filtered_sorted_second_page() {
                let store = $factory;
                let (records, meta) = run_listing(
                    &store,
                    &[
                        ("tuition[gte]", "500"),
                        ("sort", "-weeks"),
                        ("page", "2"),
                        ("limit", "5"),
                    ],
                    &options(),
                )
                .await
                .unwrap();

                assert_eq!(ids(&records), vec!["c07", "c06", "c05", "c04", "c03"]);
                assert_eq!(meta.page, 2);
                assert_eq!(meta.limit, 5);
                assert_eq!(meta.total, 12);
                assert_eq!(meta.total_pages, 3);
                assert!(meta.has_next);
                assert!(meta.has_prev);
            }

            #[tokio::test]
            async fn test_defaults_newest_first() {
                let store = $factory;
                let (records, meta) = run_listing(&store, &[], &options()).await.unwrap();

                assert_eq!(records.len(), 10);
                assert_eq!(ids(&records)[..4], ["x15", "x14", "x13", "c12"]);
                assert_eq!(meta.total, FIXTURE_COUNT);
                assert_eq!(meta.total_pages, 2);
            }

            #[tokio::test]
            async fn test_page_beyond_range() {
                let store = $factory;
                let (records, meta) = run_listing(&store, &[("page", "9"), ("limit", "5")], &options())
                    .await
                    .unwrap();

                assert!(records.is_empty());
                assert_eq!(meta.total, FIXTURE_COUNT);
                assert_eq!(meta.total_pages, 3);
                assert!(!meta.has_next);
            }

            // ==================================================================
            // Filters
            // ==================================================================

            #[tokio::test]
            async fn test_equality_on_number_field() {
                let store = $factory;
                let (records, _) = run_listing(&store, &[("weeks", "7")], &options())
                    .await
                    .unwrap();

                assert_eq!(ids(&records), vec!["c07"]);
            }

            #[tokio::test]
            async fn test_boolean_field() {
                let store = $factory;
                let (records, meta) = run_listing(
                    &store,
                    &[("scholarshipAvailable", "true"), ("limit", "20")],
                    &options(),
                )
                .await
                .unwrap();

                assert_eq!(meta.total, 7);
                assert!(records.iter().all(|r| r["scholarshipAvailable"] == true));
            }

            #[tokio::test]
            async fn test_in_operator() {
                let store = $factory;
                let (records, meta) = run_listing(
                    &store,
                    &[("minimumSkill[in]", "beginner,advanced"), ("limit", "20")],
                    &options(),
                )
                .await
                .unwrap();

                assert_eq!(meta.total, 10);
                assert!(records.iter().all(|r| r["minimumSkill"] != "intermediate"));
            }

            #[tokio::test]
            async fn test_repeated_values() {
                let store = $factory;
                let (_, meta) = run_listing(
                    &store,
                    &[("minimumSkill", "beginner"), ("minimumSkill", "advanced")],
                    &options(),
                )
                .await
                .unwrap();

                assert_eq!(meta.total, 10);
            }

            #[tokio::test]
            async fn test_range_pair() {
                let store = $factory;
                let (records, _) = run_listing(
                    &store,
                    &[("tuition[gt]", "700"), ("tuition[lte]", "1000"), ("sort", "weeks")],
                    &options(),
                )
                .await
                .unwrap();

                assert_eq!(ids(&records), vec!["c04", "c05", "c06"]);
            }

            #[tokio::test]
            async fn test_date_range() {
                let store = $factory;
                // the upper bound is 2024-01-12T23:00Z
                let (records, meta) = run_listing(
                    &store,
                    &[
                        ("createdAt[gte]", "2024-01-10"),
                        ("createdAt[lt]", "2024-01-13T00:00:00+01:00"),
                        ("sort", "createdAt"),
                    ],
                    &options(),
                )
                .await
                .unwrap();

                assert_eq!(ids(&records), vec!["c10", "c11", "c12"]);
                assert_eq!(meta.total, 3);
                assert_eq!(records[0]["createdAt"], "2024-01-10T00:00:00.000Z");
            }

            #[tokio::test]
            async fn test_top_level_operator_rejected() {
                let store = $factory;
                let err = run_listing(&store, &[("gte", "5")], &options())
                    .await
                    .unwrap_err();

                assert!(matches!(
                    err,
                    QueryError::Store(StoreError::UnsupportedOperator(_))
                ));
            }

            #[tokio::test]
            async fn test_scope_wins_over_query() {
                let store = $factory;
                let options = options();
                let raw = raw(&[("bootcamp", BOOTCAMP_EVEN), ("limit", "20")]);

                let query = Filters::new(&raw, &options)
                    .scoped("bootcamp", BOOTCAMP_ODD)
                    .filter()
                    .unwrap()
                    .sort()
                    .paginate()
                    .into_query();

                let records = execute(&query, &store).await.unwrap();
                assert_eq!(records.len(), 6);
                assert!(records.iter().all(|r| r["bootcamp"] == BOOTCAMP_ODD));
                assert_eq!(count_matching(&query, &store).await.unwrap(), 6);
            }

            #[tokio::test]
            async fn test_strict_typed_values() {
                let store = $factory;
                let strict = QueryOptions::default().strict(
                    FilterSchema::new()
                        .field(FieldRule::new("weeks", FieldKind::Number))
                        .field(FieldRule::new("tuition", FieldKind::Number)),
                );

                let (_, meta) = run_listing(&store, &[("weeks[gte]", "10")], &strict)
                    .await
                    .unwrap();
                assert_eq!(meta.total, 6);

                let err = run_listing(&store, &[("weeks", "ten")], &strict)
                    .await
                    .unwrap_err();
                assert!(matches!(err, QueryError::InvalidValue { .. }));
            }

            // ==================================================================
            // Projection / Sort
            // ==================================================================

            #[tokio::test]
            async fn test_projection_keeps_identifier() {
                let store = $factory;
                let (records, _) = run_listing(
                    &store,
                    &[("select", "title,weeks"), ("sort", "weeks"), ("limit", "1")],
                    &options(),
                )
                .await
                .unwrap();

                let keys: HashSet<&str> = records[0]
                    .as_object()
                    .unwrap()
                    .keys()
                    .map(String::as_str)
                    .collect();
                assert_eq!(keys, HashSet::from(["_id", "title", "weeks"]));
                assert_eq!(records[0]["title"], "Course 01");
            }

            #[tokio::test]
            async fn test_exclusion_projection() {
                let store = $factory;
                let (records, _) = run_listing(
                    &store,
                    &[("select", "-tuition,-weeks"), ("sort", "title"), ("limit", "1")],
                    &options(),
                )
                .await
                .unwrap();

                let record = records[0].as_object().unwrap();
                assert!(!record.contains_key("tuition"));
                assert!(!record.contains_key("weeks"));
                assert_eq!(record["_id"], "c01");
                assert_eq!(record["title"], "Course 01");
                assert!(record.contains_key("bootcamp"));
            }

            #[tokio::test]
            async fn test_multi_key_sort() {
                let store = $factory;
                let (records, _) = run_listing(
                    &store,
                    &[("sort", "bootcamp,-weeks"), ("limit", "3")],
                    &options(),
                )
                .await
                .unwrap();

                assert_eq!(ids(&records), vec!["x15", "x14", "x13"]);
            }

            // ==================================================================
            // Concurrency
            // ==================================================================

            #[tokio::test]
            async fn test_concurrent_pages() {
                let store = Arc::new($factory);

                let mut handles = vec![];
                for page in 1..=3 {
                    let store = Arc::clone(&store);
                    handles.push(tokio::spawn(async move {
                        let page = page.to_string();
                        run_listing(
                            store.as_ref(),
                            &[("page", page.as_str()), ("limit", "5"), ("sort", "weeks")],
                            &QueryOptions::default(),
                        )
                        .await
                        .unwrap()
                        .0
                    }));
                }

                let mut seen = HashSet::new();
                for handle in handles {
                    for id in ids(&handle.await.unwrap()) {
                        assert!(seen.insert(id), "pages must not overlap");
                    }
                }
                assert_eq!(seen.len() as u64, FIXTURE_COUNT);
            }
        }
    };
}

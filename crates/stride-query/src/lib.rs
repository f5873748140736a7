//! Stride Query - search, filter, sort and aggregate for list views.
//!
//! Every list screen in a sports app (camps, drills, achievements,
//! nutrition logs, forum topics) does the same thing: take an in-memory
//! collection, narrow it with a search box and a row of filter chips, order
//! it by the sort menu choice, and show a few stat cards on top. This crate
//! is that pipeline, once, for any record type:
//!
//! - Case-insensitive substring search across configured text fields
//! - Category chip with an `"all"` sentinel, plus declared extra filters
//!   (equality, set membership, numeric range, boolean flag)
//! - Named, stable sorts (recent, popular, alphabetical, custom)
//! - Aggregates that never divide by zero: count, sum, average, max, min,
//!   conditional count, percentage, progress
//! - Offset/limit windowing that keeps the full match count
//!
//! # Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use stride_query::{AggregateSpecs, Comparators, Dir, FieldConfig, Query, QueryEngine};
//!
//! let camps = vec![
//!     json!({ "id": 1, "title": "Elite Football Academy", "sport": "football", "rating": 4.8, "likes": 12 }),
//!     json!({ "id": 2, "title": "Splash Swimming Center", "sport": "swimming", "rating": 4.6, "likes": 30 }),
//!     json!({ "id": 3, "title": "Saturday Football Club", "sport": "football", "rating": 4.2, "likes": 4 }),
//! ];
//!
//! let engine = QueryEngine::new(
//!     FieldConfig::new()
//!         .search_fields(&["title"])
//!         .category_field("sport"),
//! )
//! .comparators(Comparators::new().field("rating_desc", "rating", Dir::Desc))
//! .aggregates(AggregateSpecs::new().count("total").average("averageRating", "rating"));
//!
//! let query = Query::new().search("FOOT").category("football").sort("rating_desc");
//! let bundle = engine.run(&camps, &query).unwrap();
//!
//! assert_eq!(bundle.total_count, 2);
//! assert_eq!(bundle.items[0]["id"], 1);
//! assert_eq!(bundle.aggregates.value("total"), 2.0);
//! assert!((bundle.aggregates.value("averageRating") - 4.5).abs() < 1e-9);
//! ```
//!
//! # Query Semantics
//!
//! ```text
//! match = text matches any search field (or search text is blank)
//!       ∧ category field equals the chip (or chip is "all")
//!       ∧ every active extra filter accepts the record
//! ```
//!
//! - Filtering preserves input order; sorting is stable.
//! - Aggregates are computed over every match before offset/limit, or over
//!   the whole collection with [`AggregateScope::Collection`].
//! - A record missing a field never matches an active filter on it, sorts
//!   after records that have it, and is skipped by numeric statistics.
//! - Queries referencing fields the records never expose fail with
//!   [`QueryError::UnknownField`] instead of silently matching nothing.
//!
//! # Records
//!
//! Anything implementing [`Record`] can be queried. JSON objects
//! (`serde_json::Value`) work out of the box; structs usually derive it with
//! `#[derive(Record)]` from `stride-macros`.

mod aggregate;
mod config;
mod engine;
mod error;
mod matcher;
mod ordering;
mod predicate;
mod query;
mod record;
mod sort;
mod value;

// Re-export public API
pub use aggregate::{aggregate, ratio, AggregateSpecs, Aggregates, RecordPredicate, Reducer};
pub use config::{
    validate_fields, AggregateDef, Condition, FieldConfig, FilterDef, FilterKind, ProgressDef,
    Scalar, SortDef, ViewConfig,
};
pub use engine::{run_query, QueryEngine, ResultBundle};
pub use error::{ConfigError, QueryError, Result};
pub use matcher::{matches, TextMatcher};
pub use ordering::{compare_by_orderings, compare_values, Dir, OrderBy};
pub use predicate::{build_predicate, Predicate};
pub use query::{AggregateScope, CategoryFilter, FilterValue, Query, ALL};
pub use record::Record;
pub use sort::{compare_field, keys, sort, CompareFn, Comparators};
pub use value::{Number, RecordTimestamp, Timestamp, Value};

//! Proc macros for Stride.
//!
//! - [`Record`] - Expose struct fields to `stride-query` searches, filters,
//!   sorts and aggregates
//!
//! For working examples, see `stride-query/tests/record_derive.rs`.

mod record;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives the `Record` trait for query-enabled structs.
///
/// Only annotated fields are exposed; everything else stays invisible to
/// queries.
///
/// # Field Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `text` | Text field (`AsRef<str>`): search, category and equality filters, text sorts |
/// | `number` | Numeric field (`Copy` into `Number`): range filters, numeric sorts, statistics |
/// | `timestamp` | Date field (requires `RecordTimestamp`): recency sorts |
/// | `flag` | `bool` field: flag filters and conditional statistics |
/// | `skip` | Exclude this field |
/// | `rename = "..."` | Use a custom name in queries and configuration |
///
/// `Option<T>` fields are supported for every type; `None` reads as a
/// missing value.
///
/// # Generated Code
///
/// 1. Field name constants (e.g., `Camp::TITLE`, `Camp::AGE_GROUP`)
/// 2. A `FIELDS` slice of every exposed name
/// 3. Implementation of `Record::field_value()` and `Record::field_names()`
///
/// # Example
///
/// ```ignore
/// use stride_macros::Record;
/// use stride_query::{FieldConfig, Query, QueryEngine};
///
/// #[derive(Record)]
/// struct Camp {
///     #[record(text)]
///     title: String,
///
///     #[record(text, rename = "ageGroup")]
///     age_group: String,
///
///     #[record(number)]
///     rating: Option<f64>,
///
///     #[record(flag)]
///     featured: bool,
///
///     #[record(skip)]
///     internal_notes: String,
/// }
///
/// let engine = QueryEngine::new(
///     FieldConfig::new()
///         .search_fields(&[Camp::TITLE])
///         .equals_filter("age_group", Camp::AGE_GROUP),
/// );
/// let results = engine.run(&camps, &Query::new().filter_eq("age_group", "U12"))?;
/// ```
#[proc_macro_derive(Record, attributes(record))]
pub fn record_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::record_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

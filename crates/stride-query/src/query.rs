//! The query value object.
//!
//! A [`Query`] captures what the user asked for on one interaction: the text
//! in the search box, the selected category chip, any extra filter chips, and
//! the sort menu choice. It is built fresh per keystroke or tap and holds no
//! reference to the data it will run against.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Sentinel accepted wherever a filter value can mean "no filtering".
pub const ALL: &str = "all";

/// Category chip selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryFilter {
    /// Every category (the "all" chip, or nothing selected).
    #[default]
    All,
    /// A single category value, compared exactly.
    Only(String),
}

impl CategoryFilter {
    /// Parses chip input; `"all"` and the empty string mean [`CategoryFilter::All`].
    pub fn parse(value: &str) -> Self {
        if is_all_sentinel(value) {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(value.to_string())
        }
    }

    /// Returns `true` for [`CategoryFilter::All`].
    pub fn is_all(&self) -> bool {
        matches!(self, CategoryFilter::All)
    }
}

impl From<&str> for CategoryFilter {
    fn from(value: &str) -> Self {
        CategoryFilter::parse(value)
    }
}

impl From<String> for CategoryFilter {
    fn from(value: String) -> Self {
        CategoryFilter::parse(&value)
    }
}

impl From<CategoryFilter> for String {
    fn from(value: CategoryFilter) -> Self {
        match value {
            CategoryFilter::All => ALL.to_string(),
            CategoryFilter::Only(v) => v,
        }
    }
}

/// Value selected for an extra filter dimension (age group, price, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterValue {
    /// No filtering on this dimension.
    Any,
    /// Field equals the value.
    Equals(String),
    /// Field equals one of the values.
    OneOf(Vec<String>),
    /// Field lies within the inclusive bounds; a missing bound is open.
    Range { min: Option<f64>, max: Option<f64> },
    /// Boolean field equals the flag.
    Flag(bool),
}

impl FilterValue {
    /// Equality value from chip input, mapping the "all" sentinel to [`FilterValue::Any`].
    pub fn equals(value: impl Into<String>) -> Self {
        let value = value.into();
        if is_all_sentinel(&value) {
            FilterValue::Any
        } else {
            FilterValue::Equals(value)
        }
    }

    /// Inclusive range with optional bounds.
    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        FilterValue::Range { min, max }
    }

    /// Returns `true` if this value filters nothing out.
    pub fn is_any(&self) -> bool {
        match self {
            FilterValue::Any => true,
            FilterValue::OneOf(values) => values.is_empty(),
            FilterValue::Range { min, max } => min.is_none() && max.is_none(),
            _ => false,
        }
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            FilterValue::Any => "any",
            FilterValue::Equals(_) => "equals",
            FilterValue::OneOf(_) => "one-of",
            FilterValue::Range { .. } => "range",
            FilterValue::Flag(_) => "flag",
        }
    }
}

/// Which records aggregates are computed over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateScope {
    /// Only records that passed the filters.
    #[default]
    Filtered,
    /// The whole input collection (header counts shown before filtering).
    Collection,
}

/// A search, filter and sort request against a record collection.
///
/// # Example
///
/// ```
/// use stride_query::{CategoryFilter, Query};
///
/// let query = Query::new()
///     .search("football")
///     .category("all")
///     .filter_eq("age_group", "U12")
///     .sort("rating_desc")
///     .limit(10)
///     .build();
///
/// assert_eq!(query.search_text(), "football");
/// assert_eq!(query.category_filter(), &CategoryFilter::All);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    search_text: String,
    category: CategoryFilter,
    filters: BTreeMap<String, FilterValue>,
    sort_key: Option<String>,
    aggregate_scope: AggregateScope,
    offset: Option<usize>,
    limit: Option<usize>,
}

impl Query {
    /// Creates an empty query, which matches every record.
    pub fn new() -> Self {
        Query::default()
    }

    // ========================================================================
    // Builders
    // ========================================================================

    /// Sets the raw search-box text.
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    /// Selects a category chip.
    pub fn category(mut self, category: impl Into<CategoryFilter>) -> Self {
        self.category = category.into();
        self
    }

    /// Sets the value of an extra filter declared in the field configuration.
    pub fn filter(mut self, name: &str, value: FilterValue) -> Self {
        self.filters.insert(name.to_string(), value);
        self
    }

    /// Shorthand for an equality filter (`"all"` clears it).
    pub fn filter_eq(self, name: &str, value: impl Into<String>) -> Self {
        self.filter(name, FilterValue::equals(value))
    }

    /// Shorthand for a membership filter.
    pub fn filter_in<I, S>(self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.filter(name, FilterValue::OneOf(values))
    }

    /// Shorthand for an inclusive range filter.
    pub fn filter_range(self, name: &str, min: Option<f64>, max: Option<f64>) -> Self {
        self.filter(name, FilterValue::range(min, max))
    }

    /// Shorthand for a boolean filter.
    pub fn filter_flag(self, name: &str, flag: bool) -> Self {
        self.filter(name, FilterValue::Flag(flag))
    }

    /// Selects a sort key from the comparator table.
    pub fn sort(mut self, key: impl Into<String>) -> Self {
        self.sort_key = Some(key.into());
        self
    }

    /// Computes aggregates over the whole collection instead of the matches.
    pub fn collection_stats(mut self) -> Self {
        self.aggregate_scope = AggregateScope::Collection;
        self
    }

    /// Sets the aggregate scope.
    pub fn aggregate_scope(mut self, scope: AggregateScope) -> Self {
        self.aggregate_scope = scope;
        self
    }

    /// Skips the first `n` sorted matches in `items`.
    pub fn offset(mut self, n: usize) -> Self {
        self.offset = Some(n);
        self
    }

    /// Caps the number of returned `items`.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Finalizes the query.
    pub fn build(self) -> Self {
        self
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// The raw search text.
    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// The category selection.
    pub fn category_filter(&self) -> &CategoryFilter {
        &self.category
    }

    /// Extra filter values by name.
    pub fn filters(&self) -> &BTreeMap<String, FilterValue> {
        &self.filters
    }

    /// The selected sort key, if any.
    pub fn sort_key(&self) -> Option<&str> {
        self.sort_key.as_deref()
    }

    /// Where aggregates are computed.
    pub fn get_aggregate_scope(&self) -> AggregateScope {
        self.aggregate_scope
    }

    /// Returns the offset, if set.
    pub fn get_offset(&self) -> Option<usize> {
        self.offset
    }

    /// Returns the limit, if set.
    pub fn get_limit(&self) -> Option<usize> {
        self.limit
    }

    /// Returns `true` if this query filters nothing out.
    pub fn is_empty(&self) -> bool {
        self.search_text.trim().is_empty()
            && self.category.is_all()
            && self.filters.values().all(FilterValue::is_any)
    }
}

fn is_all_sentinel(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case(ALL)
}

//! Query execution.
//!
//! [`run_query`] sequences the pieces: validate the field configuration,
//! compose the predicate, filter, sort, aggregate, window. Each call is
//! independent; nothing is cached between calls, so it is safe to run on
//! every keystroke.

use serde::Serialize;

use crate::aggregate::{aggregate, AggregateSpecs, Aggregates};
use crate::config::{FieldConfig, ViewConfig};
use crate::error::Result;
use crate::predicate::build_predicate;
use crate::query::{AggregateScope, Query};
use crate::record::Record;
use crate::sort::Comparators;

/// The outcome of running a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultBundle<'a, T> {
    /// Matching records in display order, after offset/limit.
    pub items: Vec<&'a T>,
    /// Number of matching records, before offset/limit.
    pub total_count: usize,
    /// Requested statistics.
    pub aggregates: Aggregates,
}

impl<'a, T> ResultBundle<'a, T> {
    /// Returns `true` if nothing matched ("No results found").
    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    /// Clones the displayed records.
    pub fn cloned_items(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.items.iter().map(|item| (*item).clone()).collect()
    }
}

/// Runs `query` against `records`.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use stride_query::{run_query, AggregateSpecs, Comparators, Dir, FieldConfig, Query};
///
/// let camps = vec![
///     json!({ "id": 1, "title": "Elite Football Academy", "category": "football", "rating": 4.8 }),
///     json!({ "id": 2, "title": "Splash Swimming Center", "category": "swimming", "rating": 4.6 }),
/// ];
///
/// let config = FieldConfig::new().search_fields(&["title"]).category_field("category");
/// let comparators = Comparators::new().field("rating_desc", "rating", Dir::Desc);
/// let specs = AggregateSpecs::new().average("averageRating", "rating");
///
/// let query = Query::new().category("football").sort("rating_desc");
/// let bundle = run_query(&camps, &query, &config, &comparators, &specs).unwrap();
///
/// assert_eq!(bundle.total_count, 1);
/// assert_eq!(bundle.items[0]["id"], 1);
/// assert_eq!(bundle.aggregates.value("averageRating"), 4.8);
/// ```
pub fn run_query<'a, T: Record>(
    records: &'a [T],
    query: &Query,
    config: &FieldConfig,
    comparators: &Comparators<T>,
    specs: &AggregateSpecs<T>,
) -> Result<ResultBundle<'a, T>> {
    config.validate(records)?;
    let predicate = build_predicate(query, config)?;

    let mut items: Vec<&'a T> = records.iter().filter(|r| predicate.test(*r)).collect();
    if let Some(key) = query.sort_key() {
        comparators.sort_refs(key, &mut items)?;
    }

    let aggregates = match query.get_aggregate_scope() {
        AggregateScope::Filtered => aggregate(items.iter().copied(), specs),
        AggregateScope::Collection => aggregate(records, specs),
    };

    let total_count = items.len();
    let offset = query.get_offset().unwrap_or(0);
    if offset > 0 {
        items.drain(..offset.min(items.len()));
    }
    if let Some(limit) = query.get_limit() {
        items.truncate(limit);
    }

    tracing::debug!(
        records = records.len(),
        matched = total_count,
        returned = items.len(),
        sort = query.sort_key().unwrap_or("-"),
        filters = predicate.active_filters(),
        "query executed"
    );

    Ok(ResultBundle {
        items,
        total_count,
        aggregates,
    })
}

/// A list screen's reusable query setup.
///
/// Bundles the field configuration, sort menu and statistics once so that
/// each interaction only supplies a fresh [`Query`].
///
/// ```
/// use serde_json::{json, Value};
/// use stride_query::{FieldConfig, Query, QueryEngine};
///
/// let engine: QueryEngine<Value> = QueryEngine::new(FieldConfig::new().search_fields(&["title"]))
///     .with_comparators(|c| c.text("az", "title", stride_query::Dir::Asc))
///     .with_aggregates(|a| a.count("shown"));
///
/// let topics = vec![json!({ "title": "Taper week" }), json!({ "title": "Ankle taping" })];
/// let bundle = engine.run(&topics, &Query::new().search("tap").sort("az")).unwrap();
/// assert_eq!(bundle.items[0]["title"], "Ankle taping");
/// assert_eq!(bundle.aggregates.value("shown"), 2.0);
/// ```
#[derive(Debug)]
pub struct QueryEngine<T> {
    config: FieldConfig,
    comparators: Comparators<T>,
    specs: AggregateSpecs<T>,
}

impl<T: Record + 'static> QueryEngine<T> {
    /// Creates an engine with no sort keys and no statistics.
    pub fn new(config: FieldConfig) -> Self {
        QueryEngine {
            config,
            comparators: Comparators::new(),
            specs: AggregateSpecs::new(),
        }
    }

    /// Creates an engine from a declarative view configuration.
    pub fn from_view(view: &ViewConfig) -> Self {
        QueryEngine {
            config: view.fields.clone(),
            comparators: view.comparators(),
            specs: view.aggregate_specs(),
        }
    }

    /// Replaces the sort menu.
    pub fn comparators(mut self, comparators: Comparators<T>) -> Self {
        self.comparators = comparators;
        self
    }

    /// Extends the sort menu.
    pub fn with_comparators(mut self, f: impl FnOnce(Comparators<T>) -> Comparators<T>) -> Self {
        self.comparators = f(self.comparators);
        self
    }

    /// Replaces the statistics.
    pub fn aggregates(mut self, specs: AggregateSpecs<T>) -> Self {
        self.specs = specs;
        self
    }

    /// Extends the statistics.
    pub fn with_aggregates(mut self, f: impl FnOnce(AggregateSpecs<T>) -> AggregateSpecs<T>) -> Self {
        self.specs = f(self.specs);
        self
    }
}

impl<T: Record> QueryEngine<T> {
    /// The field configuration.
    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// The sort keys this engine offers.
    pub fn sort_keys(&self) -> impl Iterator<Item = &str> {
        self.comparators.keys()
    }

    /// Runs `query` against `records`. See [`run_query`].
    pub fn run<'a>(&self, records: &'a [T], query: &Query) -> Result<ResultBundle<'a, T>> {
        run_query(records, query, &self.config, &self.comparators, &self.specs)
    }
}

//! Summary statistics for stat cards and progress bars.
//!
//! An [`AggregateSpecs`] table names the statistics a screen displays
//! ("total", "averageRating", "completion"...) and how to compute each one.
//! [`aggregate`] runs the whole table in one pass over a record set.
//!
//! Every reducer is total: empty sets, missing fields and zero denominators
//! produce `0.0`, never NaN, infinity or an error.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::Record;

/// A boxed record predicate.
pub type RecordPredicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// How a single statistic is computed.
pub enum Reducer<T> {
    /// Number of records.
    Count,
    /// Number of records satisfying the predicate.
    CountWhere(RecordPredicate<T>),
    /// Sum of a numeric field.
    Sum(String),
    /// Mean of a numeric field over records that have it.
    Average(String),
    /// Largest value of a numeric field.
    Max(String),
    /// Smallest value of a numeric field.
    Min(String),
    /// Fraction of records satisfying the predicate, in `[0, 1]`.
    PercentWhere(RecordPredicate<T>),
    /// `sum(completed) / sum(target)`, clamped to `[0, 1]`.
    Progress { completed: String, target: String },
}

impl<T> Reducer<T> {
    /// Sum of `field`.
    pub fn sum(field: impl Into<String>) -> Self {
        Reducer::Sum(field.into())
    }

    /// Mean of `field`.
    pub fn average(field: impl Into<String>) -> Self {
        Reducer::Average(field.into())
    }

    /// Maximum of `field`.
    pub fn max(field: impl Into<String>) -> Self {
        Reducer::Max(field.into())
    }

    /// Minimum of `field`.
    pub fn min(field: impl Into<String>) -> Self {
        Reducer::Min(field.into())
    }

    /// Completed-over-target progress.
    pub fn progress(completed: impl Into<String>, target: impl Into<String>) -> Self {
        Reducer::Progress {
            completed: completed.into(),
            target: target.into(),
        }
    }

    /// Count of records matching `predicate`.
    pub fn count_where<F>(predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Reducer::CountWhere(Box::new(predicate))
    }

    /// Fraction of records matching `predicate`.
    pub fn percent_where<F>(predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Reducer::PercentWhere(Box::new(predicate))
    }

    fn fields(&self) -> Vec<&str> {
        match self {
            Reducer::Sum(f) | Reducer::Average(f) | Reducer::Max(f) | Reducer::Min(f) => {
                vec![f.as_str()]
            }
            Reducer::Progress { completed, target } => vec![completed.as_str(), target.as_str()],
            _ => Vec::new(),
        }
    }
}

impl<T> fmt::Debug for Reducer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reducer::Count => write!(f, "Count"),
            Reducer::CountWhere(_) => write!(f, "CountWhere(..)"),
            Reducer::Sum(field) => write!(f, "Sum({})", field),
            Reducer::Average(field) => write!(f, "Average({})", field),
            Reducer::Max(field) => write!(f, "Max({})", field),
            Reducer::Min(field) => write!(f, "Min({})", field),
            Reducer::PercentWhere(_) => write!(f, "PercentWhere(..)"),
            Reducer::Progress { completed, target } => {
                write!(f, "Progress({} / {})", completed, target)
            }
        }
    }
}

/// Named table of statistics to compute.
///
/// ```
/// use serde_json::json;
/// use stride_query::{aggregate, AggregateSpecs};
///
/// let goals = vec![
///     json!({ "title": "Run 5k", "done": true, "current": 5, "target": 5 }),
///     json!({ "title": "100 push-ups", "done": false, "current": 40, "target": 100 }),
/// ];
///
/// let specs = AggregateSpecs::new()
///     .count("total")
///     .percent_where("completion", |g: &serde_json::Value| g["done"] == true)
///     .progress("overall", "current", "target");
///
/// let stats = aggregate(&goals, &specs);
/// assert_eq!(stats.value("total"), 2.0);
/// assert_eq!(stats.value("completion"), 0.5);
/// assert_eq!(stats.value("overall"), 45.0 / 105.0);
/// ```
pub struct AggregateSpecs<T> {
    specs: BTreeMap<String, Reducer<T>>,
}

impl<T> Default for AggregateSpecs<T> {
    fn default() -> Self {
        AggregateSpecs {
            specs: BTreeMap::new(),
        }
    }
}

impl<T> fmt::Debug for AggregateSpecs<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.specs.iter()).finish()
    }
}

impl<T> AggregateSpecs<T> {
    /// Creates an empty table.
    pub fn new() -> Self {
        AggregateSpecs::default()
    }

    /// Adds (or replaces) a statistic.
    pub fn with(mut self, name: &str, reducer: Reducer<T>) -> Self {
        self.specs.insert(name.to_string(), reducer);
        self
    }

    /// Adds a record count.
    pub fn count(self, name: &str) -> Self {
        self.with(name, Reducer::Count)
    }

    /// Adds a conditional count.
    pub fn count_where<F>(self, name: &str, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.with(name, Reducer::count_where(predicate))
    }

    /// Adds a field sum.
    pub fn sum(self, name: &str, field: &str) -> Self {
        self.with(name, Reducer::sum(field))
    }

    /// Adds a field average.
    pub fn average(self, name: &str, field: &str) -> Self {
        self.with(name, Reducer::average(field))
    }

    /// Adds a field maximum.
    pub fn max(self, name: &str, field: &str) -> Self {
        self.with(name, Reducer::max(field))
    }

    /// Adds a field minimum.
    pub fn min(self, name: &str, field: &str) -> Self {
        self.with(name, Reducer::min(field))
    }

    /// Adds a matching-fraction statistic.
    pub fn percent_where<F>(self, name: &str, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.with(name, Reducer::percent_where(predicate))
    }

    /// Adds a completed-over-target statistic.
    pub fn progress(self, name: &str, completed: &str, target: &str) -> Self {
        self.with(name, Reducer::progress(completed, target))
    }

    /// Iterates over `(name, reducer)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Reducer<T>)> {
        self.specs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Fields read by field-based reducers, with the statistic name.
    pub fn referenced_fields(&self) -> Vec<(&str, &str)> {
        self.specs
            .iter()
            .flat_map(|(name, r)| r.fields().into_iter().map(move |f| (name.as_str(), f)))
            .collect()
    }

    /// Number of statistics.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Returns `true` if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

/// Computed statistics by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Aggregates(BTreeMap<String, f64>);

impl Aggregates {
    /// The value of a statistic, if it was requested.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// The value of a statistic, `0.0` if it was not requested.
    pub fn value(&self, name: &str) -> f64 {
        self.get(name).unwrap_or(0.0)
    }

    /// Iterates over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of statistics.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no statistic was computed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the wrapper.
    pub fn into_inner(self) -> BTreeMap<String, f64> {
        self.0
    }
}

/// `completed / total`, clamped to `[0, 1]`.
///
/// A zero, negative or non-finite `total` (an unset goal target) yields `0`.
///
/// ```
/// use stride_query::ratio;
///
/// assert_eq!(ratio(3.0, 4.0), 0.75);
/// assert_eq!(ratio(12.0, 10.0), 1.0);
/// assert_eq!(ratio(5.0, 0.0), 0.0);
/// ```
pub fn ratio(completed: f64, total: f64) -> f64 {
    if !total.is_finite() || total <= 0.0 || !completed.is_finite() {
        return 0.0;
    }
    (completed / total).clamp(0.0, 1.0)
}

enum Accumulator {
    Count(usize),
    Sum(f64),
    Average { sum: f64, seen: usize },
    Max(Option<f64>),
    Min(Option<f64>),
    Fraction { hits: usize, total: usize },
    Progress { completed: f64, target: f64 },
}

impl Accumulator {
    fn for_reducer<T>(reducer: &Reducer<T>) -> Self {
        match reducer {
            Reducer::Count | Reducer::CountWhere(_) => Accumulator::Count(0),
            Reducer::Sum(_) => Accumulator::Sum(0.0),
            Reducer::Average(_) => Accumulator::Average { sum: 0.0, seen: 0 },
            Reducer::Max(_) => Accumulator::Max(None),
            Reducer::Min(_) => Accumulator::Min(None),
            Reducer::PercentWhere(_) => Accumulator::Fraction { hits: 0, total: 0 },
            Reducer::Progress { .. } => Accumulator::Progress {
                completed: 0.0,
                target: 0.0,
            },
        }
    }

    fn feed<T: Record>(&mut self, reducer: &Reducer<T>, record: &T) {
        let number = |field: &str| record.field_value(field).as_f64();
        match (self, reducer) {
            (Accumulator::Count(n), Reducer::Count) => *n += 1,
            (Accumulator::Count(n), Reducer::CountWhere(p)) => {
                if p(record) {
                    *n += 1;
                }
            }
            (Accumulator::Sum(sum), Reducer::Sum(field)) => *sum += number(field).unwrap_or(0.0),
            (Accumulator::Average { sum, seen }, Reducer::Average(field)) => {
                if let Some(v) = number(field) {
                    *sum += v;
                    *seen += 1;
                }
            }
            (Accumulator::Max(best), Reducer::Max(field)) => {
                if let Some(v) = number(field) {
                    *best = Some(best.map_or(v, |b| b.max(v)));
                }
            }
            (Accumulator::Min(best), Reducer::Min(field)) => {
                if let Some(v) = number(field) {
                    *best = Some(best.map_or(v, |b| b.min(v)));
                }
            }
            (Accumulator::Fraction { hits, total }, Reducer::PercentWhere(p)) => {
                *total += 1;
                if p(record) {
                    *hits += 1;
                }
            }
            (
                Accumulator::Progress {
                    completed: done,
                    target: goal,
                },
                Reducer::Progress { completed, target },
            ) => {
                *done += number(completed).unwrap_or(0.0);
                *goal += number(target).unwrap_or(0.0);
            }
            _ => {}
        }
    }

    fn finish(self) -> f64 {
        let value = match self {
            Accumulator::Count(n) => n as f64,
            Accumulator::Sum(sum) => sum,
            Accumulator::Average { sum, seen } => {
                if seen == 0 {
                    0.0
                } else {
                    sum / seen as f64
                }
            }
            Accumulator::Max(v) | Accumulator::Min(v) => v.unwrap_or(0.0),
            Accumulator::Fraction { hits, total } => ratio(hits as f64, total as f64),
            Accumulator::Progress { completed, target } => ratio(completed, target),
        };
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }
}

/// Computes every statistic in `specs` over `records` in a single pass.
pub fn aggregate<'a, T, I>(records: I, specs: &AggregateSpecs<T>) -> Aggregates
where
    T: Record + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut accumulators: Vec<(&str, &Reducer<T>, Accumulator)> = specs
        .iter()
        .map(|(name, reducer)| (name, reducer, Accumulator::for_reducer(reducer)))
        .collect();

    for record in records {
        for (_, reducer, acc) in accumulators.iter_mut() {
            acc.feed(reducer, record);
        }
    }

    Aggregates(
        accumulators
            .into_iter()
            .map(|(name, _, acc)| (name.to_string(), acc.finish()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value as Json};

    fn meals() -> Vec<Json> {
        vec![
            json!({ "name": "Oats", "calories": 350, "protein": 12.5, "logged": true }),
            json!({ "name": "Chicken bowl", "calories": 620, "protein": 45.0, "logged": true }),
            json!({ "name": "Shake", "calories": 280, "logged": false }),
        ]
    }

    fn full_specs() -> AggregateSpecs<Json> {
        AggregateSpecs::new()
            .count("count")
            .count_where("logged", |m: &Json| m["logged"] == true)
            .sum("calories", "calories")
            .average("avgProtein", "protein")
            .max("maxCalories", "calories")
            .min("minCalories", "calories")
            .percent_where("loggedShare", |m: &Json| m["logged"] == true)
            .progress("proteinGoal", "protein", "proteinTarget")
    }

    #[test]
    fn computes_every_reducer() {
        let stats = aggregate(&meals(), &full_specs());

        assert_eq!(stats.value("count"), 3.0);
        assert_eq!(stats.value("logged"), 2.0);
        assert_eq!(stats.value("calories"), 1250.0);
        // Average only over records that carry the field.
        assert_eq!(stats.value("avgProtein"), 28.75);
        assert_eq!(stats.value("maxCalories"), 620.0);
        assert_eq!(stats.value("minCalories"), 280.0);
        assert_eq!(stats.value("loggedShare"), 2.0 / 3.0);
        // No record has a target: zero denominator.
        assert_eq!(stats.value("proteinGoal"), 0.0);
    }

    #[test]
    fn empty_set_is_all_zeros() {
        let stats = aggregate(&Vec::<Json>::new(), &full_specs());
        assert_eq!(stats.len(), 8);
        assert!(stats.iter().all(|(_, v)| v == 0.0));
    }

    #[test]
    fn zero_denominator_percentage() {
        let specs = AggregateSpecs::new().percent_where("percentage", |x: &Json| x["done"] == true);
        let stats = aggregate(&Vec::<Json>::new(), &specs);
        assert_eq!(stats.get("percentage"), Some(0.0));
    }

    #[test]
    fn progress_is_clamped() {
        let goals = vec![json!({ "current": 130, "target": 100 })];
        let specs = AggregateSpecs::new().progress("p", "current", "target");
        assert_eq!(aggregate(&goals, &specs).value("p"), 1.0);

        let goals = vec![json!({ "current": -5, "target": 100 })];
        assert_eq!(aggregate(&goals, &specs).value("p"), 0.0);
    }

    #[test]
    fn ratio_edge_cases() {
        assert_eq!(ratio(1.0, 2.0), 0.5);
        assert_eq!(ratio(0.0, 0.0), 0.0);
        assert_eq!(ratio(1.0, -2.0), 0.0);
        assert_eq!(ratio(1.0, f64::NAN), 0.0);
        assert_eq!(ratio(f64::INFINITY, 2.0), 0.0);
        assert_eq!(ratio(3.0, 2.0), 1.0);
    }

    #[test]
    fn non_numeric_fields_are_skipped() {
        let records = vec![json!({ "points": "ten" }), json!({ "points": 10 })];
        let specs = AggregateSpecs::new()
            .sum("sum", "points")
            .average("avg", "points")
            .max("max", "missing");
        let stats = aggregate(&records, &specs);
        assert_eq!(stats.value("sum"), 10.0);
        assert_eq!(stats.value("avg"), 10.0);
        assert_eq!(stats.value("max"), 0.0);
    }

    #[test]
    fn unrequested_statistic() {
        let stats = aggregate(&meals(), &AggregateSpecs::new().count("n"));
        assert_eq!(stats.get("other"), None);
        assert_eq!(stats.value("other"), 0.0);
    }

    #[test]
    fn referenced_fields() {
        let specs: AggregateSpecs<Json> = AggregateSpecs::new()
            .count("n")
            .average("avg", "rating")
            .progress("p", "current", "target");
        assert_eq!(
            specs.referenced_fields(),
            vec![("avg", "rating"), ("p", "current"), ("p", "target")]
        );
    }

    #[test]
    fn serializes_as_plain_map() {
        let stats = aggregate(&meals(), &AggregateSpecs::new().count("total"));
        assert_eq!(serde_json::to_value(&stats).unwrap(), json!({ "total": 3.0 }));
    }
}

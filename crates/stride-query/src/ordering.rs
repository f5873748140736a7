//! Field ordering primitives.
//!
//! Provides [`Dir`] for sort direction and [`OrderBy`] for field-based
//! ordering. The named comparator table built on top of these lives in
//! [`crate::sort`].

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::record::Record;
use crate::value::Value;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dir {
    /// Ascending order (smallest first).
    #[default]
    Asc,
    /// Descending order (largest first).
    Desc,
}

impl Dir {
    /// Applies this direction to an ordering.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Dir::Asc => ordering,
            Dir::Desc => ordering.reverse(),
        }
    }

    /// Returns the display name of this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Asc => "asc",
            Dir::Desc => "desc",
        }
    }
}

impl std::fmt::Display for Dir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single ordering clause: a field and a direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    /// The field to sort by.
    pub field: String,
    /// The sort direction.
    #[serde(default)]
    pub dir: Dir,
}

impl OrderBy {
    /// Ascending ordering on `field`.
    pub fn asc(field: impl Into<String>) -> Self {
        OrderBy::new(field, Dir::Asc)
    }

    /// Descending ordering on `field`.
    pub fn desc(field: impl Into<String>) -> Self {
        OrderBy::new(field, Dir::Desc)
    }

    /// Ordering on `field` with the given direction.
    pub fn new(field: impl Into<String>, dir: Dir) -> Self {
        OrderBy {
            field: field.into(),
            dir,
        }
    }

    /// Compares two values according to this ordering.
    ///
    /// The order is total. Values of different types never tie: numbers come
    /// first, then timestamps, strings and booleans, whatever the direction.
    /// Missing values and NaN sort last in both directions.
    pub fn compare(&self, a: &Value<'_>, b: &Value<'_>) -> Ordering {
        let (rank_a, rank_b) = (sort_rank(a), sort_rank(b));
        if rank_a != rank_b {
            return rank_a.cmp(&rank_b);
        }
        if rank_a == MISSING_RANK {
            return Ordering::Equal;
        }
        compare_values(a, b)
            .map(|o| self.dir.apply(o))
            .unwrap_or(Ordering::Equal)
    }
}

const MISSING_RANK: u8 = 4;

fn sort_rank(value: &Value<'_>) -> u8 {
    match value {
        Value::Number(n) if n.to_f64().is_nan() => MISSING_RANK,
        Value::Number(_) => 0,
        Value::Timestamp(_) => 1,
        Value::String(_) => 2,
        Value::Bool(_) => 3,
        Value::None => MISSING_RANK,
    }
}

/// Compares two values of the same type.
///
/// `None` sorts after any present value. Returns `None` when the types
/// differ or a NaN is involved.
pub fn compare_values(a: &Value<'_>, b: &Value<'_>) -> Option<Ordering> {
    match (a, b) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => a.compare(*b),
        (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),

        (Value::None, Value::None) => Some(Ordering::Equal),
        (Value::None, _) => Some(Ordering::Greater),
        (_, Value::None) => Some(Ordering::Less),

        _ => None,
    }
}

/// Compares two records using a list of ordering clauses.
///
/// The first clause is the primary key, later clauses break ties.
pub fn compare_by_orderings<T>(a: &T, b: &T, orderings: &[OrderBy]) -> Ordering
where
    T: Record + ?Sized,
{
    for order_by in orderings {
        let val_a = a.field_value(&order_by.field);
        let val_b = b.field_value(&order_by.field);

        let ordering = order_by.compare(&val_a, &val_b);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

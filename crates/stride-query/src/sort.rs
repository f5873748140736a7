//! Named comparator tables and stable sorting.
//!
//! Each list view offers a sort menu ("Most recent", "Most popular",
//! "A-Z"...). A [`Comparators`] table maps each menu key to a comparison
//! function; [`sort`] orders records by one of those keys. Sorting is always
//! stable: records that compare equal keep their input order.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{QueryError, Result};
use crate::ordering::{compare_by_orderings, Dir, OrderBy};
use crate::record::Record;

/// A boxed record comparator.
pub type CompareFn<T> = Box<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Sort keys used across the app's list screens.
pub mod keys {
    /// Newest first.
    pub const RECENT: &str = "recent";
    /// Oldest first.
    pub const OLDEST: &str = "oldest";
    /// Highest engagement first.
    pub const POPULAR: &str = "popular";
    /// Title A-Z.
    pub const ALPHABETICAL: &str = "alphabetical";
}

/// Table of named comparators.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use stride_query::{sort, Comparators, Dir};
///
/// let topics = vec![
///     json!({ "title": "Warm-ups", "likes": 3, "replies": 1 }),
///     json!({ "title": "Recovery", "likes": 10, "replies": 5 }),
/// ];
///
/// let comparators = Comparators::new()
///     .sum("popular", &["likes", "replies"], Dir::Desc)
///     .text("alphabetical", "title", Dir::Asc);
///
/// let sorted = sort(&topics, "popular", &comparators).unwrap();
/// assert_eq!(sorted[0]["title"], "Recovery");
/// ```
pub struct Comparators<T> {
    table: BTreeMap<String, CompareFn<T>>,
}

impl<T> Default for Comparators<T> {
    fn default() -> Self {
        Comparators {
            table: BTreeMap::new(),
        }
    }
}

impl<T> fmt::Debug for Comparators<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Comparators")
            .field("keys", &self.table.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T: Record + 'static> Comparators<T> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Comparators::default()
    }

    /// The observed list-screen sort menu:
    /// [`keys::RECENT`], [`keys::OLDEST`], [`keys::POPULAR`] and [`keys::ALPHABETICAL`].
    pub fn standard(timestamp_field: &str, engagement_fields: &[&str], title_field: &str) -> Self {
        Comparators::new()
            .field(keys::RECENT, timestamp_field, Dir::Desc)
            .field(keys::OLDEST, timestamp_field, Dir::Asc)
            .sum(keys::POPULAR, engagement_fields, Dir::Desc)
            .text(keys::ALPHABETICAL, title_field, Dir::Asc)
    }

    /// Registers an arbitrary comparator.
    pub fn custom<F>(mut self, key: &str, compare: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.table.insert(key.to_string(), Box::new(compare));
        self
    }

    /// Sorts by a single field.
    pub fn field(self, key: &str, field: &str, dir: Dir) -> Self {
        self.fields(key, vec![OrderBy::new(field, dir)])
    }

    /// Sorts by several fields, later ones breaking ties.
    pub fn fields(self, key: &str, orderings: Vec<OrderBy>) -> Self {
        self.custom(key, move |a, b| compare_by_orderings(a, b, &orderings))
    }

    /// Sorts by the sum of numeric fields (likes + comments + shares...).
    ///
    /// Missing or non-numeric counters count as zero.
    pub fn sum(self, key: &str, fields: &[&str], dir: Dir) -> Self {
        let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        self.custom(key, move |a, b| {
            let total = |r: &T| -> f64 {
                fields
                    .iter()
                    .filter_map(|f| r.field_value(f).as_f64())
                    .sum()
            };
            dir.apply(total(a).total_cmp(&total(b)))
        })
    }

    /// Sorts by a text field, ignoring case. Missing text sorts last.
    pub fn text(self, key: &str, field: &str, dir: Dir) -> Self {
        let field = field.to_string();
        self.custom(key, move |a, b| {
            let va = a.field_value(&field);
            let vb = b.field_value(&field);
            match (va.is_none(), vb.is_none()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => dir.apply(
                    va.to_text()
                        .to_lowercase()
                        .cmp(&vb.to_text().to_lowercase()),
                ),
            }
        })
    }
}

impl<T> Comparators<T> {
    /// Returns the comparator registered under `key`.
    pub fn get(&self, key: &str) -> Result<&CompareFn<T>> {
        self.table
            .get(key)
            .ok_or_else(|| QueryError::UnknownSortKey(key.to_string()))
    }

    /// Returns `true` if `key` is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.table.contains_key(key)
    }

    /// Registered keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if no key is registered.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Stable in-place sort of record references.
    pub fn sort_refs(&self, key: &str, items: &mut [&T]) -> Result<()> {
        let compare = self.get(key)?;
        items.sort_by(|a, b| compare(*a, *b));
        Ok(())
    }
}

/// Returns `records` ordered by the comparator named `key`.
///
/// The sort is stable. An unregistered key is a [`QueryError::UnknownSortKey`].
pub fn sort<'a, T>(records: &'a [T], key: &str, comparators: &Comparators<T>) -> Result<Vec<&'a T>> {
    let mut items: Vec<&'a T> = records.iter().collect();
    comparators.sort_refs(key, &mut items)?;
    Ok(items)
}

/// Compares two records on one field, for hand-written comparators.
///
/// ```
/// use serde_json::json;
/// use stride_query::{compare_field, Comparators, Dir};
///
/// let comparators: Comparators<serde_json::Value> = Comparators::new()
///     .custom("rating_desc", |a, b| compare_field(a, b, "rating", Dir::Desc));
/// ```
pub fn compare_field<T: Record + ?Sized>(a: &T, b: &T, field: &str, dir: Dir) -> Ordering {
    OrderBy::new(field, dir)
        .compare(&a.field_value(field), &b.field_value(field))
}

//! Composition of the search, category and extra-filter predicates.
//!
//! [`build_predicate`] turns a [`Query`] and a [`FieldConfig`] into a single
//! [`Predicate`]. All dimensions combine with AND; a dimension with no
//! selected value (empty search, "all" chip, unset filter) accepts everything.
//! Composition never touches the records themselves.

use crate::config::{FieldConfig, FilterDef, FilterKind};
use crate::error::{QueryError, Result};
use crate::matcher::TextMatcher;
use crate::query::{CategoryFilter, FilterValue, Query};
use crate::record::Record;
use crate::value::Value;

/// One active, non-text filter dimension.
#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Equals {
        field: String,
        values: Vec<String>,
        case_insensitive: bool,
    },
    Range {
        field: String,
        min: Option<f64>,
        max: Option<f64>,
    },
    Flag {
        field: String,
        flag: bool,
    },
}

impl Condition {
    fn test<T: Record + ?Sized>(&self, record: &T) -> bool {
        match self {
            Condition::Equals {
                field,
                values,
                case_insensitive,
            } => {
                let value = record.field_value(field);
                if value.is_none() {
                    return false;
                }
                let text = value.to_text();
                values.iter().any(|v| {
                    if *case_insensitive {
                        v.to_lowercase() == text.to_lowercase()
                    } else {
                        *v == *text
                    }
                })
            }
            Condition::Range { field, min, max } => match record.field_value(field).as_f64() {
                Some(n) => min.map_or(true, |lo| n >= lo) && max.map_or(true, |hi| n <= hi),
                None => false,
            },
            Condition::Flag { field, flag } => {
                matches!(record.field_value(field), Value::Bool(b) if b == *flag)
            }
        }
    }

    fn from_def(name: &str, def: &FilterDef, value: &FilterValue) -> Result<Option<Self>> {
        if value.is_any() {
            return Ok(None);
        }
        let field = def.field.clone();
        let condition = match (def.kind, value) {
            (FilterKind::Equals, FilterValue::Equals(v)) => Condition::Equals {
                field,
                values: vec![v.clone()],
                case_insensitive: def.case_insensitive,
            },
            (FilterKind::Equals, FilterValue::OneOf(vs)) => Condition::Equals {
                field,
                values: vs.clone(),
                case_insensitive: def.case_insensitive,
            },
            (FilterKind::Range, FilterValue::Range { min, max }) => Condition::Range {
                field,
                min: *min,
                max: *max,
            },
            (FilterKind::Flag, FilterValue::Flag(flag)) => Condition::Flag { field, flag: *flag },
            (kind, value) => {
                return Err(QueryError::FilterKindMismatch {
                    name: name.to_string(),
                    expected: kind.as_str(),
                    actual: value.kind_name(),
                })
            }
        };
        Ok(Some(condition))
    }
}

/// A composed record filter.
///
/// Built by [`build_predicate`]; evaluate it with [`Predicate::test`].
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    text: TextMatcher,
    search_fields: Vec<String>,
    category: Option<Condition>,
    conditions: Vec<Condition>,
}

impl Predicate {
    /// Returns `true` if `record` passes every active dimension.
    pub fn test<T: Record + ?Sized>(&self, record: &T) -> bool {
        self.text.matches(record, &self.search_fields)
            && self.category.as_ref().map_or(true, |c| c.test(record))
            && self.conditions.iter().all(|c| c.test(record))
    }

    /// Returns `true` if this predicate accepts every record.
    pub fn is_trivial(&self) -> bool {
        self.text.is_empty() && self.category.is_none() && self.conditions.is_empty()
    }

    /// Number of active non-text dimensions (category included).
    pub fn active_filters(&self) -> usize {
        self.conditions.len() + usize::from(self.category.is_some())
    }

    /// Converts into a plain closure.
    pub fn into_fn<T: Record + ?Sized>(self) -> impl Fn(&T) -> bool {
        move |record| self.test(record)
    }
}

/// Builds the AND of the query's text, category and extra-filter predicates.
///
/// Fails on shape errors only: a filter value the configuration does not
/// declare ([`QueryError::UndeclaredFilter`]), a value of the wrong kind
/// ([`QueryError::FilterKindMismatch`]), or a category selection when the
/// configuration has no category field ([`QueryError::UnknownField`]).
///
/// ```
/// use serde_json::json;
/// use stride_query::{build_predicate, FieldConfig, Query};
///
/// let config = FieldConfig::new()
///     .search_fields(&["title"])
///     .category_field("sport")
///     .equals_filter("age_group", "ageGroup");
///
/// let query = Query::new().category("football").filter_eq("age_group", "U12");
/// let predicate = build_predicate(&query, &config).unwrap();
///
/// assert!(predicate.test(&json!({ "title": "Cup", "sport": "football", "ageGroup": "U12" })));
/// assert!(!predicate.test(&json!({ "title": "Cup", "sport": "football", "ageGroup": "U10" })));
/// assert!(!predicate.test(&json!({ "title": "Cup", "sport": "tennis", "ageGroup": "U12" })));
/// ```
pub fn build_predicate(query: &Query, config: &FieldConfig) -> Result<Predicate> {
    let category = match query.category_filter() {
        CategoryFilter::All => None,
        CategoryFilter::Only(value) => {
            let field = config
                .category_field
                .clone()
                .ok_or_else(|| QueryError::UnknownField {
                    field: "category".to_string(),
                    role: "the category filter (no category field configured)".to_string(),
                })?;
            Some(Condition::Equals {
                field,
                values: vec![value.clone()],
                case_insensitive: config.category_case_insensitive,
            })
        }
    };

    let mut conditions = Vec::new();
    for (name, value) in query.filters() {
        let def = config
            .filters
            .get(name)
            .ok_or_else(|| QueryError::UndeclaredFilter(name.clone()))?;
        if let Some(condition) = Condition::from_def(name, def, value)? {
            conditions.push(condition);
        }
    }

    Ok(Predicate {
        text: TextMatcher::new(query.search_text()),
        search_fields: config.search_fields.clone(),
        category,
        conditions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value as Json};

    fn config() -> FieldConfig {
        FieldConfig::new()
            .search_fields(&["title", "description"])
            .category_field("category")
            .equals_filter("age_group", "ageGroup")
            .equals_filter_ci("level", "level")
            .range_filter("price", "price")
            .flag_filter("featured", "featured")
    }

    fn camps() -> Vec<Json> {
        vec![
            json!({ "id": 1, "title": "Elite Football Academy", "category": "football",
                    "ageGroup": "U12", "level": "Advanced", "price": 250, "featured": true }),
            json!({ "id": 2, "title": "Kickoff Juniors", "category": "football",
                    "ageGroup": "U10", "level": "beginner", "price": 90, "featured": false }),
            json!({ "id": 3, "title": "Baseline Tennis Camp", "category": "tennis",
                    "ageGroup": "U12", "level": "intermediate", "price": 180 }),
            json!({ "id": 4, "title": "Open Court", "description": "Tennis for everyone",
                    "category": "tennis" }),
        ]
    }

    fn ids(query: &Query) -> Vec<i64> {
        let predicate = build_predicate(query, &config()).unwrap();
        camps()
            .iter()
            .filter(|c| predicate.test(*c))
            .map(|c| c["id"].as_i64().unwrap())
            .collect()
    }

    #[test]
    fn empty_query_is_trivial() {
        let predicate = build_predicate(&Query::new(), &config()).unwrap();
        assert!(predicate.is_trivial());
        assert_eq!(ids(&Query::new()), [1, 2, 3, 4]);
    }

    #[test]
    fn category_is_exact_and_case_sensitive() {
        assert_eq!(ids(&Query::new().category("football")), [1, 2]);
        assert!(ids(&Query::new().category("Football")).is_empty());
        assert!(ids(&Query::new().category("foot")).is_empty());
    }

    #[test]
    fn category_case_insensitive_when_configured() {
        let mut config = config();
        config.category_case_insensitive = true;
        let predicate = build_predicate(&Query::new().category("TENNIS"), &config).unwrap();
        assert_eq!(camps().iter().filter(|c| predicate.test(*c)).count(), 2);
    }

    #[test]
    fn category_ignores_search_text_scope() {
        // Search text narrows independently of the category.
        assert_eq!(ids(&Query::new().category("tennis").search("everyone")), [4]);
        assert!(ids(&Query::new().category("football").search("tennis")).is_empty());
    }

    #[test]
    fn dimensions_combine_with_and() {
        let query = Query::new().category("football").filter_eq("age_group", "U12");
        assert_eq!(ids(&query), [1]);
    }

    #[test]
    fn one_of_and_case_insensitive_equals() {
        let query = Query::new().filter_in("level", ["advanced", "BEGINNER"]);
        assert_eq!(ids(&query), [1, 2]);
    }

    #[test]
    fn range_bounds_are_inclusive_and_optional() {
        assert_eq!(ids(&Query::new().filter_range("price", Some(90.0), Some(180.0))), [2, 3]);
        assert_eq!(ids(&Query::new().filter_range("price", Some(200.0), None)), [1]);
        // Record 4 has no price and never matches an active range.
        assert_eq!(ids(&Query::new().filter_range("price", None, Some(1000.0))), [1, 2, 3]);
    }

    #[test]
    fn flag_filter_requires_a_boolean() {
        assert_eq!(ids(&Query::new().filter_flag("featured", true)), [1]);
        assert_eq!(ids(&Query::new().filter_flag("featured", false)), [2]);
    }

    #[test]
    fn all_sentinel_disables_a_filter() {
        let query = Query::new().filter_eq("age_group", "all").category("all");
        assert_eq!(ids(&query), [1, 2, 3, 4]);
        assert!(build_predicate(&query, &config()).unwrap().is_trivial());
    }

    #[test]
    fn undeclared_filter_is_an_error() {
        let err = build_predicate(&Query::new().filter_eq("risk", "low"), &config()).unwrap_err();
        assert_eq!(err, QueryError::UndeclaredFilter("risk".into()));
    }

    #[test]
    fn kind_mismatch_is_an_error() {
        let err = build_predicate(&Query::new().filter_flag("price", true), &config()).unwrap_err();
        assert_eq!(
            err,
            QueryError::FilterKindMismatch {
                name: "price".into(),
                expected: "range",
                actual: "flag",
            }
        );
    }

    #[test]
    fn category_without_category_field_is_an_error() {
        let config = FieldConfig::new().search_fields(&["title"]);
        let err = build_predicate(&Query::new().category("football"), &config).unwrap_err();
        assert!(matches!(err, QueryError::UnknownField { .. }));
    }

    #[test]
    fn active_filter_count() {
        let query = Query::new()
            .category("tennis")
            .filter_eq("age_group", "U12")
            .filter_eq("level", "all");
        assert_eq!(build_predicate(&query, &config()).unwrap().active_filters(), 2);
    }

    #[test]
    fn into_fn_closure() {
        let keep = build_predicate(&Query::new().search("court"), &config())
            .unwrap()
            .into_fn::<Json>();
        assert_eq!(camps().iter().filter(|c| keep(*c)).count(), 1);
    }
}

//! Declarative view configuration.
//!
//! A list screen describes its searchable fields, category field, filter
//! chips, sort menu and stat cards once, either in code through the
//! [`FieldConfig`] builder or in a YAML/JSON document loaded as a
//! [`ViewConfig`]:
//!
//! ```yaml
//! search_fields: [title, description]
//! category_field: sport
//! filters:
//!   age_group: { field: ageGroup, kind: equals }
//!   price: { field: price, kind: range }
//! sorts:
//!   rating_desc: { by: [{ field: rating, dir: desc }] }
//!   popular: { sum: [likes, comments], dir: desc }
//! aggregates:
//!   total: count
//!   averageRating: { average: rating }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::aggregate::{AggregateSpecs, Reducer};
use crate::error::{ConfigError, QueryError, Result};
use crate::ordering::{Dir, OrderBy};
use crate::record::Record;
use crate::sort::Comparators;
use crate::value::Value;

/// How an extra filter compares its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// Text equality (one value or a set of values).
    Equals,
    /// Inclusive numeric bounds.
    Range,
    /// Boolean equality.
    Flag,
}

impl FilterKind {
    /// Returns the display name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            FilterKind::Equals => "equals",
            FilterKind::Range => "range",
            FilterKind::Flag => "flag",
        }
    }
}

/// An extra filter dimension (age group, risk level, price...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDef {
    /// Record field the filter reads.
    pub field: String,
    /// Comparison kind.
    pub kind: FilterKind,
    /// Ignore case for `equals` filters.
    #[serde(default)]
    pub case_insensitive: bool,
}

/// Which fields a screen searches and filters on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Fields scanned by free-text search.
    pub search_fields: Vec<String>,
    /// Field compared against the category chip.
    pub category_field: Option<String>,
    /// Compare categories ignoring case.
    pub category_case_insensitive: bool,
    /// Extra filters by the name queries use for them.
    pub filters: BTreeMap<String, FilterDef>,
}

impl FieldConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        FieldConfig::default()
    }

    /// Sets the searchable fields.
    pub fn search_fields(mut self, fields: &[&str]) -> Self {
        self.search_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Sets the category field.
    pub fn category_field(mut self, field: &str) -> Self {
        self.category_field = Some(field.to_string());
        self
    }

    /// Declares a filter.
    pub fn filter(mut self, name: &str, field: &str, kind: FilterKind) -> Self {
        self.filters.insert(
            name.to_string(),
            FilterDef {
                field: field.to_string(),
                kind,
                case_insensitive: false,
            },
        );
        self
    }

    /// Declares a case-sensitive equality filter.
    pub fn equals_filter(self, name: &str, field: &str) -> Self {
        self.filter(name, field, FilterKind::Equals)
    }

    /// Declares a case-insensitive equality filter.
    pub fn equals_filter_ci(mut self, name: &str, field: &str) -> Self {
        self = self.filter(name, field, FilterKind::Equals);
        if let Some(def) = self.filters.get_mut(name) {
            def.case_insensitive = true;
        }
        self
    }

    /// Declares a numeric range filter.
    pub fn range_filter(self, name: &str, field: &str) -> Self {
        self.filter(name, field, FilterKind::Range)
    }

    /// Declares a boolean filter.
    pub fn flag_filter(self, name: &str, field: &str) -> Self {
        self.filter(name, field, FilterKind::Flag)
    }

    /// Every field this configuration reads, with a description of its role.
    pub fn referenced_fields(&self) -> Vec<(String, String)> {
        let mut fields: Vec<(String, String)> = self
            .search_fields
            .iter()
            .map(|f| (f.clone(), "search_fields".to_string()))
            .collect();
        if let Some(category) = &self.category_field {
            fields.push((category.clone(), "category_field".to_string()));
        }
        for (name, def) in &self.filters {
            fields.push((def.field.clone(), format!("filter '{}'", name)));
        }
        fields
    }

    /// Checks that every referenced field exists for `T`.
    ///
    /// See [`validate_fields`] for the rules.
    pub fn validate<T: Record>(&self, records: &[T]) -> Result<()> {
        validate_fields(self.referenced_fields(), records)
    }
}

/// Checks that each `(field, role)` pair names a field of `T`.
///
/// Types with a static schema ([`Record::field_names`]) are checked against
/// it. Schema-less records (JSON) are checked against the data: a field is
/// unknown only if the collection is non-empty and no record carries it
/// ([`Record::has_field`]), null values included. An empty collection is
/// always valid.
pub fn validate_fields<T: Record>(fields: Vec<(String, String)>, records: &[T]) -> Result<()> {
    for (field, role) in fields {
        let known = match T::field_names() {
            Some(schema) => schema.contains(&field.as_str()),
            None => records.is_empty() || records.iter().any(|r| r.has_field(&field)),
        };
        tracing::trace!(field = %field, role = %role, known, "validating field reference");
        if !known {
            return Err(QueryError::UnknownField { field, role });
        }
    }
    Ok(())
}

/// A declarative sort menu entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SortDef {
    /// Field ordering, later fields breaking ties.
    Fields { by: Vec<OrderBy> },
    /// Sum of counters (popularity).
    Sum {
        sum: Vec<String>,
        #[serde(default)]
        dir: Dir,
    },
    /// Case-insensitive text ordering.
    Text {
        text: String,
        #[serde(default)]
        dir: Dir,
    },
}

impl SortDef {
    fn fields(&self) -> Vec<String> {
        match self {
            SortDef::Fields { by } => by.iter().map(|o| o.field.clone()).collect(),
            SortDef::Sum { sum, .. } => sum.clone(),
            SortDef::Text { text, .. } => vec![text.clone()],
        }
    }
}

/// A scalar a condition compares a field to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Boolean.
    Bool(bool),
    /// Number.
    Number(f64),
    /// Text.
    Text(String),
}

impl Scalar {
    fn matches(&self, value: &Value<'_>) -> bool {
        match (self, value) {
            (Scalar::Bool(expected), Value::Bool(actual)) => expected == actual,
            (Scalar::Number(expected), _) => value.as_f64() == Some(*expected),
            (Scalar::Text(expected), Value::String(actual)) => expected == actual,
            _ => false,
        }
    }
}

/// `field == value` condition used by conditional aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Field to compare.
    pub field: String,
    /// Expected value.
    pub equals: Scalar,
}

impl Condition {
    /// Tests a record.
    pub fn test<T: Record + ?Sized>(&self, record: &T) -> bool {
        self.equals.matches(&record.field_value(&self.field))
    }
}

/// Field names of a progress statistic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressDef {
    /// Field holding the completed amount.
    pub completed: String,
    /// Field holding the goal amount.
    pub target: String,
}

/// A declarative statistic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateDef {
    /// Record count.
    Count,
    /// Sum of a field.
    Sum(String),
    /// Mean of a field.
    Average(String),
    /// Maximum of a field.
    Max(String),
    /// Minimum of a field.
    Min(String),
    /// Conditional count.
    CountWhere(Condition),
    /// Fraction of records meeting a condition.
    PercentWhere(Condition),
    /// Completed over target.
    Progress(ProgressDef),
}

impl AggregateDef {
    fn fields(&self) -> Vec<String> {
        match self {
            AggregateDef::Count => Vec::new(),
            AggregateDef::Sum(f)
            | AggregateDef::Average(f)
            | AggregateDef::Max(f)
            | AggregateDef::Min(f) => vec![f.clone()],
            AggregateDef::CountWhere(c) | AggregateDef::PercentWhere(c) => vec![c.field.clone()],
            AggregateDef::Progress(p) => vec![p.completed.clone(), p.target.clone()],
        }
    }

    /// Builds the runtime reducer.
    pub fn to_reducer<T: Record + 'static>(&self) -> Reducer<T> {
        match self {
            AggregateDef::Count => Reducer::Count,
            AggregateDef::Sum(f) => Reducer::sum(f.as_str()),
            AggregateDef::Average(f) => Reducer::average(f.as_str()),
            AggregateDef::Max(f) => Reducer::max(f.as_str()),
            AggregateDef::Min(f) => Reducer::min(f.as_str()),
            AggregateDef::CountWhere(c) => {
                let c = c.clone();
                Reducer::count_where(move |r: &T| c.test(r))
            }
            AggregateDef::PercentWhere(c) => {
                let c = c.clone();
                Reducer::percent_where(move |r: &T| c.test(r))
            }
            AggregateDef::Progress(p) => Reducer::progress(p.completed.as_str(), p.target.as_str()),
        }
    }
}

/// A complete list-screen configuration: fields, sort menu and stat cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Search and filter fields.
    #[serde(flatten)]
    pub fields: FieldConfig,
    /// Sort menu by key.
    #[serde(default)]
    pub sorts: BTreeMap<String, SortDef>,
    /// Statistics by name.
    #[serde(default)]
    pub aggregates: BTreeMap<String, AggregateDef>,
}

impl ViewConfig {
    /// Parses a YAML document.
    pub fn from_yaml_str(s: &str) -> std::result::Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Parses a JSON document.
    pub fn from_json_str(s: &str) -> std::result::Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Loads a `.yaml`, `.yml` or `.json` file.
    pub fn from_path(path: impl AsRef<Path>) -> std::result::Result<Self, ConfigError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let parse: fn(&str) -> std::result::Result<Self, ConfigError> = match ext.as_deref() {
            Some("yaml") | Some("yml") => ViewConfig::from_yaml_str,
            Some("json") => ViewConfig::from_json_str,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse(&content)
    }

    /// Builds the sort menu.
    pub fn comparators<T: Record + 'static>(&self) -> Comparators<T> {
        self.sorts
            .iter()
            .fold(Comparators::new(), |table, (key, def)| match def {
                SortDef::Fields { by } => table.fields(key, by.clone()),
                SortDef::Sum { sum, dir } => {
                    let fields: Vec<&str> = sum.iter().map(String::as_str).collect();
                    table.sum(key, &fields, *dir)
                }
                SortDef::Text { text, dir } => table.text(key, text, *dir),
            })
    }

    /// Builds the statistics table.
    pub fn aggregate_specs<T: Record + 'static>(&self) -> AggregateSpecs<T> {
        self.aggregates
            .iter()
            .fold(AggregateSpecs::new(), |specs, (name, def)| {
                specs.with(name, def.to_reducer())
            })
    }

    /// Checks every field the configuration references, sorts and
    /// statistics included.
    pub fn validate<T: Record>(&self, records: &[T]) -> Result<()> {
        let mut fields = self.fields.referenced_fields();
        for (key, def) in &self.sorts {
            fields.extend(def.fields().into_iter().map(|f| (f, format!("sort '{}'", key))));
        }
        for (name, def) in &self.aggregates {
            fields.extend(
                def.fields()
                    .into_iter()
                    .map(|f| (f, format!("aggregate '{}'", name))),
            );
        }
        validate_fields(fields, records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::sort::sort;
    use serde_json::{json, Value as Json};

    const CAMPS_YAML: &str = r#"
search_fields: [title, description]
category_field: sport
filters:
  age_group: { field: ageGroup, kind: equals }
  level: { field: level, kind: equals, case_insensitive: true }
  price: { field: price, kind: range }
  featured: { field: featured, kind: flag }
sorts:
  rating_desc: { by: [{ field: rating, dir: desc }, { field: title }] }
  popular: { sum: [likes, shares], dir: desc }
  alphabetical: { text: title }
aggregates:
  total: count
  averageRating: { average: rating }
  featuredCount: { count_where: { field: featured, equals: true } }
  topRated: { percent_where: { field: rating, equals: 4.8 } }
  fill: { progress: { completed: enrolled, target: capacity } }
"#;

    fn camps() -> Vec<Json> {
        vec![
            json!({ "title": "Splash Swimming Center", "sport": "swimming", "rating": 4.6,
                    "likes": 3, "shares": 1, "featured": false, "enrolled": 10, "capacity": 20,
                    "ageGroup": "U10", "level": "Beginner", "price": 120 }),
            json!({ "title": "Elite Football Academy", "sport": "football", "rating": 4.8,
                    "likes": 8, "shares": 4, "featured": true, "enrolled": 25, "capacity": 30,
                    "ageGroup": "U12", "level": "Advanced", "price": 300 }),
        ]
    }

    #[test]
    fn parses_yaml() {
        let config = ViewConfig::from_yaml_str(CAMPS_YAML).unwrap();

        assert_eq!(config.fields.search_fields, ["title", "description"]);
        assert_eq!(config.fields.category_field.as_deref(), Some("sport"));
        assert!(!config.fields.category_case_insensitive);
        assert_eq!(config.fields.filters["level"].kind, FilterKind::Equals);
        assert!(config.fields.filters["level"].case_insensitive);
        assert_eq!(config.fields.filters["price"].kind, FilterKind::Range);
        assert_eq!(
            config.sorts["rating_desc"],
            SortDef::Fields {
                by: vec![OrderBy::desc("rating"), OrderBy::asc("title")]
            }
        );
        assert_eq!(
            config.sorts["popular"],
            SortDef::Sum {
                sum: vec!["likes".into(), "shares".into()],
                dir: Dir::Desc
            }
        );
        assert_eq!(config.aggregates["total"], AggregateDef::Count);
        assert_eq!(
            config.aggregates["featuredCount"],
            AggregateDef::CountWhere(Condition {
                field: "featured".into(),
                equals: Scalar::Bool(true)
            })
        );
    }

    #[test]
    fn parses_json() {
        let config = ViewConfig::from_json_str(
            r#"{
                "search_fields": ["name"],
                "aggregates": { "calories": { "sum": "calories" } }
            }"#,
        )
        .unwrap();
        assert_eq!(config.fields.search_fields, ["name"]);
        assert!(config.sorts.is_empty());
        assert_eq!(
            config.aggregates["calories"],
            AggregateDef::Sum("calories".into())
        );
    }

    #[test]
    fn malformed_documents() {
        assert!(matches!(
            ViewConfig::from_yaml_str("filters: { x: { field: f, kind: fuzzy } }"),
            Err(ConfigError::Yaml(_))
        ));
        assert!(matches!(
            ViewConfig::from_json_str("{"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn loads_from_path() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("camps.yaml");
        std::fs::write(&yaml, CAMPS_YAML).unwrap();
        assert_eq!(ViewConfig::from_path(&yaml).unwrap().sorts.len(), 3);

        let toml = dir.path().join("camps.toml");
        std::fs::write(&toml, "").unwrap();
        assert!(matches!(
            ViewConfig::from_path(&toml),
            Err(ConfigError::UnsupportedFormat(_))
        ));

        assert!(matches!(
            ViewConfig::from_path(dir.path().join("missing.json")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn builds_runtime_tables() {
        let config = ViewConfig::from_yaml_str(CAMPS_YAML).unwrap();
        let records = camps();

        let comparators = config.comparators::<Json>();
        let by_rating = sort(&records, "rating_desc", &comparators).unwrap();
        assert_eq!(by_rating[0]["sport"], "football");
        let alpha = sort(&records, "alphabetical", &comparators).unwrap();
        assert_eq!(alpha[0]["sport"], "football");
        let popular = sort(&records, "popular", &comparators).unwrap();
        assert_eq!(popular[0]["sport"], "football");

        let stats = aggregate(&records, &config.aggregate_specs::<Json>());
        assert_eq!(stats.value("total"), 2.0);
        assert!((stats.value("averageRating") - 4.7).abs() < 1e-9);
        assert_eq!(stats.value("featuredCount"), 1.0);
        assert_eq!(stats.value("topRated"), 0.5);
        assert_eq!(stats.value("fill"), 35.0 / 50.0);
    }

    #[test]
    fn validates_against_data() {
        let config = ViewConfig::from_yaml_str(CAMPS_YAML).unwrap();
        // `description` is absent from every record.
        let err = config.validate(&camps()).unwrap_err();
        assert_eq!(
            err,
            QueryError::UnknownField {
                field: "description".into(),
                role: "search_fields".into(),
            }
        );

        let mut records = camps();
        records[0]["description"] = json!("Lessons for all ages");
        assert!(config.validate(&records).is_ok());

        // Nothing to check against.
        assert!(config.validate::<Json>(&[]).is_ok());
    }

    #[test]
    fn validates_filter_fields() {
        let config = FieldConfig::new()
            .search_fields(&["title"])
            .range_filter("price", "cost");
        let err = config.validate(&camps()).unwrap_err();
        assert_eq!(
            err,
            QueryError::UnknownField {
                field: "cost".into(),
                role: "filter 'price'".into(),
            }
        );
    }

    struct Drill {
        name: String,
    }

    impl Record for Drill {
        fn field_value(&self, field: &str) -> Value<'_> {
            match field {
                "name" => Value::String(&self.name),
                _ => Value::None,
            }
        }

        fn field_names() -> Option<&'static [&'static str]> {
            Some(&["name", "notes"])
        }
    }

    #[test]
    fn validates_against_static_schema() {
        let drills = vec![Drill {
            name: "Cone weave".into(),
        }];

        // `notes` is in the schema even though no record has a value.
        let ok = FieldConfig::new().search_fields(&["name", "notes"]);
        assert!(ok.validate(&drills).is_ok());

        // The schema applies even with no records.
        let bad = FieldConfig::new().category_field("sport");
        assert_eq!(
            bad.validate::<Drill>(&[]).unwrap_err(),
            QueryError::UnknownField {
                field: "sport".into(),
                role: "category_field".into(),
            }
        );
    }
}

//! Stride Catalog - browse a JSON record collection from the command line.
//!
//! Loads records and a view configuration, turns command-line flags into a
//! [`Query`], runs it through [`QueryEngine`] and renders the
//! [`ResultBundle`] as JSON or plain text.
//!
//! ```text
//! stride-catalog --records camps.json --config camps.yaml \
//!     --search football --filter age_group=U12 --sort rating_desc
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use minijinja::{context, Environment};
use serde_json::{json, Value as Json};
use stride_query::{
    ConfigError, FilterKind, FilterValue, Query, QueryEngine, QueryError, Record, ResultBundle,
    ViewConfig,
};
use thiserror::Error;

/// Errors raised by the catalog tool.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read records from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid records file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Records must be a JSON array.
    #[error("records file {0} must contain a JSON array, found {1}")]
    NotAnArray(PathBuf, &'static str),

    #[error("invalid value for filter '{name}': {reason}")]
    InvalidFilter { name: String, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("cannot serialize results: {0}")]
    Output(#[source] serde_json::Error),

    #[error("cannot render results: {0}")]
    Template(#[from] minijinja::Error),
}

const RESULTS_TEMPLATE: &str = include_str!("../templates/results.txt");

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// The serialized result bundle
    #[default]
    Json,
    /// One line per record, then statistics
    Text,
}

/// `name=min..max` range argument.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeArg {
    pub name: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Search, filter and sort a JSON record collection.
#[derive(Debug, Parser)]
#[command(name = "stride-catalog")]
#[command(version)]
#[command(about = "Search, filter, sort and summarize a JSON record collection")]
pub struct Cli {
    /// JSON file holding an array of records
    #[arg(long, value_name = "FILE")]
    pub records: PathBuf,

    /// View configuration (.yaml, .yml or .json)
    #[arg(long, value_name = "FILE")]
    pub config: PathBuf,

    /// Case-insensitive text to look for in the search fields
    #[arg(long, default_value = "")]
    pub search: String,

    /// Category to keep ("all" keeps every category)
    #[arg(long, default_value = stride_query::ALL)]
    pub category: String,

    /// Extra filter as name=value (comma-separated values match any)
    #[arg(long = "filter", value_name = "NAME=VALUE", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,

    /// Numeric range filter as name=min..max (either bound may be omitted)
    #[arg(long = "range", value_name = "NAME=MIN..MAX", value_parser = parse_range)]
    pub ranges: Vec<RangeArg>,

    /// Sort key from the configuration's sort menu
    #[arg(long)]
    pub sort: Option<String>,

    /// Skip the first N results
    #[arg(long)]
    pub offset: Option<usize>,

    /// Show at most N results
    #[arg(long)]
    pub limit: Option<usize>,

    /// Compute statistics over the whole collection instead of the matches
    #[arg(long)]
    pub collection_stats: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_filter(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing filter name in '{}'", s));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn parse_range(s: &str) -> Result<RangeArg, String> {
    let (name, bounds) = parse_filter(s)?;
    let (min, max) = parse_bounds(&bounds)?;
    Ok(RangeArg { name, min, max })
}

fn parse_bounds(bounds: &str) -> Result<(Option<f64>, Option<f64>), String> {
    let (lo, hi) = bounds
        .split_once("..")
        .ok_or_else(|| format!("expected MIN..MAX, got '{}'", bounds))?;
    let bound = |b: &str| -> Result<Option<f64>, String> {
        let b = b.trim();
        if b.is_empty() {
            return Ok(None);
        }
        b.parse::<f64>()
            .map(Some)
            .map_err(|_| format!("'{}' is not a number", b))
    };
    Ok((bound(lo)?, bound(hi)?))
}

/// Converts a `--filter` value according to the declared filter kind.
///
/// Undeclared names pass through as equality values so the engine can
/// report them.
pub fn filter_value(
    view: &ViewConfig,
    name: &str,
    raw: &str,
) -> Result<FilterValue, CatalogError> {
    let invalid = |reason: String| CatalogError::InvalidFilter {
        name: name.to_string(),
        reason,
    };
    let kind = view.fields.filters.get(name).map(|def| def.kind);

    if raw.eq_ignore_ascii_case(stride_query::ALL) {
        return Ok(FilterValue::Any);
    }
    match kind {
        Some(FilterKind::Flag) => match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(FilterValue::Flag(true)),
            "false" | "no" | "0" => Ok(FilterValue::Flag(false)),
            _ => Err(invalid(format!("expected true or false, got '{}'", raw))),
        },
        Some(FilterKind::Range) => {
            let (min, max) = parse_bounds(raw).map_err(invalid)?;
            Ok(FilterValue::range(min, max))
        }
        Some(FilterKind::Equals) | None => {
            if raw.contains(',') {
                let values = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>();
                if values.is_empty() {
                    return Err(invalid("expected at least one value".to_string()));
                }
                Ok(FilterValue::OneOf(values))
            } else {
                Ok(FilterValue::equals(raw))
            }
        }
    }
}

/// Builds the query described by the command line.
pub fn build_query(cli: &Cli, view: &ViewConfig) -> Result<Query, CatalogError> {
    let mut query = Query::new().search(cli.search.as_str()).category(cli.category.as_str());

    for (name, raw) in &cli.filters {
        query = query.filter(name, filter_value(view, name, raw)?);
    }
    for range in &cli.ranges {
        query = query.filter_range(&range.name, range.min, range.max);
    }
    if let Some(sort) = &cli.sort {
        query = query.sort(sort.as_str());
    }
    if let Some(offset) = cli.offset {
        query = query.offset(offset);
    }
    if let Some(limit) = cli.limit {
        query = query.limit(limit);
    }
    if cli.collection_stats {
        query = query.collection_stats();
    }
    Ok(query.build())
}

/// Reads a JSON array of records.
pub fn load_records(path: &Path) -> Result<Vec<Json>, CatalogError> {
    let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Json = serde_json::from_str(&content).map_err(|source| CatalogError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Json::Array(records) => Ok(records),
        other => Err(CatalogError::NotAnArray(path.to_path_buf(), json_kind(&other))),
    }
}

fn json_kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

/// Renders a bundle.
pub fn render(
    bundle: &ResultBundle<'_, Json>,
    view: &ViewConfig,
    format: OutputFormat,
) -> Result<String, CatalogError> {
    match format {
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(bundle).map_err(CatalogError::Output)?;
            out.push('\n');
            Ok(out)
        }
        OutputFormat::Text => render_text(bundle, view),
    }
}

fn text_environment() -> Result<Environment<'static>, CatalogError> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_template("results.txt", RESULTS_TEMPLATE)?;
    Ok(env)
}

fn render_text(bundle: &ResultBundle<'_, Json>, view: &ViewConfig) -> Result<String, CatalogError> {
    let label_field = view.fields.search_fields.first().map(String::as_str);

    let rows: Vec<Json> = bundle
        .items
        .iter()
        .map(|item| {
            let id = item.field_value("id");
            let id = if id.is_none() { "-".into() } else { id.to_text() };
            let label = label_field
                .map(|f| item.field_value(f))
                .filter(|label| !label.is_none())
                .map(|label| label.to_text().into_owned());
            json!({ "id": id, "label": label })
        })
        .collect();
    // Values are preformatted so `1` does not print as `1.0`.
    let stats: Vec<Json> = bundle
        .aggregates
        .iter()
        .map(|(name, value)| json!({ "name": name, "value": value.to_string() }))
        .collect();

    let noun = if bundle.total_count == 1 { "result" } else { "results" };

    let env = text_environment()?;
    let output = env.get_template("results.txt")?.render(context! {
        rows => rows,
        stats => stats,
        shown => bundle.items.len(),
        total => bundle.total_count,
        noun => noun,
    })?;
    Ok(output)
}

/// Runs the command line and returns the rendered output.
pub fn run(cli: &Cli) -> Result<String, CatalogError> {
    let view = ViewConfig::from_path(&cli.config)?;
    let records = load_records(&cli.records)?;
    tracing::debug!(
        records = records.len(),
        config = %cli.config.display(),
        sorts = view.sorts.len(),
        "loaded collection"
    );

    view.validate(&records)?;
    let query = build_query(cli, &view)?;
    let engine = QueryEngine::from_view(&view);
    let bundle = engine.run(&records, &query)?;

    render(&bundle, &view, cli.format)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> ViewConfig {
        ViewConfig::from_yaml_str(
            r#"
search_fields: [title]
filters:
  age_group: { field: ageGroup, kind: equals }
  price: { field: price, kind: range }
  featured: { field: featured, kind: flag }
"#,
        )
        .unwrap()
    }

    #[test]
    fn parses_filter_arguments() {
        assert_eq!(
            parse_filter("age_group = U12").unwrap(),
            ("age_group".to_string(), "U12".to_string())
        );
        assert!(parse_filter("U12").is_err());
        assert!(parse_filter("=U12").is_err());
    }

    #[test]
    fn parses_range_arguments() {
        assert_eq!(
            parse_range("price=10..50").unwrap(),
            RangeArg {
                name: "price".into(),
                min: Some(10.0),
                max: Some(50.0)
            }
        );
        assert_eq!(parse_range("price=..50").unwrap().min, None);
        assert_eq!(parse_range("price=10..").unwrap().max, None);
        assert!(parse_range("price=10").is_err());
        assert!(parse_range("price=cheap..50").is_err());
    }

    #[test]
    fn filter_values_follow_declared_kind() {
        let view = view();
        assert_eq!(
            filter_value(&view, "age_group", "U12").unwrap(),
            FilterValue::Equals("U12".into())
        );
        assert_eq!(
            filter_value(&view, "age_group", "U10, U12").unwrap(),
            FilterValue::OneOf(vec!["U10".into(), "U12".into()])
        );
        assert_eq!(filter_value(&view, "age_group", "ALL").unwrap(), FilterValue::Any);
        assert_eq!(
            filter_value(&view, "featured", "yes").unwrap(),
            FilterValue::Flag(true)
        );
        assert_eq!(
            filter_value(&view, "price", "..100").unwrap(),
            FilterValue::range(None, Some(100.0))
        );
        assert!(matches!(
            filter_value(&view, "featured", "maybe"),
            Err(CatalogError::InvalidFilter { .. })
        ));
        // A list with no values would otherwise match everything.
        for raw in [",", " , ,"] {
            let err = filter_value(&view, "age_group", raw).unwrap_err();
            assert_eq!(
                err.to_string(),
                "invalid value for filter 'age_group': expected at least one value"
            );
        }
        // Undeclared names are left for the engine to reject.
        assert_eq!(
            filter_value(&view, "risk", "low").unwrap(),
            FilterValue::Equals("low".into())
        );
    }

    #[test]
    fn builds_query_from_flags() {
        let cli = Cli::try_parse_from([
            "stride-catalog",
            "--records",
            "camps.json",
            "--config",
            "camps.yaml",
            "--search",
            "camp",
            "--category",
            "football",
            "--filter",
            "age_group=U12",
            "--range",
            "price=..200",
            "--sort",
            "rating_desc",
            "--limit",
            "5",
            "--collection-stats",
        ])
        .unwrap();
        let query = build_query(&cli, &view()).unwrap();

        assert_eq!(query.search_text(), "camp");
        assert_eq!(query.sort_key(), Some("rating_desc"));
        assert_eq!(query.get_limit(), Some(5));
        assert_eq!(query.filters().len(), 2);
        assert_eq!(
            query.get_aggregate_scope(),
            stride_query::AggregateScope::Collection
        );
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn renders_text() {
        let view = ViewConfig::from_yaml_str("search_fields: [title]").unwrap();
        let records = vec![
            serde_json::json!({ "id": 7, "title": "Elite Football Academy" }),
            serde_json::json!({ "title": "Unnumbered" }),
            serde_json::json!({ "id": 9 }),
        ];
        let engine = QueryEngine::from_view(&view).with_aggregates(|a| a.count("total"));
        let bundle = engine.run(&records, &Query::new()).unwrap();

        assert_eq!(
            render_text(&bundle, &view).unwrap(),
            "7  Elite Football Academy\n-  Unnumbered\n9\n\ntotal: 3\n3 results\n"
        );

        let page = engine.run(&records, &Query::new().limit(1)).unwrap();
        assert!(render_text(&page, &view).unwrap().ends_with("1 of 3 results\n"));

        let none = engine.run(&records, &Query::new().search("zzz")).unwrap();
        assert_eq!(render_text(&none, &view).unwrap(), "total: 0\nNo results found\n");

        let bare = QueryEngine::from_view(&view);
        let one = bare.run(&records[..1], &Query::new()).unwrap();
        assert_eq!(
            render_text(&one, &view).unwrap(),
            "7  Elite Football Academy\n1 result\n"
        );
    }
}

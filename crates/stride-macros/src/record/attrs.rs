//! Attribute parsing for the Record derive macro.
//!
//! Parses the `#[record(...)]` field attributes.

use proc_macro2::Span;
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Error, Ident, Lit, Meta, Result, Token,
};

/// How a field is exposed to queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    /// Searchable / equality-filterable text: `#[record(text)]`
    Text,
    /// Numeric value for ranges, sums and averages: `#[record(number)]`
    Number,
    /// Date for recency sorts: `#[record(timestamp)]`
    Timestamp,
    /// Boolean for flag filters: `#[record(flag)]`
    Flag,
}

impl RecordType {
    /// Parse a record type from an identifier.
    pub fn from_ident(ident: &Ident) -> Result<Self> {
        match ident.to_string().as_str() {
            "text" | "string" => Ok(RecordType::Text),
            "number" => Ok(RecordType::Number),
            "timestamp" | "date" => Ok(RecordType::Timestamp),
            "flag" | "bool" => Ok(RecordType::Flag),
            other => Err(Error::new(
                ident.span(),
                format!(
                    "unknown record type: '{}'. Expected one of: text, number, timestamp, flag",
                    other
                ),
            )),
        }
    }
}

/// Field-level attributes from `#[record(...)]`.
#[derive(Debug, Clone)]
pub struct RecordAttr {
    pub record_type: Option<RecordType>,
    pub skip: bool,
    /// Name queries use for the field (default: the Rust field name).
    pub rename: Option<String>,
    pub span: Span,
}

impl Default for RecordAttr {
    fn default() -> Self {
        RecordAttr {
            record_type: None,
            skip: false,
            rename: None,
            span: Span::call_site(),
        }
    }
}

impl Parse for RecordAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attr = RecordAttr::default();

        let content: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in content {
            match &meta {
                Meta::Path(p) => {
                    if p.is_ident("skip") {
                        attr.skip = true;
                    } else if let Some(ident) = p.get_ident() {
                        if attr.record_type.is_some() {
                            return Err(Error::new(ident.span(), "record type specified twice"));
                        }
                        attr.record_type = Some(RecordType::from_ident(ident)?);
                        attr.span = ident.span();
                    } else {
                        return Err(Error::new(
                            p.span(),
                            "expected record type: text, number, timestamp, flag, or skip",
                        ));
                    }
                }

                // rename = "query_name"
                Meta::NameValue(nv) => {
                    if !nv.path.is_ident("rename") {
                        return Err(Error::new(
                            nv.path.span(),
                            "unknown attribute. Expected: rename",
                        ));
                    }
                    match &nv.value {
                        syn::Expr::Lit(syn::ExprLit {
                            lit: Lit::Str(s), ..
                        }) => attr.rename = Some(s.value()),
                        other => {
                            return Err(Error::new(
                                other.span(),
                                "rename must be a string literal",
                            ))
                        }
                    }
                }

                _ => {
                    return Err(Error::new(
                        meta.span(),
                        "unknown record attribute. Expected: text, number, timestamp, flag, skip, or rename = \"...\"",
                    ));
                }
            }
        }

        if attr.skip && attr.record_type.is_some() {
            return Err(Error::new(
                attr.span,
                "a skipped field cannot also declare a record type",
            ));
        }

        Ok(attr)
    }
}

/// Extract `#[record(...)]` attributes from a field's attributes.
pub fn parse_record_attrs(attrs: &[Attribute]) -> Result<RecordAttr> {
    for attr in attrs {
        if attr.path().is_ident("record") {
            return attr.parse_args::<RecordAttr>();
        }
    }
    Ok(RecordAttr::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_record(tokens: &str) -> Result<RecordAttr> {
        syn::parse_str::<RecordAttr>(tokens)
    }

    #[test]
    fn test_record_types() {
        assert_eq!(parse_record("text").unwrap().record_type, Some(RecordType::Text));
        assert_eq!(parse_record("number").unwrap().record_type, Some(RecordType::Number));
        assert_eq!(
            parse_record("timestamp").unwrap().record_type,
            Some(RecordType::Timestamp)
        );
        assert_eq!(parse_record("flag").unwrap().record_type, Some(RecordType::Flag));
    }

    #[test]
    fn test_record_aliases() {
        assert_eq!(parse_record("string").unwrap().record_type, Some(RecordType::Text));
        assert_eq!(parse_record("bool").unwrap().record_type, Some(RecordType::Flag));
        assert_eq!(parse_record("date").unwrap().record_type, Some(RecordType::Timestamp));
    }

    #[test]
    fn test_record_skip() {
        let attr = parse_record("skip").unwrap();
        assert!(attr.skip);
        assert_eq!(attr.record_type, None);
    }

    #[test]
    fn test_record_rename() {
        let attr = parse_record(r#"text, rename = "ageGroup""#).unwrap();
        assert_eq!(attr.record_type, Some(RecordType::Text));
        assert_eq!(attr.rename, Some("ageGroup".to_string()));
    }

    #[test]
    fn test_record_invalid_type() {
        let err = parse_record("fuzzy").unwrap_err();
        assert!(err.to_string().contains("unknown record type"));
    }

    #[test]
    fn test_record_conflicts() {
        assert!(parse_record("text, number").is_err());
        assert!(parse_record("skip, flag").is_err());
        assert!(parse_record(r#"ty = "text""#).is_err());
        assert!(parse_record("rename = 3").is_err());
    }
}

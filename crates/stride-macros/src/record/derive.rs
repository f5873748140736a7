//! Implementation of the `#[derive(Record)]` macro.
//!
//! This macro generates an implementation of the `Record` trait, one name
//! constant per exposed field, and a `FIELDS` slice listing them all.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    spanned::Spanned, Data, DeriveInput, Error, Fields, GenericArgument, PathArguments, Result,
    Type,
};

use super::attrs::{parse_record_attrs, RecordType};

/// Main implementation of the Record derive macro.
pub fn record_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new(
                    input.span(),
                    "Record can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new(
                input.span(),
                "Record can only be derived for structs",
            ))
        }
    };

    let mut field_matches: Vec<TokenStream> = Vec::new();
    let mut field_constants: Vec<TokenStream> = Vec::new();
    let mut query_names: Vec<String> = Vec::new();

    for field in fields.iter() {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new(field.span(), "expected named field"))?;

        let record_attrs = parse_record_attrs(&field.attrs)?;
        if record_attrs.skip {
            continue;
        }

        // Unannotated fields are not exposed
        let record_type = match record_attrs.record_type {
            Some(t) => t,
            None => continue,
        };

        let query_name = record_attrs
            .rename
            .unwrap_or_else(|| field_name.to_string());
        if query_names.contains(&query_name) {
            return Err(Error::new(
                field.span(),
                format!("duplicate record field name '{}'", query_name),
            ));
        }

        let screaming = to_screaming_snake_case(&query_name);
        if screaming == "FIELDS" {
            return Err(Error::new(
                field.span(),
                "field name 'fields' clashes with the generated FIELDS constant; use rename",
            ));
        }
        let const_name = format_ident!("{}", screaming);

        field_constants.push(quote! {
            /// Field name constant for type-safe queries.
            pub const #const_name: &'static str = #query_name;
        });

        let value_expr = value_expr(record_type);
        let arm = match option_inner(&field.ty) {
            Some(_) => quote! {
                #query_name => match &self.#field_name {
                    ::core::option::Option::Some(v) => #value_expr,
                    ::core::option::Option::None => ::stride_query::Value::None,
                },
            },
            None => quote! {
                #query_name => {
                    let v = &self.#field_name;
                    #value_expr
                }
            },
        };
        field_matches.push(arm);
        query_names.push(query_name);
    }

    let expanded = quote! {
        impl #impl_generics #struct_name #ty_generics #where_clause {
            #(#field_constants)*

            /// Every field name exposed to queries.
            pub const FIELDS: &'static [&'static str] = &[#(#query_names),*];
        }

        impl #impl_generics ::stride_query::Record for #struct_name #ty_generics #where_clause {
            fn field_value(&self, field: &str) -> ::stride_query::Value<'_> {
                match field {
                    #(#field_matches)*
                    _ => ::stride_query::Value::None,
                }
            }

            fn field_names() -> ::core::option::Option<&'static [&'static str]> {
                ::core::option::Option::Some(Self::FIELDS)
            }
        }
    };

    Ok(expanded)
}

/// Value construction from a reference `v` to the (unwrapped) field.
fn value_expr(record_type: RecordType) -> TokenStream {
    match record_type {
        RecordType::Text => quote! {
            ::stride_query::Value::String(::core::convert::AsRef::<str>::as_ref(v))
        },
        RecordType::Number => quote! {
            ::stride_query::Value::Number(::stride_query::Number::from(*v))
        },
        RecordType::Timestamp => quote! {
            ::stride_query::Value::Timestamp(::stride_query::RecordTimestamp::record_timestamp(v))
        },
        RecordType::Flag => quote! {
            ::stride_query::Value::Bool(*v)
        },
    }
}

/// Returns `T` if `ty` is `Option<T>`.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    if path.qself.is_some() {
        return None;
    }
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) if args.args.len() == 1 => match args.args.first()? {
            GenericArgument::Type(inner) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}

/// Convert a string to SCREAMING_SNAKE_CASE.
fn to_screaming_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_was_lower = false;

    for c in s.chars() {
        if c.is_uppercase() {
            if prev_was_lower {
                result.push('_');
            }
            result.push(c);
            prev_was_lower = false;
        } else if c == '_' || c == '-' || c == ' ' {
            result.push('_');
            prev_was_lower = false;
        } else {
            result.push(c.to_ascii_uppercase());
            prev_was_lower = c.is_alphanumeric();
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(src: &str) -> Result<String> {
        let input: DeriveInput = syn::parse_str(src)?;
        record_derive_impl(input).map(|tokens| tokens.to_string())
    }

    #[test]
    fn test_screaming_snake_case() {
        assert_eq!(to_screaming_snake_case("title"), "TITLE");
        assert_eq!(to_screaming_snake_case("created_at"), "CREATED_AT");
        assert_eq!(to_screaming_snake_case("ageGroup"), "AGE_GROUP");
        assert_eq!(to_screaming_snake_case("risk-level"), "RISK_LEVEL");
        assert_eq!(to_screaming_snake_case("U12Rate"), "U12_RATE");
    }

    #[test]
    fn test_option_inner() {
        let ty: Type = syn::parse_str("Option<String>").unwrap();
        assert!(option_inner(&ty).is_some());
        let ty: Type = syn::parse_str("std::option::Option<u32>").unwrap();
        assert!(option_inner(&ty).is_some());
        let ty: Type = syn::parse_str("Vec<String>").unwrap();
        assert!(option_inner(&ty).is_none());
        let ty: Type = syn::parse_str("String").unwrap();
        assert!(option_inner(&ty).is_none());
    }

    #[test]
    fn test_expands_constants_and_fields() {
        let out = expand(
            r#"
            struct Camp {
                #[record(text)]
                title: String,
                #[record(text, rename = "ageGroup")]
                age_group: String,
                #[record(number)]
                rating: Option<f64>,
                #[record(skip)]
                secret: String,
                notes: String,
            }
            "#,
        )
        .unwrap();

        assert!(out.contains("pub const TITLE"));
        assert!(out.contains("pub const AGE_GROUP"));
        assert!(out.contains("pub const RATING"));
        assert!(!out.contains("SECRET"));
        assert!(!out.contains("NOTES"));
        assert!(out.contains("\"ageGroup\""));
        assert!(out.contains("FIELDS"));
        assert!(out.contains("Record for Camp"));
    }

    #[test]
    fn test_rejects_non_structs() {
        let err = expand("enum Sport { Football, Tennis }").unwrap_err();
        assert!(err.to_string().contains("only be derived for structs"));

        let err = expand("struct Pair(String, String);").unwrap_err();
        assert!(err.to_string().contains("named fields"));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let err = expand(
            r#"
            struct Drill {
                #[record(text)]
                name: String,
                #[record(text, rename = "name")]
                title: String,
            }
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate record field name"));
    }

    #[test]
    fn test_rejects_fields_constant_clash() {
        let err = expand(
            r#"
            struct Form {
                #[record(number)]
                fields: u32,
            }
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("FIELDS"));
    }
}

//! The [`Record`] trait and its implementations for JSON data.

use crate::value::{Number, Value};

/// An item of a displayable collection (a camp, a goal, an achievement...).
///
/// Usually derived with `#[derive(Record)]` from `stride-macros`, but small
/// types can implement it by hand:
///
/// ```
/// use stride_query::{Number, Record, Value};
///
/// struct Goal {
///     title: String,
///     progress: u32,
/// }
///
/// impl Record for Goal {
///     fn field_value(&self, field: &str) -> Value<'_> {
///         match field {
///             "title" => Value::String(&self.title),
///             "progress" => Value::Number(Number::from(self.progress)),
///             _ => Value::None,
///         }
///     }
///
///     fn field_names() -> Option<&'static [&'static str]> {
///         Some(&["title", "progress"])
///     }
/// }
/// ```
pub trait Record {
    /// Returns the value of `field`, or [`Value::None`] if the record has no
    /// such field or the field is empty.
    fn field_value(&self, field: &str) -> Value<'_>;

    /// Whether the record carries `field` at all, even with an empty value.
    ///
    /// Used when validating field configuration against schema-less data.
    fn has_field(&self, field: &str) -> bool {
        !self.field_value(field).is_none()
    }

    /// The static set of field names, when the type has one.
    ///
    /// Dynamic records (JSON objects) return `None`; field configuration is
    /// then checked against the data itself.
    fn field_names() -> Option<&'static [&'static str]>
    where
        Self: Sized,
    {
        None
    }
}

impl Record for serde_json::Map<String, serde_json::Value> {
    fn field_value(&self, field: &str) -> Value<'_> {
        self.get(field).map(json_value).unwrap_or(Value::None)
    }

    fn has_field(&self, field: &str) -> bool {
        self.contains_key(field)
    }
}

impl Record for serde_json::Value {
    fn field_value(&self, field: &str) -> Value<'_> {
        match self {
            serde_json::Value::Object(map) => map.field_value(field),
            _ => Value::None,
        }
    }

    fn has_field(&self, field: &str) -> bool {
        match self {
            serde_json::Value::Object(map) => map.contains_key(field),
            _ => false,
        }
    }
}

fn json_value(value: &serde_json::Value) -> Value<'_> {
    match value {
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(Number::I64(i))
            } else if let Some(u) = n.as_u64() {
                Value::Number(Number::U64(u))
            } else {
                n.as_f64()
                    .map(|f| Value::Number(Number::F64(f)))
                    .unwrap_or(Value::None)
            }
        }
        _ => Value::None,
    }
}

//! Free-text search matching.
//!
//! A search box matches a record when the trimmed, lowercased needle is a
//! substring of any searched field. An empty needle matches everything.

use crate::record::Record;

/// Pre-normalized free-text needle.
///
/// Normalization happens once per query rather than once per record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextMatcher {
    needle: String,
}

impl TextMatcher {
    /// Creates a matcher from raw search-box input.
    pub fn new(search_text: &str) -> Self {
        TextMatcher {
            needle: search_text.trim().to_lowercase(),
        }
    }

    /// Returns `true` if this matcher accepts every record.
    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    /// The normalized needle.
    pub fn needle(&self) -> &str {
        &self.needle
    }

    /// Tests a record against the needle across `fields` (logical OR).
    pub fn matches<R, S>(&self, record: &R, fields: &[S]) -> bool
    where
        R: Record + ?Sized,
        S: AsRef<str>,
    {
        if self.is_empty() {
            return true;
        }
        fields.iter().any(|field| {
            record
                .field_value(field.as_ref())
                .to_text()
                .to_lowercase()
                .contains(&self.needle)
        })
    }
}

/// One-shot form of [`TextMatcher::matches`].
///
/// ```
/// use serde_json::json;
/// use stride_query::matches;
///
/// let camp = json!({ "title": "Elite Football Academy" });
/// assert!(matches(&camp, "  FOOTBALL ", &["title"]));
/// assert!(!matches(&camp, "academyy", &["title"]));
/// ```
pub fn matches<R, S>(record: &R, search_text: &str, fields: &[S]) -> bool
where
    R: Record + ?Sized,
    S: AsRef<str>,
{
    TextMatcher::new(search_text).matches(record, fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_needle_matches_all() {
        let record = json!({ "title": "Splash Swimming Center" });
        assert!(matches(&record, "", &["title"]));
        assert!(matches(&record, "   ", &["title"]));
        // Even with no searchable fields at all.
        assert!(matches(&record, "", &[] as &[&str]));
    }

    #[test]
    fn case_insensitive_substring() {
        let record = json!({ "title": "Elite Football Academy" });
        assert!(matches(&record, "FOOTBALL", &["title"]));
        assert!(matches(&record, "ball aca", &["title"]));
        assert!(!matches(&record, "academyy", &["title"]));
    }

    #[test]
    fn any_field_matches() {
        let record = json!({
            "title": "Morning Drills",
            "description": "Dribbling and passing",
        });
        assert!(matches(&record, "passing", &["title", "description"]));
        assert!(!matches(&record, "passing", &["title"]));
    }

    #[test]
    fn missing_field_is_empty_text() {
        let record = json!({ "title": "Sprint Ladder" });
        assert!(!matches(&record, "ladder", &["description"]));
        assert!(matches(&record, "ladder", &["description", "title"]));
    }

    #[test]
    fn numbers_are_coerced() {
        let record = json!({ "title": "Season Opener", "year": 2024, "rating": 4.5 });
        assert!(matches(&record, "2024", &["year"]));
        assert!(matches(&record, "4.5", &["rating"]));
        assert!(!matches(&record, "2024", &["title"]));
    }

    #[test]
    fn needle_is_normalized_once() {
        let matcher = TextMatcher::new("  Elite ");
        assert_eq!(matcher.needle(), "elite");
        assert!(!matcher.is_empty());
    }
}

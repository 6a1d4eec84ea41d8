//! Filter validation shared by the evaluator and the SQL compiler.
//!
//! Both backends turn a `Filter` node into a [`FilterTarget`] here and then
//! match on it exhaustively, so they cannot disagree about which
//! field/operator/value combinations are valid.

use crate::search::types::{Field, Issue, Operator};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

/// Quote characters removed from full-text values.
const QUOTE_CHARS: [char; 5] = ['"', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}'];

/// A validated filter, ready to be lowered by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterTarget {
    /// Tag membership. `id` is the canonical form of a value shaped like a
    /// tag id.
    Tag {
        normalized_name: String,
        id: Option<String>,
    },
    /// Substring/prefix match on the name only.
    Name(String),
    /// Substring/prefix match on the content only.
    Content(String),
    /// Creation date on the given UTC calendar day.
    CreatedOn(NaiveDate),
    /// Creation instant compared with `at` (never `Operator::Eq`).
    CreatedCompare {
        operator: Operator,
        at: DateTime<Utc>,
    },
    /// Record has at least one tag.
    HasTags,
}

/// Validate a filter against the per-field operator table and parse its value.
pub fn resolve_filter(field: Field, operator: Operator, value: &str) -> Result<FilterTarget, Issue> {
    if !field.supports(operator) {
        return Err(Issue::unsupported_operator(field, operator));
    }

    match field {
        Field::Tag => Ok(FilterTarget::Tag {
            normalized_name: normalize_tag_name(value),
            id: canonical_identifier(value),
        }),
        Field::Name => Ok(FilterTarget::Name(value.to_string())),
        Field::Content => Ok(FilterTarget::Content(value.to_string())),
        Field::Created => {
            let at = parse_date_value(value).ok_or_else(|| Issue::invalid_date(value))?;
            match operator {
                Operator::Eq => Ok(FilterTarget::CreatedOn(at.date_naive())),
                Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte => {
                    Ok(FilterTarget::CreatedCompare { operator, at })
                }
            }
        }
        Field::Has => {
            if value.trim().eq_ignore_ascii_case("tags") {
                Ok(FilterTarget::HasTags)
            } else {
                Err(Issue::unsupported_has_value(value))
            }
        }
    }
}

/// Canonical form of a tag name for comparisons: trimmed, NFC, lowercase.
///
/// Stores that keep a normalized-name column must fill it with this.
pub fn normalize_tag_name(name: &str) -> String {
    name.trim().nfc().collect::<String>().to_lowercase()
}

/// Whether a tag filter value is a structured tag id (a UUID).
pub fn looks_like_identifier(value: &str) -> bool {
    Uuid::parse_str(value.trim()).is_ok()
}

/// Lowercase hyphenated form of a UUID-shaped value, `None` otherwise.
///
/// Stored tag ids are compared case-insensitively against this.
pub fn canonical_identifier(value: &str) -> Option<String> {
    Uuid::parse_str(value.trim())
        .ok()
        .map(|id| id.hyphenated().to_string())
}

/// Trim a full-text value and strip quote characters.
///
/// Both backends search for the result, and the SQL compiler places it in
/// an FTS5 string, which it then cannot close. Other punctuation is kept;
/// the FTS5 tokenizer treats it as a separator. Returns `None` when no
/// letter or digit is left, which both backends treat as matching nothing.
pub fn sanitize_fulltext(value: &str) -> Option<String> {
    let stripped: String = value
        .trim()
        .chars()
        .filter(|c| !QUOTE_CHARS.contains(c))
        .collect();
    let stripped = stripped.trim();
    if stripped.chars().any(char::is_alphanumeric) {
        Some(stripped.to_string())
    } else {
        None
    }
}

/// Parse a date filter value as a UTC instant.
///
/// Accepts `YYYY-MM-DD` (midnight), RFC 3339, and `YYYY-MM-DDTHH:MM:SS` or
/// `YYYY-MM-DD HH:MM:SS` (read as UTC).
pub fn parse_date_value(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(start_of_day(date));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.and_utc());
        }
    }
    None
}

/// Midnight UTC at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

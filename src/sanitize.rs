//! Document field sanitization for the index builder
//!
//! Every value that enters the store passes through here: text fields are
//! stripped of control characters, structured fields (tags/categories) are
//! canonicalized to a well-formed JSON array string, and dates are checked
//! against a real calendar. All three functions are total; a bad value
//! degrades to a clean default instead of failing the batch.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static DATE_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("valid date regex"));

/// Strip NUL and C0/C1 control characters, keeping newline, tab and
/// carriage return. Idempotent.
///
/// UTF-8 coercion is not needed here: `&str` is already valid UTF-8, and
/// the feed reader converts raw bytes with `from_utf8_lossy` before any
/// text reaches this function.
pub fn clean_text(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t' | '\r'))
        .collect()
}

/// Canonicalize a structured field (tags/categories) into a JSON array
/// string.
///
/// - `null` or a missing field becomes `[]`
/// - an array is re-serialized canonically, order preserved
/// - a string that itself parses as a JSON array is re-serialized
/// - a non-empty string that is not valid JSON is wrapped as a
///   single-element array
/// - anything else becomes `[]`
pub fn canonical_array(raw: &Value) -> String {
    let empty = "[]".to_string();
    match raw {
        Value::Null => empty,
        Value::Array(items) => serde_json::to_string(items).unwrap_or(empty),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => serde_json::to_string(&items).unwrap_or(empty),
            Ok(_) => empty,
            Err(_) if !s.is_empty() => {
                serde_json::to_string(&[s.as_str()]).unwrap_or(empty)
            }
            Err(_) => empty,
        },
        _ => empty,
    }
}

/// Check that a string is strictly `YYYY-MM-DD` and names a real calendar
/// date (leap years included). Callers substitute an empty date on `false`
/// rather than rejecting the record.
pub fn is_valid_date(s: &str) -> bool {
    let Some(caps) = DATE_SHAPE.captures(s) else {
        return false;
    };
    let (Ok(year), Ok(month), Ok(day)) = (
        caps[1].parse::<i32>(),
        caps[2].parse::<u32>(),
        caps[3].parse::<u32>(),
    ) else {
        return false;
    };
    NaiveDate::from_ymd_opt(year, month, day).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clean_text_strips_controls_keeps_whitespace() {
        let cleaned = clean_text("a\u{0}b\u{1}c\nd\te\r");
        assert_eq!(cleaned, "abc\nd\te\r");
        assert!(!cleaned.contains('\u{0}'));
    }

    #[test]
    fn clean_text_strips_c1_range() {
        assert_eq!(clean_text("x\u{85}y\u{9f}z"), "xyz");
    }

    #[test]
    fn clean_text_is_idempotent() {
        let inputs = ["plain", "with\u{7}bell", "tabs\tand\nnewlines", ""];
        for input in inputs {
            let once = clean_text(input);
            assert_eq!(clean_text(&once), once);
        }
    }

    #[test]
    fn canonical_array_null_is_empty() {
        assert_eq!(canonical_array(&Value::Null), "[]");
    }

    #[test]
    fn canonical_array_preserves_order() {
        assert_eq!(canonical_array(&json!(["a", "b"])), r#"["a","b"]"#);
    }

    #[test]
    fn canonical_array_wraps_plain_string() {
        assert_eq!(canonical_array(&json!("not json")), r#"["not json"]"#);
    }

    #[test]
    fn canonical_array_reserializes_embedded_array() {
        assert_eq!(canonical_array(&json!("[1,2]")), "[1,2]");
    }

    #[test]
    fn canonical_array_rejects_everything_else() {
        assert_eq!(canonical_array(&json!("")), "[]");
        assert_eq!(canonical_array(&json!("123")), "[]");
        assert_eq!(canonical_array(&json!({"k": "v"})), "[]");
        assert_eq!(canonical_array(&json!(42)), "[]");
    }

    #[test]
    fn valid_dates_accepted() {
        assert!(is_valid_date("2024-01-01"));
        assert!(is_valid_date("2024-02-29")); // leap year
        assert!(is_valid_date("2000-02-29")); // leap century
    }

    #[test]
    fn invalid_dates_rejected() {
        assert!(!is_valid_date("2023-02-29")); // not a leap year
        assert!(!is_valid_date("2024-02-30"));
        assert!(!is_valid_date("2024-13-01"));
        assert!(!is_valid_date("2024-00-10"));
        assert!(!is_valid_date("2024-1-1"));
        assert!(!is_valid_date("24-01-01"));
        assert!(!is_valid_date("2024-01-01extra"));
        assert!(!is_valid_date(""));
    }
}

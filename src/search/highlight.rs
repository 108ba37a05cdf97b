//! Result shaping: term highlighting and stored-field decoding
//!
//! Highlighting is markup-aware: the field is split on embedded `<...>`
//! spans so `<mark>` wrappers only ever land in plain text, never inside a
//! tag or attribute. Stored structured fields decode back to JSON arrays;
//! a record that fails to decode gets an empty list and a warning, and the
//! response carries on.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static MARKUP_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

/// Wrap every case-insensitive occurrence of each term in
/// `<mark>...</mark>`, leaving embedded markup untouched.
pub fn highlight_terms(text: &str, terms: &[String]) -> String {
    if text.is_empty() || terms.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for span in MARKUP_SPAN.find_iter(text) {
        out.push_str(&mark_terms(&text[last..span.start()], terms));
        out.push_str(span.as_str());
        last = span.end();
    }
    out.push_str(&mark_terms(&text[last..], terms));
    out
}

fn mark_terms(segment: &str, terms: &[String]) -> String {
    let mut marked = segment.to_string();
    for term in terms {
        let Ok(re) = Regex::new(&format!("(?i){}", regex::escape(term))) else {
            continue;
        };
        marked = re.replace_all(&marked, "<mark>${0}</mark>").into_owned();
    }
    marked
}

/// Decode a stored tags/categories value back into a JSON array.
///
/// Decode failure is a per-field, non-fatal condition: log which record is
/// bad, substitute an empty list, keep serving.
pub fn decode_structured(raw: &str, record_id: &str, field: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => Value::Array(items),
        _ => {
            tracing::warn!(
                record = %record_id,
                field,
                "stored structured field failed to decode, substituting empty list"
            );
            Value::Array(Vec::new())
        }
    }
}

/// Normalize a backend bm25 score into the response's `relevance_score`:
/// non-negative, rounded to 2 decimal places.
pub fn relevance_score(raw: f64) -> f64 {
    (raw.abs() * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn terms(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn highlights_case_insensitively() {
        let out = highlight_terms("Rust and more rust", &terms(&["rust"]));
        assert_eq!(out, "<mark>Rust</mark> and more <mark>rust</mark>");
    }

    #[test]
    fn markup_spans_left_untouched() {
        let out = highlight_terms(
            r#"<a href="rust.html">rust</a> guide"#,
            &terms(&["rust"]),
        );
        assert_eq!(out, r#"<a href="rust.html"><mark>rust</mark></a> guide"#);
    }

    #[test]
    fn empty_inputs_pass_through() {
        assert_eq!(highlight_terms("", &terms(&["x"])), "");
        assert_eq!(highlight_terms("plain", &[]), "plain");
    }

    #[test]
    fn regex_metacharacters_in_terms_are_literal() {
        let out = highlight_terms("a c++ guide", &terms(&["c++"]));
        assert_eq!(out, "a <mark>c++</mark> guide");
    }

    #[test]
    fn decode_valid_array() {
        assert_eq!(
            decode_structured(r#"["a","b"]"#, "doc-1", "tags"),
            json!(["a", "b"])
        );
    }

    #[test]
    fn decode_failure_substitutes_empty_list() {
        assert_eq!(decode_structured("{broken", "doc-1", "tags"), json!([]));
        assert_eq!(decode_structured("", "doc-1", "tags"), json!([]));
        // valid JSON, but not an array
        assert_eq!(decode_structured(r#"{"k":1}"#, "doc-1", "tags"), json!([]));
    }

    #[test]
    fn relevance_score_is_absolute_and_rounded() {
        assert_eq!(relevance_score(-3.14159), 3.14);
        assert_eq!(relevance_score(0.005), 0.01);
        assert_eq!(relevance_score(0.0), 0.0);
    }
}

//! Offline index builder
//!
//! Reads the site's JSON export, sanitizes every record, and rebuilds the
//! search store from scratch (the previous schema is dropped, never
//! patched). A malformed record is logged, counted and skipped; only a
//! missing/unreadable feed or an unopenable store aborts the run.

use std::path::Path;

use serde_json::Value;

use crate::error::{SearchError, SearchResult};
use crate::sanitize::{canonical_array, clean_text, is_valid_date};
use crate::store::{Document, SearchStore};

/// Outcome of one index build
#[derive(Debug, Default)]
pub struct BatchReport {
    pub indexed: usize,
    pub skipped: usize,
    /// Per-record failures: (record id or feed position, reason)
    pub errors: Vec<(String, String)>,
    /// Stored structured fields the post-build integrity scan could not decode
    pub malformed_stored: u64,
}

/// Build the search store at `db_path` from the JSON feed at `feed_path`.
pub async fn build_index(feed_path: &Path, db_path: &Path) -> SearchResult<BatchReport> {
    let bytes = tokio::fs::read(feed_path)
        .await
        .map_err(|e| SearchError::Feed(format!("{}: {e}", feed_path.display())))?;
    // Coerce to valid UTF-8 up front; invalid sequences become U+FFFD
    let text = String::from_utf8_lossy(&bytes);
    let records: Vec<Value> = serde_json::from_str(&text)
        .map_err(|e| SearchError::Feed(format!("invalid JSON in {}: {e}", feed_path.display())))?;

    tracing::info!(
        feed = %feed_path.display(),
        records = records.len(),
        "building search index"
    );

    let store = SearchStore::create(db_path).await?;
    let mut report = BatchReport::default();

    for (position, raw) in records.iter().enumerate() {
        match decode_record(raw) {
            Ok(doc) => match store.insert_document(&doc).await {
                Ok(()) => report.indexed += 1,
                Err(e) => record_failure(&mut report, doc.id, format!("insert failed: {e}")),
            },
            Err(reason) => record_failure(&mut report, format!("#{position}"), reason),
        }
    }

    store.optimize().await?;

    report.malformed_stored = store.verify_structured_fields().await?;
    if report.malformed_stored > 0 {
        tracing::warn!(
            count = report.malformed_stored,
            "integrity pass found stored structured fields that do not decode"
        );
    }

    tracing::info!(
        indexed = report.indexed,
        skipped = report.skipped,
        db = %db_path.display(),
        "search index built"
    );
    Ok(report)
}

fn record_failure(report: &mut BatchReport, key: String, reason: String) {
    tracing::warn!(record = %key, error = %reason, "skipping malformed record");
    report.errors.push((key, reason));
    report.skipped += 1;
}

/// Typed-optional decode with per-field defaults: an absent field and an
/// empty one are treated the same, and `href` is preferred over `url` for
/// the link field.
fn decode_record(raw: &Value) -> Result<Document, String> {
    let obj = raw
        .as_object()
        .ok_or_else(|| "record is not a JSON object".to_string())?;

    let id = clean_text(str_field(obj, "id").trim());
    if id.is_empty() {
        return Err("record has no id".to_string());
    }

    let link = {
        let href = str_field(obj, "href");
        if href.is_empty() { str_field(obj, "url") } else { href }
    };

    let date_raw = str_field(obj, "date").trim();
    let date = if is_valid_date(date_raw) {
        date_raw.to_string()
    } else {
        if !date_raw.is_empty() {
            tracing::debug!(record = %id, date = %date_raw, "invalid date, storing empty");
        }
        String::new()
    };

    Ok(Document {
        id,
        title: clean_text(str_field(obj, "title")),
        url: clean_text(link),
        content: clean_text(str_field(obj, "content")),
        summary: clean_text(str_field(obj, "summary")),
        date,
        section: clean_text(str_field(obj, "section")),
        tags: canonical_array(obj.get("tags").unwrap_or(&Value::Null)),
        categories: canonical_array(obj.get("categories").unwrap_or(&Value::Null)),
    })
}

fn str_field<'a>(obj: &'a serde_json::Map<String, Value>, key: &str) -> &'a str {
    obj.get(key).and_then(Value::as_str).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_prefers_href_over_url() {
        let doc = decode_record(&json!({
            "id": "a",
            "href": "/from-href/",
            "url": "/from-url/"
        }))
        .expect("decodes");
        assert_eq!(doc.url, "/from-href/");

        let doc = decode_record(&json!({"id": "a", "url": "/from-url/"})).expect("decodes");
        assert_eq!(doc.url, "/from-url/");
    }

    #[test]
    fn decode_rejects_records_without_id() {
        assert!(decode_record(&json!({"title": "no id"})).is_err());
        assert!(decode_record(&json!({"id": ""})).is_err());
        assert!(decode_record(&json!("not an object")).is_err());
    }

    #[test]
    fn decode_substitutes_empty_for_invalid_date() {
        let doc = decode_record(&json!({"id": "a", "date": "2024-02-30"})).expect("decodes");
        assert_eq!(doc.date, "");

        let doc = decode_record(&json!({"id": "a", "date": "2024-02-29"})).expect("decodes");
        assert_eq!(doc.date, "2024-02-29");
    }

    #[test]
    fn decode_canonicalizes_structured_fields() {
        let doc = decode_record(&json!({
            "id": "a",
            "tags": ["x", "y"],
            "categories": "solo"
        }))
        .expect("decodes");
        assert_eq!(doc.tags, r#"["x","y"]"#);
        assert_eq!(doc.categories, r#"["solo"]"#);

        let doc = decode_record(&json!({"id": "a"})).expect("decodes");
        assert_eq!(doc.tags, "[]");
        assert_eq!(doc.categories, "[]");
    }

    #[test]
    fn decode_strips_control_characters() {
        let doc = decode_record(&json!({"id": "a", "title": "bad\u{0}title"})).expect("decodes");
        assert_eq!(doc.title, "badtitle");
    }
}

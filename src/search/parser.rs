//! Query DSL parsing
//!
//! Turns a raw, human-typed search string into a [`ParsedQuery`]. Parsing
//! is total and deterministic: every input produces a value, never an
//! error. Each stage consumes its matches from the remaining text before
//! the next stage runs, so a quoted phrase can never be re-read as a field
//! clause and a date filter can never leak into the plain terms.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::sanitize::is_valid_date;

static PHRASE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]+)""#).expect("valid regex"));
static AFTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"after:(\d{4}-\d{2}-\d{2})").expect("valid regex"));
static BEFORE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"before:(\d{4}-\d{2}-\d{2})").expect("valid regex"));
static FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(title|tags|categories|content|summary):(\S+)").expect("valid regex"));

/// Minimum length for a plain search term; shorter tokens are discarded.
const MIN_TERM_LEN: usize = 2;

/// Document fields that may be scoped with `field:term` syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryField {
    Title,
    Tags,
    Categories,
    Content,
    Summary,
}

impl QueryField {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "title" => Some(Self::Title),
            "tags" => Some(Self::Tags),
            "categories" => Some(Self::Categories),
            "content" => Some(Self::Content),
            "summary" => Some(Self::Summary),
            _ => None,
        }
    }

    /// Column name in the FTS table
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Tags => "tags",
            Self::Categories => "categories",
            Self::Content => "content",
            Self::Summary => "summary",
        }
    }
}

/// Boolean operators detected in the raw query.
///
/// `NOT` is detected and reported back to the caller but does not negate
/// anything during compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BoolOp {
    And,
    Or,
    Not,
}

/// A `field:term` clause from the raw query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSearch {
    pub field: QueryField,
    pub term: String,
}

/// Structured form of a raw search string, built once per request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedQuery {
    pub terms: Vec<String>,
    pub phrases: Vec<String>,
    pub field_searches: Vec<FieldSearch>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub operators: BTreeSet<BoolOp>,
}

impl ParsedQuery {
    /// Parse a raw search string.
    ///
    /// Precedence: quoted phrases, then the first `after:`/`before:` date
    /// filter each, then field-scoped clauses, then whitespace tokens
    /// (operators and plain terms). Calendar-invalid date filters are
    /// consumed but dropped.
    pub fn parse(raw: &str) -> Self {
        let mut parsed = ParsedQuery::default();

        let mut rest = raw.to_string();
        for caps in PHRASE_RE.captures_iter(&rest) {
            parsed.phrases.push(caps[1].to_string());
        }
        rest = PHRASE_RE.replace_all(&rest, "").into_owned();

        rest = take_date_filter(&rest, &AFTER_RE, &mut parsed.after);
        rest = take_date_filter(&rest, &BEFORE_RE, &mut parsed.before);

        for caps in FIELD_RE.captures_iter(&rest) {
            if let Some(field) = QueryField::from_token(&caps[1]) {
                parsed.field_searches.push(FieldSearch {
                    field,
                    term: caps[2].to_string(),
                });
            }
        }
        rest = FIELD_RE.replace_all(&rest, "").into_owned();

        for token in rest.split_whitespace() {
            if token.eq_ignore_ascii_case("AND") {
                parsed.operators.insert(BoolOp::And);
            } else if token.eq_ignore_ascii_case("OR") {
                parsed.operators.insert(BoolOp::Or);
            } else if token.eq_ignore_ascii_case("NOT") {
                parsed.operators.insert(BoolOp::Not);
            } else if token.chars().count() >= MIN_TERM_LEN {
                parsed.terms.push(token.to_string());
            }
        }

        parsed
    }
}

/// Consume the first `after:`/`before:` match from `text`, recording the
/// date only when it is calendar-valid. Later occurrences are left in
/// place and fall through to the term stage.
fn take_date_filter(text: &str, re: &Regex, slot: &mut Option<String>) -> String {
    let Some(caps) = re.captures(text) else {
        return text.to_string();
    };
    if let (Some(whole), Some(date)) = (caps.get(0), caps.get(1)) {
        if is_valid_date(date.as_str()) {
            *slot = Some(date.as_str().to_string());
        }
        let mut out = String::with_capacity(text.len());
        out.push_str(&text[..whole.start()]);
        out.push_str(&text[whole.end()..]);
        return out;
    }
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_parses_to_empty_query() {
        let parsed = ParsedQuery::parse("");
        assert_eq!(parsed, ParsedQuery::default());

        let parsed = ParsedQuery::parse("   \t ");
        assert!(parsed.terms.is_empty());
        assert!(parsed.phrases.is_empty());
    }

    #[test]
    fn phrases_dates_and_unknown_fields() {
        let parsed = ParsedQuery::parse(r#""hello world" tag:foo after:2024-01-01 cats"#);
        assert_eq!(parsed.phrases, vec!["hello world"]);
        assert_eq!(parsed.after.as_deref(), Some("2024-01-01"));
        // "tag" is not a recognized field, so the token stays literal
        assert!(parsed.field_searches.is_empty());
        assert!(parsed.terms.contains(&"tag:foo".to_string()));
        assert!(parsed.terms.contains(&"cats".to_string()));
    }

    #[test]
    fn field_clauses_consumed_in_order() {
        let parsed = ParsedQuery::parse("title:rust summary:async plain");
        assert_eq!(parsed.field_searches.len(), 2);
        assert_eq!(parsed.field_searches[0].field, QueryField::Title);
        assert_eq!(parsed.field_searches[0].term, "rust");
        assert_eq!(parsed.field_searches[1].field, QueryField::Summary);
        assert_eq!(parsed.field_searches[1].term, "async");
        assert_eq!(parsed.terms, vec!["plain"]);
    }

    #[test]
    fn operators_detected_case_insensitively() {
        let parsed = ParsedQuery::parse("foo or bar NOT baz");
        assert!(parsed.operators.contains(&BoolOp::Or));
        assert!(parsed.operators.contains(&BoolOp::Not));
        assert!(!parsed.operators.contains(&BoolOp::And));
        assert_eq!(parsed.terms, vec!["foo", "bar", "baz"]);
    }

    #[test]
    fn short_tokens_discarded() {
        let parsed = ParsedQuery::parse("a bc d ef");
        assert_eq!(parsed.terms, vec!["bc", "ef"]);
    }

    #[test]
    fn invalid_date_filter_consumed_but_dropped() {
        let parsed = ParsedQuery::parse("after:2023-02-29 rust");
        assert_eq!(parsed.after, None);
        assert_eq!(parsed.terms, vec!["rust"]);
    }

    #[test]
    fn first_date_filter_wins() {
        let parsed = ParsedQuery::parse("after:2024-01-01 after:2024-02-02");
        assert_eq!(parsed.after.as_deref(), Some("2024-01-01"));
        // the second occurrence falls through to the term stage
        assert_eq!(parsed.terms, vec!["after:2024-02-02"]);
    }

    #[test]
    fn before_filter_recognized() {
        let parsed = ParsedQuery::parse("before:2024-06-15 notes");
        assert_eq!(parsed.before.as_deref(), Some("2024-06-15"));
        assert_eq!(parsed.terms, vec!["notes"]);
    }
}

//! FTS5 query compilation
//!
//! Compiles a [`ParsedQuery`] into the backend's boolean MATCH expression.
//! This is the only place FTS5 syntax is assembled; nothing else in the
//! crate concatenates query text.

use super::parser::{BoolOp, ParsedQuery};

/// Characters that force a term into quoted, exact-match form
const FTS5_SPECIALS: &[char] = &['"', '(', ')', '[', ']', ':', '+', '-', '^', '*'];

/// Compile a parsed query into an FTS5 MATCH expression.
///
/// Field clauses, phrases, then plain terms, conjoined with `AND`. Plain
/// terms collapse into one `(a OR b)` group when an explicit `OR` was
/// detected; otherwise each term is its own conjunct. Returns `None` when
/// there is nothing searchable, and callers must short-circuit to an empty
/// result set without touching the backend.
pub fn compile(parsed: &ParsedQuery) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();

    for fs in &parsed.field_searches {
        parts.push(format!("{}:{}", fs.field.as_str(), escape_term(&fs.term)));
    }

    for phrase in &parsed.phrases {
        parts.push(format!("\"{}\"", phrase.replace('"', "\"\"")));
    }

    if !parsed.terms.is_empty() {
        if parsed.operators.contains(&BoolOp::Or) {
            let group = parsed
                .terms
                .iter()
                .map(|t| escape_term(t))
                .collect::<Vec<_>>()
                .join(" OR ");
            parts.push(format!("({group})"));
        } else {
            parts.extend(parsed.terms.iter().map(|t| escape_term(t)));
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" AND "))
    }
}

/// Escape a single term for FTS5.
///
/// Terms carrying FTS5 syntax characters, or spelling a bare operator
/// keyword, are quoted (internal quotes doubled) and matched exactly.
/// Everything else gets a trailing `*` for prefix matching. A
/// user-supplied trailing `*` on an otherwise plain term already requests
/// prefix matching and is kept as-is, never doubled.
pub fn escape_term(term: &str) -> String {
    if let Some(stem) = term.strip_suffix('*') {
        if !stem.is_empty() && !needs_quoting(stem) {
            return term.to_string();
        }
    }
    if needs_quoting(term) {
        format!("\"{}\"", term.replace('"', "\"\""))
    } else {
        format!("{term}*")
    }
}

fn needs_quoting(term: &str) -> bool {
    term.contains(FTS5_SPECIALS)
        || term.eq_ignore_ascii_case("AND")
        || term.eq_ignore_ascii_case("OR")
        || term.eq_ignore_ascii_case("NOT")
}

//! Result ordering and pagination
//!
//! Secondary ranking on top of the backend's bm25 score, compiled into the
//! ORDER BY tail of the row query, plus the page/limit/offset math shared
//! by the service handlers.

use super::parser::ParsedQuery;
use crate::config::MAX_RESULTS;

/// Requested result ordering. Unrecognized values fall back to relevance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Title-boost partition, then bm25 (lower is better), then recency
    #[default]
    Relevance,
    DateDesc,
    DateAsc,
}

impl SortOrder {
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("date_desc") => Self::DateDesc,
            Some("date_asc") => Self::DateAsc,
            _ => Self::Relevance,
        }
    }

    /// ORDER BY tail for the row query. `c` is the content table, `f` the
    /// FTS mirror; FTS5 bm25 is more negative for better matches, so
    /// ascending order ranks best-first.
    pub(crate) fn order_clause(self) -> &'static str {
        match self {
            Self::Relevance => {
                "CASE WHEN c.title LIKE ? THEN 1 ELSE 2 END, bm25(f.search_fts), c.date DESC"
            }
            Self::DateDesc => "c.date DESC, bm25(f.search_fts)",
            Self::DateAsc => "c.date ASC, bm25(f.search_fts)",
        }
    }

    /// Whether the order clause carries the title-boost LIKE bind
    pub(crate) fn uses_title_boost(self) -> bool {
        matches!(self, Self::Relevance)
    }
}

/// LIKE pattern for the relevance title boost: the first plain term, or a
/// match-everything pattern when the query had none.
pub(crate) fn title_boost_pattern(parsed: &ParsedQuery) -> String {
    match parsed.terms.first() {
        Some(term) => format!("%{term}%"),
        None => "%".to_string(),
    }
}

/// A clamped page request: 1-indexed page number and effective limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub limit: u32,
}

impl Page {
    /// Clamp raw request values: page to a minimum of 1, limit to
    /// `[0, per_page_default]` and the hard cap of 100.
    pub fn new(requested_page: i64, requested_limit: Option<i64>, per_page_default: u32) -> Self {
        let number = requested_page.clamp(1, i64::from(u32::MAX)) as u32;
        let default = i64::from(per_page_default);
        let limit = requested_limit
            .unwrap_or(default)
            .min(default)
            .clamp(0, i64::from(MAX_RESULTS)) as u32;
        Self { number, limit }
    }

    pub fn offset(self) -> i64 {
        i64::from(self.number - 1) * i64::from(self.limit)
    }

    /// Number of pages needed for `total` results, 0 when the limit is 0
    pub fn total_pages(self, total: u64) -> u32 {
        if self.limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(self.limit)) as u32
        }
    }
}

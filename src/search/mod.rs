//! Search query pipeline and result shaping
//!
//! This module ties the per-request pipeline together: parse the raw
//! query, compile it to an FTS5 expression, run the count and row queries,
//! then shape rows into the response envelope. The pipeline is pure per
//! request: an immutable [`SearchRequest`] goes in, a [`SearchResponse`]
//! comes out, and nothing is shared between requests.

pub mod compiler;
pub mod highlight;
pub mod parser;
pub mod rank;

pub use compiler::{compile, escape_term};
pub use parser::{BoolOp, FieldSearch, ParsedQuery, QueryField};
pub use rank::{Page, SortOrder};

use serde::Serialize;
use serde_json::Value;

use crate::config::ServiceConfig;
use crate::error::SearchResult;
use crate::store::{Filters, MatchedRow, SearchStore};

/// Immutable request context for one search
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub page: i64,
    pub section: Option<String>,
    pub sort: SortOrder,
    pub limit: Option<i64>,
}

/// One shaped result row in the response envelope
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub url: String,
    pub summary: String,
    pub date: String,
    pub section: String,
    pub tags: Value,
    pub categories: Value,
    pub content_snippet: String,
    pub title_highlighted: String,
    pub summary_highlighted: String,
    pub relevance_score: f64,
}

/// Search response envelope.
///
/// The short-circuit path (query too short, nothing compilable) omits
/// `total_pages`, `parsed_query` and `fts_query`.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed_query: Option<ParsedQuery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fts_query: Option<String>,
}

/// Run one search end to end.
///
/// Queries shorter than two characters and queries that compile to
/// nothing searchable return an empty envelope without touching the
/// backend. `total` comes from a count-only execution of the same
/// predicate, so pagination metadata is independent of ranking.
pub async fn execute_search(
    cfg: &ServiceConfig,
    store: &SearchStore,
    req: &SearchRequest,
) -> SearchResult<SearchResponse> {
    let raw_query = req.query.trim();
    let page = Page::new(req.page, req.limit, cfg.results_per_page);

    if raw_query.chars().count() < 2 {
        return Ok(empty_response(raw_query, page));
    }

    let parsed = ParsedQuery::parse(raw_query);
    let Some(fts_query) = compile(&parsed) else {
        return Ok(empty_response(raw_query, page));
    };

    let filters = Filters {
        section: req
            .section
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        after: parsed.after.clone(),
        before: parsed.before.clone(),
    };

    let start = std::time::Instant::now();
    let total = store.count_matches(&fts_query, &filters).await?;
    let boost = rank::title_boost_pattern(&parsed);
    let rows = store
        .fetch_matches(
            &fts_query,
            &filters,
            req.sort,
            &boost,
            i64::from(page.limit),
            page.offset(),
        )
        .await?;

    let results: Vec<SearchHit> = rows.iter().map(|row| shape_hit(row, &parsed.terms)).collect();

    tracing::info!(
        query = %raw_query,
        fts_query = %fts_query,
        total,
        returned = results.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "search completed"
    );

    Ok(SearchResponse {
        results,
        total,
        page: page.number,
        per_page: page.limit,
        total_pages: Some(page.total_pages(total.max(0) as u64)),
        query: raw_query.to_string(),
        parsed_query: Some(parsed),
        fts_query: Some(fts_query),
    })
}

fn empty_response(query: &str, page: Page) -> SearchResponse {
    SearchResponse {
        results: Vec::new(),
        total: 0,
        page: page.number,
        per_page: page.limit,
        total_pages: None,
        query: query.to_string(),
        parsed_query: None,
        fts_query: None,
    }
}

fn shape_hit(row: &MatchedRow, terms: &[String]) -> SearchHit {
    SearchHit {
        id: row.id.clone(),
        title: row.title.clone(),
        url: row.url.clone(),
        summary: row.summary.clone(),
        date: row.date.clone(),
        section: row.section.clone(),
        tags: highlight::decode_structured(&row.tags, &row.id, "tags"),
        categories: highlight::decode_structured(&row.categories, &row.id, "categories"),
        content_snippet: row.content_snippet.clone(),
        title_highlighted: highlight::highlight_terms(&row.title, terms),
        summary_highlighted: highlight::highlight_terms(&row.summary, terms),
        relevance_score: highlight::relevance_score(row.relevance),
    }
}

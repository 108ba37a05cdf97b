//! SQLite-backed search store
//!
//! This layer owns every piece of SQL in the crate: the rebuild schema,
//! document inserts, and the match/count/sections queries the service
//! runs. The FTS5 engine itself (porter stemming, `bm25()` scoring,
//! `snippet()` excerpting) is consumed as-is, never reimplemented.
//!
//! The builder opens the store read-write and recreates the schema from
//! scratch (a rebuild is full, not incremental); the query service opens
//! it read-only, one connection per request.

use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use crate::error::{SearchError, SearchResult};
use crate::search::rank::SortOrder;

/// Rebuild script: the metadata table, its FTS5 mirror, sync triggers,
/// and the metadata indexes the service filters on.
const SCHEMA_SQL: &str = r#"
DROP TABLE IF EXISTS search_fts;
DROP TABLE IF EXISTS search_content;

-- Main content table (metadata + stored fields)
CREATE TABLE search_content (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    url TEXT NOT NULL,
    content TEXT,
    summary TEXT,
    date TEXT,
    section TEXT,
    tags TEXT,
    categories TEXT
);

-- FTS5 mirror with porter stemming, sourced from the content table
CREATE VIRTUAL TABLE search_fts USING fts5(
    title,
    content,
    summary,
    tags,
    categories,
    content='search_content',
    content_rowid='rowid',
    tokenize='porter'
);

-- Keep the FTS mirror in sync with the content table
CREATE TRIGGER search_content_ai AFTER INSERT ON search_content BEGIN
    INSERT INTO search_fts(rowid, title, content, summary, tags, categories)
    VALUES (new.rowid, new.title, new.content, new.summary, new.tags, new.categories);
END;

CREATE TRIGGER search_content_ad AFTER DELETE ON search_content BEGIN
    DELETE FROM search_fts WHERE rowid = old.rowid;
END;

CREATE TRIGGER search_content_au AFTER UPDATE ON search_content BEGIN
    UPDATE search_fts
    SET title = new.title,
        content = new.content,
        summary = new.summary,
        tags = new.tags,
        categories = new.categories
    WHERE rowid = new.rowid;
END;

-- Indexes for the service's structured filters
CREATE INDEX idx_section ON search_content(section);
CREATE INDEX idx_date ON search_content(date);
CREATE INDEX idx_section_date ON search_content(section, date);
"#;

/// A sanitized, persisted site document.
///
/// `tags` and `categories` hold the canonical JSON-array serialization
/// produced by [`crate::sanitize::canonical_array`]; `date` is either
/// empty or a calendar-valid `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub url: String,
    pub content: String,
    pub summary: String,
    pub date: String,
    pub section: String,
    pub tags: String,
    pub categories: String,
}

/// Structured filters applied alongside the MATCH expression
#[derive(Debug, Clone, Default)]
pub struct Filters {
    pub section: Option<String>,
    pub after: Option<String>,
    pub before: Option<String>,
}

impl Filters {
    /// WHERE clause shared by the count and row queries, so pagination
    /// metadata always agrees with the fetched page.
    fn predicate(&self) -> String {
        let mut sql = String::from(" WHERE f.search_fts MATCH ?");
        if self.section.is_some() {
            sql.push_str(" AND c.section = ?");
        }
        if self.after.is_some() {
            sql.push_str(" AND c.date >= ?");
        }
        if self.before.is_some() {
            sql.push_str(" AND c.date <= ?");
        }
        sql
    }
}

/// One matching row as returned by the backend, before shaping
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MatchedRow {
    pub id: String,
    pub title: String,
    pub url: String,
    pub summary: String,
    pub date: String,
    pub section: String,
    pub tags: String,
    pub categories: String,
    /// Raw bm25 score (more negative = more relevant)
    pub relevance: f64,
    /// Marked-up excerpt from the content column
    pub content_snippet: String,
}

/// Handle on the SQLite search store
#[derive(Clone)]
pub struct SearchStore {
    pool: SqlitePool,
}

impl SearchStore {
    /// Create (or reset) the store for a full rebuild, dropping any prior
    /// schema first.
    pub async fn create(path: &Path) -> SearchResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| SearchError::StoreOpen(format!("{}: {e}", path.display())))?;

        sqlx::raw_sql(SCHEMA_SQL).execute(&pool).await?;
        tracing::info!(db = %path.display(), "search store schema created");

        Ok(Self { pool })
    }

    /// Open an existing store read-only. Each service request opens its
    /// own handle; a missing or corrupt file is a fatal setup error.
    pub async fn open_readonly(path: &Path) -> SearchResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| SearchError::StoreOpen(format!("{}: {e}", path.display())))?;

        Ok(Self { pool })
    }

    pub async fn insert_document(&self, doc: &Document) -> SearchResult<()> {
        sqlx::query(
            "INSERT INTO search_content \
             (id, title, url, content, summary, date, section, tags, categories) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&doc.id)
        .bind(&doc.title)
        .bind(&doc.url)
        .bind(&doc.content)
        .bind(&doc.summary)
        .bind(&doc.date)
        .bind(&doc.section)
        .bind(&doc.tags)
        .bind(&doc.categories)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Post-build compaction/statistics pass: merge the FTS index, refresh
    /// planner statistics, reclaim free pages.
    pub async fn optimize(&self) -> SearchResult<()> {
        sqlx::query("INSERT INTO search_fts(search_fts) VALUES('optimize')")
            .execute(&self.pool)
            .await?;
        sqlx::raw_sql("ANALYZE; VACUUM;").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn count_documents(&self) -> SearchResult<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM search_content")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    /// Full-corpus integrity pass: decode every stored structured field
    /// and return how many fail to parse as a JSON array. Failures are
    /// logged per record; this never hard-fails a build.
    pub async fn verify_structured_fields(&self) -> SearchResult<u64> {
        let rows = sqlx::query("SELECT id, tags, categories FROM search_content")
            .fetch_all(&self.pool)
            .await?;

        let mut malformed = 0u64;
        for row in &rows {
            let id: String = row.try_get("id")?;
            for field in ["tags", "categories"] {
                let raw: String = row.try_get(field)?;
                if !matches!(serde_json::from_str::<Value>(&raw), Ok(Value::Array(_))) {
                    tracing::warn!(
                        record = %id,
                        field,
                        "stored structured field does not parse as a JSON array"
                    );
                    malformed += 1;
                }
            }
        }
        Ok(malformed)
    }

    /// Count rows matching the expression and filters, without ranking or
    /// pagination clauses.
    pub async fn count_matches(&self, fts_query: &str, filters: &Filters) -> SearchResult<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM search_content c \
             JOIN search_fts f ON c.rowid = f.rowid{}",
            filters.predicate()
        );

        let mut query = sqlx::query_scalar::<_, i64>(&sql).bind(fts_query);
        if let Some(section) = &filters.section {
            query = query.bind(section);
        }
        if let Some(after) = &filters.after {
            query = query.bind(after);
        }
        if let Some(before) = &filters.before {
            query = query.bind(before);
        }

        Ok(query.fetch_one(&self.pool).await?)
    }

    /// Fetch one ordered page of matching rows.
    ///
    /// `title_boost` is the LIKE pattern for the relevance sort's boost
    /// partition; it is only bound when `sort` uses it.
    pub async fn fetch_matches(
        &self,
        fts_query: &str,
        filters: &Filters,
        sort: SortOrder,
        title_boost: &str,
        limit: i64,
        offset: i64,
    ) -> SearchResult<Vec<MatchedRow>> {
        let sql = format!(
            "SELECT c.id, c.title, c.url, c.summary, c.date, c.section, c.tags, c.categories, \
             bm25(f.search_fts) AS relevance, \
             snippet(f.search_fts, 1, '<mark>', '</mark>', '...', 32) AS content_snippet \
             FROM search_content c \
             JOIN search_fts f ON c.rowid = f.rowid{} \
             ORDER BY {} LIMIT ? OFFSET ?",
            filters.predicate(),
            sort.order_clause()
        );

        let mut query = sqlx::query_as::<_, MatchedRow>(&sql).bind(fts_query);
        if let Some(section) = &filters.section {
            query = query.bind(section);
        }
        if let Some(after) = &filters.after {
            query = query.bind(after);
        }
        if let Some(before) = &filters.before {
            query = query.bind(before);
        }
        if sort.uses_title_boost() {
            query = query.bind(title_boost);
        }
        query = query.bind(limit).bind(offset);

        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Distinct non-empty section values, sorted.
    pub async fn sections(&self) -> SearchResult<Vec<String>> {
        let sections = sqlx::query_scalar(
            "SELECT DISTINCT section FROM search_content WHERE section != '' ORDER BY section",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(sections)
    }
}

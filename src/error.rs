//! Error types for the search index and query service
//!
//! Fatal setup failures (unreadable feed, unopenable store) get their own
//! variants; everything recoverable (a malformed record, an undecodable
//! stored field) is handled in place and never surfaces as an error.

use thiserror::Error;

/// Result type alias for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Error types for index building and query serving
#[derive(Debug, Error)]
pub enum SearchError {
    /// Search store could not be opened or created
    #[error("Failed to open search store: {0}")]
    StoreOpen(String),

    /// Document feed is missing or not valid JSON
    #[error("Search feed error: {0}")]
    Feed(String),

    /// Underlying SQLite/FTS5 failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding error outside the per-record paths
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

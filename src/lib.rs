//! Full-text search for static sites
//!
//! Two halves share one pipeline: an offline index builder that ingests a
//! site's JSON export into a SQLite FTS5 store, and a stateless query
//! service that parses a small search DSL, compiles it to an FTS5 MATCH
//! expression, and returns ranked, highlighted, paginated JSON.

pub mod config;
pub mod error;
pub mod index;
pub mod sanitize;
pub mod search;
pub mod server;
pub mod store;

pub use config::ServiceConfig;
pub use error::{SearchError, SearchResult};
pub use index::{BatchReport, build_index};
pub use search::{
    ParsedQuery, SearchHit, SearchRequest, SearchResponse, SortOrder, execute_search,
};
pub use store::{Document, SearchStore};

//! Service configuration
//!
//! Small on purpose: the query service is stateless, so the only knobs are
//! where the store lives and how pages are sized.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Hard ceiling on a single result page, regardless of caller input.
pub const MAX_RESULTS: u32 = 100;

/// Configuration for the query service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Path to the SQLite search store produced by the index builder
    pub db_path: PathBuf,
    /// Default (and maximum requestable) page size
    pub results_per_page: u32,
}

impl ServiceConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            results_per_page: 20,
        }
    }

    #[must_use]
    pub fn with_results_per_page(mut self, per_page: u32) -> Self {
        self.results_per_page = per_page.min(MAX_RESULTS);
        self
    }
}

//! Data structures for web search functionality

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::engine::SearchEngine;
use super::errors::SearchError;

// =============================================================================
// Request
// =============================================================================

/// One search invocation, validated on construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    query: String,
    max_results: usize,
    page_timeout: Duration,
}

impl SearchRequest {
    /// Validate and build a request
    ///
    /// The query is trimmed; it must be non-empty. `max_results` and
    /// `page_timeout` must be positive.
    pub fn new(
        query: impl AsRef<str>,
        max_results: usize,
        page_timeout: Duration,
    ) -> Result<Self, SearchError> {
        let query = query.as_ref().trim();
        if query.is_empty() {
            return Err(SearchError::InvalidRequest(
                "Search query cannot be empty".to_string(),
            ));
        }
        if max_results == 0 {
            return Err(SearchError::InvalidRequest(
                "max_results must be at least 1".to_string(),
            ));
        }
        if page_timeout.is_zero() {
            return Err(SearchError::InvalidRequest(
                "page timeout must be at least 1ms".to_string(),
            ));
        }

        Ok(Self {
            query: query.to_string(),
            max_results,
            page_timeout,
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub fn page_timeout(&self) -> Duration {
        self.page_timeout
    }
}

// =============================================================================
// Results
// =============================================================================

/// A single search result with rank, title, URL, and snippet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Result ranking (1-indexed, on-page order)
    pub rank: usize,

    /// Page title
    pub title: String,

    /// Absolute page URL
    pub url: String,

    /// Description snippet, may be empty
    pub snippet: String,
}

/// Ordered results of one query, never longer than the request's cap
///
/// Only [`SearchResponse::new`] builds one, so the cap always holds.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    query: String,
    engine: SearchEngine,
    parser_version: String,
    /// The page did not reach its ready condition before the timeout
    partial: bool,
    searched_at: DateTime<Utc>,
    results: Vec<SearchResult>,
}

impl SearchResponse {
    /// Build a response, truncating `results` to `max_results`
    #[must_use]
    pub fn new(
        request: &SearchRequest,
        engine: SearchEngine,
        parser_version: impl Into<String>,
        partial: bool,
        mut results: Vec<SearchResult>,
    ) -> Self {
        results.truncate(request.max_results());
        Self {
            query: request.query().to_string(),
            engine,
            parser_version: parser_version.into(),
            partial,
            searched_at: Utc::now(),
            results,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn engine(&self) -> SearchEngine {
        self.engine
    }

    pub fn parser_version(&self) -> &str {
        &self.parser_version
    }

    pub fn is_partial(&self) -> bool {
        self.partial
    }

    pub fn searched_at(&self) -> DateTime<Utc> {
        self.searched_at
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Text of a result's destination page, or why it could not be read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum PageContent {
    Text(String),
    Failed(String),
}

/// A search result together with the content of the page it points to
#[derive(Debug, Clone, Serialize)]
pub struct FetchedResult {
    pub result: SearchResult,
    pub content: PageContent,
}

//! Web search functionality using browser automation
//!
//! Orchestrates one query end to end: acquire a tab from the
//! [`BrowserManager`], navigate and wait ([`executor`]), parse the captured
//! page ([`parser`]), release the tab.
//!
//! # Architecture
//! - `types` - Request/response data structures
//! - `engine` - Search engines and query URLs
//! - `parser` - Versioned result-markup parsers
//! - `executor` - Navigation, readiness wait and capture
//! - `content` - Destination page text for fetched results
//! - `format` - Text renderings for tools and the CLI
//!
//! # Usage
//! ```no_run
//! use kodegen_tools_kagi::{Config, web_search::SearchService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let service = SearchService::new(Config::from_env()?);
//!     let response = service.search("rust programming").await?;
//!     println!("Found {} results", response.len());
//!     service.shutdown().await;
//!     Ok(())
//! }
//! ```

mod content;
mod engine;
mod errors;
mod executor;
mod format;
mod parser;
mod types;

pub use content::{fetch_page_text, html_to_text, truncate_chars};
pub use engine::{DUCKDUCKGO_SEARCH_URL, KAGI_SEARCH_URL, SearchEngine};
pub use errors::{ParseError, SearchError, SearchStage};
pub use executor::{
    NavigationTimedOut, Readiness, SearchPage, capture_html, execute_query, is_navigation_timeout,
    run_search_on_page,
};
pub use format::{format_fetched, format_results, summary_line};
pub use parser::{
    DUCKDUCKGO_REACT, KAGI_V2, LayoutParser, ResultParser, SelectorLayout, default_parser,
    known_parser_versions, parser_for,
};
pub use types::{FetchedResult, PageContent, SearchRequest, SearchResponse, SearchResult};

use std::sync::Arc;

use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::manager::BrowserManager;

/// Search pipeline bound to one configuration and one browser manager
pub struct SearchService {
    config: Config,
    manager: Arc<BrowserManager>,
    parser: &'static dyn ResultParser,
}

impl SearchService {
    pub fn new(config: Config) -> Self {
        let manager = Arc::new(BrowserManager::new(config.browser.clone()));
        Self::with_manager(config, manager)
    }

    pub fn with_manager(config: Config, manager: Arc<BrowserManager>) -> Self {
        let parser = parser_for(&config.search.parser_version)
            .unwrap_or_else(|| default_parser(config.search.engine));
        Self {
            config,
            manager,
            parser,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn manager(&self) -> &Arc<BrowserManager> {
        &self.manager
    }

    pub fn parser(&self) -> &'static dyn ResultParser {
        self.parser
    }

    /// Build a request for `query` with the configured cap and timeout
    pub fn request(&self, query: &str) -> Result<SearchRequest, SearchError> {
        SearchRequest::new(
            query,
            self.config.search.results_max,
            self.config.search.page_timeout,
        )
    }

    /// Search with the configured limits
    pub async fn search(&self, query: &str) -> Result<SearchResponse, SearchError> {
        let request = self.request(query)?;
        self.search_with(&request).await
    }

    /// Search with an explicit request
    pub async fn search_with(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
        let span = info_span!("search", request_id = %Uuid::new_v4(), query = request.query());

        async {
            info!("Starting web search");
            let lease = self.manager.acquire_page().await?;
            let outcome = run_search_on_page(lease.page(), self.parser, request).await;
            lease.release().await;

            match &outcome {
                Ok(response) => info!(
                    "Search completed with {} result(s){}",
                    response.len(),
                    if response.is_partial() { " (partial)" } else { "" }
                ),
                Err(e) => warn!("Search failed during {} stage: {}", e.stage(), e),
            }
            outcome
        }
        .instrument(span)
        .await
    }

    /// Search, then load every result in its own tab and read its text
    ///
    /// Result pages are fetched concurrently. A result whose page cannot be
    /// loaded carries [`PageContent::Failed`] instead of failing the call.
    pub async fn search_and_fetch(
        &self,
        request: &SearchRequest,
    ) -> Result<(SearchResponse, Vec<FetchedResult>), SearchError> {
        let response = self.search_with(request).await?;
        let timeout = request.page_timeout();
        let char_limit = self.config.search.content_char_limit;

        let fetches = response.results().iter().cloned().map(|result| async move {
            let content = match self.manager.acquire_page().await {
                Ok(lease) => {
                    let content =
                        fetch_page_text(lease.page(), &result.url, timeout, char_limit).await;
                    lease.release().await;
                    content
                }
                Err(e) => PageContent::Failed(e.to_string()),
            };
            FetchedResult { result, content }
        });

        let fetched = futures::future::join_all(fetches).await;
        Ok((response, fetched))
    }

    /// Disconnect from the browser
    pub async fn shutdown(&self) {
        self.manager.shutdown().await;
    }
}

//! Kagi search tools for AI agents
//!
//! Runs web searches through the user's own logged-in Chrome-family browser
//! over the DevTools protocol and returns the scraped results via MCP.

pub mod browser;
pub mod browser_setup;
pub mod config;
mod manager;
pub mod server;
mod tools;
pub mod utils;
pub mod web_search;

use std::sync::Arc;

pub use browser::{BrowserError, BrowserResult, BrowserWrapper, PageLease, find_browser_executable};
pub use config::{BrowserConfig, CdpEndpoint, Config, ConfigError, SearchConfig, SessionPolicy};
pub use manager::BrowserManager;
pub use server::{KagiSearchServer, serve_stdio};
pub use tools::{KagiSearchArgs, KagiSearchFetchArgs};
pub use web_search::{SearchError, SearchResponse, SearchResult, SearchService};

/// Build the search service for `config` and serve MCP on stdio until the
/// client goes away
pub async fn start_server(config: Config) -> anyhow::Result<()> {
    let service = Arc::new(SearchService::new(config));
    serve_stdio(service).await
}

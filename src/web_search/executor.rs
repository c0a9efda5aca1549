//! Query execution: navigate, wait for the results page, capture it
//!
//! The executor only needs a handful of page operations, expressed by
//! [`SearchPage`]. The browser module implements it for chromiumoxide pages;
//! tests implement it with canned pages.

use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::engine::SearchEngine;
use super::errors::{ParseError, SearchError};
use super::parser::ResultParser;
use super::types::{SearchRequest, SearchResponse};
use crate::utils::constants::CONTENT_CAPTURE_TIMEOUT_MS;
use crate::utils::wait_for_selector;

/// Page operations the search pipeline relies on
#[async_trait]
pub trait SearchPage: Send + Sync {
    /// Navigate to `url`, resolving once the browser reports the navigation
    ///
    /// Fails with [`NavigationTimedOut`] when the browser gave up waiting.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Whether `selector` currently matches an element
    async fn has_selector(&self, selector: &str) -> bool;

    /// Serialized DOM of the current document
    async fn html(&self) -> Result<String>;

    /// Current address, if the page has one
    async fn current_url(&self) -> Option<String>;
}

/// Returned by [`SearchPage::navigate`] when the browser itself gave up
/// waiting for the navigation
///
/// Treated like missing the page deadline: extraction continues on
/// whatever loaded.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("navigation timed out in the browser")]
pub struct NavigationTimedOut;

/// Whether a navigation error only says the page was too slow
pub fn is_navigation_timeout(error: &anyhow::Error) -> bool {
    error.is::<NavigationTimedOut>()
}

/// Outcome of waiting for the results page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    /// The deadline passed first; extraction proceeds on what loaded
    TimedOut,
}

/// Navigate to the engine's results page and wait for `ready_selector`
///
/// Navigation and readiness share one `page_timeout` budget. Missing the
/// deadline is not an error: the caller extracts whatever loaded and marks
/// the response partial.
pub async fn execute_query<P>(
    page: &P,
    engine: SearchEngine,
    ready_selector: &str,
    request: &SearchRequest,
) -> Result<Readiness, SearchError>
where
    P: SearchPage + ?Sized,
{
    let url = engine
        .search_url(request.query())
        .map_err(|e| SearchError::Navigation {
            url: engine.base_url().to_string(),
            reason: format!("could not build search URL: {e}"),
        })?;

    let budget = request.page_timeout();
    let started = Instant::now();

    info!("Navigating to {} search: {}", engine, url);
    match tokio::time::timeout(budget, page.navigate(url.as_str())).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) if is_navigation_timeout(&e) => {
            warn!("Browser timed out the navigation, extracting best effort");
            return Ok(Readiness::TimedOut);
        }
        Ok(Err(e)) => {
            return Err(SearchError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            });
        }
        Err(_) => {
            warn!(
                "Navigation did not complete within {}ms, extracting best effort",
                budget.as_millis()
            );
            return Ok(Readiness::TimedOut);
        }
    }

    let remaining = budget.saturating_sub(started.elapsed());
    if wait_for_selector(page, ready_selector, remaining).await {
        debug!("Results page ready after {:?}", started.elapsed());
        Ok(Readiness::Ready)
    } else {
        warn!(
            "Ready selector '{}' not present within {}ms, extracting best effort",
            ready_selector,
            budget.as_millis()
        );
        Ok(Readiness::TimedOut)
    }
}

/// Read the page HTML, bounded by [`CONTENT_CAPTURE_TIMEOUT_MS`]
pub async fn capture_html<P>(page: &P) -> Result<String, SearchError>
where
    P: SearchPage + ?Sized,
{
    let limit = Duration::from_millis(CONTENT_CAPTURE_TIMEOUT_MS);
    match tokio::time::timeout(limit, page.html()).await {
        Ok(Ok(html)) => Ok(html),
        Ok(Err(e)) => Err(SearchError::Navigation {
            url: page.current_url().await.unwrap_or_else(|| "about:blank".to_string()),
            reason: format!("could not read page content: {e}"),
        }),
        Err(_) => Err(SearchError::Timeout {
            timeout_ms: limit.as_millis(),
        }),
    }
}

/// Run one query on an already acquired page: navigate, wait, capture, parse
pub async fn run_search_on_page<P>(
    page: &P,
    parser: &dyn ResultParser,
    request: &SearchRequest,
) -> Result<SearchResponse, SearchError>
where
    P: SearchPage + ?Sized,
{
    let engine = parser.engine();
    let readiness = execute_query(page, engine, parser.ready_selector(), request).await?;
    let html = capture_html(page).await?;
    let page_url = page
        .current_url()
        .await
        .unwrap_or_else(|| engine.base_url().to_string());

    let timed_out = readiness == Readiness::TimedOut;
    let results = match parser.parse(&html, &page_url, request.max_results()) {
        Ok(results) => results,
        // A page cut off by the deadline has not rendered its results yet
        Err(ParseError::MissingContainer { .. }) if timed_out => {
            warn!("Results page did not render before the timeout, returning no results");
            Vec::new()
        }
        Err(e) => return Err(e.into()),
    };

    Ok(SearchResponse::new(
        request,
        engine,
        parser.version(),
        timed_out,
        results,
    ))
}

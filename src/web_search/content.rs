//! Destination page content for fetched results

use std::time::Duration;

use tracing::{debug, warn};

use super::executor::{SearchPage, capture_html, is_navigation_timeout};
use super::parser::collapse_whitespace;
use super::types::PageContent;

/// Load `url` in `page` and return its visible text
///
/// Navigation gets `timeout`; when it runs out whatever has loaded is used.
/// Text is produced by html2md with whitespace collapsed and, for
/// `char_limit > 0`, truncated to that many characters.
pub async fn fetch_page_text<P>(
    page: &P,
    url: &str,
    timeout: Duration,
    char_limit: usize,
) -> PageContent
where
    P: SearchPage + ?Sized,
{
    match tokio::time::timeout(timeout, page.navigate(url)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) if is_navigation_timeout(&e) => {
            debug!("Browser timed out loading {}, reading what is there", url);
        }
        Ok(Err(e)) => {
            warn!("Failed to load result page {}: {}", url, e);
            return PageContent::Failed(format!("navigation failed: {e}"));
        }
        Err(_) => {
            debug!(
                "Result page {} still loading after {}ms, reading what is there",
                url,
                timeout.as_millis()
            );
        }
    }

    match capture_html(page).await {
        Ok(html) => PageContent::Text(html_to_text(&html, char_limit)),
        Err(e) => {
            warn!("Failed to read result page {}: {}", url, e);
            PageContent::Failed(e.to_string())
        }
    }
}

/// Convert HTML to collapsed plain text, truncated to `char_limit` (0 = no limit)
pub fn html_to_text(html: &str, char_limit: usize) -> String {
    let text = collapse_whitespace(&html2md::parse_html(html));
    truncate_chars(&text, char_limit)
}

/// First `limit` characters of `text` followed by `...`, or `text` unchanged
/// when it fits or `limit` is 0
pub fn truncate_chars(text: &str, limit: usize) -> String {
    if limit == 0 {
        return text.to_string();
    }

    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}

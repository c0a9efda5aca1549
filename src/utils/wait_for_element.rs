//! Element polling utility for SPA support
//!
//! Provides wait_for_selector() which polls for DOM elements with exponential backoff.
//! Search result pages render their result list via JavaScript after the initial
//! load event fires, so navigation completing does not mean results are present.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::web_search::SearchPage;

/// Wait for a selector to match in the DOM using exponential backoff polling
///
/// # Arguments
/// * `page` - The page to search in
/// * `selector` - CSS selector for the element
/// * `timeout` - Maximum time to wait for the element
///
/// # Returns
/// `true` once the selector matches, `false` if `timeout` elapsed first.
/// A single slow lookup cannot stretch the wait: the whole loop runs under
/// `tokio::time::timeout`.
///
/// # Polling Strategy
/// - Starts at 100ms intervals
/// - Doubles each retry (exponential backoff)
/// - Caps at 1 second maximum interval
pub async fn wait_for_selector<P>(page: &P, selector: &str, timeout: Duration) -> bool
where
    P: SearchPage + ?Sized,
{
    let start = Instant::now();

    let poll = async {
        let mut poll_interval = Duration::from_millis(100);
        let max_interval = Duration::from_secs(1);

        loop {
            if page.has_selector(selector).await {
                return;
            }

            trace!("Selector '{}' not present yet, retrying in {:?}", selector, poll_interval);
            tokio::time::sleep(poll_interval).await;
            poll_interval = (poll_interval * 2).min(max_interval);
        }
    };

    match tokio::time::timeout(timeout, poll).await {
        Ok(()) => {
            debug!("Selector '{}' appeared after {:?}", selector, start.elapsed());
            true
        }
        Err(_) => {
            debug!(
                "Selector '{}' not found within {}ms",
                selector,
                timeout.as_millis()
            );
            false
        }
    }
}

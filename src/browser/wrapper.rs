//! CDP connection lifecycle and per-request page leases

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::error::CdpError;
use chromiumoxide::handler::HandlerConfig;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::OwnedMutexGuard;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use super::BrowserError;
use crate::browser_setup::ensure_endpoint;
use crate::config::{BrowserConfig, CdpEndpoint};
use crate::web_search::{NavigationTimedOut, SearchPage};

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Wrapper for a CDP connection and its event handler task
///
/// The handler MUST be aborted when the connection is no longer used, or it
/// keeps running after the websocket is gone. Dropping the wrapper aborts it.
/// The browser itself is not closed: it belongs to the user.
pub struct BrowserWrapper {
    browser: Browser,
    handler: JoinHandle<()>,
    endpoint: CdpEndpoint,
}

impl BrowserWrapper {
    pub(crate) fn new(browser: Browser, handler: JoinHandle<()>, endpoint: CdpEndpoint) -> Self {
        Self {
            browser,
            handler,
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &CdpEndpoint {
        &self.endpoint
    }

    /// Cheap liveness check (`Browser.getVersion`)
    pub async fn is_alive(&self) -> bool {
        match self.browser.version().await {
            Ok(_) => true,
            Err(e) => {
                warn!("Browser health check on {} failed: {}", self.endpoint, e);
                false
            }
        }
    }

    /// Open a fresh blank tab
    pub async fn new_blank_page(&self) -> Result<Page, BrowserError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::PageCreationFailed(e.to_string()))?;
        debug!("Opened new tab {:?}", page.target_id());
        Ok(page)
    }

    /// Find an already open tab by its target id
    ///
    /// Targets that existed before we connected are discovered asynchronously,
    /// so the lookup is retried briefly before giving up.
    pub async fn find_page(&self, target_id: &str) -> Result<Page, BrowserError> {
        for attempt in 0..10 {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }

            let pages = self
                .browser
                .pages()
                .await
                .map_err(|e| BrowserError::PageCreationFailed(e.to_string()))?;

            if let Some(page) = pages
                .into_iter()
                .find(|page| page.target_id().inner() == target_id)
            {
                return Ok(page);
            }
        }

        Err(BrowserError::TargetNotFound(target_id.to_string()))
    }
}

impl Drop for BrowserWrapper {
    fn drop(&mut self) {
        info!("Disconnecting from browser at {}", self.endpoint);
        self.handler.abort();
    }
}

/// Ask the DevTools HTTP interface for the browser websocket URL
pub async fn resolve_websocket_url(endpoint: &CdpEndpoint) -> Result<String, BrowserError> {
    let handshake_err = |reason: String| BrowserError::Handshake {
        endpoint: endpoint.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(HANDSHAKE_TIMEOUT)
        .build()
        .map_err(|e| handshake_err(e.to_string()))?;

    let response = client
        .get(endpoint.version_url())
        .send()
        .await
        .map_err(|e| handshake_err(e.to_string()))?;

    if !response.status().is_success() {
        return Err(handshake_err(format!(
            "/json/version answered HTTP {}",
            response.status()
        )));
    }

    let body: Value = response
        .json()
        .await
        .map_err(|e| handshake_err(format!("invalid /json/version document: {e}")))?;

    body.get("webSocketDebuggerUrl")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .ok_or_else(|| handshake_err("/json/version has no webSocketDebuggerUrl".to_string()))
}

/// Attach to the configured browser, launching it first if allowed
pub async fn connect_browser(config: &BrowserConfig) -> Result<BrowserWrapper, BrowserError> {
    ensure_endpoint(config).await?;

    let endpoint = config.endpoint.clone();
    let ws_url = resolve_websocket_url(&endpoint).await?;
    info!("Connecting to browser websocket {}", ws_url);

    let handler_config = HandlerConfig {
        request_timeout: config.request_timeout,
        ..Default::default()
    };
    let (browser, mut handler) = Browser::connect_with_config(ws_url, handler_config)
        .await
        .map_err(|e| BrowserError::Handshake {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

    let handler_task = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if let Err(e) = h {
                let error_msg = e.to_string();

                // Chrome emits CDP events chromiumoxide has no variant for
                // Reference: https://github.com/mattsse/chromiumoxide/issues/167
                //            https://github.com/mattsse/chromiumoxide/issues/229
                let is_benign_serialization_error = error_msg
                    .contains("data did not match any variant of untagged enum Message")
                    || error_msg.contains("Failed to deserialize WS response");

                if is_benign_serialization_error {
                    trace!("Suppressed benign CDP serialization error: {}", error_msg);
                } else {
                    error!("Browser handler error: {:?}", e);
                }
            }
        }
        info!("Browser handler task completed");
    });

    Ok(BrowserWrapper::new(browser, handler_task, endpoint))
}

/// One request's exclusive use of a tab
///
/// Call [`PageLease::release`] when done. A lease dropped without release
/// (the request future was cancelled) schedules the close on the runtime.
/// Tabs the lease attached to rather than opened are never closed.
pub struct PageLease {
    page: Page,
    close_on_release: bool,
    released: bool,
    /// Connection owned by this lease alone (per-request sessions)
    connection: Option<BrowserWrapper>,
    /// Serializes requests sharing one attached tab
    _attached: Option<OwnedMutexGuard<()>>,
}

impl PageLease {
    pub(crate) fn opened(page: Page) -> Self {
        Self {
            page,
            close_on_release: true,
            released: false,
            connection: None,
            _attached: None,
        }
    }

    pub(crate) fn attached(page: Page, guard: OwnedMutexGuard<()>) -> Self {
        Self {
            page,
            close_on_release: false,
            released: false,
            connection: None,
            _attached: Some(guard),
        }
    }

    pub(crate) fn with_connection(mut self, connection: BrowserWrapper) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Close the tab (if this lease opened it) and end the lease
    pub async fn release(mut self) {
        self.released = true;
        if self.close_on_release
            && let Err(e) = self.page.clone().close().await
        {
            warn!("Failed to close search tab: {}", e);
        }
    }
}

impl Drop for PageLease {
    fn drop(&mut self) {
        if self.released || !self.close_on_release {
            return;
        }

        let page = self.page.clone();
        let connection = self.connection.take();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!("Page lease dropped before release, closing tab in background");
                handle.spawn(async move {
                    if let Err(e) = page.close().await {
                        warn!("Failed to close abandoned tab: {}", e);
                    }
                    drop(connection);
                });
            }
            Err(_) => warn!("Page lease dropped outside a runtime, tab left open"),
        }
    }
}

#[async_trait]
impl SearchPage for Page {
    async fn navigate(&self, url: &str) -> Result<()> {
        match self.goto(url).await {
            Ok(_) => Ok(()),
            Err(CdpError::Timeout) => Err(NavigationTimedOut.into()),
            Err(e) => Err(e.into()),
        }
    }

    async fn has_selector(&self, selector: &str) -> bool {
        self.find_element(selector).await.is_ok()
    }

    async fn html(&self) -> Result<String> {
        Ok(self.content().await?)
    }

    async fn current_url(&self) -> Option<String> {
        self.url().await.ok().flatten()
    }
}

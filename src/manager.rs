//! Browser connection manager
//!
//! Hands out one tab per request and, depending on [`SessionPolicy`], either
//! keeps a single connection for the whole process or connects per request.
//!
//! # Async Lock Requirements
//!
//! Must use `tokio::sync::Mutex`: the connection is health-checked and
//! (re)established while the lock is held, across `.await` points.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};
use tracing::{debug, info};

use crate::browser::{BrowserError, BrowserWrapper, PageLease, connect_browser};
use crate::config::{BrowserConfig, SessionPolicy};

pub struct BrowserManager {
    config: BrowserConfig,
    browser: Arc<Mutex<Option<BrowserWrapper>>>,
    /// Held by the request currently using the attached target
    attached_target: Arc<Mutex<()>>,
}

impl BrowserManager {
    /// Create a manager; nothing connects until the first request
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            browser: Arc::new(Mutex::new(None)),
            attached_target: Arc::new(Mutex::new(())),
        }
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// Get the shared connection, connecting or reconnecting as needed
    ///
    /// # Health Check and Recovery Flow
    /// 1. Lock the connection mutex
    /// 2. If a connection exists, check it with `Browser.getVersion`
    /// 3. If dead, drop it (aborting its handler)
    /// 4. Connect if nothing usable is cached
    async fn shared_connection(&self) -> Result<MutexGuard<'_, Option<BrowserWrapper>>, BrowserError> {
        let mut guard = self.browser.lock().await;

        if let Some(wrapper) = guard.as_ref() {
            if wrapper.is_alive().await {
                debug!("Browser health check passed, reusing connection");
                return Ok(guard);
            }
            info!("Dropping dead browser connection, reconnecting");
            guard.take();
        }

        let wrapper = connect_browser(&self.config).await?;
        *guard = Some(wrapper);
        Ok(guard)
    }

    /// Acquire a tab for one request
    ///
    /// With `CDP_TARGET_ID` set the lease attaches to that tab and requests
    /// queue for it; otherwise every request gets its own new tab.
    pub async fn acquire_page(&self) -> Result<PageLease, BrowserError> {
        let attached_guard = match self.config.target_id {
            Some(_) => Some(self.attached_target.clone().lock_owned().await),
            None => None,
        };

        match self.config.session {
            SessionPolicy::Shared => {
                let guard = self.shared_connection().await?;
                let wrapper = guard.as_ref().ok_or_else(|| {
                    BrowserError::PageCreationFailed("Browser connection not available".into())
                })?;
                self.open_page(wrapper, attached_guard).await
            }
            SessionPolicy::PerRequest => {
                let wrapper = connect_browser(&self.config).await?;
                let lease = self.open_page(&wrapper, attached_guard).await?;
                Ok(lease.with_connection(wrapper))
            }
        }
    }

    async fn open_page(
        &self,
        wrapper: &BrowserWrapper,
        attached_guard: Option<OwnedMutexGuard<()>>,
    ) -> Result<PageLease, BrowserError> {
        match (&self.config.target_id, attached_guard) {
            (Some(target_id), Some(guard)) => {
                let page = wrapper.find_page(target_id).await?;
                debug!("Attached to existing tab {}", target_id);
                Ok(PageLease::attached(page, guard))
            }
            _ => Ok(PageLease::opened(wrapper.new_blank_page().await?)),
        }
    }

    /// Drop the shared connection if one exists
    ///
    /// Only the CDP connection ends; the browser keeps running.
    /// Safe to call multiple times.
    pub async fn shutdown(&self) {
        if let Some(wrapper) = self.browser.lock().await.take() {
            info!("Shutting down browser connection to {}", wrapper.endpoint());
            drop(wrapper);
        }
    }

    /// Whether a shared connection is currently cached
    pub async fn is_connected(&self) -> bool {
        self.browser.lock().await.is_some()
    }
}

//! Test utilities shared by the search test suite

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use kodegen_tools_kagi::Config;
use kodegen_tools_kagi::web_search::{NavigationTimedOut, SearchPage};

pub const KAGI_RESULTS: &str = include_str!("../fixtures/kagi_results.html");
#[allow(dead_code)]
pub const KAGI_NO_RESULTS: &str = include_str!("../fixtures/kagi_no_results.html");
#[allow(dead_code)]
pub const KAGI_SIGNIN: &str = include_str!("../fixtures/kagi_signin.html");
#[allow(dead_code)]
pub const DUCKDUCKGO_RESULTS: &str = include_str!("../fixtures/duckduckgo_results.html");

/// Address a real Kagi results page for "rust programming" would have
#[allow(dead_code)]
pub const KAGI_PAGE_URL: &str = "https://kagi.com/search?q=rust+programming";

/// How [`FakePage::navigate`] behaves
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum Navigation {
    Completes,
    /// Never resolves
    Stalls,
    Fails(&'static str),
    /// The browser reports its own navigation timeout
    BrowserTimeout,
}

/// In-memory page serving canned HTML
pub struct FakePage {
    html: String,
    url: String,
    navigation: Navigation,
    ready: bool,
    visited: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl FakePage {
    /// A page that loads `html` and reports the results container immediately
    pub fn serving(html: &str) -> Self {
        Self {
            html: html.to_string(),
            url: KAGI_PAGE_URL.to_string(),
            navigation: Navigation::Completes,
            ready: true,
            visited: Mutex::new(Vec::new()),
        }
    }

    pub fn with_navigation(mut self, navigation: Navigation) -> Self {
        self.navigation = navigation;
        self
    }

    /// The ready selector never appears
    pub fn never_ready(mut self) -> Self {
        self.ready = false;
        self
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchPage for FakePage {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.visited.lock().unwrap().push(url.to_string());
        match &self.navigation {
            Navigation::Completes => Ok(()),
            Navigation::Stalls => {
                std::future::pending::<()>().await;
                Ok(())
            }
            Navigation::Fails(reason) => Err(anyhow!("{reason}")),
            Navigation::BrowserTimeout => Err(NavigationTimedOut.into()),
        }
    }

    async fn has_selector(&self, _selector: &str) -> bool {
        self.ready
    }

    async fn html(&self) -> Result<String> {
        Ok(self.html.clone())
    }

    async fn current_url(&self) -> Option<String> {
        Some(self.url.clone())
    }
}

/// Configuration built from `vars` only, ignoring the process environment
#[allow(dead_code)]
pub fn config_from(vars: &[(&str, &str)]) -> Config {
    try_config_from(vars).unwrap()
}

#[allow(dead_code)]
pub fn try_config_from(
    vars: &[(&str, &str)],
) -> Result<Config, kodegen_tools_kagi::ConfigError> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|key| map.get(key).cloned())
}

/// A local port nothing listens on
#[allow(dead_code)]
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

#[allow(dead_code)]
pub fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

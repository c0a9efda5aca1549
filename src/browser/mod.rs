//! Browser infrastructure for attaching to (and if needed launching) a
//! debuggable Chrome-family browser

mod wrapper;

pub use crate::browser_setup::{endpoint_listening, find_browser_executable, launch_debug_browser};
pub use wrapper::{BrowserWrapper, PageLease, connect_browser, resolve_websocket_url};

use thiserror::Error;

/// Failures while reaching the browser or opening a tab.
/// Every variant belongs to the connection stage.
#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("CDP endpoint {endpoint} is unreachable: {reason}")]
    Unreachable { endpoint: String, reason: String },

    #[error("Failed to find browser executable: {0}")]
    ExecutableNotFound(String),

    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("DevTools handshake with {endpoint} failed: {reason}")]
    Handshake { endpoint: String, reason: String },

    #[error("Target {0} is not an open page in the browser")]
    TargetNotFound(String),

    #[error("Failed to create page: {0}")]
    PageCreationFailed(String),
}

pub type BrowserResult<T> = Result<T, BrowserError>;

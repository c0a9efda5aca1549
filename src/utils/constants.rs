//! Shared configuration constants for the search tools
//!
//! Default values and bounds used throughout the crate to keep the
//! environment parsing, the CLI and the tools in agreement.

/// Default CDP host when `CDP_URL` is unset
pub const DEFAULT_CDP_URL: &str = "http://localhost";

/// Default remote debugging port (Chrome's conventional 9222)
pub const DEFAULT_CDP_PORT: u16 = 9222;

/// Default cap on results returned per query
pub const DEFAULT_RESULTS_MAX: usize = 10;

/// Default page readiness timeout in milliseconds
pub const DEFAULT_PAGE_TIMEOUT_MS: u64 = 30_000;

/// Default wait for a freshly launched browser to expose its endpoint
pub const DEFAULT_LAUNCH_TIMEOUT_MS: u64 = 10_000;

/// TCP connect timeout used to decide whether a browser is already listening
pub const ENDPOINT_CONNECT_TIMEOUT_MS: u64 = 1_000;

/// Upper bound on reading the page HTML once navigation has settled
pub const CONTENT_CAPTURE_TIMEOUT_MS: u64 = 10_000;

/// Headroom of the CDP command timeout over the page timeout
pub const CDP_REQUEST_MARGIN_MS: u64 = 5_000;

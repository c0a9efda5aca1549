//! Timeout validation utilities for browser operations

use std::time::Duration;

/// Maximum timeout for browser navigation operations (5 minutes)
/// Covers slow-loading sites, heavy SPAs, and network delays
pub const MAX_NAVIGATION_TIMEOUT_MS: u64 = 300_000; // 5 minutes

/// Maximum wait for a launched browser to open its debugging port (2 minutes)
pub const MAX_LAUNCH_TIMEOUT_MS: u64 = 120_000;

/// Validate a navigation/readiness timeout
///
/// # Arguments
/// * `timeout_ms` - Optional timeout in milliseconds
/// * `default_ms` - Default timeout if None provided
///
/// # Returns
/// * `Ok(Duration)` - Validated Duration object
/// * `Err(String)` - If the timeout is zero or exceeds MAX_NAVIGATION_TIMEOUT_MS
///
/// # Example
/// ```rust
/// use kodegen_tools_kagi::utils::validate_navigation_timeout;
///
/// let timeout = validate_navigation_timeout(Some(45000), 30000).unwrap();
/// assert_eq!(timeout.as_millis(), 45000);
/// ```
pub fn validate_navigation_timeout(
    timeout_ms: Option<u64>,
    default_ms: u64,
) -> Result<Duration, String> {
    validate_bounded(timeout_ms.unwrap_or(default_ms), MAX_NAVIGATION_TIMEOUT_MS)
}

/// Validate the browser launch timeout
pub fn validate_launch_timeout(
    timeout_ms: Option<u64>,
    default_ms: u64,
) -> Result<Duration, String> {
    validate_bounded(timeout_ms.unwrap_or(default_ms), MAX_LAUNCH_TIMEOUT_MS)
}

fn validate_bounded(ms: u64, max_ms: u64) -> Result<Duration, String> {
    if ms == 0 {
        return Err("Timeout must be at least 1ms".to_string());
    }

    if ms > max_ms {
        return Err(format!(
            "Timeout cannot exceed {}ms ({:.1} minutes). Received: {}ms ({:.1} minutes)",
            max_ms,
            max_ms as f64 / 60_000.0,
            ms,
            ms as f64 / 60_000.0
        ));
    }

    Ok(Duration::from_millis(ms))
}

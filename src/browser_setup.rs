use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::browser::BrowserError;
use crate::browser::resolve_websocket_url;
use crate::config::{BrowserConfig, CdpEndpoint};
use crate::utils::constants::ENDPOINT_CONNECT_TIMEOUT_MS;

/// Find a Chrome-family executable on the system with platform-specific search paths.
///
/// Only consulted when `BROWSER` is unset. Chromium derivatives that keep a
/// logged-in profile (Brave, Chrome, Chromium, Edge) all speak CDP.
pub async fn find_browser_executable() -> Result<PathBuf> {
    let paths = if cfg!(target_os = "windows") {
        vec![
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"%LOCALAPPDATA%\Google\Chrome\Application\chrome.exe",
            r"%PROGRAMFILES%\BraveSoftware\Brave-Browser\Application\brave.exe",
            r"%LOCALAPPDATA%\BraveSoftware\Brave-Browser\Application\brave.exe",
            r"C:\Program Files\Chromium\Application\chrome.exe",
            r"%PROGRAMFILES(X86)%\Microsoft\Edge\Application\msedge.exe",
        ]
    } else if cfg!(target_os = "macos") {
        vec![
            "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
            "~/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
            "~/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/opt/homebrew/bin/chromium",
        ]
    } else {
        // Linux
        vec![
            "/usr/bin/brave-browser",
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/brave",
            "/snap/bin/chromium",
            "/opt/google/chrome/chrome",
        ]
    };

    for path_str in paths {
        let path = if let Some(rest) = path_str.strip_prefix("~/") {
            match dirs::home_dir() {
                Some(home) => home.join(rest),
                None => continue,
            }
        } else if path_str.contains('%') && cfg!(target_os = "windows") {
            PathBuf::from(expand_windows_env_vars(path_str))
        } else {
            PathBuf::from(path_str)
        };

        if path.exists() {
            info!("Found browser at: {}", path.display());
            return Ok(path);
        }
    }

    if !cfg!(target_os = "windows") {
        for cmd in &["brave-browser", "google-chrome", "chromium", "chromium-browser"] {
            let output = Command::new("which").arg(cmd).output();

            if let Ok(output) = output
                && output.status.success()
            {
                let path_str = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path_str.is_empty() {
                    let path = PathBuf::from(path_str);
                    info!("Found browser using 'which' command: {}", path.display());
                    return Ok(path);
                }
            }
        }
    }

    Err(anyhow!(
        "No Chrome-family browser found. Set BROWSER to the executable path."
    ))
}

/// Expand Windows environment variables in the form %VAR% within a path string.
///
/// Unknown variables keep their original %VAR% token.
fn expand_windows_env_vars(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut chars = path.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '%' {
            let var_name: String = chars.by_ref().take_while(|&c| c != '%').collect();

            if !var_name.is_empty() {
                if let Ok(value) = std::env::var(&var_name) {
                    result.push_str(&value);
                } else {
                    result.push('%');
                    result.push_str(&var_name);
                    result.push('%');
                }
            } else {
                result.push('%');
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Whether something accepts TCP connections on the endpoint
pub async fn endpoint_listening(endpoint: &CdpEndpoint, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, TcpStream::connect(endpoint.authority())).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            debug!("Endpoint {} refused: {}", endpoint, e);
            false
        }
        Err(_) => {
            debug!("Endpoint {} timed out on connect", endpoint);
            false
        }
    }
}

/// Start `executable` with remote debugging enabled on `port`
///
/// The process runs with the user's default profile and is left running
/// when this process exits.
pub fn launch_debug_browser(executable: &Path, port: u16) -> Result<()> {
    let mut command = tokio::process::Command::new(executable);
    command
        .arg(format!("--remote-debugging-port={port}"))
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(false);

    // Always disable sandbox in containerized environments (Docker detection)
    if should_disable_sandbox() {
        info!("Detected containerized environment, disabling sandbox");
        command.arg("--no-sandbox").arg("--disable-setuid-sandbox");
    }

    let child = command
        .spawn()
        .with_context(|| format!("Failed to start {}", executable.display()))?;
    info!(
        "Started browser {} (pid {:?}) with remote debugging on port {}",
        executable.display(),
        child.id(),
        port
    );
    Ok(())
}

/// Make sure a browser answers on the configured endpoint
///
/// One connect attempt; if nothing listens and launching is allowed, start the
/// configured (or discovered) browser and poll `/json/version` until it
/// answers or `launch_timeout` elapses.
pub async fn ensure_endpoint(config: &BrowserConfig) -> Result<(), BrowserError> {
    let endpoint = &config.endpoint;
    let connect_timeout = Duration::from_millis(ENDPOINT_CONNECT_TIMEOUT_MS);

    if endpoint_listening(endpoint, connect_timeout).await {
        debug!("Browser already listening on {}", endpoint);
        return Ok(());
    }

    if !config.launch {
        return Err(BrowserError::Unreachable {
            endpoint: endpoint.to_string(),
            reason: "nothing is listening and BROWSER_LAUNCH is disabled".to_string(),
        });
    }

    let executable = match &config.executable {
        Some(path) => path.clone(),
        None => find_browser_executable()
            .await
            .map_err(|e| BrowserError::ExecutableNotFound(e.to_string()))?,
    };

    info!("No browser on {}, starting {}", endpoint, executable.display());
    launch_debug_browser(&executable, endpoint.port)
        .map_err(|e| BrowserError::LaunchFailed(format!("{e:#}")))?;

    wait_for_endpoint(endpoint, config.launch_timeout).await
}

/// Poll the DevTools discovery document until it answers
async fn wait_for_endpoint(endpoint: &CdpEndpoint, timeout: Duration) -> Result<(), BrowserError> {
    let start = Instant::now();
    let poll_interval = Duration::from_millis(200);

    loop {
        let remaining = timeout.saturating_sub(start.elapsed());
        let attempt = match tokio::time::timeout(remaining, resolve_websocket_url(endpoint)).await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(_) => Err("no answer before the launch timeout".to_string()),
        };

        match attempt {
            Ok(_) => {
                info!("Browser endpoint {} ready after {:?}", endpoint, start.elapsed());
                return Ok(());
            }
            Err(e) if start.elapsed() >= timeout => {
                warn!("Launched browser never exposed {}: {}", endpoint, e);
                return Err(BrowserError::Unreachable {
                    endpoint: endpoint.to_string(),
                    reason: format!(
                        "browser was started but did not answer within {}ms \
                         (is another instance already running without remote debugging?)",
                        timeout.as_millis()
                    ),
                });
            }
            Err(_) => {
                let remaining = timeout.saturating_sub(start.elapsed());
                tokio::time::sleep(poll_interval.min(remaining)).await;
            }
        }
    }
}

/// Detect if running in containerized environment (Docker, etc.)
/// In containers, sandbox must be disabled as setuid doesn't work
fn should_disable_sandbox() -> bool {
    std::path::Path::new("/.dockerenv").exists()
        || std::env::var("container").is_ok()
        || std::env::var("KUBERNETES_SERVICE_HOST").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_keeps_unknown_variables() {
        let expanded = expand_windows_env_vars(r"%KODEGEN_SURELY_UNSET_VAR%\brave.exe");
        assert_eq!(expanded, r"%KODEGEN_SURELY_UNSET_VAR%\brave.exe");
        assert_eq!(expand_windows_env_vars("100%%"), "100%");
    }

    #[tokio::test]
    async fn test_launch_wait_is_bounded_by_launch_timeout() {
        // Accepts connections but never answers /json/version
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let silent = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let endpoint = CdpEndpoint::new("127.0.0.1", port);
        let started = Instant::now();
        let err = wait_for_endpoint(&endpoint, Duration::from_millis(300))
            .await
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(2), "{:?}", started.elapsed());
        assert!(matches!(err, BrowserError::Unreachable { .. }));
        silent.abort();
    }
}

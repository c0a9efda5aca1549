//! Process configuration loaded once from the environment
//!
//! Every component receives the values it needs from [`Config`]; nothing
//! below this module reads environment variables on its own.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::utils::constants::{
    CDP_REQUEST_MARGIN_MS, DEFAULT_CDP_PORT, DEFAULT_CDP_URL, DEFAULT_LAUNCH_TIMEOUT_MS,
    DEFAULT_PAGE_TIMEOUT_MS, DEFAULT_RESULTS_MAX,
};
use crate::utils::{validate_launch_timeout, validate_navigation_timeout};
use crate::web_search::{SearchEngine, default_parser, known_parser_versions, parser_for};

/// Errors raised while reading configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("{var} is out of range: {message}")]
    OutOfRange { var: &'static str, message: String },

    #[error("RESULT_PARSER '{version}' is unknown (known: {known})")]
    UnknownParser { version: String, known: String },

    #[error("RESULT_PARSER '{version}' reads {parser_engine} pages but SEARCH_ENGINE is {engine}")]
    ParserEngineMismatch {
        version: String,
        parser_engine: SearchEngine,
        engine: SearchEngine,
    },
}

/// Remote debugging endpoint of the browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdpEndpoint {
    pub host: String,
    pub port: u16,
}

impl CdpEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Build an endpoint from a `CDP_URL` value and a port
    ///
    /// The scheme is optional (`localhost`, `http://localhost` and
    /// `http://127.0.0.1/` all work). Any port inside the URL is ignored in
    /// favour of `port`, matching how `CDP_URL` and `CDP_PORT` are documented.
    pub fn from_url(cdp_url: &str, port: u16) -> Result<Self, String> {
        let trimmed = cdp_url.trim();
        if trimmed.is_empty() {
            return Err("empty URL".to_string());
        }

        let candidate = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        };

        let parsed = Url::parse(&candidate).map_err(|e| e.to_string())?;
        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| "URL has no host".to_string())?;

        Ok(Self::new(host, port))
    }

    /// `host:port`, suitable for `TcpStream::connect`
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base of the DevTools HTTP interface
    pub fn http_base(&self) -> String {
        format!("http://{}", self.authority())
    }

    /// DevTools discovery document holding `webSocketDebuggerUrl`
    pub fn version_url(&self) -> String {
        format!("{}/json/version", self.http_base())
    }
}

impl fmt::Display for CdpEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.authority())
    }
}

/// Whether requests share one CDP connection or each opens its own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPolicy {
    /// One health-checked connection for the process, one tab per request
    #[default]
    Shared,
    /// A fresh connection per request, dropped with the request's tab
    PerRequest,
}

impl FromStr for SessionPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shared" | "reuse" => Ok(Self::Shared),
            "per-request" | "per_request" | "fresh" => Ok(Self::PerRequest),
            _ => Err(()),
        }
    }
}

impl fmt::Display for SessionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shared => f.write_str("shared"),
            Self::PerRequest => f.write_str("per-request"),
        }
    }
}

/// Browser connection and launch configuration
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Executable to launch when nothing listens on the endpoint.
    /// `None` falls back to platform discovery.
    pub executable: Option<PathBuf>,

    pub endpoint: CdpEndpoint,

    /// Allow launching a browser when the endpoint is unreachable
    pub launch: bool,

    /// How long a launched browser may take to expose its endpoint
    pub launch_timeout: Duration,

    pub session: SessionPolicy,

    /// Attach to this existing tab instead of opening one per request
    pub target_id: Option<String>,

    /// Timeout for individual CDP commands, navigation included.
    /// Always above the page timeout so the search deadline fires first.
    pub request_timeout: Duration,
}

/// Query, extraction and output configuration
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub engine: SearchEngine,

    /// Structure-version id of the result parser
    pub parser_version: String,

    /// Cap on results per query, always > 0
    pub results_max: usize,

    pub page_timeout: Duration,

    /// Max characters of fetched page content, 0 = unlimited
    pub content_char_limit: usize,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub browser: BrowserConfig,
    pub search: SearchConfig,
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match get("CDP_PORT") {
            Some(raw) => raw.parse::<u16>().ok().filter(|p| *p > 0).ok_or(
                ConfigError::Invalid {
                    var: "CDP_PORT",
                    value: raw,
                    expected: "a TCP port between 1 and 65535",
                },
            )?,
            None => DEFAULT_CDP_PORT,
        };

        let cdp_url = get("CDP_URL").unwrap_or_else(|| DEFAULT_CDP_URL.to_string());
        let endpoint =
            CdpEndpoint::from_url(&cdp_url, port).map_err(|_| ConfigError::Invalid {
                var: "CDP_URL",
                value: cdp_url.clone(),
                expected: "a host name or URL such as http://localhost",
            })?;

        let launch = match get("BROWSER_LAUNCH") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid {
                var: "BROWSER_LAUNCH",
                value: raw,
                expected: "a boolean (true/false)",
            })?,
            None => true,
        };

        let launch_timeout_ms = parse_u64(&get, "BROWSER_LAUNCH_TIMEOUT")?;
        let launch_timeout = validate_launch_timeout(launch_timeout_ms, DEFAULT_LAUNCH_TIMEOUT_MS)
            .map_err(|message| ConfigError::OutOfRange {
                var: "BROWSER_LAUNCH_TIMEOUT",
                message,
            })?;

        let session = match get("BROWSER_SESSION") {
            Some(raw) => raw.parse::<SessionPolicy>().map_err(|()| ConfigError::Invalid {
                var: "BROWSER_SESSION",
                value: raw,
                expected: "'shared' or 'per-request'",
            })?,
            None => SessionPolicy::default(),
        };

        let engine = match get("SEARCH_ENGINE") {
            Some(raw) => raw.parse::<SearchEngine>().map_err(|()| ConfigError::Invalid {
                var: "SEARCH_ENGINE",
                value: raw,
                expected: "'kagi' or 'duckduckgo'",
            })?,
            None => SearchEngine::default(),
        };

        let parser_version = match get("RESULT_PARSER") {
            Some(version) => {
                let parser = parser_for(&version).ok_or_else(|| ConfigError::UnknownParser {
                    version: version.clone(),
                    known: known_parser_versions().join(", "),
                })?;
                if parser.engine() != engine {
                    return Err(ConfigError::ParserEngineMismatch {
                        version,
                        parser_engine: parser.engine(),
                        engine,
                    });
                }
                parser.version().to_string()
            }
            None => default_parser(engine).version().to_string(),
        };

        let results_max = match get("RESULTS_MAX") {
            Some(raw) => raw.parse::<usize>().ok().filter(|n| *n > 0).ok_or(
                ConfigError::Invalid {
                    var: "RESULTS_MAX",
                    value: raw,
                    expected: "a positive integer",
                },
            )?,
            None => DEFAULT_RESULTS_MAX,
        };

        let page_timeout_ms = parse_u64(&get, "PAGE_TIMEOUT")?;
        let page_timeout = validate_navigation_timeout(page_timeout_ms, DEFAULT_PAGE_TIMEOUT_MS)
            .map_err(|message| ConfigError::OutOfRange {
                var: "PAGE_TIMEOUT",
                message,
            })?;

        let content_char_limit = match get("CONTENT_CHAR_LIMIT") {
            Some(raw) => raw.parse::<usize>().map_err(|_| ConfigError::Invalid {
                var: "CONTENT_CHAR_LIMIT",
                value: raw,
                expected: "a non-negative integer",
            })?,
            None => 0,
        };

        let browser = BrowserConfig {
            executable: get("BROWSER").map(PathBuf::from),
            endpoint,
            launch,
            launch_timeout,
            session,
            target_id: get("CDP_TARGET_ID"),
            request_timeout: cdp_request_timeout(page_timeout),
        };

        Ok(Self {
            browser,
            search: SearchConfig {
                engine,
                parser_version,
                results_max,
                page_timeout,
                content_char_limit,
            },
        })
    }

    /// Change the page timeout, keeping the CDP command timeout above it
    pub fn set_page_timeout(&mut self, page_timeout: Duration) {
        self.search.page_timeout = page_timeout;
        self.browser.request_timeout = cdp_request_timeout(page_timeout);
    }
}

/// CDP command timeout for a given page timeout
pub fn cdp_request_timeout(page_timeout: Duration) -> Duration {
    page_timeout + Duration::from_millis(CDP_REQUEST_MARGIN_MS)
}

fn parse_u64<G>(get: &G, var: &'static str) -> Result<Option<u64>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    get(var)
        .map(|raw| {
            raw.parse::<u64>().map_err(|_| ConfigError::Invalid {
                var,
                value: raw,
                expected: "an integer number of milliseconds",
            })
        })
        .transpose()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

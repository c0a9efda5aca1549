//! Error taxonomy for one search invocation

use std::fmt;

use thiserror::Error;

use crate::browser::BrowserError;

/// Pipeline stage a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStage {
    Request,
    Connection,
    Navigation,
    Parsing,
}

impl fmt::Display for SearchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Request => "request",
            Self::Connection => "connection",
            Self::Navigation => "navigation",
            Self::Parsing => "parsing",
        })
    }
}

/// The page markup did not match what a parser variant expects
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error(
        "result container '{selector}' not found; the {parser} layout may have changed \
         or the page is not a results page (url: {page_url})"
    )]
    MissingContainer {
        parser: &'static str,
        selector: &'static str,
        page_url: String,
    },

    #[error("parser {parser} has an invalid selector '{selector}': {message}")]
    InvalidSelector {
        parser: &'static str,
        selector: &'static str,
        message: String,
    },
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Connection(#[from] BrowserError),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Page content was not available within {timeout_ms}ms")]
    Timeout { timeout_ms: u128 },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl SearchError {
    pub fn stage(&self) -> SearchStage {
        match self {
            Self::InvalidRequest(_) => SearchStage::Request,
            Self::Connection(_) => SearchStage::Connection,
            Self::Navigation { .. } | Self::Timeout { .. } => SearchStage::Navigation,
            Self::Parse(_) => SearchStage::Parsing,
        }
    }

    /// Message surfaced to MCP clients
    pub fn user_message(&self) -> String {
        format!("Search failed during {} stage: {}", self.stage(), self)
    }
}

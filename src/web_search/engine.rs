//! Search engines and their query URLs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

/// Kagi search endpoint. Requires a logged-in browser profile.
pub const KAGI_SEARCH_URL: &str = "https://kagi.com/search";

/// `DuckDuckGo` search URL base
pub const DUCKDUCKGO_SEARCH_URL: &str = "https://duckduckgo.com/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchEngine {
    #[default]
    Kagi,
    DuckDuckGo,
}

impl SearchEngine {
    /// Base against which relative result links are resolved
    pub fn base_url(self) -> &'static str {
        match self {
            Self::Kagi => "https://kagi.com/",
            Self::DuckDuckGo => DUCKDUCKGO_SEARCH_URL,
        }
    }

    /// Results page URL for `query`, form-urlencoded (spaces become `+`)
    pub fn search_url(self, query: &str) -> Result<Url, url::ParseError> {
        let (base, extra): (&str, &[(&str, &str)]) = match self {
            Self::Kagi => (KAGI_SEARCH_URL, &[]),
            Self::DuckDuckGo => (DUCKDUCKGO_SEARCH_URL, &[("ia", "web")]),
        };

        let mut url = Url::parse(base)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", query);
            for (key, value) in extra {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

impl FromStr for SearchEngine {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kagi" => Ok(Self::Kagi),
            "duckduckgo" | "ddg" => Ok(Self::DuckDuckGo),
            _ => Err(()),
        }
    }
}

impl fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Kagi => "kagi",
            Self::DuckDuckGo => "duckduckgo",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kagi_url_encodes_spaces_as_plus() {
        let url = SearchEngine::Kagi.search_url("rust async book").unwrap();
        assert_eq!(url.as_str(), "https://kagi.com/search?q=rust+async+book");
    }

    #[test]
    fn test_special_characters_are_escaped() {
        let url = SearchEngine::Kagi.search_url("c++ & rust?").unwrap();
        assert_eq!(url.as_str(), "https://kagi.com/search?q=c%2B%2B+%26+rust%3F");
    }

    #[test]
    fn test_duckduckgo_url_requests_web_results() {
        let url = SearchEngine::DuckDuckGo.search_url("tokio").unwrap();
        assert_eq!(url.as_str(), "https://duckduckgo.com/?q=tokio&ia=web");
    }

    #[test]
    fn test_engine_names_round_trip() {
        assert_eq!("Kagi".parse::<SearchEngine>(), Ok(SearchEngine::Kagi));
        assert_eq!("ddg".parse::<SearchEngine>(), Ok(SearchEngine::DuckDuckGo));
        assert!("bing".parse::<SearchEngine>().is_err());
        assert_eq!(SearchEngine::DuckDuckGo.to_string(), "duckduckgo");
    }
}

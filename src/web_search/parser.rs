//! Result extraction from captured search pages
//!
//! Search engines change their markup without notice, so each known layout is
//! a parser variant identified by a structure-version id (`kagi-v2`, ...).
//! Supporting a new layout means adding a variant here; the executor and the
//! tools only ever talk to [`ResultParser`].

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};
use url::Url;

use super::engine::SearchEngine;
use super::errors::ParseError;
use super::types::SearchResult;

/// A markup strategy for one version of one engine's results page
pub trait ResultParser: Send + Sync {
    /// Structure-version identifier, e.g. `kagi-v2`
    fn version(&self) -> &'static str;

    fn engine(&self) -> SearchEngine;

    /// Selector whose presence means the results page has rendered
    fn ready_selector(&self) -> &'static str;

    /// Extract up to `max_results` results in page order
    ///
    /// `page_url` is the address the HTML was captured from; relative result
    /// links are resolved against it.
    fn parse(
        &self,
        html: &str,
        page_url: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, ParseError>;
}

/// CSS selectors describing one results-page layout
#[derive(Debug, Clone, Copy)]
pub struct SelectorLayout {
    pub version: &'static str,
    pub engine: SearchEngine,
    /// Wraps the whole result list; absent means the layout changed
    pub container: &'static str,
    /// One node per search hit, relative to the container
    pub result: &'static str,
    pub title: &'static str,
    /// Anchor carrying the destination `href`
    pub link: &'static str,
    pub snippet: &'static str,
}

/// Parser driven entirely by a [`SelectorLayout`]
#[derive(Debug, Clone, Copy)]
pub struct LayoutParser {
    layout: SelectorLayout,
}

impl LayoutParser {
    pub const fn new(layout: SelectorLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &SelectorLayout {
        &self.layout
    }

    fn selector(&self, css: &'static str) -> Result<Selector, ParseError> {
        Selector::parse(css).map_err(|e| ParseError::InvalidSelector {
            parser: self.layout.version,
            selector: css,
            message: format!("{e:?}"),
        })
    }
}

/// Kagi results page as served since the `#layout-v2` redesign
pub static KAGI_V2: LayoutParser = LayoutParser::new(SelectorLayout {
    version: "kagi-v2",
    engine: SearchEngine::Kagi,
    container: "#layout-v2",
    result: "div._0_SRI",
    title: "a.__sri_title_link",
    link: "a.__sri_title_link",
    snippet: "div.__sri-desc div",
});

/// `DuckDuckGo` React results page
pub static DUCKDUCKGO_REACT: LayoutParser = LayoutParser::new(SelectorLayout {
    version: "duckduckgo-react",
    engine: SearchEngine::DuckDuckGo,
    container: "ol.react-results--main",
    result: "article[data-testid='result']",
    title: "h2 a",
    link: "h2 a",
    snippet: "div[data-result='snippet']",
});

static PARSERS: [&dyn ResultParser; 2] = [&KAGI_V2, &DUCKDUCKGO_REACT];

/// Look up a parser variant by structure-version id
pub fn parser_for(version: &str) -> Option<&'static dyn ResultParser> {
    PARSERS
        .iter()
        .copied()
        .find(|parser| parser.version().eq_ignore_ascii_case(version.trim()))
}

/// Current layout for `engine`
pub fn default_parser(engine: SearchEngine) -> &'static dyn ResultParser {
    match engine {
        SearchEngine::Kagi => &KAGI_V2,
        SearchEngine::DuckDuckGo => &DUCKDUCKGO_REACT,
    }
}

pub fn known_parser_versions() -> Vec<&'static str> {
    PARSERS.iter().map(|parser| parser.version()).collect()
}

impl ResultParser for LayoutParser {
    fn version(&self) -> &'static str {
        self.layout.version
    }

    fn engine(&self) -> SearchEngine {
        self.layout.engine
    }

    fn ready_selector(&self) -> &'static str {
        self.layout.container
    }

    fn parse(
        &self,
        html: &str,
        page_url: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, ParseError> {
        let container_sel = self.selector(self.layout.container)?;
        let result_sel = self.selector(self.layout.result)?;
        let title_sel = self.selector(self.layout.title)?;
        let link_sel = self.selector(self.layout.link)?;
        let snippet_sel = self.selector(self.layout.snippet)?;

        let document = Html::parse_document(html);
        let container = document.select(&container_sel).next().ok_or_else(|| {
            ParseError::MissingContainer {
                parser: self.layout.version,
                selector: self.layout.container,
                page_url: page_url.to_string(),
            }
        })?;

        let base = link_base(page_url, self.layout.engine);
        let mut results = Vec::new();

        for (index, node) in container.select(&result_sel).enumerate() {
            if results.len() >= max_results {
                break;
            }

            let title = node
                .select(&title_sel)
                .next()
                .map(element_text)
                .unwrap_or_default();
            if title.is_empty() {
                trace!("Result node {} has no title, skipping", index + 1);
                continue;
            }

            let Some(href) = node
                .select(&link_sel)
                .next()
                .and_then(|link| link.value().attr("href"))
            else {
                trace!("Result node {} has no link, skipping", index + 1);
                continue;
            };

            let Some(url) = resolve_result_url(&base, href) else {
                debug!("Result node {} has unusable href '{}', skipping", index + 1, href);
                continue;
            };

            let snippet = node
                .select(&snippet_sel)
                .next()
                .map(element_text)
                .unwrap_or_default();

            results.push(SearchResult {
                rank: results.len() + 1,
                title,
                url: url.into(),
                snippet,
            });
        }

        debug!(
            "{} parser extracted {} result(s) (cap {})",
            self.layout.version,
            results.len(),
            max_results
        );
        Ok(results)
    }
}

fn link_base(page_url: &str, engine: SearchEngine) -> Option<Url> {
    Url::parse(page_url)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .or_else(|| Url::parse(engine.base_url()).ok())
}

/// Absolute http(s) destination for `href`, or `None`
fn resolve_result_url(base: &Option<Url>, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let url = match Url::parse(href) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => base.as_ref()?.join(href).ok()?,
        Err(_) => return None,
    };

    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// Visible text of an element with whitespace runs collapsed
fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

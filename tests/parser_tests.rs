//! Result extraction against captured results pages

use kodegen_tools_kagi::web_search::{
    DUCKDUCKGO_REACT, KAGI_V2, ParseError, ResultParser, SearchEngine, parser_for,
};
use url::Url;

mod common;
use common::{DUCKDUCKGO_RESULTS, KAGI_NO_RESULTS, KAGI_PAGE_URL, KAGI_RESULTS, KAGI_SIGNIN};

/// Well-formed result nodes in `kagi_results.html`
const KAGI_VALID_RESULTS: usize = 6;

#[test]
fn test_kagi_results_in_page_order() {
    let results = KAGI_V2.parse(KAGI_RESULTS, KAGI_PAGE_URL, 10).unwrap();

    let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Rust Programming Language",
            "The Rust Programming Language",
            "Rust By Example",
            "Rust Playground",
            "crates.io: Rust Package Registry",
            "Tokio - An asynchronous Rust runtime",
        ]
    );

    let ranks: Vec<usize> = results.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_kagi_result_count_is_capped() {
    for cap in 1..=10 {
        let results = KAGI_V2.parse(KAGI_RESULTS, KAGI_PAGE_URL, cap).unwrap();
        assert_eq!(results.len(), cap.min(KAGI_VALID_RESULTS), "cap {cap}");
        assert_eq!(results[0].title, "Rust Programming Language");
    }
}

#[test]
fn test_kagi_urls_are_absolute_http() {
    let results = KAGI_V2.parse(KAGI_RESULTS, KAGI_PAGE_URL, 10).unwrap();

    for result in &results {
        let url = Url::parse(&result.url).unwrap();
        assert!(matches!(url.scheme(), "http" | "https"), "{}", result.url);
        assert!(!result.title.trim().is_empty());
    }

    assert_eq!(
        results[2].url,
        "https://kagi.com/proxy?url=https%3A%2F%2Fdoc.rust-lang.org%2Frust-by-example%2F"
    );
    assert!(results.iter().all(|r| !r.url.starts_with("javascript")));
    assert!(results.iter().all(|r| !r.url.contains("ads.example.com")));
}

#[test]
fn test_kagi_text_is_collapsed_and_snippet_optional() {
    let results = KAGI_V2.parse(KAGI_RESULTS, KAGI_PAGE_URL, 10).unwrap();

    assert_eq!(
        results[1].snippet,
        "by Steve Klabnik and Carol Nichols, with contributions from the Rust Community"
    );
    assert_eq!(results[3].title, "Rust Playground");
    assert_eq!(results[3].snippet, "");
}

#[test]
fn test_relative_links_fall_back_to_engine_base() {
    let results = KAGI_V2.parse(KAGI_RESULTS, "about:blank", 10).unwrap();
    assert_eq!(
        results[2].url,
        "https://kagi.com/proxy?url=https%3A%2F%2Fdoc.rust-lang.org%2Frust-by-example%2F"
    );
}

#[test]
fn test_no_results_page_is_empty_not_error() {
    let results = KAGI_V2
        .parse(KAGI_NO_RESULTS, "https://kagi.com/search?q=qwzxv", 10)
        .unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_unrecognised_page_is_parse_error() {
    let err = KAGI_V2
        .parse(KAGI_SIGNIN, "https://kagi.com/signin", 10)
        .unwrap_err();

    match &err {
        ParseError::MissingContainer {
            parser,
            selector,
            page_url,
        } => {
            assert_eq!(*parser, "kagi-v2");
            assert_eq!(*selector, "#layout-v2");
            assert_eq!(page_url, "https://kagi.com/signin");
        }
        other => panic!("expected MissingContainer, got {other:?}"),
    }
    assert!(err.to_string().contains("layout may have changed"));
}

#[test]
fn test_duckduckgo_layout() {
    let results = DUCKDUCKGO_REACT
        .parse(DUCKDUCKGO_RESULTS, "https://duckduckgo.com/?q=tokio&ia=web", 10)
        .unwrap();

    let urls: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://tokio.rs/",
            "https://docs.rs/tokio/latest/tokio/",
            "https://github.com/tokio-rs/tokio",
        ]
    );
    assert_eq!(results[2].snippet, "");
    assert_eq!(DUCKDUCKGO_REACT.engine(), SearchEngine::DuckDuckGo);
}

#[test]
fn test_parsers_do_not_read_each_others_pages() {
    assert!(KAGI_V2.parse(DUCKDUCKGO_RESULTS, KAGI_PAGE_URL, 10).is_err());
    assert!(DUCKDUCKGO_REACT.parse(KAGI_RESULTS, KAGI_PAGE_URL, 10).is_err());
}

#[test]
fn test_registry_returns_static_variants() {
    let parser = parser_for("kagi-v2").unwrap();
    assert_eq!(parser.ready_selector(), "#layout-v2");
    assert_eq!(parser.engine(), SearchEngine::Kagi);
}

//! Result page text for `kagi_search_fetch`

use kodegen_tools_kagi::web_search::{
    FetchedResult, PageContent, SearchResult, fetch_page_text, format_fetched,
};

mod common;
use common::{FakePage, Navigation, millis};

const ARTICLE: &str = "<html><body>\
    <p>Tokio is an asynchronous runtime for the Rust programming language.</p>\
    </body></html>";

const RESULT_URL: &str = "https://tokio.rs/";

#[tokio::test]
async fn test_loaded_page_text_is_truncated_to_limit() {
    let page = FakePage::serving(ARTICLE);

    let content = fetch_page_text(&page, RESULT_URL, millis(5_000), 11).await;

    assert_eq!(content, PageContent::Text("Tokio is an...".to_string()));
    assert_eq!(page.visited(), vec![RESULT_URL.to_string()]);
}

#[tokio::test]
async fn test_zero_limit_keeps_full_text() {
    let page = FakePage::serving(ARTICLE);

    let content = fetch_page_text(&page, RESULT_URL, millis(5_000), 0).await;

    assert_eq!(
        content,
        PageContent::Text(
            "Tokio is an asynchronous runtime for the Rust programming language.".to_string()
        )
    );
}

#[tokio::test]
async fn test_navigation_failure_is_reported_inline() {
    let page = FakePage::serving(ARTICLE)
        .with_navigation(Navigation::Fails("net::ERR_CONNECTION_REFUSED"));

    let content = fetch_page_text(&page, RESULT_URL, millis(5_000), 20).await;

    match content {
        PageContent::Failed(reason) => {
            assert!(reason.contains("ERR_CONNECTION_REFUSED"), "{reason}")
        }
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_stalled_navigation_reads_what_loaded() {
    let page = FakePage::serving(ARTICLE).with_navigation(Navigation::Stalls);

    let content = fetch_page_text(&page, RESULT_URL, millis(50), 20).await;

    assert_eq!(content, PageContent::Text("Tokio is an asynchro...".to_string()));
}

#[tokio::test]
async fn test_browser_timeout_reads_what_loaded() {
    let page = FakePage::serving(ARTICLE).with_navigation(Navigation::BrowserTimeout);

    let content = fetch_page_text(&page, RESULT_URL, millis(5_000), 5).await;

    assert_eq!(content, PageContent::Text("Tokio...".to_string()));
}

#[tokio::test]
async fn test_fetched_listing_mixes_text_and_failures() {
    let loaded = FakePage::serving(ARTICLE);
    let broken =
        FakePage::serving(ARTICLE).with_navigation(Navigation::Fails("net::ERR_ABORTED"));

    let fetched = vec![
        FetchedResult {
            result: result(1, RESULT_URL),
            content: fetch_page_text(&loaded, RESULT_URL, millis(5_000), 5).await,
        },
        FetchedResult {
            result: result(2, "https://docs.rs/tokio"),
            content: fetch_page_text(&broken, "https://docs.rs/tokio", millis(5_000), 5).await,
        },
    ];

    let listing = format_fetched("tokio", &fetched);
    assert!(listing.contains(
        "1: Tokio 1\nURL: https://tokio.rs/\nSnippet: No snippet available.\nContent: Tokio..."
    ));
    assert!(listing.contains("2: Tokio 2\nURL: https://docs.rs/tokio\n"));
    assert!(listing.contains("Content: Error fetching content: navigation failed: net::ERR_ABORTED"));
}

fn result(rank: usize, url: &str) -> SearchResult {
    SearchResult {
        rank,
        title: format!("Tokio {rank}"),
        url: url.to_string(),
        snippet: String::new(),
    }
}

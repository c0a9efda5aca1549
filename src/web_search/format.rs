//! Plain-text renderings of search output

use super::types::{FetchedResult, PageContent, SearchResponse};

const RULE: &str = "-----";

/// One-line summary used as the first tool content
pub fn summary_line(response: &SearchResponse) -> String {
    let top = response
        .results()
        .first()
        .map_or("none", |r| r.title.as_str());
    let partial = if response.is_partial() {
        " · partial (page timeout)"
    } else {
        ""
    };

    format!(
        "Search ({}): {}\n Results: {} · Top: {}{}",
        response.engine(),
        response.query(),
        response.len(),
        top,
        partial
    )
}

/// Numbered listing of results with title, URL and snippet
pub fn format_results(response: &SearchResponse) -> String {
    let mut out = header(response.query());

    if response.is_empty() {
        out.push_str("No results found for this query.");
        return out;
    }

    let blocks: Vec<String> = response
        .results()
        .iter()
        .map(|r| {
            format!(
                "{}: {}\nURL: {}\nSnippet: {}",
                r.rank,
                r.title,
                r.url,
                snippet_or_placeholder(&r.snippet)
            )
        })
        .collect();
    out.push_str(&blocks.join("\n\n"));
    out
}

/// Numbered listing of results including the fetched page content
pub fn format_fetched(query: &str, fetched: &[FetchedResult]) -> String {
    let mut out = header(query);

    if fetched.is_empty() {
        out.push_str("No results found for this query.");
        return out;
    }

    let blocks: Vec<String> = fetched
        .iter()
        .map(|item| {
            let r = &item.result;
            let content = match &item.content {
                PageContent::Text(text) if text.is_empty() => "No content fetched.".to_string(),
                PageContent::Text(text) => text.clone(),
                PageContent::Failed(reason) => format!("Error fetching content: {reason}"),
            };
            format!(
                "{}: {}\nURL: {}\nSnippet: {}\nContent: {}",
                r.rank,
                r.title,
                r.url,
                snippet_or_placeholder(&r.snippet),
                content
            )
        })
        .collect();
    out.push_str(&blocks.join("\n\n"));
    out
}

fn header(query: &str) -> String {
    format!("{RULE}\nResults for search query \"{query}\":\n{RULE}\n")
}

fn snippet_or_placeholder(snippet: &str) -> &str {
    if snippet.is_empty() {
        "No snippet available."
    } else {
        snippet
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::web_search::{SearchEngine, SearchRequest, SearchResult};

    fn result(rank: usize, snippet: &str) -> SearchResult {
        SearchResult {
            rank,
            title: format!("Title {rank}"),
            url: format!("https://example.com/{rank}"),
            snippet: snippet.to_string(),
        }
    }

    #[test]
    fn test_format_fetched_reports_each_content_state() {
        let fetched = vec![
            FetchedResult {
                result: result(1, "first"),
                content: PageContent::Text("Body text".to_string()),
            },
            FetchedResult {
                result: result(2, ""),
                content: PageContent::Failed("navigation failed: net::ERR".to_string()),
            },
        ];

        let text = format_fetched("rust", &fetched);
        assert!(text.starts_with("-----\nResults for search query \"rust\":\n-----\n"));
        assert!(text.contains("1: Title 1\nURL: https://example.com/1\nSnippet: first\nContent: Body text"));
        assert!(text.contains("Snippet: No snippet available."));
        assert!(text.contains("Content: Error fetching content: navigation failed: net::ERR"));
    }

    #[test]
    fn test_format_fetched_empty_page_text() {
        let fetched = vec![FetchedResult {
            result: result(1, "first"),
            content: PageContent::Text(String::new()),
        }];

        let text = format_fetched("rust", &fetched);
        assert!(text.ends_with("Snippet: first\nContent: No content fetched."));
    }

        #[test]
    fn test_empty_listing() {
        assert!(format_fetched("nothing", &[]).ends_with("No results found for this query."));

        let request = SearchRequest::new("nothing", 5, Duration::from_secs(1)).unwrap();
        let response = SearchResponse::new(&request, SearchEngine::Kagi, "kagi-v2", false, vec![]);
        assert!(format_results(&response).ends_with("No results found for this query."));
        assert!(summary_line(&response).contains("Results: 0 · Top: none"));
    }
}

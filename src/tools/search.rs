//! `kagi_search` MCP tool implementation
//!
//! Runs one query and returns structured results with titles, URLs, and snippets.

use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, Content};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use crate::web_search::{SearchResponse, SearchService, summary_line};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct KagiSearchArgs {
    /// Concise, keyword-focused search query. Include the essential context so
    /// the query stands on its own.
    pub query: String,
}

pub async fn execute(service: &SearchService, args: KagiSearchArgs) -> Result<CallToolResult, McpError> {
    match service.search(&args.query).await {
        Ok(response) => Ok(CallToolResult::success(render(&response))),
        Err(e) => Ok(super::failure(&e)),
    }
}

/// Content[0] is a human summary, Content[1] the machine-parseable JSON
pub fn render(response: &SearchResponse) -> Vec<Content> {
    let metadata = json!({
        "query": response.query(),
        "engine": response.engine(),
        "parser_version": response.parser_version(),
        "partial": response.is_partial(),
        "searched_at": response.searched_at(),
        "result_count": response.len(),
        "results": response.results(),
    });
    let json_str = serde_json::to_string_pretty(&metadata).unwrap_or_else(|_| "{}".to_string());

    vec![Content::text(summary_line(response)), Content::text(json_str)]
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::Value;

    use super::*;
    use crate::config::Config;
    use crate::web_search::{SearchEngine, SearchRequest, SearchResult};

    fn unreachable_service() -> SearchService {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .and_then(|listener| listener.local_addr())
            .map(|addr| addr.port())
            .unwrap();
        let config = Config::from_lookup(|key| match key {
            "CDP_URL" => Some("127.0.0.1".to_string()),
            "CDP_PORT" => Some(port.to_string()),
            "BROWSER_LAUNCH" => Some("false".to_string()),
            _ => None,
        })
        .unwrap();
        SearchService::new(config)
    }

    #[test]
    fn test_render_summary_and_json() {
        let request = SearchRequest::new("rust", 10, Duration::from_secs(1)).unwrap();
        let response = SearchResponse::new(
            &request,
            SearchEngine::Kagi,
            "kagi-v2",
            false,
            vec![SearchResult {
                rank: 1,
                title: "Rust".to_string(),
                url: "https://www.rust-lang.org/".to_string(),
                snippet: String::new(),
            }],
        );

        let contents = serde_json::to_value(render(&response)).unwrap();
        let summary = contents[0]["text"].as_str().unwrap();
        assert!(summary.contains("rust"));

        let metadata: Value = serde_json::from_str(contents[1]["text"].as_str().unwrap()).unwrap();
        assert_eq!(metadata["result_count"], 1);
        assert_eq!(metadata["partial"], false);
        assert_eq!(metadata["results"][0]["url"], "https://www.rust-lang.org/");
    }

    #[tokio::test]
    async fn test_connection_failure_is_tool_error() {
        let service = unreachable_service();
        let args = KagiSearchArgs {
            query: "rust programming".to_string(),
        };

        let result = execute(&service, args).await.unwrap();
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["isError"], true);
        let text = value["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Search failed during connection stage"), "{text}");
    }
}

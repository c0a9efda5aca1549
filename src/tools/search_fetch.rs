//! `kagi_search_fetch` MCP tool implementation
//!
//! Runs one query, then opens every result and returns its page text.

use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, Content};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::web_search::{SearchService, format_fetched, summary_line};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct KagiSearchFetchArgs {
    /// Concise, keyword-focused search query. Include the essential context so
    /// the query stands on its own.
    pub query: String,
}

pub async fn execute(
    service: &SearchService,
    args: KagiSearchFetchArgs,
) -> Result<CallToolResult, McpError> {
    let request = match service.request(&args.query) {
        Ok(request) => request,
        Err(e) => return Ok(super::failure(&e)),
    };

    match service.search_and_fetch(&request).await {
        Ok((response, fetched)) => Ok(CallToolResult::success(vec![
            Content::text(summary_line(&response)),
            Content::text(format_fetched(response.query(), &fetched)),
        ])),
        Err(e) => Ok(super::failure(&e)),
    }
}

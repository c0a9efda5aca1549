//! MCP server exposing the search tools over stdio

use std::sync::Arc;

use anyhow::Context;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, ServerCapabilities, ServerInfo};
use rmcp::{ErrorData as McpError, ServerHandler, ServiceExt, tool, tool_handler, tool_router};
use tracing::info;

use crate::tools::{self, KagiSearchArgs, KagiSearchFetchArgs};
use crate::web_search::SearchService;

const INSTRUCTIONS: &str = "Web search through the user's own logged-in browser. \
     Use kagi_search for ranked results (title, URL, snippet) and kagi_search_fetch \
     when the page contents of the results are needed.";

#[derive(Clone)]
pub struct KagiSearchServer {
    tool_router: ToolRouter<Self>,
    service: Arc<SearchService>,
}

#[tool_router]
impl KagiSearchServer {
    pub fn new(service: Arc<SearchService>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            service,
        }
    }

    pub fn service(&self) -> &Arc<SearchService> {
        &self.service
    }

    #[tool(
        name = "kagi_search",
        description = "Search the web with Kagi through the locally logged-in browser. Returns up to RESULTS_MAX results in page order, each with rank, title, url and snippet (snippet may be empty). `partial: true` means the results page had not finished rendering before the page timeout. Example: kagi_search({\"query\": \"rust async programming\"})"
    )]
    async fn kagi_search(
        &self,
        Parameters(args): Parameters<KagiSearchArgs>,
    ) -> Result<CallToolResult, McpError> {
        tools::search::execute(&self.service, args).await
    }

    #[tool(
        name = "kagi_search_fetch",
        description = "Search the web with Kagi and fetch the page content of every result. Use when the user asks to fetch results or when snippets are not enough. Results are numbered; each has title, URL, snippet and page text, truncated to CONTENT_CHAR_LIMIT characters when configured. Pages that fail to load are reported inline."
    )]
    async fn kagi_search_fetch(
        &self,
        Parameters(args): Parameters<KagiSearchFetchArgs>,
    ) -> Result<CallToolResult, McpError> {
        tools::search_fetch::execute(&self.service, args).await
    }
}

#[tool_handler]
impl ServerHandler for KagiSearchServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Serve MCP over stdin/stdout until the client disconnects or Ctrl-C
///
/// The browser connection is dropped on the way out; the browser keeps running.
pub async fn serve_stdio(service: Arc<SearchService>) -> anyhow::Result<()> {
    let server = KagiSearchServer::new(Arc::clone(&service));
    let running = server
        .serve(rmcp::transport::stdio())
        .await
        .context("Failed to start MCP stdio transport")?;
    info!("MCP server ready on stdio");

    tokio::select! {
        quit = running.waiting() => {
            let reason = quit.context("MCP service task failed")?;
            info!("MCP session ended: {:?}", reason);
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl-C, shutting down");
        }
    }

    service.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_router_exposes_both_tools() {
        let config = Config::from_lookup(|_| None).unwrap();
        let server = KagiSearchServer::new(Arc::new(SearchService::new(config)));

        let mut names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        names.sort();

        assert_eq!(names, vec!["kagi_search", "kagi_search_fetch"]);
    }
}

//! MCP tool implementations
//!
//! Each tool is a plain async function over [`SearchService`]; the rmcp
//! router in `server.rs` only forwards to them.
//!
//! [`SearchService`]: crate::web_search::SearchService

pub mod search;
pub mod search_fetch;

pub use search::KagiSearchArgs;
pub use search_fetch::KagiSearchFetchArgs;

use rmcp::model::{CallToolResult, Content};

use crate::web_search::SearchError;

/// Tool-level failure naming the stage that failed
pub fn failure(error: &SearchError) -> CallToolResult {
    CallToolResult::error(vec![Content::text(error.user_message())])
}

// Kagi search MCP server
//
// Without a subcommand this serves the search tools over stdio for an MCP
// client. `search` runs one query from the shell and prints the listing.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use kodegen_tools_kagi::utils::validate_navigation_timeout;
use kodegen_tools_kagi::web_search::{format_fetched, format_results, summary_line};
use kodegen_tools_kagi::{Config, SearchService, serve_stdio};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kodegen-kagi")]
#[command(version)]
#[command(about = "Web search through your own browser session, served over MCP")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the MCP tools over stdio (default)
    Serve,

    /// Run a single search and print the results
    Search {
        /// Search query
        query: String,

        /// Cap on returned results (overrides RESULTS_MAX)
        #[arg(short = 'n', long)]
        max_results: Option<usize>,

        /// Page timeout in milliseconds (overrides PAGE_TIMEOUT)
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Also open every result and print its page text
        #[arg(long)]
        fetch: bool,

        /// Truncate fetched page text to this many characters (overrides CONTENT_CHAR_LIMIT)
        #[arg(long)]
        content_limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // stdout belongs to the MCP transport
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Invalid configuration")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            tracing::info!(
                "Starting Kagi search server (engine {}, parser {}, endpoint {})",
                config.search.engine,
                config.search.parser_version,
                config.browser.endpoint
            );
            serve_stdio(Arc::new(SearchService::new(config))).await
        }
        Command::Search {
            query,
            max_results,
            timeout,
            fetch,
            content_limit,
        } => {
            let mut config = config;
            if let Some(max) = max_results {
                if max == 0 {
                    return Err(anyhow!("--max-results must be at least 1"));
                }
                config.search.results_max = max;
            }
            if timeout.is_some() {
                let page_timeout = validate_navigation_timeout(
                    timeout,
                    config.search.page_timeout.as_millis() as u64,
                )
                .map_err(|e| anyhow!(e))?;
                config.set_page_timeout(page_timeout);
            }
            if let Some(limit) = content_limit {
                config.search.content_char_limit = limit;
            }
            run_search(config, &query, fetch).await
        }
    }
}

async fn run_search(config: Config, query: &str, fetch: bool) -> Result<()> {
    let service = SearchService::new(config);
    let request = service.request(query).map_err(|e| anyhow!(e.user_message()))?;

    let outcome = if fetch {
        service
            .search_and_fetch(&request)
            .await
            .map(|(response, fetched)| {
                format!(
                    "{}\n\n{}",
                    summary_line(&response),
                    format_fetched(response.query(), &fetched)
                )
            })
    } else {
        service.search_with(&request).await.map(|response| {
            format!("{}\n\n{}", summary_line(&response), format_results(&response))
        })
    };

    // Give in-flight tab closes a moment before the runtime goes away
    service.shutdown().await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let listing = outcome.map_err(|e| anyhow!(e.user_message()))?;
    println!("{listing}");
    Ok(())
}

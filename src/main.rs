//! stargaze - search GitHub repositories and toggle stars.
//!
//! # Usage
//!
//! ```bash
//! # Show the authenticated user
//! stargaze viewer
//!
//! # Search with the configured default query, three pages
//! stargaze search --pages 3
//!
//! # Star or unstar a repository from the first page of a search
//! stargaze toggle frontend-handbook --query "frontend"
//! ```
//!
//! Configuration comes from `STARGAZE_*` environment variables, an optional
//! TOML file named by `STARGAZE_CONFIG_FILE`, and `GITHUB_TOKEN`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use stargaze::cache::CacheStore;
use stargaze::github::{GitHubClient, SearchResult};
use stargaze::state::SearchState;
use stargaze::{AppConfig, Session};

#[derive(Parser)]
#[command(name = "stargaze")]
#[command(author, version, about = "Search GitHub repositories and toggle stars")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the authenticated user
    Viewer,
    /// Search repositories
    Search {
        /// Search string (defaults to the configured query)
        query: Option<String>,

        /// Number of pages to walk forward
        #[arg(short, long, default_value_t = 1)]
        pages: u32,
    },
    /// Star or unstar a repository found on the first search page
    Toggle {
        /// Repository name as shown in search results
        name: String,

        /// Search string (defaults to the configured query)
        #[arg(short, long)]
        query: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "command failed");
        return Err(e);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    let client = GitHubClient::from_config(&config)?;

    match cli.command {
        Commands::Viewer => {
            let mut session = Session::new(client, SearchState::default());
            let viewer = session.viewer().await?;
            match viewer.name {
                Some(name) => println!("{} ({})", viewer.login, name),
                None => println!("{}", viewer.login),
            }
        }
        Commands::Search { query, pages } => {
            let query = query.unwrap_or_else(|| config.default_query.clone());
            let mut session = Session::new(client, SearchState::new(query, config.page_size));

            let page = session.load().await?;
            print_page(&page);
            for _ in 1..pages {
                match session.next_page().await? {
                    Some(next) => print_page(&next),
                    None => break,
                }
            }

            if let Some(entry) = session.cache().entry(&session.search.key()) {
                tracing::debug!(age_ms = entry.age().as_millis() as u64, "last page cache entry");
            }
            if session.search.page_info().is_some_and(|info| info.has_next_page) {
                println!("(more results, use --pages to see further)");
            }
            log_rate_limit(&session);
        }
        Commands::Toggle { name, query } => {
            let query = query.unwrap_or_else(|| config.default_query.clone());
            let mut session = Session::new(client, SearchState::new(query, config.page_size));

            let page = session.load().await?;
            let node_id = page
                .node_by_name(&name)
                .map(|node| node.id.clone())
                .with_context(|| format!("repository {} is not on the first page", name))?;

            let state = session.toggle_star(&node_id).await?;
            println!(
                "{} {} ({} stars)",
                if state.viewer_has_starred { "starred" } else { "unstarred" },
                name,
                state.total_count()
            );
            log_rate_limit(&session);
        }
    }

    Ok(())
}

fn log_rate_limit<C: CacheStore>(session: &Session<GitHubClient, C>) {
    let rate_limit = session.transport().rate_limit();
    tracing::info!(
        remaining = rate_limit.remaining,
        limit = rate_limit.limit,
        "GitHub rate limit"
    );
}

fn print_page(page: &SearchResult) {
    println!("{} repositories", page.repository_count);
    for edge in &page.edges {
        let node = &edge.node;
        let mark = if node.star.viewer_has_starred { "*" } else { " " };
        println!(
            "{} {:>6}  {}  {}",
            mark,
            node.star.total_count(),
            node.name,
            node.url
        );
    }
}

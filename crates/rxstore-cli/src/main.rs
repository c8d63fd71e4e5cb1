mod commands;

use clap::{Parser, Subcommand};
use rxstore_core::{AppConfig, SortOption};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "rxstore-cli")]
#[command(about = "Storefront route resolution command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve a storefront path and print its render plan as JSON
    Resolve {
        /// Storefront path, e.g. /thuoc/giam-dau
        path: String,
        /// Content filter, repeatable (e.g. --filter brand=5,9)
        #[arg(long = "filter", value_name = "KEY=VALUE", value_parser = parse_filter_arg)]
        filters: Vec<(String, String)>,
        /// Sort order: bestselling, price-low, price-high
        #[arg(long)]
        sort: Option<SortOption>,
        /// Page number (1-based)
        #[arg(long)]
        page: Option<u32>,
        /// Products per page (defaults to the configured page size)
        #[arg(long)]
        page_size: Option<u32>,
        /// Print the loading skeleton that would show before the fetch completes
        #[arg(long)]
        pending: bool,
    },
    /// Fetch the dynamic filter groups for a category slug
    Filters {
        /// Category slug, e.g. giam-dau
        slug: String,
    },
    /// Print the canonical query string for a set of filters
    Query {
        #[arg(long = "filter", value_name = "KEY=VALUE", value_parser = parse_filter_arg)]
        filters: Vec<(String, String)>,
        #[arg(long)]
        sort: Option<SortOption>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        page_size: Option<u32>,
        /// Leave page and page_size out of the query string
        #[arg(long)]
        no_pagination: bool,
    },
    /// Show recently viewed products from the state store
    Recent {
        /// Remove all recently viewed entries
        #[arg(long)]
        clear: bool,
    },
}

/// Parses a `KEY=VALUE` filter argument. The value may be empty.
fn parse_filter_arg(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got \"{raw}\""))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("filter key is empty in \"{raw}\""));
    }
    Ok((key.to_owned(), value.trim().to_owned()))
}

/// Installs the fmt subscriber on stderr so stdout stays clean JSON.
fn init_tracing(default_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

/// Loads configuration (including `.env`) and installs logging at the
/// configured level.
fn load_config() -> anyhow::Result<AppConfig> {
    let config = rxstore_core::load_app_config()?;
    init_tracing(&config.log_level)?;
    tracing::debug!(env = %config.env, base_url = %config.api_base_url, "configuration loaded");
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Resolve {
            path,
            filters,
            sort,
            page,
            page_size,
            pending,
        }) => {
            let config = load_config()?;
            let request = commands::ResolveRequest {
                path: &path,
                filters: &filters,
                sort,
                page,
                page_size,
                pending,
            };
            commands::run_resolve(&config, &request).await?;
        }
        Some(Commands::Filters { slug }) => {
            let config = load_config()?;
            commands::run_filters(&config, &slug).await?;
        }
        Some(Commands::Query {
            filters,
            sort,
            page,
            page_size,
            no_pagination,
        }) => {
            init_tracing("warn")?;
            let query = commands::build_query(&filters, sort, page, page_size, !no_pagination)?;
            println!("{query}");
        }
        Some(Commands::Recent { clear }) => {
            let config = load_config()?;
            commands::run_recent(&config, clear).await?;
        }
        None => println!("rxstore-cli ready; see --help for commands"),
    }

    Ok(())
}

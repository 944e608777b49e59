mod commands;
mod config;
mod server;
mod themealdb;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    Filter, cmd_areas, cmd_categories, cmd_filter, cmd_ingredients, cmd_latest, cmd_popular,
    cmd_random, cmd_requests, cmd_search, cmd_show, cmd_similar,
};
use crate::config::Config;
use crate::themealdb::TheMealDbClient;
use mealcache_core::service::{DEFAULT_POPULAR_LIMIT, MealApi};

#[derive(Parser)]
#[command(
    name = "mealcache",
    version,
    about = "A caching front end for TheMealDB recipe API",
    long_about = "A caching front end for TheMealDB recipe API.\n\n\
        Lookups are served from a local SQLite cache when possible and fetched\n\
        from TheMealDB otherwise. Set MEALCACHE_DB to choose the database file\n\
        and MEALCACHE_API_URL to point at a different upstream."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the JSON API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
    },
    #[command(flatten)]
    Query(QueryCommands),
}

/// Commands answered by a single orchestrator call.
#[derive(Subcommand)]
enum QueryCommands {
    /// Search meals by name
    Search {
        /// Meal name, or part of one
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a meal's full recipe
    Show {
        /// TheMealDB meal id (e.g. 52772)
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a random meal
    Random {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the most recently cached meals
    Latest {
        /// Number of meals to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List meals in a category
    Category {
        /// Category name (e.g. Seafood)
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List meals from an area
    Area {
        /// Area name (e.g. Canadian)
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List meals using an ingredient
    Ingredient {
        /// Ingredient name (e.g. chicken_breast)
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all meal categories
    Categories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all areas
    Areas {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all ingredients
    Ingredients {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the most searched keywords
    Popular {
        /// Number of keywords to show
        #[arg(short, long, default_value_t = DEFAULT_POPULAR_LIMIT)]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show past searches similar to a keyword
    Similar {
        /// Keyword to match
        keyword: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the request log (cache hits and remote calls)
    Requests {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let client = TheMealDbClient::new(&config.api_base_url)?;
    let api = MealApi::open(&config.db_path, Box::new(client))?;
    tracing::debug!(db = %config.db_path.display(), upstream = %config.api_base_url, "ready");

    match cli.command {
        Commands::Serve { port, bind } => server::start_server(api, port, &bind).await,
        Commands::Query(command) => tokio::task::spawn_blocking(move || dispatch(&api, command))
            .await
            .context("command task failed")?,
    }
}

/// Runs off the async runtime: the orchestrator blocks on remote calls.
fn dispatch(api: &MealApi, command: QueryCommands) -> Result<()> {
    match command {
        QueryCommands::Search { name, json } => cmd_search(api, &name, json),
        QueryCommands::Show { id, json } => cmd_show(api, id, json),
        QueryCommands::Random { json } => cmd_random(api, json),
        QueryCommands::Latest { limit, json } => cmd_latest(api, limit, json),
        QueryCommands::Category { name, json } => cmd_filter(api, Filter::Category, &name, json),
        QueryCommands::Area { name, json } => cmd_filter(api, Filter::Area, &name, json),
        QueryCommands::Ingredient { name, json } => {
            cmd_filter(api, Filter::Ingredient, &name, json)
        }
        QueryCommands::Categories { json } => cmd_categories(api, json),
        QueryCommands::Areas { json } => cmd_areas(api, json),
        QueryCommands::Ingredients { json } => cmd_ingredients(api, json),
        QueryCommands::Popular { limit, json } => cmd_popular(api, limit, json),
        QueryCommands::Similar { keyword, json } => cmd_similar(api, &keyword, json),
        QueryCommands::Requests { limit, json } => cmd_requests(api, limit, json),
    }
}

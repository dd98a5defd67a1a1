use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use newsrelay_core::{storage::Database, AppConfig};

mod commands;

#[derive(Parser)]
#[command(name = "newsrelay")]
#[command(author, version, about = "Relays summarized feed articles to a Telegram channel")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run ingestion and delivery until interrupted (default)
    Run,
    /// Register a feed source
    AddSource {
        /// Display name of the source
        #[arg(short, long)]
        name: String,
        /// RSS or Atom feed URL
        #[arg(short, long)]
        url: String,
    },
    /// List all sources
    ListSources,
    /// Show one source
    ShowSource {
        id: i64,
    },
    /// Delete a source; its stored articles are kept
    DeleteSource {
        id: i64,
    },
    /// Run a single ingestion pass
    Ingest,
    /// Deliver at most one pending article
    Deliver,
    /// Write a default configuration file if none exists
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(AppConfig::config_path);

    if let Some(Commands::InitConfig) = cli.command {
        return commands::init_config::run(&config_path);
    }

    let config = Arc::new(AppConfig::load_from(&config_path)?);

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let db = Database::new(&config).await?;

    match cli.command {
        Some(Commands::Run) | None => commands::daemon::run(db, config).await,
        Some(Commands::AddSource { name, url }) => {
            commands::add_source::run(&db, &name, &url).await
        }
        Some(Commands::ListSources) => commands::list_sources::run(&db).await,
        Some(Commands::ShowSource { id }) => commands::show_source::run(&db, id).await,
        Some(Commands::DeleteSource { id }) => commands::delete_source::run(&db, id).await,
        Some(Commands::Ingest) => commands::ingest::run(&db, &config).await,
        Some(Commands::Deliver) => commands::deliver::run(&db, &config).await,
        Some(Commands::InitConfig) => Ok(()),
    }
}

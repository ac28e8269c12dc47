use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::Path;
use tracing::info;

use call_insight::config::AppConfig;
use call_insight::logging::init_logging;
use call_insight::store::{RecordStore, SqliteRecordStore};
use call_insight::Application;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve {
        /// Interface to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to bind
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Create the call_records table and exit
    InitDb,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // .env is optional; real environment wins
    dotenvy::dotenv().ok();

    let command = cli.command.unwrap_or(Commands::Serve { host: None, port: None });

    // Load configuration
    let mut config = match command {
        Commands::Serve { .. } => AppConfig::load()?,
        Commands::InitDb => AppConfig::load_for_init_db()?,
    };

    // Initialize logging
    let _log_guard = init_logging(
        Some(&config.get_log_level()),
        config.logging.file_path.as_deref().map(Path::new),
        config.logging.format == "json",
    )?;

    info!("Starting call-insight service");

    match command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let application = Application::build(&config).await?;
            application.bind_and_serve(&config.bind_address()).await?;
        },
        Commands::InitDb => {
            let store = SqliteRecordStore::open(&config.database)?;
            store.ensure_schema().await?;
            store.close().await;
            info!("Database initialized");
        },
    }

    Ok(())
}

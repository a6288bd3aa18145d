mod import;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use adscope_agent::{ChatRequest, Orchestrator, PgCampaignStore};
use adscope_core::{ActiveFilterSet, Channel, ValueProp};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "adscope-cli")]
#[command(about = "Adscope command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Run one chat turn and print the response JSON
    Chat {
        /// The question to ask
        message: String,
        /// Restrict results to these channels (comma-separated)
        #[arg(long, value_delimiter = ',')]
        channel: Vec<Channel>,
        /// Restrict results to these value propositions (comma-separated)
        #[arg(long, value_delimiter = ',')]
        value_prop: Vec<ValueProp>,
    },
    /// Import ingestion output (a JSON array of campaign records)
    Import {
        /// Path to the JSON file
        path: PathBuf,
        /// Validate the file without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
}

impl Commands {
    /// The file to validate when this is `import --dry-run`.
    fn dry_run_path(&self) -> Option<&Path> {
        match self {
            Self::Import {
                path,
                dry_run: true,
            } => Some(path.as_path()),
            _ => None,
        }
    }
}

fn base_filters(channel: &[Channel], value_prop: &[ValueProp]) -> ActiveFilterSet {
    ActiveFilterSet {
        channel: (!channel.is_empty()).then(|| channel.to_vec()),
        value_prop: (!value_prop.is_empty()).then(|| value_prop.to_vec()),
        ..ActiveFilterSet::default()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("adscope-cli: run with --help to list commands");
        return Ok(());
    };

    // A dry-run import only reads the file, so it runs without env config.
    if let Some(path) = command.dry_run_path() {
        init_tracing(DEFAULT_LOG_LEVEL)?;
        let records = import::read_records(path)?;
        tracing::info!(records = records.len(), "dry run: file is valid, nothing written");
        return Ok(());
    }

    let config = adscope_core::load_app_config()?;
    init_tracing(&config.log_level)?;

    let pool_config = adscope_db::PoolConfig::from_app_config(&config);
    let pool = adscope_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Migrate => {
            let applied = adscope_db::run_migrations(&pool).await?;
            tracing::info!(applied, "migrations up to date");
        }
        Commands::Chat {
            message,
            channel,
            value_prop,
        } => {
            let store = Arc::new(PgCampaignStore::new(pool));
            let orchestrator = Orchestrator::from_config(&config, store)?;
            let request = ChatRequest::new(message)
                .with_filters(base_filters(&channel, &value_prop));
            let response = orchestrator.respond(&request).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Import { path, .. } => {
            let records = import::read_records(&path)?;
            let inserted = import::run_import(&pool, &records).await?;
            tracing::info!(inserted, path = %path.display(), "import complete");
        }
    }

    Ok(())
}

const DEFAULT_LOG_LEVEL: &str = "info";

/// Logs go to stderr so `chat` output stays pipeable. `RUST_LOG` wins over
/// `fallback`.
fn init_tracing(fallback: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(fallback))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

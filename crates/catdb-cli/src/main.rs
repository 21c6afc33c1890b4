use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod db;
mod runs;
mod sync;

#[derive(Debug, Parser)]
#[command(name = "catdb")]
#[command(about = "Product catalog ingestion and normalization")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Ingest products for every active brand (`all`) or one brand slug.
    Sync {
        target: String,
        /// Restrict native catalogs to recently published products.
        #[arg(long)]
        new_only: bool,
        /// Fetch, normalize and classify without writing anything.
        #[arg(long)]
        dry_run: bool,
    },
    /// List recent scrape runs, newest first.
    Runs {
        #[arg(long)]
        brand: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Database maintenance.
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    Migrate,
    Ping,
    /// Upsert brands from the brands YAML file.
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = catdb_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    tracing::info!(env = %config.env, "catdb starting");
    let pool = catdb_db::connect_pool(
        &config.database_url,
        catdb_db::PoolConfig::from_app_config(&config),
    )
    .await?;

    match cli.command {
        Commands::Sync {
            target,
            new_only,
            dry_run,
        } => {
            let options = catdb_sync::SyncOptions { new_only, dry_run };
            let summary = sync::run_sync(pool, &config, &target, options).await?;
            if summary.any_failed() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Runs { brand, limit } => {
            runs::run_list_runs(pool, brand.as_deref(), limit).await?;
        }
        Commands::Db { command } => match command {
            DbCommands::Migrate => db::run_migrate(&pool).await?,
            DbCommands::Ping => db::run_ping(&pool).await?,
            DbCommands::Seed => db::run_seed(&pool, &config).await?,
        },
    }

    Ok(ExitCode::SUCCESS)
}

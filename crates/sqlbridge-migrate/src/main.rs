//! sqlbridge-migrate CLI
//!
//! Command-line tool for keeping a database in line with its models.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use sqlbridge_adapter::{AdapterSettings, SqliteAdapter};
use sqlbridge_migrate::load_models;

/// Schema synchronization for sqlbridge models.
#[derive(Parser)]
#[command(name = "sqlbridge-migrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (SQLite path or connection string).
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:db.sqlite3")]
    database: String,

    /// JSON file with the model definitions.
    #[arg(short, long, default_value = "models.json")]
    models: PathBuf,

    /// Abort the whole batch after this many milliseconds.
    #[arg(long, env = "SQLBRIDGE_MIGRATION_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Enable verbose output (every statement is logged).
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drop and recreate every table. All rows are lost.
    Automigrate {
        /// Confirm that existing data may be destroyed.
        #[arg(long)]
        force: bool,
    },

    /// Bring every table in line with its model, keeping data.
    Autoupdate,

    /// Show the SQL autoupdate would run, without running it.
    Plan,

    /// Exit with an error if any table differs from its model.
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let models = load_models(&cli.models)?;
    info!("Loaded {} model(s) from {}", models.len(), cli.models.display());

    let mut settings = AdapterSettings::new(cli.database);
    if let Some(timeout) = cli.timeout_ms {
        settings = settings.with_migration_timeout_ms(timeout);
    }
    let adapter = SqliteAdapter::initialize(settings, models).await?;

    match cli.command {
        Commands::Automigrate { force } => {
            if !force && !adapter.settings().is_memory() {
                anyhow::bail!("automigrate drops every table; pass --force to confirm");
            }
            adapter.automigrate().await?;
            info!("All tables recreated.");
        }

        Commands::Autoupdate => {
            adapter.autoupdate().await?;
            info!("Database is up to date.");
        }

        Commands::Plan => {
            for plan in adapter.plan().await? {
                if plan.statements.is_empty() {
                    println!("-- {}: up to date", plan.model);
                    continue;
                }
                println!("-- {}", plan.model);
                for sql in &plan.statements {
                    println!("{sql};");
                }
            }
        }

        Commands::Check => {
            let stale: Vec<String> = adapter
                .plan()
                .await?
                .into_iter()
                .filter(|plan| !plan.statements.is_empty())
                .map(|plan| plan.model)
                .collect();
            if !stale.is_empty() {
                for model in &stale {
                    warn!(model = %model, "Table differs from its model");
                }
                anyhow::bail!("{} model(s) out of date", stale.len());
            }
            info!("All tables match their models.");
        }
    }

    adapter.disconnect().await;
    Ok(())
}

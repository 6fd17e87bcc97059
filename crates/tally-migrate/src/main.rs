//! tally-migrate CLI
//!
//! Command-line tool that applies the bank schema to a PostgreSQL database.

use clap::{Parser, Subcommand};
use tally_core::{float, integer, text, timestamp, SqlFunction, TableRegistry};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use tally_migrate::prelude::*;

/// Content-hashed schema migrations for the bank schema.
#[derive(Parser)]
#[command(name = "tally-migrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Full database URL. Overrides the individual connection flags.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Database dialect.
    #[arg(long, env = "TALLY_DB_DIALECT", default_value = "postgresql")]
    dialect: String,

    /// Client driver suffix (e.g. `asyncpg`); informational only.
    #[arg(long, env = "TALLY_DB_DRIVER")]
    driver: Option<String>,

    /// Database user.
    #[arg(short, long, env = "TALLY_DB_USER", default_value = "postgres")]
    user: String,

    /// Database password.
    #[arg(long, env = "TALLY_DB_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,

    /// Database host.
    #[arg(long, env = "TALLY_DB_HOST", default_value = "localhost")]
    host: String,

    /// Database port.
    #[arg(short, long, env = "TALLY_DB_PORT", default_value_t = 5432)]
    port: u16,

    /// Database name.
    #[arg(short, long, env = "TALLY_DB_NAME", default_value = "postgres")]
    database: String,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn dsn(&self) -> Dsn {
        Dsn {
            dialect: self.dialect.clone(),
            driver: self.driver.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            host: self.host.clone(),
            port: self.port,
            database: self.database.clone(),
        }
    }

    fn connection(&self) -> PgConnection {
        match &self.database_url {
            Some(url) => PgConnection::new(url.clone()),
            None => PgConnection::from_dsn(&self.dsn()),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the DDL and hash of every declared table.
    Sql,

    /// Apply pending migrations.
    Migrate {
        /// Show SQL without executing (dry run).
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the applied migrations.
    ShowMigrations {
        /// Print the ledger as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Declares the ledger followed by the bank tables.
fn declare_schema() -> Result<TableRegistry> {
    let mut registry = TableRegistry::new();
    declare_ledger(&mut registry)?;
    registry.declare_table(
        "accounts",
        Some("account_id"),
        vec![
            integer("account_id").primary_key(),
            text("account_type"),
            timestamp("created_at").default_function(SqlFunction::Now),
            timestamp("updated_at").nullable().default_null(),
        ],
    )?;
    registry.declare_table(
        "payments",
        Some("payment_id"),
        vec![
            integer("payment_id").primary_key(),
            integer("account_id"),
            float("amount"),
            timestamp("created_at").default_function(SqlFunction::Now),
            timestamp("updated_at").nullable().default_null(),
        ],
    )?;
    Ok(registry)
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

    let registry = declare_schema()?;

    match cli.command {
        Commands::Sql => {
            for planned in MigrationRunner::new(&registry).plan()? {
                println!("-- {} ({})", planned.table, planned.hash);
                println!("{}\n", planned.ddl);
            }
        }

        Commands::Migrate { dry_run } => {
            if dry_run {
                info!("Dry run mode - SQL will be printed but not executed.");
            }

            let mut conn = cli.connection();
            conn.connect().await?;
            let result = MigrationRunner::new(&registry)
                .dry_run(dry_run)
                .run(&mut conn)
                .await;
            conn.disconnect().await;

            let records = result?;
            let applied = records
                .iter()
                .filter(|r| r.outcome == MigrationOutcome::Applied)
                .count();
            info!(tables = records.len(), applied, "Migration run finished");
        }

        Commands::ShowMigrations { json } => {
            let ledger = Ledger::from_registry(&registry, LEDGER_TABLE)?;
            let mut conn = cli.connection();
            conn.connect().await?;
            let result: Result<Vec<LedgerEntry>> = async {
                if ledger.exists(&mut conn).await? {
                    ledger.entries(&mut conn).await
                } else {
                    Ok(Vec::new())
                }
            }
            .await;
            conn.disconnect().await;
            let entries = result?;

            if json {
                println!("{}", entries_to_json(&entries)?);
            } else if entries.is_empty() {
                info!("No migrations have been applied yet.");
            } else {
                println!("\nApplied migrations:");
                println!("{:-<60}", "");
                for entry in &entries {
                    println!(
                        " [X] {} {} ({})",
                        entry.migration_name,
                        entry.migration_hash,
                        entry.created_at.format("%Y-%m-%d %H:%M:%S")
                    );
                }
                println!();
            }
        }
    }

    Ok(())
}

//! Holiday ledger server and admin tool.
//!
//! # Usage
//!
//! ```bash
//! # Serve the HTTP API
//! holiday-ledger serve --config config/default --db ledger.db
//!
//! # Force a recompute for one staff member
//! holiday-ledger recalculate --db ledger.db Alice
//!
//! # Derive an identifier without a store
//! holiday-ledger identify staff Alice
//!
//! # Re-key every row under a new namespace
//! holiday-ledger migrate-namespace --db ledger.db --to-version 2 \
//!     --to-uuid 0b8f... --confirm-rekey
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use holiday_ledger::api::{AppState, create_router};
use holiday_ledger::config::ConfigLoader;
use holiday_ledger::error::EngineError;
use holiday_ledger::identity::{EntityType, IdentityGenerator, IdentityNamespace, NamespaceMigration};
use holiday_ledger::store::SqliteStore;
use serde::Serialize;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "holiday-ledger")]
#[command(about = "Deterministic-identity HR ledger with holiday entitlement recalculation")]
struct Args {
    /// Configuration directory holding identity.yaml, accrual.yaml and store.yaml.
    #[arg(long, global = true, default_value = "config/default")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API.
    Serve {
        /// SQLite database file.
        #[arg(long)]
        db: PathBuf,
        /// Address to listen on.
        #[arg(long, default_value = "127.0.0.1:3000")]
        bind: SocketAddr,
    },
    /// Recompute one staff member's current-year entitlement.
    Recalculate {
        /// SQLite database file.
        #[arg(long)]
        db: PathBuf,
        /// Staff name.
        name: String,
        /// Employment end to use for this recompute only.
        #[arg(long)]
        employment_end: Option<NaiveDate>,
    },
    /// Print the identifier for a natural key.
    Identify {
        /// Record kind: staff, shift, accrual_year, entitlement or change_of_terms.
        #[arg(value_parser = parse_entity_type)]
        entity_type: EntityType,
        /// Natural-key fields in order.
        fields: Vec<String>,
    },
    /// Re-key every row under a new identity namespace.
    MigrateNamespace {
        /// SQLite database file.
        #[arg(long)]
        db: PathBuf,
        /// Target namespace version.
        #[arg(long)]
        to_version: u32,
        /// Target namespace uuid.
        #[arg(long)]
        to_uuid: Uuid,
        /// Required: acknowledges every stored identifier will change.
        #[arg(long)]
        confirm_rekey: bool,
    },
}

fn parse_entity_type(raw: &str) -> Result<EntityType, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| format!("unknown entity type '{raw}'"))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).compact().init();
}

fn print_json<T: Serialize>(value: &T) -> Result<(), EngineError> {
    let text = serde_json::to_string_pretty(value).map_err(|err| EngineError::Storage {
        message: format!("failed to encode output: {err}"),
    })?;
    println!("{text}");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(err) => {
            error!(error = %err, "Command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode, EngineError> {
    let loader = ConfigLoader::load(&args.config)?;
    let config = *loader.config();

    match args.command {
        Command::Serve { db, bind } => {
            let store = SqliteStore::open(&db, &config)?;
            info!(
                db = %db.display(),
                namespace_version = store.namespace().version(),
                year_start = %store.current_year().start,
                "Store opened"
            );

            let router = create_router(AppState::new(store));
            let listener = tokio::net::TcpListener::bind(bind)
                .await
                .map_err(|err| EngineError::Storage {
                    message: format!("failed to bind {bind}: {err}"),
                })?;
            info!(%bind, "Listening");
            axum::serve(listener, router)
                .await
                .map_err(|err| EngineError::Storage {
                    message: format!("server error: {err}"),
                })?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Recalculate {
            db,
            name,
            employment_end,
        } => {
            let store = SqliteStore::open(&db, &config)?;
            let report = store.recalculate(&name, employment_end)?;
            print_json(&report)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Identify {
            entity_type,
            fields,
        } => {
            let generator = IdentityGenerator::new(config.namespace());
            let fields: Vec<Option<String>> = fields.into_iter().map(Some).collect();
            println!("{}", generator.identify_fields(entity_type, &fields));
            Ok(ExitCode::SUCCESS)
        }
        Command::MigrateNamespace {
            db,
            to_version,
            to_uuid,
            confirm_rekey,
        } => {
            let target = IdentityNamespace::new(to_version, to_uuid)?;
            let plan = NamespaceMigration::plan(config.namespace(), target)?;
            if !confirm_rekey {
                warn!(
                    from_version = plan.from().version(),
                    to_version = plan.to().version(),
                    "Refusing to re-key without --confirm-rekey"
                );
                return Ok(ExitCode::from(2));
            }

            let store = SqliteStore::open(&db, &config)?;
            let (_, report) = store.migrate_namespace(plan)?;
            print_json(&report)?;
            info!("Update identity.yaml to the new namespace before reopening the store");
            Ok(ExitCode::SUCCESS)
        }
    }
}

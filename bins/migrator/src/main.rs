//! Schema migration runner for the envelope ledger.
//!
//! Usage:
//!   migrator up      - Apply pending migrations and seed default accounts
//!   migrator down    - Roll back the last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables, re-apply migrations and seed
//!
//! The database URL comes from the same configuration as the server.

use anyhow::{Context, bail};
use envelope_db::{connect, migration::Migrator, seed::ensure_default_accounts};
use envelope_shared::AppConfig;
use sea_orm_migration::MigratorTrait;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    let command = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());
    let config = AppConfig::load().context("loading configuration")?;
    if config.database.is_in_memory() {
        info!("Database is in-memory, changes will not outlive this run");
    }

    let db = connect(&config.database)
        .await
        .context("connecting to database")?;

    match command.as_str() {
        "up" => {
            Migrator::up(&db, None).await?;
            let seeded = ensure_default_accounts(&db).await?;
            info!(seeded, "Migrations applied");
        }
        "down" => {
            Migrator::down(&db, Some(1)).await?;
            info!("Rolled back last migration");
        }
        "status" => Migrator::status(&db).await?,
        "fresh" => {
            Migrator::fresh(&db).await?;
            let seeded = ensure_default_accounts(&db).await?;
            info!(seeded, "Schema rebuilt");
        }
        other => bail!("unknown command {other:?}, expected up, down, status or fresh"),
    }

    Ok(())
}

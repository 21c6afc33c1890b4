//! `catdb db` maintenance commands.

use anyhow::Context;
use sqlx::PgPool;

pub(crate) async fn run_migrate(pool: &PgPool) -> anyhow::Result<()> {
    let applied = catdb_db::run_migrations(pool)
        .await
        .context("failed to apply migrations")?;
    tracing::info!(applied, "migrations complete");
    println!("applied {applied} migration(s)");
    Ok(())
}

pub(crate) async fn run_ping(pool: &PgPool) -> anyhow::Result<()> {
    catdb_db::ping(pool).await.context("database ping failed")?;
    println!("database ok");
    Ok(())
}

/// Upsert every brand from the configured YAML file.
pub(crate) async fn run_seed(pool: &PgPool, config: &catdb_core::AppConfig) -> anyhow::Result<()> {
    let file = catdb_core::load_brands(&config.brands_path)
        .with_context(|| format!("failed to load {}", config.brands_path.display()))?;
    let seeded = catdb_db::seed_brands(pool, &file.brands)
        .await
        .context("failed to seed brands")?;
    tracing::info!(seeded, path = %config.brands_path.display(), "brands seeded");
    println!("seeded {seeded} brand(s)");
    Ok(())
}

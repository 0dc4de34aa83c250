use anyhow::{Context, Result};
use diesel::{Connection, pg::PgConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness};

/// Diesel's migration harness is synchronous; run it on the blocking pool
/// before the server starts accepting requests.
pub async fn run_migrations_blocking(
    migrations: EmbeddedMigrations,
    database_url: &str,
) -> Result<usize> {
    let database_url = database_url.to_owned();
    tokio::task::spawn_blocking(move || -> Result<usize> {
        let mut conn = PgConnection::establish(&database_url)
            .context("Failed to establish a migration connection")?;
        let versions = conn
            .run_pending_migrations(migrations)
            .map_err(|err| anyhow::anyhow!("Failed to run migrations: {err}"))?;
        Ok(versions.len())
    })
    .await
    .context("Migration task panicked")?
}

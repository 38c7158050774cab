/// Database migration runner
///
/// Embeds the SQL files under `migrations/` at compile time and applies any
/// that have not yet run. The authoritative schema is owned by deployment
/// tooling; this runner exists so local development and the integration
/// tests can provision a database from scratch.
///
/// # Example
///
/// ```no_run
/// use taskhub::db::migrate::run_migrations;
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), taskhub::Error> {
/// run_migrations(&pool).await?;
/// # Ok(())
/// # }
/// ```
use sqlx::PgPool;
use tracing::info;

use crate::error::Error;

/// Applies all pending migrations
///
/// # Errors
///
/// Returns [`Error::Database`] if a migration fails; the failing migration
/// is rolled back.
pub async fn run_migrations(pool: &PgPool) -> Result<(), Error> {
    info!("running database migrations");
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|err| Error::Database(sqlx::Error::Migrate(Box::new(err))))?;
    info!("database schema up to date");
    Ok(())
}

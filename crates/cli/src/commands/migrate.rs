//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! nimbus migrate
//! ```
//!
//! # Environment Variables
//!
//! - `NIMBUS_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Migrations live in `crates/server/migrations/` and are embedded into the
//! binary at compile time:
//! ```text
//! migrations/
//! ├── 20261015000001_create_users.sql
//! ├── 20261015000002_create_locations.sql
//! └── 20261015000003_create_weather.sql
//! ```

use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;
use tracing::info;

use nimbus_server::config::get_database_url;
use nimbus_server::db;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply schema migrations, then create the session table.
///
/// # Errors
///
/// Returns an error if no database URL is configured, the database cannot be
/// reached, or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = get_database_url("NIMBUS_DATABASE_URL")
        .ok_or(MigrationError::MissingEnvVar("NIMBUS_DATABASE_URL"))?;

    info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    info!("Running schema migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    info!("Creating session table...");
    PostgresStore::new(pool).migrate().await?;

    info!("Migrations complete!");
    Ok(())
}

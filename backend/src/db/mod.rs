pub mod submission_repository;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::config::ServerConfig;

/// Opens the process-wide pool. Closed by `main` once the server stops.
pub async fn init_pool(config: &ServerConfig) -> Result<SqlitePool, sqlx::Error> {
    log::info!(
        "Connecting to {} (max {} connections)",
        config.database_url,
        config.database_max_connections
    );
    SqlitePoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
}

use crate::db::{DatabaseConnection, Db as _};

/// Connects to the database and applies migrations.
///
/// # Errors
/// Errors if connection to database fails or a migration cannot be applied.
/// Connections can fail if the database file cannot be created, or if the database URL is invalid.
pub async fn connect(db_url: &str) -> anyhow::Result<DatabaseConnection> {
    let connection = DatabaseConnection::connect(db_url).await?;
    tracing::info!("Connected to database");
    sqlx::migrate!("./migrations/sqlite")
        .run(&connection.pool)
        .await?;
    Ok(connection)
}

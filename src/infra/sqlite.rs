// Shared SQLite pool setup for the stores that persist to disk.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;

/// Open (creating if needed) the database at `database_path`.
///
/// Accepts a bare file path, a `sqlite:` URL, or `:memory:`. An in-memory
/// database is private to one connection, so the pool is held at one.
pub async fn connect(database_path: &str) -> anyhow::Result<SqlitePool> {
    if database_path.contains(":memory:") {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        return Ok(pool);
    }

    // Ensure the file exists if it's a file path
    let path_str = database_path
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    let path = Path::new(path_str);
    if !path.exists() {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::File::create(path)?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&format!("sqlite://{}", path_str))
        .await?;

    Ok(pool)
}

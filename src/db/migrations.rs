// Database migrations
// Migrations are forward-only. Never edit or delete a migration after it ships.

use rusqlite::Connection;

use crate::error::{ReplayError, Result};

/// All migrations in order. Each migration is a SQL string.
/// Statements use IF NOT EXISTS so stores created by earlier tooling
/// (without a user_version) are adopted as-is.
const MIGRATIONS: &[&str] = &[
    // Migration 1: Snapshot table
    r#"
    CREATE TABLE IF NOT EXISTS raw_itunes_library (
        snapshot_date TEXT NOT NULL,
        snapshot_path TEXT NOT NULL,
        track_id INTEGER NOT NULL,
        name TEXT,
        artist TEXT,
        album_artist TEXT,
        album TEXT,
        genre TEXT,
        kind TEXT,
        total_time INTEGER,
        disc_number INTEGER,
        disc_count INTEGER,
        track_number INTEGER,
        track_count INTEGER,
        year INTEGER,
        date_added TEXT,
        play_count INTEGER,
        play_date INTEGER,
        play_date_utc TEXT,
        skip_count INTEGER,
        skip_date TEXT,
        rating INTEGER,
        loved INTEGER,
        persistent_id TEXT,
        location TEXT,
        PRIMARY KEY (snapshot_date, track_id)
    );

    CREATE INDEX IF NOT EXISTS idx_raw_itunes_library_persistent_id
        ON raw_itunes_library(persistent_id);
    "#,
];

/// Get current schema version from database
fn get_schema_version(conn: &Connection) -> Result<u32> {
    let version: u32 = conn.query_row(
        "PRAGMA user_version",
        [],
        |row| row.get(0)
    )?;
    Ok(version)
}

/// Run all pending migrations. Safe to call on every load.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;
    let target_version = MIGRATIONS.len() as u32;

    if current_version > target_version {
        return Err(ReplayError::Schema(format!(
            "Database schema version {} is newer than this build supports (max {})",
            current_version, target_version
        )));
    }

    if current_version == target_version {
        return Ok(());
    }

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let migration_version = (i + 1) as u32;
        if migration_version <= current_version {
            continue;
        }

        conn.execute_batch(migration)?;
        conn.execute_batch(&format!("PRAGMA user_version = {}", migration_version))?;

        log::debug!("Applied migration {}", migration_version);
    }

    Ok(())
}

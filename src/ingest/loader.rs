// Snapshot loader: replace one snapshot date in the store

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::migrations::run_migrations;
use crate::db::schema::{self, format_date};
use crate::error::Result;
use crate::library::TrackRecord;

/// Replace all rows for `snapshot_date` with `tracks` in one transaction.
///
/// An empty `tracks` is a no-op so a failed or empty parse never wipes a
/// snapshot that loaded earlier. If any insert fails the transaction rolls
/// back and the previous rows for the date are kept.
pub fn load_snapshot(
    conn: &mut Connection,
    snapshot_date: NaiveDate,
    snapshot_path: &str,
    tracks: &[TrackRecord],
) -> Result<usize> {
    if tracks.is_empty() {
        log::info!("No tracks to load for {}", snapshot_date);
        return Ok(0);
    }

    run_migrations(conn)?;

    let date = format_date(snapshot_date);
    let tx = conn.transaction()?;

    let replaced = schema::delete_snapshot(&tx, &date)?;
    if replaced > 0 {
        log::info!("Replacing {} existing rows for {}", replaced, date);
    }

    for track in tracks {
        schema::insert_track(&tx, &date, snapshot_path, track)?;
    }

    tx.commit()?;

    log::info!("Loaded {} tracks from {}", tracks.len(), date);
    Ok(tracks.len())
}

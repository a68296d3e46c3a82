// Database schema types and query helpers

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, params};

use crate::constants::{DATE_STORAGE_FORMAT, TIMESTAMP_STORAGE_FORMAT};
use crate::error::Result;
use crate::library::TrackRecord;

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_STORAGE_FORMAT).to_string()
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_STORAGE_FORMAT).to_string()
}

// ----- Tracks -----

pub fn insert_track(conn: &Connection, snapshot_date: &str, snapshot_path: &str, track: &TrackRecord) -> Result<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO raw_itunes_library (
            snapshot_date, snapshot_path, track_id, name, artist, album_artist, album, genre, kind,
            total_time, disc_number, disc_count, track_number, track_count, year, date_added,
            play_count, play_date, play_date_utc, skip_count, skip_date, rating, loved,
            persistent_id, location
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
            ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25
        )",
    )?;
    stmt.execute(params![
        snapshot_date,
        snapshot_path,
        track.track_id,
        track.name,
        track.artist,
        track.album_artist,
        track.album,
        track.genre,
        track.kind,
        track.total_time,
        track.disc_number,
        track.disc_count,
        track.track_number,
        track.track_count,
        track.year,
        track.date_added.map(format_timestamp),
        track.play_count,
        track.play_date,
        track.play_date_utc.map(format_timestamp),
        track.skip_count,
        track.skip_date.map(format_timestamp),
        track.rating,
        track.loved,
        track.persistent_id,
        track.location,
    ])?;
    Ok(())
}

/// Remove every row of one snapshot date, returning the number removed
pub fn delete_snapshot(conn: &Connection, snapshot_date: &str) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM raw_itunes_library WHERE snapshot_date = ?1",
        params![snapshot_date],
    )?;
    Ok(removed)
}

pub fn count_tracks(conn: &Connection, snapshot_date: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM raw_itunes_library WHERE snapshot_date = ?1",
        params![snapshot_date],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ----- Snapshots -----

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub snapshot_date: String,
    pub snapshot_path: String,
    pub track_count: i64,
}

/// Snapshot dates present in the store, oldest first
pub fn list_snapshots(conn: &Connection) -> Result<Vec<SnapshotSummary>> {
    let mut stmt = conn.prepare(
        "SELECT snapshot_date, MIN(snapshot_path), COUNT(*)
         FROM raw_itunes_library
         GROUP BY snapshot_date
         ORDER BY snapshot_date",
    )?;

    let snapshots = stmt
        .query_map([], |row| {
            Ok(SnapshotSummary {
                snapshot_date: row.get(0)?,
                snapshot_path: row.get(1)?,
                track_count: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(snapshots)
}

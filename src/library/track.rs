// Canonical track record

use chrono::NaiveDateTime;

/// One track's metadata as of a snapshot, independent of the source format.
/// Timestamps are UTC.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackRecord {
    pub track_id: i64,
    pub name: Option<String>,
    pub artist: Option<String>,
    pub album_artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub kind: Option<String>,
    pub total_time: Option<i64>,
    pub disc_number: Option<i64>,
    pub disc_count: Option<i64>,
    pub track_number: Option<i64>,
    pub track_count: Option<i64>,
    pub year: Option<i64>,
    pub date_added: Option<NaiveDateTime>,
    pub play_count: i64,
    /// Legacy numeric play date (seconds since 1904)
    pub play_date: Option<i64>,
    pub play_date_utc: Option<NaiveDateTime>,
    pub skip_count: i64,
    pub skip_date: Option<NaiveDateTime>,
    pub rating: Option<i64>,
    pub loved: bool,
    pub persistent_id: Option<String>,
    pub location: Option<String>,
}

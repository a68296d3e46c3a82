// Field normalization from source-native tracks to canonical records

use std::collections::{HashMap, HashSet};
use std::time::SystemTime;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use plist::{Dictionary, Value};

use super::{ParsedLibrary, RawTrack, TrackRecord};
use crate::constants::{PERSISTENT_ID_TAIL_DIGITS, POSITIONAL_ID_OFFSET};

/// Where a track's storage id came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackIdSource {
    Native,
    Persistent,
    Positional,
}

/// Normalize every track of a parsed document.
///
/// Track ids are unique in the result. Two tracks carrying the same native
/// or persistent id keep the first one and report the other. A positional id
/// never displaces a track: when it clashes it moves past
/// `POSITIONAL_ID_OFFSET`.
pub fn normalize(parsed: &ParsedLibrary) -> Vec<TrackRecord> {
    let resolved: Vec<(TrackRecord, TrackIdSource)> = parsed
        .tracks
        .iter()
        .enumerate()
        .map(|(index, raw)| match raw {
            RawTrack::Plist { key, fields } => from_plist(key, fields, index),
            RawTrack::Tabular { fields } => from_tabular(fields, index),
        })
        .collect();

    // Stable ids are claimed first so a positional id can never take one
    let mut seen = HashSet::new();
    let mut dropped = HashSet::new();
    for (index, (record, source)) in resolved.iter().enumerate() {
        if *source == TrackIdSource::Positional {
            continue;
        }
        if !seen.insert(record.track_id) {
            log::warn!(
                "Duplicate track id {} (persistent id {}), keeping the first occurrence",
                record.track_id,
                record.persistent_id.as_deref().unwrap_or("-")
            );
            dropped.insert(index);
        }
    }

    let mut records = Vec::with_capacity(resolved.len() - dropped.len());
    for (index, (mut record, source)) in resolved.into_iter().enumerate() {
        if dropped.contains(&index) {
            continue;
        }
        if source == TrackIdSource::Positional && !seen.insert(record.track_id) {
            let moved = POSITIONAL_ID_OFFSET + index as i64;
            log::debug!("Positional id {} is taken, using {}", record.track_id, moved);
            record.track_id = moved;
            seen.insert(moved);
        }
        records.push(record);
    }

    records
}

/// Pick a storage id: the source's own integer id, then the tail of the
/// persistent id, then the position in the document.
pub fn derive_track_id(native_id: Option<i64>, persistent_id: Option<&str>, index: usize) -> i64 {
    resolve_track_id(native_id, persistent_id, index).0
}

fn resolve_track_id(
    native_id: Option<i64>,
    persistent_id: Option<&str>,
    index: usize,
) -> (i64, TrackIdSource) {
    if let Some(id) = native_id {
        return (id, TrackIdSource::Native);
    }
    match persistent_id.and_then(track_id_from_persistent_id) {
        Some(id) => (id, TrackIdSource::Persistent),
        None => (index as i64, TrackIdSource::Positional),
    }
}

/// Fold a persistent id into a numeric id using its last eight characters
/// read as hex (low 32 bits). Only the tail has to be hexadecimal.
pub fn track_id_from_persistent_id(persistent_id: &str) -> Option<i64> {
    let chars: Vec<char> = persistent_id.trim().chars().collect();
    let tail: String = chars[chars.len().saturating_sub(PERSISTENT_ID_TAIL_DIGITS)..]
        .iter()
        .collect();
    if tail.is_empty() || !tail.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    i64::from_str_radix(&tail, 16).ok()
}

/// Parse an ISO-8601 timestamp. A trailing `Z` is read as `+00:00` and
/// values without an offset are taken as UTC.
pub fn parse_iso8601(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let normalized = match value.strip_suffix('Z').or_else(|| value.strip_suffix('z')) {
        Some(stripped) => format!("{}+00:00", stripped),
        None => value.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, fmt) {
            return Some(dt);
        }
    }

    let utc = FixedOffset::east_opt(0)?;
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Some(naive.and_utc().with_timezone(&utc));
        }
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(&normalized, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc().with_timezone(&utc));
    }

    None
}

// ----- Property list -----

fn from_plist(key: &str, fields: &Dictionary, index: usize) -> (TrackRecord, TrackIdSource) {
    let persistent_id = plist_string(fields, "Persistent ID");
    let native_id = key
        .trim()
        .parse::<i64>()
        .ok()
        .or_else(|| plist_int(fields, "Track ID"));

    let (track_id, source) = resolve_track_id(native_id, persistent_id.as_deref(), index);

    let record = TrackRecord {
        track_id,
        name: plist_string(fields, "Name"),
        artist: plist_string(fields, "Artist"),
        album_artist: plist_string(fields, "Album Artist"),
        album: plist_string(fields, "Album"),
        genre: plist_string(fields, "Genre"),
        kind: plist_string(fields, "Kind"),
        total_time: plist_int(fields, "Total Time"),
        disc_number: plist_int(fields, "Disc Number"),
        disc_count: plist_int(fields, "Disc Count"),
        track_number: plist_int(fields, "Track Number"),
        track_count: plist_int(fields, "Track Count"),
        year: plist_int(fields, "Year"),
        date_added: plist_date(fields, "Date Added"),
        play_count: plist_int(fields, "Play Count").unwrap_or(0),
        play_date: plist_int(fields, "Play Date"),
        play_date_utc: plist_date(fields, "Play Date UTC"),
        skip_count: plist_int(fields, "Skip Count").unwrap_or(0),
        skip_date: plist_date(fields, "Skip Date"),
        rating: plist_int(fields, "Rating"),
        loved: plist_bool(fields, "Loved").unwrap_or(false),
        persistent_id,
        location: plist_string(fields, "Location"),
    };
    (record, source)
}

fn plist_string(fields: &Dictionary, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_string).map(str::to_string)
}

fn plist_int(fields: &Dictionary, key: &str) -> Option<i64> {
    match fields.get(key)? {
        Value::Integer(i) => i.as_signed().or_else(|| i.as_unsigned().and_then(|u| i64::try_from(u).ok())),
        Value::Real(r) if r.fract() == 0.0 => Some(*r as i64),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn plist_bool(fields: &Dictionary, key: &str) -> Option<bool> {
    match fields.get(key)? {
        Value::Boolean(b) => Some(*b),
        Value::Integer(i) => i.as_signed().map(|v| v != 0),
        _ => None,
    }
}

fn plist_date(fields: &Dictionary, key: &str) -> Option<NaiveDateTime> {
    fields.get(key).and_then(Value::as_date).map(plist_date_to_utc)
}

/// Convert a property list date to a naive UTC timestamp
pub fn plist_date_to_utc(date: plist::Date) -> NaiveDateTime {
    let system: SystemTime = date.into();
    DateTime::<Utc>::from(system).naive_utc()
}

// ----- Tabular -----

fn from_tabular(fields: &HashMap<String, String>, index: usize) -> (TrackRecord, TrackIdSource) {
    let persistent_id = cell_string(fields, "persistent_id");
    let (track_id, source) = resolve_track_id(None, persistent_id.as_deref(), index);

    let record = TrackRecord {
        track_id,
        name: cell_string(fields, "title"),
        artist: cell_string(fields, "artist"),
        album_artist: cell_string(fields, "album_artist"),
        album: cell_string(fields, "album"),
        genre: cell_string(fields, "genre"),
        kind: cell_string(fields, "kind"),
        total_time: cell_int(fields, "total_time"),
        disc_number: cell_int(fields, "disc_number"),
        disc_count: cell_int(fields, "disc_count"),
        track_number: cell_int(fields, "track_number"),
        track_count: cell_int(fields, "track_count"),
        year: cell_int(fields, "year"),
        date_added: cell_timestamp(fields, "date_added"),
        play_count: cell_int(fields, "play_count").unwrap_or(0),
        // The tabular export has no legacy play date
        play_date: None,
        play_date_utc: cell_timestamp(fields, "last_played_date"),
        skip_count: cell_int(fields, "skip_count").unwrap_or(0),
        skip_date: cell_timestamp(fields, "skip_date"),
        rating: cell_int(fields, "rating"),
        loved: fields
            .get("loved")
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false),
        persistent_id,
        location: cell_string(fields, "location"),
    };
    (record, source)
}

fn cell_string(fields: &HashMap<String, String>, key: &str) -> Option<String> {
    fields
        .get(key)
        .filter(|v| !v.is_empty())
        .cloned()
}

fn cell_int(fields: &HashMap<String, String>, key: &str) -> Option<i64> {
    let raw = fields.get(key)?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<i64>() {
        Ok(v) => Some(v),
        Err(_) => {
            log::debug!("Ignoring non-numeric {} value {:?}", key, raw);
            None
        }
    }
}

fn cell_timestamp(fields: &HashMap<String, String>, key: &str) -> Option<NaiveDateTime> {
    let raw = fields.get(key)?;
    if raw.trim().is_empty() {
        return None;
    }
    let parsed = parse_iso8601(raw).map(|dt| dt.naive_utc());
    if parsed.is_none() {
        log::debug!("Ignoring unparsable {} value {:?}", key, raw);
    }
    parsed
}

// Tabular (CSV/TSV) library parser

use std::collections::HashMap;
use std::path::Path;
use chrono::{Local, NaiveDateTime};

use super::normalize::parse_iso8601;
use super::{LibrarySource, ParsedLibrary, RawTrack, SourceFormat};
use crate::error::{ReplayError, Result};

pub struct CsvSource {
    delimiter: u8,
}

impl CsvSource {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Comma-separated unless the file is a `.tsv`
    pub fn for_path(path: &Path) -> Self {
        let is_tsv = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("tsv"))
            .unwrap_or(false);
        Self::new(if is_tsv { b'\t' } else { b',' })
    }
}

impl LibrarySource for CsvSource {
    fn format(&self) -> SourceFormat {
        SourceFormat::Tabular
    }

    fn parse(&self, path: &Path) -> Result<ParsedLibrary> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_path(path)
            .map_err(|e| ReplayError::parse(path, e))?;

        let headers = reader
            .headers()
            .map_err(|e| ReplayError::parse(path, e))?
            .clone();

        let mut taken_at: Option<NaiveDateTime> = None;
        let mut tracks = Vec::new();

        for (row, result) in reader.records().enumerate() {
            let record = match result {
                Ok(record) => record,
                Err(e) if e.is_io_error() => return Err(ReplayError::parse(path, e)),
                Err(e) => {
                    log::warn!("Skipping unreadable row {} in {}: {}", row + 1, path.display(), e);
                    continue;
                }
            };

            let fields: HashMap<String, String> = headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect();

            if tracks.is_empty() {
                taken_at = Some(snapshot_time(&fields, path));
            }

            tracks.push(RawTrack::Tabular { fields });
        }

        Ok(ParsedLibrary { taken_at, tracks })
    }
}

/// Capture time from the first row's `snapshot_date`, or now when missing
fn snapshot_time(fields: &HashMap<String, String>, path: &Path) -> NaiveDateTime {
    match fields.get("snapshot_date").and_then(|v| parse_iso8601(v)) {
        Some(dt) => dt.naive_local(),
        None => {
            log::warn!(
                "Could not read snapshot_date in {}, using the current time",
                path.display()
            );
            Local::now().naive_local()
        }
    }
}

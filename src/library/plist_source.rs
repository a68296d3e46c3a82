// Property list library parser (binary or XML)

use std::path::Path;
use chrono::{DateTime, Local, NaiveDateTime};
use plist::Value;

use super::normalize::plist_date_to_utc;
use super::{LibrarySource, ParsedLibrary, RawTrack, SourceFormat};
use crate::error::{ReplayError, Result};

pub struct PlistSource;

impl LibrarySource for PlistSource {
    fn format(&self) -> SourceFormat {
        SourceFormat::PropertyList
    }

    fn parse(&self, path: &Path) -> Result<ParsedLibrary> {
        let value = Value::from_file(path).map_err(|e| ReplayError::parse(path, e))?;
        let mut root = value
            .into_dictionary()
            .ok_or_else(|| ReplayError::parse(path, "top-level element is not a dictionary"))?;

        let taken_at = match root.get("Date").and_then(Value::as_date) {
            Some(date) => Some(plist_date_to_utc(date)),
            None => {
                log::warn!(
                    "{} has no Date element, using the file modification time",
                    path.display()
                );
                modified_at(path)
            }
        };

        let tracks = match root.remove("Tracks") {
            Some(Value::Dictionary(tracks)) => tracks
                .into_iter()
                .filter_map(|(key, value)| match value {
                    Value::Dictionary(fields) => Some(RawTrack::Plist { key, fields }),
                    _ => {
                        log::warn!("Skipping track entry {}: not a dictionary", key);
                        None
                    }
                })
                .collect(),
            Some(_) => {
                log::warn!("{}: Tracks is not a dictionary", path.display());
                Vec::new()
            }
            None => Vec::new(),
        };

        Ok(ParsedLibrary { taken_at, tracks })
    }
}

/// File modification time in local wall-clock time
fn modified_at(path: &Path) -> Option<NaiveDateTime> {
    let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok()?;
    let local: DateTime<Local> = modified.into();
    Some(local.naive_local())
}

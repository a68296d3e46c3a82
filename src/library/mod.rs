// Library document parsing

pub mod track;
pub mod normalize;
pub mod plist_source;
pub mod csv_source;

use std::collections::HashMap;
use std::path::Path;
use chrono::NaiveDateTime;

use crate::constants::TABULAR_EXTENSIONS;
use crate::error::Result;
use csv_source::CsvSource;
use plist_source::PlistSource;
pub use track::TrackRecord;

/// Serialization family of a library document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Binary or XML property list exported by Music / iTunes
    PropertyList,
    /// Header-driven CSV (or TSV) export
    Tabular,
}

impl SourceFormat {
    /// Guess the format from the file extension
    pub fn detect(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if TABULAR_EXTENSIONS.contains(&ext.as_str()) {
            SourceFormat::Tabular
        } else {
            SourceFormat::PropertyList
        }
    }
}

/// Source-native fields for one track, before normalization
#[derive(Debug, Clone)]
pub enum RawTrack {
    Plist {
        key: String,
        fields: plist::Dictionary,
    },
    Tabular {
        fields: HashMap<String, String>,
    },
}

/// A parsed document: when it was captured and what it contains
#[derive(Debug, Clone, Default)]
pub struct ParsedLibrary {
    pub taken_at: Option<NaiveDateTime>,
    pub tracks: Vec<RawTrack>,
}

/// A parser for one document format
pub trait LibrarySource {
    fn format(&self) -> SourceFormat;

    /// Read the document at `path`. Errors mean the document as a whole
    /// could not be read; bad individual values never fail the parse.
    fn parse(&self, path: &Path) -> Result<ParsedLibrary>;
}

/// Pick the parser for a document, using the declared format if given
pub fn source_for(path: &Path, format: Option<SourceFormat>) -> Box<dyn LibrarySource> {
    match format.unwrap_or_else(|| SourceFormat::detect(path)) {
        SourceFormat::PropertyList => Box::new(PlistSource),
        SourceFormat::Tabular => Box::new(CsvSource::for_path(path)),
    }
}

/// A document read and normalized into canonical records
#[derive(Debug, Clone)]
pub struct LibraryDocument {
    pub format: SourceFormat,
    pub taken_at: Option<NaiveDateTime>,
    pub tracks: Vec<TrackRecord>,
}

/// Parse and normalize a library document
pub fn read_library(path: &Path, format: Option<SourceFormat>) -> Result<LibraryDocument> {
    let source = source_for(path, format);
    let parsed = source.parse(path)?;
    let tracks = normalize::normalize(&parsed);

    Ok(LibraryDocument {
        format: source.format(),
        taken_at: parsed.taken_at,
        tracks,
    })
}

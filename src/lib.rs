// Music Replay - Library Entry Point
//
// Rebuilds a dated history of a music library by loading every library
// snapshot found in a backup archive into one SQLite table.

pub mod constants;
pub mod error;
pub mod config;
pub mod db;
pub mod backup;
pub mod library;
pub mod ingest;

pub use config::{ArchiveConfig, HostSetting, PipelineConfig};
pub use error::{ReplayError, Result};
pub use ingest::{Pipeline, RunSummary};
pub use library::{SourceFormat, TrackRecord};

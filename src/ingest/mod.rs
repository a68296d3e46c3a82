// Snapshot ingest pipeline

pub mod loader;

use std::path::{Path, PathBuf};
use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;

use crate::backup::{self, BackupEntry, LibraryLookup};
use crate::config::PipelineConfig;
use crate::error::{ReplayError, Result};
use crate::library::{self, SourceFormat};

/// Counts for one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub discovered: usize,
    pub loaded: usize,
    pub skipped_missing: usize,
    pub skipped_failed: usize,
    pub skipped_empty: usize,
    pub tracks_loaded: usize,
}

/// A backup together with the library document found inside it
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredBackup {
    pub taken_at: NaiveDateTime,
    pub container: PathBuf,
    pub library: Option<PathBuf>,
}

enum Outcome {
    Loaded(usize),
    Empty,
    Failed,
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Backups in the archive, oldest first
    pub fn backups(&self) -> Result<Vec<BackupEntry>> {
        let archive = self.config.archive()?;
        Ok(backup::find_backups(&archive.root, &archive.layout))
    }

    /// List the archive's backups and resolve each one's library document
    /// without loading anything
    pub fn discover(&self) -> Result<Vec<DiscoveredBackup>> {
        let archive = self.config.archive()?;

        Ok(self
            .backups()?
            .into_iter()
            .map(|entry| {
                let library = match backup::find_library_file(&entry.path, &archive.user) {
                    LibraryLookup::Found(path) => Some(path),
                    LibraryLookup::NotFound => None,
                };
                DiscoveredBackup {
                    taken_at: entry.taken_at,
                    container: entry.path,
                    library,
                }
            })
            .collect())
    }

    /// Load every backup in the archive, oldest first. Backups without a
    /// readable library are skipped; store failures end the run.
    pub fn run_sweep(&self, conn: &mut Connection) -> Result<RunSummary> {
        let backups = self.backups()?;
        self.load_backups(conn, &backups)
    }

    /// Load an already discovered list of backups
    pub fn load_backups(&self, conn: &mut Connection, backups: &[BackupEntry]) -> Result<RunSummary> {
        let archive = self.config.archive()?;

        let mut summary = RunSummary {
            discovered: backups.len(),
            ..Default::default()
        };

        if backups.is_empty() {
            log::info!("No backups found under {}", archive.root.display());
            return Ok(summary);
        }
        log::info!("Found {} backups", backups.len());

        for entry in backups {
            log::info!("Processing backup from {}", entry.taken_at);
            self.ingest_backup(conn, entry, &archive.user, &mut summary)?;
        }

        Ok(summary)
    }

    fn ingest_backup(
        &self,
        conn: &mut Connection,
        entry: &BackupEntry,
        user: &str,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let library_path = match backup::find_library_file(&entry.path, user) {
            LibraryLookup::Found(path) => path,
            LibraryLookup::NotFound => {
                log::info!("No library file found in {}", entry.path.display());
                summary.skipped_missing += 1;
                return Ok(());
            }
        };
        log::info!("Found library file: {}", library_path.display());

        // Backups are dated by their folder, not by the document inside
        let outcome = ingest_document(conn, &library_path, None, Some(entry.taken_at))?;
        record_outcome(summary, outcome);
        Ok(())
    }

    /// Load one explicitly named document. A missing file is an error; a
    /// document that cannot be parsed is reported and skipped.
    pub fn run_single(
        &self,
        conn: &mut Connection,
        path: &Path,
        format: Option<SourceFormat>,
    ) -> Result<RunSummary> {
        if !path.is_file() {
            return Err(ReplayError::NotFound(format!("library file {}", path.display())));
        }

        let mut summary = RunSummary {
            discovered: 1,
            ..Default::default()
        };
        let outcome = ingest_document(conn, path, format, None)?;
        record_outcome(&mut summary, outcome);
        Ok(summary)
    }
}

/// Parse, normalize and load one document. Only store errors are returned;
/// parse problems become `Outcome::Failed`.
fn ingest_document(
    conn: &mut Connection,
    path: &Path,
    format: Option<SourceFormat>,
    dated: Option<NaiveDateTime>,
) -> Result<Outcome> {
    let document = match library::read_library(path, format) {
        Ok(document) => document,
        Err(e) => {
            log::error!("Failed to parse {}: {}", path.display(), e);
            return Ok(Outcome::Failed);
        }
    };

    if document.tracks.is_empty() {
        log::warn!("{} contains no tracks", path.display());
        return Ok(Outcome::Empty);
    }

    let taken_at = match dated.or(document.taken_at) {
        Some(t) => t,
        None => {
            log::warn!("Could not date {}, skipping", path.display());
            return Ok(Outcome::Failed);
        }
    };

    let loaded = loader::load_snapshot(
        conn,
        taken_at.date(),
        &path.to_string_lossy(),
        &document.tracks,
    )?;
    Ok(Outcome::Loaded(loaded))
}

fn record_outcome(summary: &mut RunSummary, outcome: Outcome) {
    match outcome {
        Outcome::Loaded(count) => {
            summary.loaded += 1;
            summary.tracks_loaded += count;
        }
        Outcome::Empty => summary.skipped_empty += 1,
        Outcome::Failed => summary.skipped_failed += 1,
    }
}

#[cfg(test)]
mod tests;

// Backup archive discovery

pub mod naming;

use std::path::{Path, PathBuf};
use chrono::NaiveDateTime;
use walkdir::WalkDir;

use crate::constants::{LATEST_ALIAS, LIBRARY_SUBPATHS, VOLUME_ROOTS};

/// How backups are arranged under the archive root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveLayout {
    /// `<root>/<stamp>.backup[/<stamp>.backup]`
    Flat,
    /// `<root>/<host>/<stamp>[.suffix]`, with a `Latest` alias alongside
    HostScoped { host: String },
}

/// One dated backup container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub taken_at: NaiveDateTime,
    pub path: PathBuf,
}

/// Result of looking for the library document inside a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryLookup {
    Found(PathBuf),
    NotFound,
}

/// List the backups under `root`, oldest first.
/// A missing root is reported and yields no backups.
pub fn find_backups(root: &Path, layout: &ArchiveLayout) -> Vec<BackupEntry> {
    let scan_dir = match layout {
        ArchiveLayout::Flat => root.to_path_buf(),
        ArchiveLayout::HostScoped { host } => root.join(host),
    };

    if !scan_dir.is_dir() {
        log::error!("Backup directory not found: {}", scan_dir.display());
        return Vec::new();
    }

    let mut backups = Vec::new();

    for entry in WalkDir::new(&scan_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n,
            None => continue,
        };

        if matches!(layout, ArchiveLayout::HostScoped { .. }) && name.eq_ignore_ascii_case(LATEST_ALIAS) {
            continue;
        }

        if !path.is_dir() {
            continue;
        }

        let stamp = naming::classify(name);
        if stamp.is_in_progress() {
            log::info!("Skipping unfinished backup {}", name);
            continue;
        }
        let taken_at = match stamp.taken_at() {
            Some(t) => t,
            None => {
                log::debug!("Ignoring non-backup entry {}", name);
                continue;
            }
        };

        backups.push(BackupEntry {
            taken_at,
            path: resolve_container(path, name),
        });
    }

    backups.sort_by(|a, b| a.taken_at.cmp(&b.taken_at).then_with(|| a.path.cmp(&b.path)));
    backups
}

/// APFS backups repeat the folder name one level down; use the inner
/// folder when it exists.
fn resolve_container(path: &Path, name: &str) -> PathBuf {
    let nested = path.join(name);
    if nested.is_dir() {
        nested
    } else {
        path.to_path_buf()
    }
}

/// Candidate library document paths for `user` inside a container, in
/// priority order
pub fn candidate_paths(container: &Path, user: &str) -> Vec<PathBuf> {
    VOLUME_ROOTS
        .iter()
        .flat_map(|volume| {
            LIBRARY_SUBPATHS
                .iter()
                .map(move |sub| container.join(volume).join(sub.replace("{user}", user)))
        })
        .collect()
}

/// Find the first existing library document inside a container
pub fn find_library_file(container: &Path, user: &str) -> LibraryLookup {
    candidate_paths(container, user)
        .into_iter()
        .find(|p| p.is_file())
        .map(LibraryLookup::Found)
        .unwrap_or(LibraryLookup::NotFound)
}

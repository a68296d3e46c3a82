// Pipeline configuration

use std::path::PathBuf;

use crate::backup::ArchiveLayout;
use crate::constants::{DEFAULT_DB_FILENAME, ENV_ARCHIVE_ROOT, ENV_USER};
use crate::error::{ReplayError, Result};

/// Where backups live and whose library to look for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveConfig {
    pub root: PathBuf,
    pub user: String,
    pub layout: ArchiveLayout,
}

/// Host selection for host-scoped archives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostSetting {
    /// Backups sit directly under the archive root
    None,
    /// Backups sit under the named host folder
    Named(String),
    /// Backups sit under this machine's host folder
    Local,
}

impl ArchiveConfig {
    /// Build from optional settings, reporting the first missing one
    pub fn from_settings(root: Option<PathBuf>, user: Option<String>, host: HostSetting) -> Result<Self> {
        let root = root
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| {
                ReplayError::Config(format!(
                    "archive root is not set (use --archive-root or {})",
                    ENV_ARCHIVE_ROOT
                ))
            })?;

        let user = user
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                ReplayError::Config(format!("user name is not set (use --user or {})", ENV_USER))
            })?;

        let layout = match host {
            HostSetting::None => ArchiveLayout::Flat,
            HostSetting::Named(host) if !host.trim().is_empty() => ArchiveLayout::HostScoped {
                host: host.trim().to_string(),
            },
            HostSetting::Named(_) | HostSetting::Local => ArchiveLayout::HostScoped {
                host: local_host_name()?,
            },
        };

        Ok(Self { root, user, layout })
    }
}

/// Settings for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub db_path: PathBuf,
    /// Only needed when sweeping an archive
    pub archive: Option<ArchiveConfig>,
}

impl PipelineConfig {
    pub fn new(db_path: Option<PathBuf>, archive: Option<ArchiveConfig>) -> Self {
        Self {
            db_path: db_path.unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILENAME)),
            archive,
        }
    }

    pub fn archive(&self) -> Result<&ArchiveConfig> {
        self.archive
            .as_ref()
            .ok_or_else(|| ReplayError::Config("no backup archive configured".to_string()))
    }
}

/// This machine's name as used for host folders (without a `.local` suffix)
fn local_host_name() -> Result<String> {
    let name = hostname::get()
        .map_err(|e| ReplayError::Config(format!("could not determine host name: {}", e)))?
        .to_string_lossy()
        .to_string();
    let name = name.strip_suffix(".local").unwrap_or(&name).to_string();
    if name.is_empty() {
        return Err(ReplayError::Config("host name is empty".to_string()));
    }
    Ok(name)
}

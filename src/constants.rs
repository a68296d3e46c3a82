// Music Replay Constants

// Store
pub const DEFAULT_DB_FILENAME: &str = "music_replay.db";

// Environment variables read by the CLI
pub const ENV_ARCHIVE_ROOT: &str = "TIMEMACHINE_VOLUME";
pub const ENV_USER: &str = "USERNAME";
pub const ENV_HOST: &str = "TIMEMACHINE_HOST";
pub const ENV_DB_PATH: &str = "MUSIC_REPLAY_DB";

// Volume roots inside a backup container, newest layout first.
// APFS snapshots expose the data volume as "Data"; HFS-era backups
// split it across "Macintosh HD - Data" and "Macintosh HD".
pub const VOLUME_ROOTS: [&str; 3] = ["Data", "Macintosh HD - Data", "Macintosh HD"];

// Library document locations relative to the volume root. `{user}` is
// replaced with the configured account name.
pub const LIBRARY_SUBPATHS: [&str; 3] = [
    "Users/{user}/Music/Music/Music Library.xml",
    "Users/{user}/Music/iTunes/iTunes Music Library.xml",
    "Users/{user}/Music/iTunes/iTunes Library.xml",
];

// Host-scoped archives keep a symlink to the newest backup under this name
pub const LATEST_ALIAS: &str = "Latest";

// Backups still being written carry this suffix
pub const IN_PROGRESS_SUFFIX: &str = "inProgress";

// Timestamp embedded in backup folder names, e.g. 2025-01-03-095001
pub const BACKUP_STAMP_FORMAT: &str = "%Y-%m-%d-%H%M%S";

// Storage formats
pub const DATE_STORAGE_FORMAT: &str = "%Y-%m-%d";
pub const TIMESTAMP_STORAGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// Number of trailing hex digits of a persistent id folded into a track id
pub const PERSISTENT_ID_TAIL_DIGITS: usize = 8;

// Positional ids that clash with a stable id move above the 32-bit range
pub const POSITIONAL_ID_OFFSET: i64 = 1 << 32;

// File extensions read with the tabular parser
pub const TABULAR_EXTENSIONS: [&str; 2] = ["csv", "tsv"];

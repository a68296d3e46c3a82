// End-to-end pipeline tests over synthetic archives

use super::*;
use crate::backup::ArchiveLayout;
use crate::config::ArchiveConfig;
use crate::db::schema;
use plist::{Dictionary, Value};
use std::time::{Duration, UNIX_EPOCH};
use tempfile::TempDir;

const USER: &str = "alice";

/// In-memory store; the loader creates the schema on first use
fn setup_test_db() -> Connection {
    Connection::open_in_memory().unwrap()
}

fn pipeline_for(root: &Path, layout: ArchiveLayout) -> Pipeline {
    let archive = ArchiveConfig {
        root: root.to_path_buf(),
        user: USER.to_string(),
        layout,
    };
    Pipeline::new(PipelineConfig::new(None, Some(archive)))
}

/// Write an XML library with the given (track id, name, persistent id) entries
fn write_library(path: &Path, tracks: &[(i64, &str, &str)]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();

    let mut track_dict = Dictionary::new();
    for (id, name, pid) in tracks {
        let mut track = Dictionary::new();
        track.insert("Track ID".to_string(), Value::from(*id));
        track.insert("Name".to_string(), Value::String(name.to_string()));
        track.insert("Persistent ID".to_string(), Value::String(pid.to_string()));
        track.insert("Play Count".to_string(), Value::from(3i64));
        track_dict.insert(id.to_string(), Value::Dictionary(track));
    }

    let mut root = Dictionary::new();
    root.insert("Major Version".to_string(), Value::from(1i64));
    // Document date deliberately differs from the backup folder date
    root.insert(
        "Date".to_string(),
        Value::Date((UNIX_EPOCH + Duration::from_secs(1_600_000_000)).into()),
    );
    root.insert("Tracks".to_string(), Value::Dictionary(track_dict));
    Value::Dictionary(root).to_file_xml(path).unwrap();
}

/// Create `<root>/<stamp>.backup/<stamp>.backup/Data/Users/alice/Music/Music/Music Library.xml`
fn add_apfs_backup(root: &Path, stamp: &str, tracks: &[(i64, &str, &str)]) -> PathBuf {
    let name = format!("{}.backup", stamp);
    let library = root
        .join(&name)
        .join(&name)
        .join("Data/Users")
        .join(USER)
        .join("Music/Music/Music Library.xml");
    write_library(&library, tracks);
    library
}

fn count_all(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM raw_itunes_library", [], |row| row.get(0))
        .unwrap()
}

fn two_tracks() -> Vec<(i64, &'static str, &'static str)> {
    vec![(101, "One", "AAAA000000000001"), (102, "Two", "AAAA000000000002")]
}

#[test]
fn test_sweep_two_snapshots_loads_four_rows() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    add_apfs_backup(root, "2025-01-03-095001", &two_tracks());
    add_apfs_backup(root, "2025-01-10-095001", &two_tracks());

    let pipeline = pipeline_for(root, ArchiveLayout::Flat);
    let mut conn = setup_test_db();
    let summary = pipeline.run_sweep(&mut conn).unwrap();

    assert_eq!(summary.discovered, 2);
    assert_eq!(summary.loaded, 2);
    assert_eq!(summary.tracks_loaded, 4);
    assert_eq!(count_all(&conn), 4);

    let snapshots = schema::list_snapshots(&conn).unwrap();
    let dates: Vec<&str> = snapshots.iter().map(|s| s.snapshot_date.as_str()).collect();
    assert_eq!(dates, vec!["2025-01-03", "2025-01-10"]);
    assert!(snapshots.iter().all(|s| s.track_count == 2));
    assert!(snapshots[0].snapshot_path.ends_with("Music Library.xml"));

    let distinct: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM (SELECT DISTINCT snapshot_date, track_id FROM raw_itunes_library)",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(distinct, 4);
}

#[test]
fn test_sweep_twice_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    add_apfs_backup(tmp.path(), "2025-01-03-095001", &two_tracks());
    add_apfs_backup(tmp.path(), "2025-01-10-095001", &two_tracks());

    let pipeline = pipeline_for(tmp.path(), ArchiveLayout::Flat);
    let mut conn = setup_test_db();
    pipeline.run_sweep(&mut conn).unwrap();
    pipeline.run_sweep(&mut conn).unwrap();

    assert_eq!(count_all(&conn), 4);
}

#[test]
fn test_sweep_skips_missing_and_corrupt_libraries() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    add_apfs_backup(root, "2025-01-01-000000", &two_tracks());

    // No library inside this backup
    std::fs::create_dir_all(root.join("2025-01-02-000000.backup/Data/Users")).unwrap();

    // Corrupt library
    let corrupt = add_apfs_backup(root, "2025-01-03-000000", &two_tracks());
    std::fs::write(&corrupt, b"<?xml version=\"1.0\"?><plist><dict><key>Tracks").unwrap();

    // Library with no tracks
    add_apfs_backup(root, "2025-01-04-000000", &[]);

    // Not a backup at all
    std::fs::create_dir_all(root.join("scratch")).unwrap();

    add_apfs_backup(root, "2025-01-05-000000", &[(7, "Late", "BBBB000000000007")]);

    let pipeline = pipeline_for(root, ArchiveLayout::Flat);
    let mut conn = setup_test_db();
    let summary = pipeline.run_sweep(&mut conn).unwrap();

    assert_eq!(
        summary,
        RunSummary {
            discovered: 5,
            loaded: 2,
            skipped_missing: 1,
            skipped_failed: 1,
            skipped_empty: 1,
            tracks_loaded: 3,
        }
    );
    assert_eq!(schema::count_tracks(&conn, "2025-01-01").unwrap(), 2);
    assert_eq!(schema::count_tracks(&conn, "2025-01-05").unwrap(), 1);
}

#[test]
fn test_sweep_host_scoped_legacy_volume() {
    let tmp = TempDir::new().unwrap();
    let host_dir = tmp.path().join("studio-mac");
    let library = host_dir
        .join("2024-11-20-220000")
        .join("Macintosh HD/Users")
        .join(USER)
        .join("Music/iTunes/iTunes Music Library.xml");
    write_library(&library, &two_tracks());
    std::fs::create_dir_all(host_dir.join("Latest")).unwrap();

    let pipeline = pipeline_for(tmp.path(), ArchiveLayout::HostScoped { host: "studio-mac".to_string() });
    let mut conn = setup_test_db();
    let summary = pipeline.run_sweep(&mut conn).unwrap();

    assert_eq!(summary.loaded, 1);
    assert_eq!(schema::count_tracks(&conn, "2024-11-20").unwrap(), 2);
}

#[test]
fn test_sweep_missing_root_is_empty_run() {
    let tmp = TempDir::new().unwrap();
    let pipeline = pipeline_for(&tmp.path().join("unplugged"), ArchiveLayout::Flat);
    let mut conn = setup_test_db();

    let summary = pipeline.run_sweep(&mut conn).unwrap();
    assert_eq!(summary, RunSummary::default());
}

#[test]
fn test_sweep_without_archive_config_fails() {
    let pipeline = Pipeline::new(PipelineConfig::new(None, None));
    let mut conn = setup_test_db();
    assert!(matches!(pipeline.run_sweep(&mut conn), Err(ReplayError::Config(_))));
}

#[test]
fn test_discover_reports_library_paths() {
    let tmp = TempDir::new().unwrap();
    let library = add_apfs_backup(tmp.path(), "2025-01-03-095001", &two_tracks());
    std::fs::create_dir_all(tmp.path().join("2025-01-04-095001.local")).unwrap();

    let found = pipeline_for(tmp.path(), ArchiveLayout::Flat).discover().unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].library.as_deref(), Some(library.as_path()));
    assert!(found[1].library.is_none());
}

#[test]
fn test_single_plist_uses_document_date() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("Music Library.xml");
    write_library(&path, &two_tracks());

    let pipeline = Pipeline::new(PipelineConfig::new(None, None));
    let mut conn = setup_test_db();
    let summary = pipeline.run_single(&mut conn, &path, None).unwrap();

    assert_eq!(summary.loaded, 1);
    // 1_600_000_000 is 2020-09-13 12:26:40 UTC
    assert_eq!(schema::count_tracks(&conn, "2020-09-13").unwrap(), 2);
}

#[test]
fn test_single_csv_derives_ids_from_persistent_id() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("export.csv");
    std::fs::write(
        &path,
        "snapshot_date,persistent_id,title,play_count,loved,total_time\n\
         2025-01-03T09:50:01Z,4A1B2C3D5E6F7081,A,5,true,\n\
         2025-01-03T09:50:01Z,,B,1,false,180000\n",
    )
    .unwrap();

    let pipeline = Pipeline::new(PipelineConfig::new(None, None));
    let mut conn = setup_test_db();
    pipeline.run_single(&mut conn, &path, Some(SourceFormat::Tabular)).unwrap();

    let (name, play_count, loved, total_time): (String, i64, bool, Option<i64>) = conn
        .query_row(
            "SELECT name, play_count, loved, total_time FROM raw_itunes_library
             WHERE snapshot_date = '2025-01-03' AND track_id = ?1",
            [0x5E6F7081i64],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .unwrap();
    assert_eq!(name, "A");
    assert_eq!(play_count, 5);
    assert!(loved);
    assert_eq!(total_time, None);

    // No persistent id: positional index
    let positional: String = conn
        .query_row(
            "SELECT name FROM raw_itunes_library WHERE snapshot_date = '2025-01-03' AND track_id = 1",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(positional, "B");
}

#[test]
fn test_single_missing_file_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let pipeline = Pipeline::new(PipelineConfig::new(None, None));
    let mut conn = setup_test_db();

    let result = pipeline.run_single(&mut conn, &tmp.path().join("nope.xml"), None);
    assert!(matches!(result, Err(ReplayError::NotFound(_))));
}

#[test]
fn test_single_corrupt_file_is_skipped() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("broken.xml");
    std::fs::write(&path, b"definitely not a plist").unwrap();

    let pipeline = Pipeline::new(PipelineConfig::new(None, None));
    let mut conn = setup_test_db();
    let summary = pipeline.run_single(&mut conn, &path, None).unwrap();

    assert_eq!(summary.skipped_failed, 1);
    assert_eq!(summary.loaded, 0);
}

// Music Replay CLI binary

use std::path::PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};
use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use music_replay_lib::constants::{ENV_ARCHIVE_ROOT, ENV_DB_PATH, ENV_HOST, ENV_USER};
use music_replay_lib::db::{open_db, schema};
use music_replay_lib::{ArchiveConfig, HostSetting, Pipeline, PipelineConfig, RunSummary, SourceFormat};

#[derive(Parser)]
#[command(name = "music-replay")]
#[command(about = "Music Replay - rebuild library history from backups", long_about = None)]
#[command(version)]
struct Cli {
    /// Snapshot database file
    #[arg(long, global = true, env = ENV_DB_PATH)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ArchiveArgs {
    /// Backup archive root
    #[arg(long, env = ENV_ARCHIVE_ROOT)]
    archive_root: Option<PathBuf>,
    /// Account whose Music library is loaded
    #[arg(short, long, env = ENV_USER)]
    user: Option<String>,
    /// Host folder for host-scoped archives (this machine when given without a name)
    #[arg(long, env = ENV_HOST, num_args = 0..=1)]
    host: Option<Option<String>>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Plist,
}

impl From<FormatArg> for SourceFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => SourceFormat::Tabular,
            FormatArg::Plist => SourceFormat::PropertyList,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Load every library snapshot found in the backup archive
    Sweep {
        #[command(flatten)]
        archive: ArchiveArgs,
    },

    /// Load a single library file (plist or CSV export)
    Load {
        /// Library file
        path: PathBuf,
        /// File format (detected from the extension by default)
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },

    /// List backups and the library file found in each, without loading
    Discover {
        #[command(flatten)]
        archive: ArchiveArgs,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List snapshot dates already in the database
    Snapshots,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "music_replay=info,music_replay_lib=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sweep { archive } => cmd_sweep(cli.db, archive),
        Commands::Load { path, format } => cmd_load(cli.db, path, format),
        Commands::Discover { archive, json } => cmd_discover(cli.db, archive, json),
        Commands::Snapshots => cmd_snapshots(cli.db),
    }
}

fn cmd_sweep(db: Option<PathBuf>, archive: ArchiveArgs) -> Result<()> {
    let config = PipelineConfig::new(db, Some(archive_config(archive)?));
    let pipeline = Pipeline::new(config);

    let archive = pipeline.config().archive()?;
    println!("Archive:  {}", archive.root.display());
    println!("Database: {}", pipeline.config().db_path.display());

    // The store is only created once there is something to load
    let backups = pipeline.backups()?;
    if backups.is_empty() {
        log::info!("No backups found under {}", archive.root.display());
        print_summary(&RunSummary::default());
        return Ok(());
    }

    let mut conn = open_db(&pipeline.config().db_path)?;
    let summary = pipeline.load_backups(&mut conn, &backups)?;

    print_summary(&summary);
    Ok(())
}

fn cmd_load(db: Option<PathBuf>, path: PathBuf, format: Option<FormatArg>) -> Result<()> {
    if !path.is_file() {
        anyhow::bail!("File not found: {}", path.display());
    }

    let pipeline = Pipeline::new(PipelineConfig::new(db, None));
    println!("Library:  {}", path.display());
    println!("Database: {}", pipeline.config().db_path.display());

    let mut conn = open_db(&pipeline.config().db_path)?;
    let summary = pipeline.run_single(&mut conn, &path, format.map(SourceFormat::from))?;

    print_summary(&summary);
    Ok(())
}

fn cmd_discover(db: Option<PathBuf>, archive: ArchiveArgs, json: bool) -> Result<()> {
    let pipeline = Pipeline::new(PipelineConfig::new(db, Some(archive_config(archive)?)));
    let found = pipeline.discover()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }

    if found.is_empty() {
        println!("No backups found.");
        return Ok(());
    }

    println!("{:>19}  {}", "Backup", "Library");
    println!("{}", "-".repeat(70));
    for backup in &found {
        let library = backup
            .library
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(no library file)".to_string());
        println!("{:>19}  {}", backup.taken_at.format("%Y-%m-%d %H:%M:%S"), library);
    }

    let with_library = found.iter().filter(|b| b.library.is_some()).count();
    println!();
    println!("{} backups, {} with a library file", found.len(), with_library);

    Ok(())
}

fn cmd_snapshots(db: Option<PathBuf>) -> Result<()> {
    let config = PipelineConfig::new(db, None);
    let conn = open_db(&config.db_path)?;
    let snapshots = schema::list_snapshots(&conn)?;

    if snapshots.is_empty() {
        println!("No snapshots loaded. Use 'music-replay sweep' or 'music-replay load <file>'.");
        return Ok(());
    }

    println!("{:>10}  {:>7}  {}", "Date", "Tracks", "Source");
    println!("{}", "-".repeat(70));
    for snapshot in &snapshots {
        println!("{:>10}  {:>7}  {}", snapshot.snapshot_date, snapshot.track_count, snapshot.snapshot_path);
    }

    Ok(())
}

// --- Helper Functions ---

fn archive_config(args: ArchiveArgs) -> Result<ArchiveConfig> {
    let host = match args.host {
        None => HostSetting::None,
        Some(None) => HostSetting::Local,
        Some(Some(name)) => HostSetting::Named(name),
    };
    Ok(ArchiveConfig::from_settings(args.archive_root, args.user, host)?)
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("Run complete:");
    println!("  Snapshots found:    {}", summary.discovered);
    println!("  Loaded:             {}", summary.loaded);
    println!("  No library file:    {}", summary.skipped_missing);
    println!("  Failed to parse:    {}", summary.skipped_failed);
    println!("  Empty:              {}", summary.skipped_empty);
    println!("  Tracks loaded:      {}", summary.tracks_loaded);
}

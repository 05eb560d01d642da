//! dbal-sync CLI
//!
//! Command-line tool for comparing and synchronizing database structures.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use dbal_sync::prelude::*;

/// Database structure synchronization.
#[derive(Parser)]
#[command(name = "dbal-sync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Source database URL.
    #[arg(long, env = "SOURCE_DATABASE_URL")]
    source_url: Option<String>,

    /// Source snapshot file (used when no source URL is given).
    #[arg(long)]
    source_snapshot: Option<PathBuf>,

    /// Target database URL.
    #[arg(long, env = "TARGET_DATABASE_URL")]
    target_url: Option<String>,

    /// Target snapshot file (used when no target URL is given).
    #[arg(long)]
    target_snapshot: Option<PathBuf>,

    /// Regex selecting tables whose rows are synchronized too.
    #[arg(long)]
    information_tables: Option<String>,

    /// Schema to read instead of the connection's default.
    #[arg(long)]
    schema: Option<String>,

    /// JSON file with default sync options.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the change-set as JSON.
    Diff {
        /// Never delete what only the target has.
        #[arg(short, long)]
        merge: bool,
    },

    /// Print the SQL a sync would run, without running it.
    Plan {
        /// Never delete what only the target has.
        #[arg(short, long)]
        merge: bool,
    },

    /// Move the target's structure to the source's.
    Sync {
        /// Never delete what only the target has.
        #[arg(short, long)]
        merge: bool,

        /// Show SQL without executing (dry run).
        #[arg(long)]
        dry_run: bool,
    },

    /// Serialize the source structure to a snapshot file.
    Snapshot {
        /// Output file.
        #[arg(short, long)]
        out: PathBuf,
    },
}

impl Cli {
    fn options(&self) -> anyhow::Result<SyncOptions> {
        let mut options = match &self.config {
            Some(path) => SyncOptions::from_file(path)?,
            None => SyncOptions::default(),
        };
        if self.information_tables.is_some() {
            options.information_tables.clone_from(&self.information_tables);
        }
        if self.schema.is_some() {
            options.schema.clone_from(&self.schema);
        }
        Ok(options)
    }

    fn source(&self) -> EndpointConfig {
        EndpointConfig {
            url: self.source_url.clone(),
            snapshot: self.source_snapshot.clone(),
        }
    }

    fn target(&self) -> EndpointConfig {
        EndpointConfig {
            url: self.target_url.clone(),
            snapshot: self.target_snapshot.clone(),
        }
    }
}

fn synchronizer(cli: &Cli, options: &SyncOptions) -> anyhow::Result<Synchronizer> {
    let source = Endpoint::from_config(&cli.source())?.open(options)?;
    let target = Endpoint::from_config(&cli.target())?.open(options)?;
    Ok(Synchronizer::new().source(source).target(target))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut options = cli.options()?;

    match &cli.command {
        Commands::Diff { merge } => {
            let changes = synchronizer(&cli, &options)?.compare(options.merge || *merge)?;
            println!("{}", serde_json::to_string_pretty(&changes)?);
        }

        Commands::Plan { merge } => {
            options.dry_run = true;
            let report = synchronizer(&cli, &options)?.sync(options.merge || *merge)?;
            match report {
                WriteReport::Statements(statements) => {
                    for sql in statements {
                        println!("{sql};");
                    }
                }
                WriteReport::Snapshot(path) => {
                    info!("Target is the snapshot {}; no SQL to show.", path.display());
                }
            }
        }

        Commands::Sync { merge, dry_run } => {
            options.dry_run |= *dry_run;
            if options.dry_run {
                info!("Dry run mode - SQL will be printed but not executed.");
            }
            let report = synchronizer(&cli, &options)?.sync(options.merge || *merge)?;
            match report {
                WriteReport::Statements(statements) => {
                    if options.dry_run {
                        for sql in &statements {
                            println!("{sql};");
                        }
                    }
                    info!("Synchronized: {} statement(s).", statements.len());
                }
                WriteReport::Snapshot(path) => {
                    info!("Synchronized snapshot {}.", path.display());
                }
            }
        }

        Commands::Snapshot { out } => {
            let mut source = Endpoint::from_config(&cli.source())?.open(&options)?;
            let database = source.read()?;
            write_snapshot(out, &database)?;
            info!("Wrote {} table(s) to {}.", database.tables.len(), out.display());
        }
    }

    Ok(())
}

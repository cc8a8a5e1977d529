//! Hemicycle: batch standardizer for legacy parliamentary data dumps.
//!
//! The Czech Chamber of Deputies publishes its member registry and
//! roll-call votes as pipe-delimited, windows-1250 encoded fixed-column
//! dumps. This crate turns those dumps into a canonical set of tabular
//! and columnar outputs plus derived snapshot views, deterministically:
//! the same raw inputs always produce byte-identical outputs.
//!
//! # Pipeline
//!
//! - `entities`: raw persons/organizations/memberships into the three
//!   canonical CSV tables
//! - `votes`: roll-call events, motions and individual ballots into
//!   JSON, CSV and Parquet
//! - `snapshots`: current-term, group and roster views derived from the
//!   canonical tables
//!
//! Each stage is callable on its own; `run` chains all of them.
//!
//! # Crate Structure
//!
//! - [`core`]: dump reader, dates, data model, tabular and columnar IO
//! - [`stages`]: the standardization and derivation stages

pub mod core;
pub mod stages;

use crate::core::config::{SourceConfig, Workspace};
use crate::core::error::HemicycleError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[clap(
    name = "hemicycle",
    version = env!("CARGO_PKG_VERSION"),
    about = "Standardize legacy parliamentary dumps into canonical tables and snapshot views"
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct WorkspaceCli {
    /// Unpacked member/organization dump directory.
    #[clap(long, default_value = "work/raw/poslanci")]
    raw_members: PathBuf,
    /// Unpacked roll-call dump directory.
    #[clap(long, default_value = "work/raw/hl-2025ps")]
    raw_votes: PathBuf,
    /// Canonical tabular output directory.
    #[clap(long, default_value = "work/standard")]
    standard: PathBuf,
    /// Columnar output directory.
    #[clap(long, default_value = "work/publish")]
    publish: PathBuf,
    /// Snapshot view output directory.
    #[clap(long, default_value = "snapshots")]
    snapshots: PathBuf,
    /// Identifier namespace.
    #[clap(long, default_value = "psp")]
    namespace: String,
    /// Session tag embedded in the roll-call dump file names.
    #[clap(long, default_value = "2025")]
    session: String,
}

impl WorkspaceCli {
    fn workspace(&self) -> Workspace {
        Workspace {
            raw_members_dir: self.raw_members.clone(),
            raw_votes_dir: self.raw_votes.clone(),
            standard_dir: self.standard.clone(),
            publish_dir: self.publish.clone(),
            snapshots_dir: self.snapshots.clone(),
        }
    }

    fn source(&self) -> SourceConfig {
        SourceConfig {
            namespace: self.namespace.clone(),
            session: self.session.clone(),
            ..SourceConfig::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Standardize raw person/organization/membership dumps
    Entities(WorkspaceCli),
    /// Standardize roll-call events, motions and ballots
    Votes(WorkspaceCli),
    /// Derive the snapshot views from the canonical tables
    Snapshots(WorkspaceCli),
    /// Run the full pipeline: entities, votes, then snapshots
    Run(WorkspaceCli),
    /// Print version
    Version,
}

fn run_entities(ws: &Workspace, source: &SourceConfig) -> Result<(), HemicycleError> {
    core::config::ensure_dir(&ws.standard_dir)?;
    stages::entities::run(ws, source)?;
    Ok(())
}

fn run_votes(ws: &Workspace, source: &SourceConfig) -> Result<(), HemicycleError> {
    core::config::ensure_dir(&ws.standard_dir)?;
    core::config::ensure_dir(&ws.publish_dir)?;
    stages::votes::run(ws, source)?;
    Ok(())
}

fn run_snapshots(ws: &Workspace, source: &SourceConfig) -> Result<(), HemicycleError> {
    stages::term::run(ws, source)?;
    stages::groups::run(ws, source)?;
    stages::roster::run(ws, source)?;
    Ok(())
}

pub fn run() -> Result<(), HemicycleError> {
    let cli = Cli::parse();
    match cli.command {
        Command::Version => {
            println!("v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Entities(args) => run_entities(&args.workspace(), &args.source()),
        Command::Votes(args) => run_votes(&args.workspace(), &args.source()),
        Command::Snapshots(args) => run_snapshots(&args.workspace(), &args.source()),
        Command::Run(args) => {
            let ws = args.workspace();
            let source = args.source();
            run_entities(&ws, &source)?;
            run_votes(&ws, &source)?;
            run_snapshots(&ws, &source)?;
            info!("pipeline complete");
            Ok(())
        }
    }
}

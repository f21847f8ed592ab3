use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Plan fee benchmark CLI arguments
#[derive(Debug, Parser)]
#[command(
    name = "plan-fee-benchmark",
    version,
    about = "Peer-group percentile benchmarks for retirement plan fees"
)]
pub struct Cli {
    /// Record source to serve from (sqlite, memory or fixture)
    #[arg(long)]
    pub source: Option<String>,

    /// SQLite database URL
    #[arg(long)]
    pub database_url: Option<String>,

    /// JSON file of benchmark records for the memory source
    #[arg(long)]
    pub data_path: Option<PathBuf>,

    /// Address to bind the HTTP server to
    #[arg(long)]
    pub bind: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Join Form 5500 and Schedule A extracts and load them into SQLite
    Ingest(IngestArgs),
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Form 5500 extract (`.csv`, or a JSON array)
    #[arg(long)]
    pub form5500: PathBuf,

    /// Schedule A extract (`.csv`, or a JSON array)
    #[arg(long)]
    pub schedule_a: PathBuf,

    /// Plan year to stamp on every record
    #[arg(long)]
    pub plan_year: Option<i32>,
}

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Fieldops - Scheduling feasibility and schedule insights
#[derive(Parser, Debug)]
#[command(name = "fieldops")]
#[command(about = "Scheduling feasibility and schedule insights", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Storage backend to use (memory or postgres)
    #[arg(long, global = true, default_value = "memory")]
    pub storage: StorageBackend,

    /// JSON fixture of bookings and due items to seed the memory backend
    #[arg(long, global = true, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Configuration file (ignored when missing)
    #[arg(long, global = true, default_value = "fieldops.toml")]
    pub config: PathBuf,

    /// Business time zone override (IANA name)
    #[arg(long, global = true)]
    pub timezone: Option<String>,

    /// Depot address override
    #[arg(long, global = true)]
    pub depot: Option<String>,

    /// Enable the insight enhancer for this run
    #[arg(long, global = true)]
    pub enhance: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StorageBackend {
    /// In-memory storage (default, for development)
    Memory,
    /// PostgreSQL persistent storage
    Postgres,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the days in a range that can take a job
    Availability(AvailabilityArgs),

    /// Run the schedule insight rules over a date window
    Analyze(AnalyzeArgs),

    /// List, resolve, or dismiss stored insights
    Insights(InsightsArgs),

    /// Show the canonical form of addresses
    Normalize(NormalizeArgs),

    /// Show resolved configuration and where each value came from
    Config,

    /// Maintain the travel-pair cache
    Cache(CacheArgs),
}

#[derive(Args, Debug)]
pub struct AvailabilityArgs {
    /// First day (YYYY-MM-DD)
    #[arg(long)]
    pub from: NaiveDate,

    /// Last day, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub to: NaiveDate,

    /// Local start time (HH:MM)
    #[arg(long)]
    pub time: String,

    /// Job length in hours
    #[arg(long, default_value = "1.0")]
    pub duration: f64,

    /// Service address of the new job
    #[arg(long)]
    pub location: Option<String>,

    /// Only consider this technician's schedule
    #[arg(long)]
    pub technician: Option<String>,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// First day of the window (YYYY-MM-DD)
    #[arg(long)]
    pub from: NaiveDate,

    /// Last day of the window, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub to: NaiveDate,

    /// Only analyze this technician
    #[arg(long)]
    pub technician: Option<String>,

    /// Record the run as scheduled rather than manual
    #[arg(long)]
    pub scheduled: bool,
}

#[derive(Args, Debug)]
pub struct InsightsArgs {
    #[command(subcommand)]
    pub action: InsightsAction,
}

#[derive(Subcommand, Debug)]
pub enum InsightsAction {
    /// List insights
    List(ListInsightsArgs),

    /// Mark an open insight as resolved
    Resolve(TransitionArgs),

    /// Mark an open insight as dismissed
    Dismiss(TransitionArgs),
}

#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Delete travel estimates past their TTL
    Purge,
}

#[derive(Args, Debug)]
pub struct ListInsightsArgs {
    /// open, resolved, or dismissed
    #[arg(long)]
    pub status: Option<String>,

    /// Insight kind (e.g. rest_gap)
    #[arg(long)]
    pub kind: Option<String>,

    #[arg(long)]
    pub from: Option<NaiveDate>,

    #[arg(long)]
    pub to: Option<NaiveDate>,

    #[arg(long)]
    pub technician: Option<String>,
}

#[derive(Args, Debug)]
pub struct TransitionArgs {
    /// Insight ID
    pub id: String,

    /// Note recorded with the change
    #[arg(long)]
    pub note: Option<String>,
}

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Addresses to normalize
    #[arg(required = true)]
    pub addresses: Vec<String>,
}

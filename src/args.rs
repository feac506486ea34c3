use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Clone)]
#[command(
    display_name = "Rating Processor",
    long_about = "Replays the full cross-platform tournament history through a Glicko-2 \
    rating model and emits the encoded leaderboard datasets"
)]
pub struct Args {
    /// Directory containing the raw platform collections (per namespace)
    /// and the override/attribute tables under `tables/`.
    #[arg(short, long, env, help = "Input data directory")]
    pub input_dir: PathBuf,

    /// Directory the encoded outputs are written to, one subdirectory
    /// per namespace.
    #[arg(short, long, env, help = "Output directory")]
    pub output_dir: PathBuf,

    /// The historical date at which the classic pass snapshots its ratings
    /// into the generated seed table for the sequel namespace bootstrap.
    #[arg(long, env, default_value = "2018-10-24", help = "Seed table boundary date (YYYY-MM-DD)")]
    pub seed_boundary: String,

    /// Only run the classic namespace pass (skips the sequel replay).
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub classic_only: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        env = "RUST_LOG",
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"],
        help = "Sets the logging verbosity"
    )]
    pub log_level: String
}

//! CLI argument parsing

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "speechcheckr")]
#[command(version, about = "Quality-control analysis for recorded speech")]
pub struct Args {
    /// Input WAV file or directory
    #[arg(short, long)]
    pub input: PathBuf,

    /// Only measure peak, noise floor and normalization
    #[arg(short, long)]
    pub basic: bool,

    /// Print one JSON document per file instead of text
    #[arg(long)]
    pub json: bool,

    /// JSON file with threshold overrides
    #[arg(short, long, env = "SPEECHCHECKR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the peak normalization target (dBFS)
    #[arg(long, allow_negative_numbers = true)]
    pub target: Option<f64>,

    /// Show measurement details and debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

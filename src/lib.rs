#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]
#![allow(clippy::type_complexity)]
#![allow(clippy::too_many_arguments)]

// Core modules
pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod utils;

// Re-export commonly used types outside of crate (for the binaries and tests/)
pub use analysis::{CalibrationResult, Evaluation, PriceMoveComputer, ThresholdCalibrator};
pub use config::{CALIBRATION, PERSISTENCE, RunConfig};
pub use data::{CsvTable, PriceSeriesProvider};
pub use domain::{Event, Move, PipelineError, PredictedClass};
pub use engine::{CalibrationOutcome, Pipeline};

// CLI argument parsing
use {
    clap::{Args, Parser, Subcommand},
    std::path::PathBuf,
};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Calibrates sentiment predictions against subsequent price moves", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Label each event with the price move that followed it (adds `price_move`)
    PriceMoves {
        #[command(flatten)]
        io: StageIo,
        #[command(flatten)]
        window: WindowArgs,
    },
    /// Sweep margins against an existing `price_move` column and report metrics
    Calibrate {
        #[command(flatten)]
        io: StageIo,
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Price moves then calibration, in one pass
    Run {
        #[command(flatten)]
        io: StageIo,
        #[command(flatten)]
        window: WindowArgs,
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Fill `matched_tickers` from event text using a stock table
    MatchTickers {
        #[command(flatten)]
        io: StageIo,
        /// Stock table CSV (Ticker, Company, optional Context)
        #[arg(long)]
        stocks: PathBuf,
        /// Minimum bear probability for an event to count as opinionated
        #[arg(long)]
        bear_min: Option<f64>,
        /// Minimum bull probability for an event to count as opinionated
        #[arg(long)]
        bull_min: Option<f64>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct StageIo {
    /// Input events CSV
    #[arg(long, short)]
    pub input: PathBuf,
    /// Output events CSV
    #[arg(long, short)]
    pub output: PathBuf,
}

#[derive(Args, Debug, Clone, Default)]
pub struct WindowArgs {
    /// Days after the event the move is measured over
    #[arg(long)]
    pub window_days: Option<u32>,
    /// Absolute return above which a move counts as up/down (0.02 = 2%)
    #[arg(long)]
    pub threshold: Option<f64>,
    /// Events fetched concurrently
    #[arg(long)]
    pub concurrency: Option<usize>,
    /// Skip the on-disk price cache
    #[arg(long, default_value_t = false)]
    pub no_cache: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ReportArgs {
    /// Confusion matrix CSV for the chosen margin
    #[arg(long)]
    pub confusion: Option<PathBuf>,
    /// Margin candidates, e.g. "0,0.02,0.05" or "[0, 0.1]"
    #[arg(long)]
    pub margins: Option<String>,
    /// Calibration summary JSON
    #[arg(long)]
    pub summary: Option<PathBuf>,
}

impl WindowArgs {
    pub fn apply(&self, config: RunConfig) -> Result<RunConfig, PipelineError> {
        Ok(config
            .with_window_days(self.window_days)
            .with_threshold(self.threshold)?
            .with_concurrency(self.concurrency)?
            .with_price_cache(!self.no_cache))
    }
}

impl ReportArgs {
    pub fn apply(&self, config: RunConfig) -> Result<RunConfig, PipelineError> {
        config.with_margins(self.margins.as_deref())
    }
}

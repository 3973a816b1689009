//! Configuration module for the sentiment-move pipeline.

// Can all be private now because we have a public re-export.
mod analysis;
mod debug;
mod persistence;
mod run;
mod types;
mod yahoo;

// Re-export commonly used items
pub use analysis::{CALIBRATION, CalibrationConfig, ConvictionConfig, MoveWindowConfig};
pub use debug::DF;
pub use persistence::{PERSISTENCE, price_cache_filename};
pub use run::{RunConfig, parse_margins};
pub use types::{ClosePrice, Margin, PriceLike, Prob, ReturnThreshold};
pub use yahoo::{YAHOO, YahooApiConfig};

pub const LOG_PERFORMANCE: bool = DF.log_performance;

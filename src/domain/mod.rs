// Domain types and value objects
mod errors;
mod event;
mod labels;
mod price_series;

// Re-export commonly used types to the world
pub use errors::PipelineError;
pub use event::{Event, SentimentTriple, parse_ticker_list};
pub use labels::{Move, PredictedClass};
pub use price_series::{DailyClose, PriceSeries};

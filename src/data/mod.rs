mod confusion_io;
mod event_io;
mod price_cache;
mod provider;
mod rate_limiter;
mod yahoo;

pub use {
    confusion_io::{load_confusion, read_confusion, save_confusion, write_confusion},
    event_io::{
        BEAR_COLUMN, BULL_COLUMN, CsvTable, DATE_COLUMNS, ID_COLUMN, MODEL_MOVE_COLUMN,
        MODEL_PRED_COLUMN, NEUTRAL_COLUMN, PRICE_MOVE_COLUMN, TEXT_COLUMN, TICKERS_COLUMN,
    },
    price_cache::CachedProvider,
    provider::{FetchError, PriceSeriesProvider, RetryPolicy, fetch_with_retry},
    rate_limiter::GlobalRateLimiter,
    yahoo::YahooProvider,
};

//! Debugging feature flags.

pub struct LogFlags {
    /// Log every successful price fetch (failures are always logged).
    pub log_price_fetches: bool,

    /// Log the score of each margin candidate at info instead of debug.
    pub log_margin_sweep: bool,

    /// Activate trace_time macro (for cool scope-level timing)
    pub log_performance: bool,

    /// Log cache hits / misses of the price cache
    pub log_price_cache: bool,
}

pub const DF: LogFlags = LogFlags {
    log_price_fetches: false,
    log_margin_sweep: false,
    log_performance: false,
    log_price_cache: false,
};

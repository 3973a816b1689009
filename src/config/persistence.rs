//! File persistence and serialization configuration

/// Configuration for the on-disk price cache
pub struct PriceCacheConfig {
    /// Directory path for storing cached daily closes
    pub directory: &'static str,
    /// Base filename for the cache file (without extension)
    pub filename_base: &'static str,
    /// Current version of the cache serialization format
    pub version: f64,
    /// Entries older than this are refetched
    pub max_age_secs: i64,
}

/// Default artifact names written next to the output stream
pub struct ArtifactConfig {
    pub confusion_matrix: &'static str,
    pub calibration_summary: &'static str,
}

/// The Master Persistence Configuration
pub struct PersistenceConfig {
    pub price_cache: PriceCacheConfig,
    pub artifacts: ArtifactConfig,
}

pub const PERSISTENCE: PersistenceConfig = PersistenceConfig {
    price_cache: PriceCacheConfig {
        directory: "price_cache",
        filename_base: "daily_closes",
        version: 2.0,
        max_age_secs: 7 * 24 * 60 * 60,
    },
    artifacts: ArtifactConfig {
        confusion_matrix: "confusion_matrix_price.csv",
        calibration_summary: "calibration_summary.json",
    },
};

/// Example: "daily_closes_v2.bin"
pub fn price_cache_filename() -> String {
    format!(
        "{}_v{}.bin",
        PERSISTENCE.price_cache.filename_base, PERSISTENCE.price_cache.version
    )
}

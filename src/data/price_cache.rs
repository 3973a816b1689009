use {
    crate::{
        config::{DF, PERSISTENCE},
        data::{FetchError, PriceSeriesProvider},
        domain::PriceSeries,
        utils::{
            TimeUtils, format_duration, how_many_seconds_ago, local_now_as_timestamp_ms,
            local_today,
        },
    },
    anyhow::{Context, Result, bail},
    async_trait::async_trait,
    chrono::NaiveDate,
    serde::{Deserialize, Serialize},
    std::{
        collections::HashMap,
        fs::{self, File},
        io::{BufReader, BufWriter},
        path::Path,
        sync::Arc,
    },
    tokio::sync::Mutex,
};

/// One fetched window and when it was fetched.
#[derive(Serialize, Deserialize, Debug, Clone)]
struct CachedSeries {
    fetched_ms: i64,
    end: NaiveDate,
    series: PriceSeries,
}

impl CachedSeries {
    /// Every close in `[start, end)` is final once `end` is today or earlier.
    fn is_closed(&self, today: NaiveDate) -> bool {
        self.end <= today
    }

    fn age_secs(&self) -> i64 {
        how_many_seconds_ago(self.fetched_ms)
    }
}

/// Binary cache file wrapper with metadata
#[derive(Serialize, Deserialize, Debug)]
struct PriceCacheFile {
    version: f64,
    timestamp_ms: i64,
    entries: HashMap<String, CachedSeries>,
}

fn cache_key(ticker: &str, start: NaiveDate, end: NaiveDate) -> String {
    format!("{}|{}|{}", ticker, start, end)
}

/// Memoizes successful fetches of the wrapped provider. Failures are never cached.
pub struct CachedProvider {
    inner: Arc<dyn PriceSeriesProvider>,
    entries: Mutex<HashMap<String, CachedSeries>>,
}

impl CachedProvider {
    pub fn new(inner: Arc<dyn PriceSeriesProvider>) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Seeds the cache from disk. An absent or incompatible file starts empty;
    /// entries past `max_age_secs` are dropped one by one.
    pub fn load_or_empty(inner: Arc<dyn PriceSeriesProvider>, path: &Path) -> Self {
        let entries = match read_cache_file(path) {
            Ok(entries) => {
                log::info!("Loaded {} cached price series from {:?}", entries.len(), path);
                entries
            }
            Err(e) => {
                if path.exists() {
                    log::warn!("Ignoring price cache {:?}: {:#}", path, e);
                }
                HashMap::new()
            }
        };
        Self {
            inner,
            entries: Mutex::new(entries),
        }
    }

    /// The wrapped provider.
    pub fn inner(&self) -> Arc<dyn PriceSeriesProvider> {
        self.inner.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Writes the closed windows to disk. Windows still open stay in memory only.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let today = local_today();
        let entries: HashMap<String, CachedSeries> = self
            .entries
            .lock()
            .await
            .iter()
            .filter(|(_, entry)| entry.is_closed(today))
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect();
        let count = entries.len();
        let cache = PriceCacheFile {
            version: PERSISTENCE.price_cache.version,
            timestamp_ms: local_now_as_timestamp_ms(),
            entries,
        };
        write_cache_file(&cache, path)?;
        log::info!("Saved {} price series to {:?}", count, path);
        Ok(())
    }
}

#[async_trait]
impl PriceSeriesProvider for CachedProvider {
    async fn fetch_daily_closes(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, FetchError> {
        let key = cache_key(ticker, start, end);
        if let Some(hit) = self.entries.lock().await.get(&key) {
            if DF.log_price_cache {
                log::info!("Price cache hit: {}", key);
            }
            return Ok(hit.series.clone());
        }

        // Lock released across the fetch; a concurrent miss on the same key fetches twice.
        let series = self.inner.fetch_daily_closes(ticker, start, end).await?;
        if !series.is_empty() {
            let entry = CachedSeries {
                fetched_ms: local_now_as_timestamp_ms(),
                end,
                series: series.clone(),
            };
            self.entries.lock().await.insert(key, entry);
        }
        Ok(series)
    }
}

fn write_cache_file(cache: &PriceCacheFile, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("Failed to create file: {}", path.display()))?;
    bincode::serialize_into(BufWriter::new(file), cache)
        .with_context(|| format!("Failed to serialize price cache to {}", path.display()))
}

fn read_cache_file(path: &Path) -> Result<HashMap<String, CachedSeries>> {
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    let cache: PriceCacheFile = bincode::deserialize_from(BufReader::new(file))
        .with_context(|| format!("Failed to deserialize cache from: {:?}", path))?;

    if cache.version != PERSISTENCE.price_cache.version {
        bail!(
            "Cache version mismatch: file v{} vs required v{}",
            cache.version,
            PERSISTENCE.price_cache.version
        );
    }

    let max_age = PERSISTENCE.price_cache.max_age_secs;
    let total = cache.entries.len();
    let fresh: HashMap<String, CachedSeries> = cache
        .entries
        .into_iter()
        .filter(|(_, entry)| entry.age_secs() <= max_age)
        .collect();
    if fresh.len() < total {
        log::info!(
            "Dropped {} cached price series older than {}",
            total - fresh.len(),
            format_duration(max_age * TimeUtils::MS_IN_S)
        );
    }

    Ok(fresh)
}

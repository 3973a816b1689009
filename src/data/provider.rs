use {
    crate::{config::YahooApiConfig, domain::PriceSeries},
    async_trait::async_trait,
    chrono::NaiveDate,
    std::{error::Error, fmt, time::Duration},
};

/// Why a single ticker fetch produced no series. Never fatal for the run.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Unknown symbol, delisted, or no bars in the requested range.
    DataUnavailable(String),
    /// Provider asked us to slow down. `retry_after` when the provider said how long.
    RateLimited { retry_after: Option<Duration> },
    /// Network failure, timeout, 5xx, or an unreadable body.
    Transport(String),
}

impl FetchError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::RateLimited { .. } | FetchError::Transport(_))
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FetchError::DataUnavailable(msg) => write!(f, "Data unavailable: {}", msg),
            FetchError::RateLimited {
                retry_after: Some(wait),
            } => write!(f, "Rate limited (retry after {:.1}s)", wait.as_secs_f64()),
            FetchError::RateLimited { retry_after: None } => write!(f, "Rate limited"),
            FetchError::Transport(msg) => write!(f, "Transport error: {}", msg),
        }
    }
}

impl Error for FetchError {}

/// Abstract interface for fetching daily closes.
#[async_trait]
pub trait PriceSeriesProvider: Send + Sync {
    /// Daily closes with `start <= date < end`, ascending.
    async fn fetch_daily_closes(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, FetchError>;
}

/// Bounded exponential backoff for one ticker fetch.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Extra attempts after the first.
    pub retries: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            retries: 0,
            base_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Wait before retry number `attempt` (1-based). A provider hint wins but is still capped.
    pub fn delay_for(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        let exp = self
            .base_backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
        hint.unwrap_or(exp).min(self.max_backoff)
    }
}

impl From<&YahooApiConfig> for RetryPolicy {
    fn from(config: &YahooApiConfig) -> Self {
        Self {
            retries: config.retries,
            base_backoff: Duration::from_millis(config.backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&YahooApiConfig::default())
    }
}

/// Runs one fetch, retrying rate-limit and transport failures per `policy`.
/// `DataUnavailable` returns immediately.
pub async fn fetch_with_retry(
    provider: &dyn PriceSeriesProvider,
    ticker: &str,
    start: NaiveDate,
    end: NaiveDate,
    policy: &RetryPolicy,
) -> Result<PriceSeries, FetchError> {
    let mut attempt = 0;
    loop {
        match provider.fetch_daily_closes(ticker, start, end).await {
            Ok(series) => return Ok(series),
            Err(e) if e.is_retryable() && attempt < policy.retries => {
                attempt += 1;
                let hint = match &e {
                    FetchError::RateLimited { retry_after } => *retry_after,
                    _ => None,
                };
                let wait = policy.delay_for(attempt, hint);
                log::warn!(
                    "{} fetch failed ({}). Retry {}/{} in {:.1}s",
                    ticker,
                    e,
                    attempt,
                    policy.retries,
                    wait.as_secs_f64()
                );
                tokio::time::sleep(wait).await;
            }
            Err(e) => return Err(e),
        }
    }
}

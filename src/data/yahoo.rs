use {
    crate::{
        config::{DF, YAHOO, YahooApiConfig},
        data::{FetchError, GlobalRateLimiter, PriceSeriesProvider},
        domain::{DailyClose, PriceSeries},
        utils::{date_to_epoch_secs, epoch_secs_to_local_date},
    },
    anyhow::Context,
    async_trait::async_trait,
    chrono::NaiveDate,
    reqwest::{Client, StatusCode, Url, header::RETRY_AFTER},
    serde::Deserialize,
    std::time::Duration,
};

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize, Default)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Daily closes from the Yahoo Finance v8 chart endpoint.
pub struct YahooProvider {
    client: Client,
    base_url: String,
    limiter: GlobalRateLimiter,
}

impl YahooProvider {
    pub fn new(limiter: GlobalRateLimiter) -> anyhow::Result<Self> {
        let config = YahooApiConfig::default();
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(YAHOO.user_agent)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: YAHOO.chart_base_url.to_string(),
            limiter,
        })
    }

    /// Points the client at another chart-compatible host (mirrors, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// `<base>/<ticker>`, with the ticker percent-encoded as a single path segment.
    pub(crate) fn chart_url(&self, ticker: &str) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            FetchError::Transport(format!("bad chart url {}: {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                FetchError::Transport(format!("chart url {} cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .push(ticker);
        Ok(url)
    }
}

#[async_trait]
impl PriceSeriesProvider for YahooProvider {
    async fn fetch_daily_closes(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, FetchError> {
        self.limiter
            .acquire(YAHOO.limits.chart_call_weight, ticker)
            .await;

        let url = self.chart_url(ticker)?;
        let period1 = date_to_epoch_secs(start).to_string();
        let period2 = date_to_epoch_secs(end).to_string();

        let response = self
            .client
            .get(url)
            .query(&[
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
                ("interval", "1d"),
                ("events", "history"),
            ])
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            log::warn!("{} Rate limit exceeded (HTTP 429).", ticker);
            return Err(FetchError::RateLimited { retry_after });
        }
        if status.is_server_error() {
            log::warn!("{} Server error (status code: {})", ticker, status);
            return Err(FetchError::Transport(format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let series = parse_chart_response(ticker, &body, start, end).map_err(|e| {
            // Client errors without a readable chart error are still "no data" for this symbol.
            match e {
                FetchError::Transport(msg) if status.is_client_error() => {
                    FetchError::DataUnavailable(format!("HTTP {}: {}", status, msg))
                }
                other => other,
            }
        })?;

        if DF.log_price_fetches {
            log::info!(
                "{} fetched {} daily closes for [{}, {})",
                ticker,
                series.len(),
                start,
                end
            );
        }
        Ok(series)
    }
}

/// Parses a chart response body into closes within `[start, end)`.
pub(crate) fn parse_chart_response(
    ticker: &str,
    body: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<PriceSeries, FetchError> {
    let envelope: ChartEnvelope = serde_json::from_str(body)
        .map_err(|e| FetchError::Transport(format!("unreadable chart response: {}", e)))?;

    if let Some(err) = envelope.chart.error {
        return Err(FetchError::DataUnavailable(format!(
            "{}: {}",
            err.code, err.description
        )));
    }

    let result = envelope
        .chart
        .result
        .and_then(|mut results| {
            if results.is_empty() {
                None
            } else {
                Some(results.swap_remove(0))
            }
        })
        .ok_or_else(|| FetchError::DataUnavailable("empty chart result".to_string()))?;

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    let gmt_offset = result.meta.gmtoffset;
    let points: Vec<DailyClose> = result
        .timestamp
        .iter()
        .zip(closes)
        .filter_map(|(&ts, close)| {
            let close = close?;
            let date = epoch_secs_to_local_date(ts, gmt_offset)?;
            Some(DailyClose::new(date, close))
        })
        .filter(|c| c.date >= start && c.date < end)
        .collect();

    if points.is_empty() {
        return Err(FetchError::DataUnavailable(format!(
            "no closes for {} in [{}, {})",
            ticker, start, end
        )));
    }

    Ok(PriceSeries::new(ticker, points))
}

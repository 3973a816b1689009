use {
    crate::{
        analysis::{
            CalibrationResult, ConvictionFilter, Evaluation, Evaluator, MoveWindow,
            PriceMoveComputer, SentimentLabeler, ThresholdCalibrator, TickerMatcher,
            prediction_pairs,
        },
        config::{PERSISTENCE, RunConfig, YAHOO, price_cache_filename},
        data::{
            BEAR_COLUMN, BULL_COLUMN, CachedProvider, CsvTable, GlobalRateLimiter,
            MODEL_MOVE_COLUMN, MODEL_PRED_COLUMN, NEUTRAL_COLUMN, PRICE_MOVE_COLUMN,
            PriceSeriesProvider, RetryPolicy, TEXT_COLUMN, TICKERS_COLUMN, YahooProvider,
        },
        domain::{Move, PipelineError, SentimentTriple},
    },
    anyhow::Result,
    itertools::Itertools,
    std::{
        path::{Path, PathBuf},
        sync::Arc,
    },
};

/// Output of the calibration stage.
pub struct CalibrationOutcome {
    /// Input rows plus `model_pred` / `model_move` at the chosen margin.
    pub table: CsvTable,
    pub result: CalibrationResult,
    /// Report for the chosen margin.
    pub evaluation: Evaluation,
}

/// Wires the stages to a price provider. Every fetch goes through a per-run
/// cache; the cache is seeded from and saved to disk when `cache_path` is set.
pub struct Pipeline {
    config: RunConfig,
    cache: Arc<CachedProvider>,
    retry: RetryPolicy,
    cache_path: Option<PathBuf>,
}

impl Pipeline {
    pub fn new(config: RunConfig, provider: Arc<dyn PriceSeriesProvider>) -> Self {
        Self {
            config,
            cache: Arc::new(CachedProvider::new(provider)),
            retry: RetryPolicy::default(),
            cache_path: None,
        }
    }

    /// Yahoo-backed pipeline, with the on-disk price cache when the config enables it.
    pub fn with_yahoo(config: RunConfig) -> Result<Self> {
        let limiter = GlobalRateLimiter::per_minute(YAHOO.limits.requests_per_minute);
        let provider: Arc<dyn PriceSeriesProvider> = Arc::new(YahooProvider::new(limiter)?);
        if !config.use_price_cache {
            return Ok(Self::new(config, provider));
        }
        let path = PathBuf::from(PERSISTENCE.price_cache.directory).join(price_cache_filename());
        Ok(Self::new(config, provider).with_disk_cache(path))
    }

    pub fn with_disk_cache(mut self, path: PathBuf) -> Self {
        let inner = self.cache.inner();
        self.cache = Arc::new(CachedProvider::load_or_empty(inner, &path));
        self.cache_path = Some(path);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Adds (or replaces) `price_move` for every row.
    pub async fn price_moves(&self, table: CsvTable) -> Result<CsvTable> {
        let events = table.parse_events(self.config.sum_tolerance)?;
        let window = MoveWindow::from(&self.config);
        log::info!(
            "Computing {}-day moves (threshold {}) for {} events, {} in flight",
            window.window_days,
            window.threshold,
            events.len(),
            self.config.concurrency
        );

        let computer = PriceMoveComputer::new(self.cache.clone(), self.retry.clone());
        let moves = crate::trace_time!("Price moves", 1_000_000, {
            computer
                .compute_moves(&events, &window, self.config.concurrency)
                .await
        });

        let counts = moves.iter().map(|(_, m)| *m).counts();
        log::info!(
            "Moves: up={} down={} neutral={} unknown={}",
            counts.get(&Move::Up).unwrap_or(&0),
            counts.get(&Move::Down).unwrap_or(&0),
            counts.get(&Move::Neutral).unwrap_or(&0),
            counts.get(&Move::Unknown).unwrap_or(&0)
        );

        self.save_cache().await;

        let values: Vec<String> = moves.iter().map(|(_, m)| m.as_str().to_string()).collect();
        Ok(table.with_column(PRICE_MOVE_COLUMN, &values)?)
    }

    pub fn calibrate(&self, table: CsvTable) -> Result<CalibrationOutcome> {
        calibrate_table(&self.config, table)
    }

    /// Both stages back to back without an intermediate file.
    pub async fn run(&self, table: CsvTable) -> Result<CalibrationOutcome> {
        let with_moves = self.price_moves(table).await?;
        self.calibrate(with_moves)
    }

    async fn save_cache(&self) {
        if let Some(path) = &self.cache_path {
            // A failed save costs a refetch next run, nothing more.
            if let Err(e) = self.cache.save(path).await {
                log::warn!("Could not save price cache: {:#}", e);
            }
        }
    }
}

/// Sweeps the margin candidates against `price_move` and labels every row at the best one.
pub fn calibrate_table(config: &RunConfig, table: CsvTable) -> Result<CalibrationOutcome> {
    let events = table.parse_events(config.sum_tolerance)?;
    let truth = table.read_moves(PRICE_MOVE_COLUMN)?;

    let result = crate::trace_time!("Margin sweep", 100_000, {
        ThresholdCalibrator::calibrate(&events, &truth, &config.margin_candidates)?
    });
    let margin = result.best.margin;
    log::info!(
        "Best margin {} (macro F1 {:.4} over {} events)",
        margin,
        result.best.macro_f1,
        result.best.evaluated
    );

    let evaluation = Evaluator::evaluate(prediction_pairs(&events, &truth, margin));

    let labels: Vec<_> = events
        .iter()
        .map(|e| SentimentLabeler::label(&e.sentiment, margin))
        .collect();
    let preds: Vec<String> = labels.iter().map(|c| c.to_string()).collect();
    let pred_moves: Vec<String> = labels
        .iter()
        .map(|c| c.to_move().as_str().to_string())
        .collect();

    let table = table
        .with_column(MODEL_PRED_COLUMN, &preds)?
        .with_column(MODEL_MOVE_COLUMN, &pred_moves)?;

    Ok(CalibrationOutcome {
        table,
        result,
        evaluation,
    })
}

/// Fills `matched_tickers` from each row's text, dropping rows with no match
/// or without enough bear/bull conviction.
pub fn annotate(
    table: CsvTable,
    matcher: &TickerMatcher,
    filter: ConvictionFilter,
    sum_tolerance: f64,
) -> Result<CsvTable, PipelineError> {
    let text_col = table.column(TEXT_COLUMN).ok_or_else(|| {
        PipelineError::malformed_file(format!("missing required column '{}'", TEXT_COLUMN))
    })?;
    let bear = table.float_column(BEAR_COLUMN)?;
    let neutral = table.float_column(NEUTRAL_COLUMN)?;
    let bull = table.float_column(BULL_COLUMN)?;

    let mut keep = vec![false; table.len()];
    let mut matched = Vec::new();
    let (mut unmatched, mut low_conviction) = (0usize, 0usize);

    for row in 0..table.len() {
        let sentiment = SentimentTriple::try_new(bear[row], neutral[row], bull[row], sum_tolerance)
            .map_err(|reason| PipelineError::malformed(row + 1, reason))?;
        let tickers = matcher.match_text(table.cell(row, text_col));
        if tickers.is_empty() {
            unmatched += 1;
            continue;
        }
        if !filter.passes(&sentiment) {
            low_conviction += 1;
            continue;
        }
        keep[row] = true;
        matched.push(tickers.join(","));
    }

    let total = table.len();
    let kept = table.retain_rows(|row| keep[row]);
    log::info!(
        "Annotated {} of {} events ({} without a ticker, {} below conviction)",
        kept.len(),
        total,
        unmatched,
        low_conviction
    );
    kept.with_column(TICKERS_COLUMN, &matched)
}

/// Reads a CSV, logging its size.
pub fn read_table(path: &Path) -> Result<CsvTable> {
    let table = CsvTable::read_path(path)?;
    log::info!("Read {} rows from {:?}", table.len(), path);
    Ok(table)
}

pub fn write_table(table: &CsvTable, path: &Path) -> Result<()> {
    table.write_path(path)?;
    log::info!("Wrote {} rows to {:?}", table.len(), path);
    Ok(())
}

use crate::{
    config::{CALIBRATION, Margin, ReturnThreshold, YAHOO},
    domain::PipelineError,
    utils::parse_float_list,
};

/// Parameters for one run: the blueprints in this module, overridden from the command line.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub window_days: u32,
    pub threshold: ReturnThreshold,
    pub margin_candidates: Vec<Margin>,
    pub sum_tolerance: f64,
    /// Width of the bounded price-fetch pool.
    pub concurrency: usize,
    pub use_price_cache: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            window_days: CALIBRATION.window.window_days,
            threshold: CALIBRATION.window.threshold,
            margin_candidates: CALIBRATION.margin_candidates.to_vec(),
            sum_tolerance: CALIBRATION.input.sum_tolerance,
            concurrency: YAHOO.limits.concurrent_fetch_tasks,
            use_price_cache: true,
        }
    }
}

impl RunConfig {
    pub fn with_window_days(mut self, window_days: Option<u32>) -> Self {
        if let Some(days) = window_days {
            self.window_days = days;
        }
        self
    }

    pub fn with_threshold(mut self, threshold: Option<f64>) -> Result<Self, PipelineError> {
        if let Some(raw) = threshold {
            self.threshold = ReturnThreshold::try_new(raw).ok_or_else(|| {
                PipelineError::config(format!(
                    "threshold must be a finite, non-negative number (got {})",
                    raw
                ))
            })?;
        }
        Ok(self)
    }

    /// `raw` is a literal list such as `0,0.02,0.05` or `[0, 0.1]`.
    pub fn with_margins(mut self, raw: Option<&str>) -> Result<Self, PipelineError> {
        if let Some(raw) = raw {
            self.margin_candidates = parse_margins(raw)?;
        }
        Ok(self)
    }

    pub fn with_concurrency(mut self, concurrency: Option<usize>) -> Result<Self, PipelineError> {
        if let Some(n) = concurrency {
            if n == 0 {
                return Err(PipelineError::config("concurrency must be at least 1"));
            }
            self.concurrency = n;
        }
        Ok(self)
    }

    pub fn with_price_cache(mut self, enabled: bool) -> Self {
        self.use_price_cache = enabled;
        self
    }
}

/// Parses and range-checks a margin list. Empty lists are rejected.
pub fn parse_margins(raw: &str) -> Result<Vec<Margin>, PipelineError> {
    let values = parse_float_list(raw)
        .map_err(|e| PipelineError::config(format!("margin list '{}': {}", raw, e)))?;
    if values.is_empty() {
        return Err(PipelineError::config("margin candidate list is empty"));
    }
    values
        .into_iter()
        .map(|v| {
            Margin::try_new(v).ok_or_else(|| {
                PipelineError::config(format!("margin {} is outside [0, 1]", v))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_blueprint() {
        let config = RunConfig::default();
        assert_eq!(config.window_days, 3);
        assert_eq!(config.threshold.value(), 0.02);
        assert_eq!(config.margin_candidates.len(), 5);
    }

    #[test]
    fn test_margin_overrides_are_validated() {
        let ok = RunConfig::default().with_margins(Some("[0.2, 0.1]")).unwrap();
        assert_eq!(
            ok.margin_candidates,
            vec![Margin::new(0.2), Margin::new(0.1)]
        );

        assert!(matches!(
            RunConfig::default().with_margins(Some("")),
            Err(PipelineError::Config(_))
        ));
        assert!(RunConfig::default().with_margins(Some("0.5, 1.5")).is_err());
    }

    #[test]
    fn test_bad_threshold_and_concurrency() {
        assert!(RunConfig::default().with_threshold(Some(-0.01)).is_err());
        assert!(RunConfig::default().with_threshold(Some(f64::NAN)).is_err());
        assert!(RunConfig::default().with_concurrency(Some(0)).is_err());
    }
}

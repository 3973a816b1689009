use {
    crate::{
        config::{DF, ReturnThreshold, RunConfig},
        data::{PriceSeriesProvider, RetryPolicy, fetch_with_retry},
        domain::{Event, Move, PriceSeries},
        utils::shift_days,
    },
    chrono::NaiveDate,
    futures::{StreamExt, stream},
    std::sync::Arc,
};

/// How far after the event the move is measured, and how big it must be.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveWindow {
    pub window_days: u32,
    pub threshold: ReturnThreshold,
}

impl MoveWindow {
    /// `[event_date - 1, event_date + window_days + 1)`, end exclusive.
    pub fn fetch_range(&self, event_date: NaiveDate) -> (NaiveDate, NaiveDate) {
        (
            shift_days(event_date, -1),
            shift_days(event_date, i64::from(self.window_days) + 1),
        )
    }
}

impl From<&RunConfig> for MoveWindow {
    fn from(config: &RunConfig) -> Self {
        Self {
            window_days: config.window_days,
            threshold: config.threshold,
        }
    }
}

/// Labels a series: `None` when it cannot yield a return (fewer than two closes,
/// or a first close that is not positive).
pub fn classify_series(series: &PriceSeries, threshold: ReturnThreshold) -> Option<Move> {
    series
        .window_return()
        .map(|ret| Move::from_return(ret, threshold.value()))
}

/// Ground-truth move labels from a price provider.
pub struct PriceMoveComputer {
    provider: Arc<dyn PriceSeriesProvider>,
    retry: RetryPolicy,
}

impl PriceMoveComputer {
    pub fn new(provider: Arc<dyn PriceSeriesProvider>, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    /// Tries each ticker in listed order; the first one that yields a label wins.
    /// Failures are logged and skipped, never propagated.
    pub async fn compute_move(
        &self,
        event_id: &str,
        tickers: &[String],
        event_date: NaiveDate,
        window: &MoveWindow,
    ) -> Move {
        let (start, end) = window.fetch_range(event_date);

        for ticker in tickers {
            let series =
                match fetch_with_retry(self.provider.as_ref(), ticker, start, end, &self.retry)
                    .await
                {
                    Ok(series) => series,
                    Err(e) => {
                        log::warn!("[event {}] skipping {}: {}", event_id, ticker, e);
                        continue;
                    }
                };

            // Providers are asked for [start, end) but not trusted to honour it.
            let series = series.within(start, end);
            match classify_series(&series, window.threshold) {
                Some(label) => {
                    if DF.log_price_fetches {
                        log::info!(
                            "[event {}] {} -> {} ({} closes {}..{})",
                            event_id,
                            ticker,
                            label,
                            series.len(),
                            start,
                            end
                        );
                    }
                    return label;
                }
                None => {
                    log::warn!(
                        "[event {}] skipping {}: {} close(s) in [{}, {}) cannot produce a return",
                        event_id,
                        ticker,
                        series.len(),
                        start,
                        end
                    );
                }
            }
        }

        if tickers.is_empty() {
            log::debug!("[event {}] no tickers, move unknown", event_id);
        }
        Move::Unknown
    }

    /// Moves for every event, at most `concurrency` events in flight.
    /// Output is in input order whatever order the fetches complete in.
    pub async fn compute_moves(
        &self,
        events: &[Event],
        window: &MoveWindow,
        concurrency: usize,
    ) -> Vec<(String, Move)> {
        let mut labelled: Vec<(usize, String, Move)> = stream::iter(events.iter().enumerate())
            .map(|(idx, event)| async move {
                let label = self
                    .compute_move(&event.id, &event.tickers, event.event_date(), window)
                    .await;
                (idx, event.id.clone(), label)
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        labelled.sort_unstable_by_key(|(idx, _, _)| *idx);
        labelled
            .into_iter()
            .map(|(_, id, label)| (id, label))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{data::FetchError, domain::DailyClose, utils::parse_event_timestamp};
    use async_trait::async_trait;
    use std::{collections::HashMap, sync::Mutex};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    /// Serves fixed closes per ticker, honouring the requested range.
    struct StaticProvider {
        closes: HashMap<String, Vec<(NaiveDate, f64)>>,
        requests: Mutex<Vec<(String, NaiveDate, NaiveDate)>>,
    }

    impl StaticProvider {
        fn new() -> Self {
            Self {
                closes: HashMap::new(),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn with(mut self, ticker: &str, points: &[(u32, f64)]) -> Self {
            self.closes.insert(
                ticker.to_string(),
                points.iter().map(|&(day, c)| (d(day), c)).collect(),
            );
            self
        }
    }

    #[async_trait]
    impl PriceSeriesProvider for StaticProvider {
        async fn fetch_daily_closes(
            &self,
            ticker: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<PriceSeries, FetchError> {
            self.requests
                .lock()
                .unwrap()
                .push((ticker.to_string(), start, end));
            let points = self
                .closes
                .get(ticker)
                .ok_or_else(|| FetchError::DataUnavailable(format!("unknown {}", ticker)))?;
            let in_range: Vec<DailyClose> = points
                .iter()
                .filter(|(date, _)| *date >= start && *date < end)
                .map(|&(date, c)| DailyClose::new(date, c))
                .collect();
            Ok(PriceSeries::new(ticker, in_range))
        }
    }

    fn window() -> MoveWindow {
        MoveWindow {
            window_days: 3,
            threshold: ReturnThreshold::new(0.02),
        }
    }

    fn computer(provider: Arc<StaticProvider>) -> PriceMoveComputer {
        PriceMoveComputer::new(provider, RetryPolicy::none())
    }

    fn tickers(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_fetch_range_is_end_exclusive_window() {
        assert_eq!(window().fetch_range(d(10)), (d(9), d(14)));
    }

    #[tokio::test]
    async fn test_late_evening_event_keeps_its_local_date() {
        let provider = Arc::new(StaticProvider::new().with("AAPL", &[(9, 100.0), (13, 103.0)]));
        let event = Event {
            id: "e1".to_string(),
            timestamp: parse_event_timestamp("2024-03-10 23:30:00-04:00").unwrap(),
            tickers: tickers(&["AAPL"]),
            sentiment: crate::domain::SentimentTriple::try_new(0.2, 0.6, 0.2, 0.01).unwrap(),
        };
        let moves = computer(provider.clone())
            .compute_moves(std::slice::from_ref(&event), &window(), 1)
            .await;
        assert_eq!(moves, vec![("e1".to_string(), Move::Up)]);
        // 03:30 UTC on the 11th, but the window is anchored on the 10th.
        assert_eq!(provider.requests.lock().unwrap()[0], ("AAPL".to_string(), d(9), d(14)));
    }

    #[tokio::test]
    async fn test_requests_the_padded_window() {
        let provider = Arc::new(StaticProvider::new().with("AAPL", &[(9, 100.0), (13, 103.0)]));
        let label = computer(provider.clone())
            .compute_move("e1", &tickers(&["AAPL"]), d(10), &window())
            .await;
        assert_eq!(label, Move::Up);
        assert_eq!(provider.requests.lock().unwrap()[0], ("AAPL".to_string(), d(9), d(14)));
    }

    #[tokio::test]
    async fn test_first_resolvable_ticker_wins() {
        let provider = Arc::new(
            StaticProvider::new()
                .with("THIN", &[(11, 50.0)])
                .with("DOWN", &[(9, 100.0), (12, 95.0)])
                .with("UP", &[(9, 100.0), (12, 110.0)]),
        );
        let label = computer(provider.clone())
            .compute_move("e1", &tickers(&["GONE", "THIN", "DOWN", "UP"]), d(10), &window())
            .await;
        assert_eq!(label, Move::Down);
        // "UP" is never requested once "DOWN" resolves.
        assert_eq!(provider.requests.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_no_resolvable_ticker_is_unknown() {
        let provider = Arc::new(StaticProvider::new().with("ZERO", &[(9, 0.0), (12, 5.0)]));
        let c = computer(provider);
        assert_eq!(c.compute_move("e1", &[], d(10), &window()).await, Move::Unknown);
        assert_eq!(
            c.compute_move("e2", &tickers(&["ZERO", "GONE"]), d(10), &window()).await,
            Move::Unknown
        );
    }

    #[tokio::test]
    async fn test_threshold_boundary_is_neutral() {
        let provider = Arc::new(StaticProvider::new().with("FLAT", &[(9, 100.0), (12, 102.0)]));
        let label = computer(provider)
            .compute_move("e1", &tickers(&["FLAT"]), d(10), &window())
            .await;
        assert_eq!(label, Move::Neutral);
    }

    #[tokio::test]
    async fn test_compute_moves_preserves_input_order() {
        let provider = Arc::new(
            StaticProvider::new()
                .with("UP", &[(9, 100.0), (12, 110.0)])
                .with("DOWN", &[(9, 100.0), (12, 90.0)]),
        );
        let events: Vec<Event> = ["UP", "DOWN", "NONE", "UP"]
            .iter()
            .enumerate()
            .map(|(i, t)| Event {
                id: format!("id{}", i),
                timestamp: d(10).and_hms_opt(14, 0, 0).unwrap().and_utc().fixed_offset(),
                tickers: tickers(&[*t]),
                sentiment: crate::domain::SentimentTriple::try_new(0.2, 0.6, 0.2, 0.01).unwrap(),
            })
            .collect();

        let c = computer(provider);
        let first = c.compute_moves(&events, &window(), 3).await;
        let second = c.compute_moves(&events, &window(), 1).await;

        assert_eq!(
            first,
            vec![
                ("id0".to_string(), Move::Up),
                ("id1".to_string(), Move::Down),
                ("id2".to_string(), Move::Unknown),
                ("id3".to_string(), Move::Up),
            ]
        );
        assert_eq!(first, second);
    }
}

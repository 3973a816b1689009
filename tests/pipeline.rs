//! End-to-end runs of the pipeline against an in-memory price provider.

use async_trait::async_trait;
use chrono::NaiveDate;
use sentiment_move::{
    CsvTable, Move, Pipeline, PriceSeriesProvider, RunConfig,
    analysis::{ConfusionMatrix, ConvictionFilter, TickerMatcher},
    config::Margin,
    data::{FetchError, RetryPolicy, load_confusion, save_confusion},
    domain::{DailyClose, PriceSeries},
    engine::{annotate, calibrate_table},
};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

/// Closes keyed by ticker; unknown tickers fail like a delisted symbol.
struct MockProvider {
    closes: HashMap<&'static str, Vec<(u32, f64)>>,
    calls: AtomicUsize,
}

impl MockProvider {
    fn new() -> Self {
        let mut closes = HashMap::new();
        closes.insert("UP", vec![(9, 100.0), (11, 104.0), (13, 106.0)]);
        closes.insert("FLAT", vec![(9, 100.0), (13, 101.0)]);
        closes.insert("DOWN", vec![(9, 100.0), (12, 91.0)]);
        closes.insert("ONEDAY", vec![(11, 50.0)]);
        Self {
            closes,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PriceSeriesProvider for MockProvider {
    async fn fetch_daily_closes(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let points = self
            .closes
            .get(ticker)
            .ok_or_else(|| FetchError::DataUnavailable(format!("{} not found", ticker)))?;
        let closes = points
            .iter()
            .map(|&(day, close)| DailyClose::new(d(day), close))
            .filter(|c| c.date >= start && c.date < end)
            .collect();
        Ok(PriceSeries::new(ticker, closes))
    }
}

const EVENTS: &str = "\
id,date,text,matched_tickers,sent_bear,sent_neut,sent_bull
a,2024-03-10 13:30:00+00:00,great quarter,UP,0.1,0.1,0.8
b,2024-03-10,nothing to see,\"FLAT\",0.4,0.5,0.1
c,2024-03-10T20:00:00Z,ugly guidance,\"GONE,ONEDAY,DOWN,UP\",0.34,0.33,0.33
d,2024-03-10,no ticker,,0.2,0.6,0.2
";

fn pipeline(config: RunConfig, provider: Arc<MockProvider>) -> Pipeline {
    Pipeline::new(config, provider).with_retry(RetryPolicy::none())
}

fn events() -> CsvTable {
    CsvTable::from_reader(EVENTS.as_bytes()).unwrap()
}

mod price_moves {
    use super::*;

    #[tokio::test]
    async fn test_moves_follow_first_resolvable_ticker() {
        let provider = Arc::new(MockProvider::new());
        let p = pipeline(RunConfig::default(), provider.clone());
        let table = p.price_moves(events()).await.unwrap();

        let moves = table.read_moves("price_move").unwrap();
        assert_eq!(moves["a"], Move::Up);
        assert_eq!(moves["b"], Move::Neutral);
        assert_eq!(moves["c"], Move::Down);
        assert_eq!(moves["d"], Move::Unknown);

        // Extra columns ride along untouched.
        let text = table.column("text").unwrap();
        assert_eq!(table.cell(2, text), "ugly guidance");
    }

    #[tokio::test]
    async fn test_repeat_requests_hit_the_run_cache() {
        let provider = Arc::new(MockProvider::new());
        let p = pipeline(RunConfig::default(), provider.clone());
        let first = p.price_moves(events()).await.unwrap();
        let calls_after_first = provider.calls.load(Ordering::SeqCst);
        let second = p.price_moves(events()).await.unwrap();

        assert_eq!(
            first.read_moves("price_move").unwrap(),
            second.read_moves("price_move").unwrap()
        );
        // Only the failing lookup (GONE) is asked for again.
        assert_eq!(provider.calls.load(Ordering::SeqCst), calls_after_first + 1);
    }

    #[tokio::test]
    async fn test_malformed_input_aborts_before_fetching() {
        let raw = "id,date,matched_tickers,sent_bear,sent_neut,sent_bull\n\
                   a,2024-03-10,UP,0.1,0.1,0.8\n\
                   b,yesterday,UP,0.1,0.1,0.8\n";
        let provider = Arc::new(MockProvider::new());
        let p = pipeline(RunConfig::default(), provider.clone());
        let table = CsvTable::from_reader(raw.as_bytes()).unwrap();

        assert!(p.price_moves(table).await.is_err());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}

mod calibration {
    use super::*;

    #[tokio::test]
    async fn test_scenario_at_margin_point_two() {
        let config = RunConfig::default().with_margins(Some("0.2")).unwrap();
        let provider = Arc::new(MockProvider::new());
        let outcome = pipeline(config, provider).run(events()).await.unwrap();

        assert_eq!(outcome.result.best.margin, Margin::new(0.2));
        assert_eq!(
            outcome.evaluation.matrix,
            ConfusionMatrix::from_counts([[0, 1, 0], [1, 0, 0], [0, 0, 1]])
        );
        assert!((outcome.evaluation.macro_f1 - 1.0 / 3.0).abs() < 1e-9);

        let preds = outcome.table.read_moves("model_move").unwrap();
        assert_eq!(preds["a"], Move::Up);
        assert_eq!(preds["b"], Move::Down);
        assert_eq!(preds["c"], Move::Neutral);
    }

    #[tokio::test]
    async fn test_default_sweep_keeps_first_best_margin() {
        let provider = Arc::new(MockProvider::new());
        let outcome = pipeline(RunConfig::default(), provider).run(events()).await.unwrap();

        // Margin 0 already predicts all three known moves correctly.
        assert_eq!(outcome.result.scores.len(), 5);
        assert_eq!(outcome.result.best.margin, Margin::ZERO);
        assert_eq!(outcome.result.best.macro_f1, 1.0);
        assert_eq!(outcome.evaluation.total(), 3);
    }

    #[test]
    fn test_calibrate_requires_price_move_column() {
        assert!(calibrate_table(&RunConfig::default(), events()).is_err());
    }

    #[tokio::test]
    async fn test_confusion_file_round_trip() {
        let provider = Arc::new(MockProvider::new());
        let outcome = pipeline(RunConfig::default(), provider).run(events()).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("confusion_matrix_price.csv");
        save_confusion(&outcome.evaluation.matrix, &path).unwrap();
        assert_eq!(load_confusion(&path).unwrap(), outcome.evaluation.matrix);
    }

    #[tokio::test]
    async fn test_output_file_can_be_recalibrated() {
        let provider = Arc::new(MockProvider::new());
        let outcome = pipeline(RunConfig::default(), provider).run(events()).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events_calibrated.csv");
        outcome.table.write_path(&path).unwrap();

        let reread = CsvTable::read_path(&path).unwrap();
        let again = calibrate_table(&RunConfig::default(), reread).unwrap();
        assert_eq!(again.result, outcome.result);
        // model_pred / model_move are replaced in place, not duplicated.
        assert_eq!(again.table.headers().len(), outcome.table.headers().len());
    }
}

mod ticker_matching {
    use super::*;

    #[test]
    fn test_annotate_fills_tickers_and_filters() {
        let stocks = "Ticker,Company,Context\nAAPL,Apple,\"['iPhone']\"\nTSLA,Tesla,\n";
        let stock_table = CsvTable::from_reader(stocks.as_bytes()).unwrap();
        let matcher =
            TickerMatcher::new(&TickerMatcher::from_stock_table(&stock_table).unwrap()).unwrap();

        let raw = "\
id,timestamp,text,sent_bear,sent_neut,sent_bull
1,2024-03-10,iPhone sales collapse,0.7,0.2,0.1
2,2024-03-10,Tesla is a company,0.05,0.9,0.05
3,2024-03-10,weather is nice,0.1,0.1,0.8
4,2024-03-10,$TSLA and apple rally,0.1,0.2,0.7
";
        let table = CsvTable::from_reader(raw.as_bytes()).unwrap();
        let filter = ConvictionFilter {
            bear_min: 0.2,
            bull_min: 0.2,
        };
        let out = annotate(table, &matcher, filter, 0.01).unwrap();

        assert_eq!(out.len(), 2);
        let tickers = out.column("matched_tickers").unwrap();
        assert_eq!(out.cell(0, tickers), "AAPL");
        assert_eq!(out.cell(1, tickers), "AAPL,TSLA");

        // The annotated stream feeds straight into the move stage.
        let events = out.parse_events(0.01).unwrap();
        assert_eq!(events[1].tickers, vec!["AAPL", "TSLA"]);
    }
}

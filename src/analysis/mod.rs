// Calibration and evaluation algorithms
mod calibrator;
mod evaluator;
mod price_move;
mod sentiment_labeler;
mod ticker_matcher;

pub use {
    calibrator::{CalibrationResult, MarginScore, ThresholdCalibrator, prediction_pairs},
    evaluator::{ClassMetrics, ConfusionMatrix, Evaluation, Evaluator},
    price_move::{MoveWindow, PriceMoveComputer, classify_series},
    sentiment_labeler::SentimentLabeler,
    ticker_matcher::{ConvictionFilter, StockPattern, TickerMatcher},
};

use {
    crate::{
        analysis::{Evaluator, SentimentLabeler},
        config::{DF, Margin},
        domain::{Event, Move, PipelineError},
    },
    rayon::prelude::*,
    serde::{Deserialize, Serialize},
    std::collections::HashMap,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarginScore {
    pub margin: Margin,
    pub macro_f1: f64,
    /// Pairs that survived the join (both sides known).
    pub evaluated: usize,
}

/// Every candidate's score in candidate order, plus the retained best.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    pub scores: Vec<MarginScore>,
    pub best: MarginScore,
}

/// (true move, predicted move) for every event with a known truth and a known prediction.
/// Events missing from `truth` are dropped. Order follows `events`.
pub fn prediction_pairs(
    events: &[Event],
    truth: &HashMap<String, Move>,
    margin: Margin,
) -> Vec<(Move, Move)> {
    events
        .iter()
        .filter_map(|event| {
            let actual = *truth.get(&event.id)?;
            let predicted = SentimentLabeler::predict_move(&event.sentiment, margin);
            (actual.is_known() && predicted.is_known()).then_some((actual, predicted))
        })
        .collect()
}

pub struct ThresholdCalibrator;

impl ThresholdCalibrator {
    fn score(events: &[Event], truth: &HashMap<String, Move>, margin: Margin) -> MarginScore {
        let pairs = prediction_pairs(events, truth, margin);
        MarginScore {
            margin,
            evaluated: pairs.len(),
            macro_f1: Evaluator::macro_f1(pairs),
        }
    }

    /// Grid search over `candidates`. The first candidate reaching the maximum macro F1 wins.
    pub fn calibrate(
        events: &[Event],
        truth: &HashMap<String, Move>,
        candidates: &[Margin],
    ) -> Result<CalibrationResult, PipelineError> {
        if candidates.is_empty() {
            return Err(PipelineError::config("margin candidate list is empty"));
        }

        // 1. Score every candidate in parallel (collect keeps candidate order)
        let scores: Vec<MarginScore> = candidates
            .par_iter()
            .map(|&margin| Self::score(events, truth, margin))
            .collect();

        // 2. In-order reduction, strict '>' so ties keep the earlier margin
        let mut best = scores[0];
        for score in &scores {
            let level = if DF.log_margin_sweep {
                log::Level::Info
            } else {
                log::Level::Debug
            };
            log::log!(
                level,
                "margin={} macro_f1={:.4} (n={})",
                score.margin,
                score.macro_f1,
                score.evaluated
            );
            if score.macro_f1 > best.macro_f1 {
                best = *score;
            }
        }

        if best.evaluated == 0 {
            log::warn!("No event has both a price move and a prediction; every margin scores 0");
        }

        Ok(CalibrationResult { scores, best })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SentimentTriple;
    use chrono::{TimeZone, Utc};

    fn event(id: &str, bear: f64, neutral: f64, bull: f64) -> Event {
        Event {
            id: id.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 15, 0, 0).unwrap().fixed_offset(),
            tickers: vec!["AAPL".to_string()],
            sentiment: SentimentTriple::try_new(bear, neutral, bull, 0.01).unwrap(),
        }
    }

    fn truth(pairs: &[(&str, Move)]) -> HashMap<String, Move> {
        pairs.iter().map(|(id, m)| (id.to_string(), *m)).collect()
    }

    fn margins(values: &[f64]) -> Vec<Margin> {
        values.iter().map(|&v| Margin::new(v)).collect()
    }

    #[test]
    fn test_empty_candidates_is_config_error() {
        let err = ThresholdCalibrator::calibrate(&[], &HashMap::new(), &[]).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_empty_join_scores_zero_everywhere() {
        let events = vec![event("1", 0.1, 0.1, 0.8)];
        let truth = truth(&[("1", Move::Unknown)]);
        let result =
            ThresholdCalibrator::calibrate(&events, &truth, &margins(&[0.0, 0.1])).unwrap();
        assert!(result.scores.iter().all(|s| s.macro_f1 == 0.0 && s.evaluated == 0));
        assert_eq!(result.best.margin, Margin::ZERO);
    }

    #[test]
    fn test_ties_keep_first_candidate() {
        // Every margin below 0.7 predicts the same thing here.
        let events = vec![event("1", 0.1, 0.1, 0.8), event("2", 0.8, 0.1, 0.1)];
        let truth = truth(&[("1", Move::Up), ("2", Move::Down)]);
        let result =
            ThresholdCalibrator::calibrate(&events, &truth, &margins(&[0.3, 0.0, 0.5])).unwrap();
        assert_eq!(result.best.margin, Margin::new(0.3));
        assert_eq!(result.scores.len(), 3);
        assert_eq!(result.scores[1].margin, Margin::ZERO);
    }

    #[test]
    fn test_picks_margin_with_highest_macro_f1() {
        // Top class is wrong, runner-up is right: only a wide margin recovers it.
        let events = vec![event("1", 0.45, 0.1, 0.45), event("2", 0.1, 0.5, 0.4)];
        let truth = truth(&[("1", Move::Up), ("2", Move::Up)]);
        let result =
            ThresholdCalibrator::calibrate(&events, &truth, &margins(&[0.0, 0.2])).unwrap();
        assert_eq!(result.best.margin, Margin::new(0.2));
        assert!(result.best.macro_f1 > result.scores[0].macro_f1);
    }

    #[test]
    fn test_scenario_macro_f1_at_point_two() {
        let events = vec![
            event("a", 0.1, 0.1, 0.8),
            event("b", 0.4, 0.5, 0.1),
            event("c", 0.34, 0.33, 0.33),
        ];
        let truth = truth(&[("a", Move::Up), ("b", Move::Neutral), ("c", Move::Down)]);
        let result =
            ThresholdCalibrator::calibrate(&events, &truth, &margins(&[0.2])).unwrap();
        assert!((result.best.macro_f1 - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(result.best.evaluated, 3);
    }
}

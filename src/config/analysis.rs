//! Calibration and evaluation configuration

use crate::config::types::{Margin, ReturnThreshold};

/// How the ground-truth move label is derived from prices.
pub struct MoveWindowConfig {
    /// Trading days after the event that the return is measured over.
    pub window_days: u32,
    /// |return| above this is a move, at or below it is neutral.
    pub threshold: ReturnThreshold,
}

/// Input validation tolerances.
pub struct InputConfig {
    /// Allowed drift of bear + neutral + bull away from 1.0
    pub sum_tolerance: f64,
}

/// Conviction filter applied when tickers are matched from raw text.
pub struct ConvictionConfig {
    pub bear_min: f64,
    pub bull_min: f64,
}

/// The Master Calibration Configuration
pub struct CalibrationConfig {
    pub window: MoveWindowConfig,
    /// Candidate margins, swept in this order (first maximum wins).
    pub margin_candidates: &'static [Margin],
    pub input: InputConfig,
    pub conviction: ConvictionConfig,
}

pub const CALIBRATION: CalibrationConfig = CalibrationConfig {
    window: MoveWindowConfig {
        window_days: 3,
        threshold: ReturnThreshold::new(0.02),
    },

    margin_candidates: &[
        Margin::new(0.0),
        Margin::new(0.02),
        Margin::new(0.05),
        Margin::new(0.1),
        Margin::new(0.2),
    ],

    input: InputConfig {
        // Softmax outputs written at 6 d.p. drift by ~1e-6; hand-edited files less tidy.
        sum_tolerance: 0.01,
    },

    conviction: ConvictionConfig {
        bear_min: 0.2,
        bull_min: 0.2,
    },
};

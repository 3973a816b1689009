use {
    crate::{config::Prob, domain::labels::PredictedClass},
    chrono::{DateTime, FixedOffset, NaiveDate},
    itertools::Itertools,
    serde::{Deserialize, Serialize},
};

/// Bear / neutral / bull probabilities from the sentiment model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentTriple {
    bear: Prob,
    neutral: Prob,
    bull: Prob,
}

impl SentimentTriple {
    /// Validates non-negativity and that the components sum to 1 within `tolerance`.
    pub fn try_new(bear: f64, neutral: f64, bull: f64, tolerance: f64) -> Result<Self, String> {
        for (name, p) in [("sent_bear", bear), ("sent_neut", neutral), ("sent_bull", bull)] {
            if !p.is_finite() {
                return Err(format!("{} is not a finite number", name));
            }
            if p < 0.0 {
                return Err(format!("{} is negative ({})", name, p));
            }
        }
        let sum = bear + neutral + bull;
        if (sum - 1.0).abs() > tolerance {
            return Err(format!(
                "sentiment probabilities sum to {:.6}, expected 1 +/- {}",
                sum, tolerance
            ));
        }
        Ok(Self {
            bear: Prob::new(bear),
            neutral: Prob::new(neutral),
            bull: Prob::new(bull),
        })
    }

    #[inline]
    pub fn probability(&self, class: PredictedClass) -> f64 {
        match class {
            PredictedClass::Bear => self.bear.value(),
            PredictedClass::Neutral => self.neutral.value(),
            PredictedClass::Bull => self.bull.value(),
        }
    }

    pub fn bear(&self) -> f64 {
        self.bear.value()
    }

    pub fn neutral(&self) -> f64 {
        self.neutral.value()
    }

    pub fn bull(&self) -> f64 {
        self.bull.value()
    }
}

/// One scored text tied to zero or more tickers. Immutable once read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    /// As written in the input, offset included.
    pub timestamp: DateTime<FixedOffset>,
    /// Resolution order for the price move: first resolvable ticker wins.
    pub tickers: Vec<String>,
    pub sentiment: SentimentTriple,
}

impl Event {
    /// Calendar date in the timestamp's own offset.
    pub fn event_date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// Splits a `matched_tickers` cell ("AAPL, $tsla,AAPL") into ["AAPL", "TSLA"].
/// Keeps listed order and the first occurrence of duplicates.
pub fn parse_ticker_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim().trim_start_matches('$').to_ascii_uppercase())
        .filter(|t| !t.is_empty())
        .unique()
        .collect()
}

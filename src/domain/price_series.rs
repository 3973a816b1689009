use {
    crate::config::{ClosePrice, PriceLike},
    chrono::NaiveDate,
    serde::{Deserialize, Serialize},
};

/// One daily close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: ClosePrice,
}

impl DailyClose {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            close: ClosePrice::new(close),
        }
    }
}

/// Daily closes for one ticker, ascending by date with no duplicate dates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceSeries {
    pub ticker: String,
    closes: Vec<DailyClose>,
}

impl PriceSeries {
    /// Sorts by date and drops later duplicates of the same date along with non-finite closes.
    pub fn new(ticker: impl Into<String>, mut closes: Vec<DailyClose>) -> Self {
        closes.retain(|c| c.close.value().is_finite());
        closes.sort_by_key(|c| c.date);
        closes.dedup_by_key(|c| c.date);
        Self {
            ticker: ticker.into(),
            closes,
        }
    }

    pub fn closes(&self) -> &[DailyClose] {
        &self.closes
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn first(&self) -> Option<&DailyClose> {
        self.closes.first()
    }

    pub fn last(&self) -> Option<&DailyClose> {
        self.closes.last()
    }

    /// Closes with `start <= date < end`.
    pub fn within(&self, start: NaiveDate, end: NaiveDate) -> PriceSeries {
        PriceSeries {
            ticker: self.ticker.clone(),
            closes: self
                .closes
                .iter()
                .filter(|c| c.date >= start && c.date < end)
                .copied()
                .collect(),
        }
    }

    /// Return from the earliest to the latest close. `None` with fewer than two
    /// points or a non-positive first close.
    pub fn window_return(&self) -> Option<f64> {
        if self.closes.len() < 2 {
            return None;
        }
        let first = self.first()?;
        let last = self.last()?;
        last.close.return_from(&first.close)
    }
}

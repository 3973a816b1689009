//! Ticker matching for raw text events.
//!
//! A stock table maps each ticker to its company name and optional product
//! context terms. A text matches a ticker when any of those terms appears as a
//! whole word, or when the ticker is written as a `$CASHTAG`.

use {
    crate::{
        config::ConvictionConfig,
        data::CsvTable,
        domain::{PipelineError, SentimentTriple},
        utils::parse_string_list,
    },
    anyhow::{Context, Result},
    itertools::Itertools,
    regex::Regex,
    std::path::Path,
};

const TICKER_COLUMN: &str = "Ticker";
const COMPANY_COLUMN: &str = "Company";
const CONTEXT_COLUMN: &str = "Context";

/// One stock table row.
#[derive(Debug, Clone, PartialEq)]
pub struct StockPattern {
    pub ticker: String,
    pub terms: Vec<String>,
}

pub struct TickerMatcher {
    patterns: Vec<(String, Regex)>,
    cashtag_regex: Regex,
}

impl TickerMatcher {
    pub fn new(stocks: &[StockPattern]) -> Result<Self> {
        let patterns = stocks
            .iter()
            .filter(|s| !s.terms.is_empty())
            .map(|s| {
                let alternation = s.terms.iter().map(|t| regex::escape(t)).join("|");
                let re = Regex::new(&format!(r"(?i)\b(?:{})\b", alternation))
                    .with_context(|| format!("Bad pattern for ticker {}", s.ticker))?;
                Ok::<_, anyhow::Error>((s.ticker.clone(), re))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            patterns,
            cashtag_regex: Regex::new(r"\$([A-Z]{1,5})\b")?,
        })
    }

    /// Reads `Ticker`, `Company` and the optional `Context` list column.
    pub fn from_stock_table(table: &CsvTable) -> Result<Vec<StockPattern>, PipelineError> {
        let require = |name: &str| {
            table.column(name).ok_or_else(|| {
                PipelineError::malformed_file(format!("stock table is missing column '{}'", name))
            })
        };
        let ticker_col = require(TICKER_COLUMN)?;
        let company_col = require(COMPANY_COLUMN)?;
        let context_col = table.column(CONTEXT_COLUMN);

        (0..table.len())
            .map(|row| {
                let ticker = table.cell(row, ticker_col).trim().to_ascii_uppercase();
                if ticker.is_empty() {
                    return Err(PipelineError::malformed(row + 1, "empty ticker"));
                }
                let mut terms = vec![table.cell(row, company_col).trim().to_string()];
                if let Some(col) = context_col {
                    let raw = table.cell(row, col);
                    match parse_string_list(raw) {
                        Ok(items) => terms.extend(items),
                        // Unreadable context only loses the extra terms, as with an empty cell.
                        Err(reason) => log::warn!(
                            "Ignoring context for {} (row {}): {}",
                            ticker,
                            row + 1,
                            reason
                        ),
                    }
                }
                terms.retain(|t| !t.is_empty());
                Ok(StockPattern { ticker, terms })
            })
            .collect()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let table = CsvTable::read_path(path)?;
        let stocks = Self::from_stock_table(&table)?;
        log::info!("Loaded {} stock patterns from {:?}", stocks.len(), path);
        Self::new(&stocks)
    }

    /// Tickers mentioned in `text`: stock table order first, then cashtags, no repeats.
    pub fn match_text(&self, text: &str) -> Vec<String> {
        let by_name = self
            .patterns
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(ticker, _)| ticker.clone());
        let by_cashtag = self
            .cashtag_regex
            .captures_iter(text)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()));
        by_name.chain(by_cashtag).unique().collect()
    }
}

/// Drops events whose bear and bull probabilities are both below their minimums.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvictionFilter {
    pub bear_min: f64,
    pub bull_min: f64,
}

impl ConvictionFilter {
    pub fn passes(&self, sentiment: &SentimentTriple) -> bool {
        !(sentiment.bear() < self.bear_min && sentiment.bull() < self.bull_min)
    }
}

impl From<&ConvictionConfig> for ConvictionFilter {
    fn from(config: &ConvictionConfig) -> Self {
        Self {
            bear_min: config.bear_min,
            bull_min: config.bull_min,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STOCKS: &str = "\
Ticker,Company,Context
AAPL,Apple,\"['iPhone', 'MacBook']\"
TSLA,Tesla,\"Cybertruck; Model Y\"
GM,General Motors,
";

    fn matcher() -> TickerMatcher {
        let table = CsvTable::from_reader(STOCKS.as_bytes()).unwrap();
        let stocks = TickerMatcher::from_stock_table(&table).unwrap();
        TickerMatcher::new(&stocks).unwrap()
    }

    #[test]
    fn test_stock_table_parses_context_lists() {
        let table = CsvTable::from_reader(STOCKS.as_bytes()).unwrap();
        let stocks = TickerMatcher::from_stock_table(&table).unwrap();
        assert_eq!(stocks[0].terms, vec!["Apple", "iPhone", "MacBook"]);
        assert_eq!(stocks[1].terms, vec!["Tesla", "Cybertruck", "Model Y"]);
        assert_eq!(stocks[2].terms, vec!["General Motors"]);
    }

    #[test]
    fn test_whole_word_case_insensitive() {
        let m = matcher();
        assert_eq!(m.match_text("new IPHONE leaks"), vec!["AAPL"]);
        assert!(m.match_text("pineapple season").is_empty());
        assert_eq!(m.match_text("general motors and tesla"), vec!["TSLA", "GM"]);
    }

    #[test]
    fn test_cashtags_follow_table_matches() {
        let m = matcher();
        assert_eq!(
            m.match_text("$NVDA beats, Apple too, $AAPL $nvda"),
            vec!["AAPL", "NVDA"]
        );
    }

    #[test]
    fn test_missing_company_column_is_malformed() {
        let table = CsvTable::from_reader("Ticker\nAAPL\n".as_bytes()).unwrap();
        assert!(TickerMatcher::from_stock_table(&table).is_err());
    }

    #[test]
    fn test_conviction_filter() {
        let filter = ConvictionFilter {
            bear_min: 0.2,
            bull_min: 0.2,
        };
        let t = |b, n, u| SentimentTriple::try_new(b, n, u, 0.01).unwrap();
        assert!(!filter.passes(&t(0.1, 0.8, 0.1)));
        assert!(filter.passes(&t(0.2, 0.7, 0.1)));
        assert!(filter.passes(&t(0.05, 0.7, 0.25)));
    }
}

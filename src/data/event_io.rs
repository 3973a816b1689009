//! Event stream CSV I/O.
//!
//! The table keeps every input column verbatim so enriched outputs carry the
//! caller's extra fields (text, user, ...) through untouched. Typed [`Event`]s
//! are parsed from it on demand.

use {
    crate::{
        domain::{Event, Move, PipelineError, SentimentTriple, parse_ticker_list},
        utils::parse_event_timestamp,
    },
    anyhow::{Context, Result},
    csv::{ReaderBuilder, StringRecord, Writer},
    std::{
        collections::{HashMap, HashSet},
        fs::File,
        io::{Read, Write},
        path::Path,
    },
};

pub const ID_COLUMN: &str = "id";
pub const DATE_COLUMNS: &[&str] = &["date", "timestamp"];
pub const TICKERS_COLUMN: &str = "matched_tickers";
pub const BEAR_COLUMN: &str = "sent_bear";
pub const NEUTRAL_COLUMN: &str = "sent_neut";
pub const BULL_COLUMN: &str = "sent_bull";
pub const TEXT_COLUMN: &str = "text";
pub const PRICE_MOVE_COLUMN: &str = "price_move";
pub const MODEL_PRED_COLUMN: &str = "model_pred";
pub const MODEL_MOVE_COLUMN: &str = "model_move";

/// A CSV file held as header + raw string rows.
#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl CsvTable {
    pub fn new(headers: StringRecord, rows: Vec<StringRecord>) -> Self {
        Self { headers, rows }
    }

    pub fn read_path(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
        Self::from_reader(file).with_context(|| format!("Failed to read CSV: {:?}", path))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new().flexible(false).from_reader(reader);
        let headers = reader.headers()?.clone();
        let rows = reader
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to parse CSV row")?;
        Ok(Self { headers, rows })
    }

    pub fn write_path(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("Failed to create file: {:?}", path))?;
        self.to_writer(file)
            .with_context(|| format!("Failed to write CSV: {:?}", path))
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = Writer::from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    pub fn rows(&self) -> &[StringRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first header equal to `name` (trimmed, case-insensitive).
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }

    fn require_column(&self, name: &str) -> Result<usize, PipelineError> {
        self.column(name)
            .ok_or_else(|| PipelineError::malformed_file(format!("missing required column '{}'", name)))
    }

    /// Cell value of `column` in `row`, or "" when the row is short.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or("")
    }

    /// Sets (or appends) a column. An existing column with the same name is overwritten in place.
    pub fn with_column(mut self, name: &str, values: &[String]) -> Result<Self, PipelineError> {
        if values.len() != self.rows.len() {
            return Err(PipelineError::malformed_file(format!(
                "column '{}' has {} values for {} rows",
                name,
                values.len(),
                self.rows.len()
            )));
        }
        match self.column(name) {
            Some(idx) => {
                self.rows = self
                    .rows
                    .iter()
                    .zip(values)
                    .map(|(row, value)| {
                        row.iter()
                            .enumerate()
                            .map(|(i, cell)| if i == idx { value.as_str() } else { cell })
                            .collect()
                    })
                    .collect();
            }
            None => {
                self.headers.push_field(name);
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push_field(value);
                }
            }
        }
        Ok(self)
    }

    /// Keeps rows whose index satisfies `keep`.
    pub fn retain_rows(mut self, keep: impl Fn(usize) -> bool) -> Self {
        self.rows = self
            .rows
            .into_iter()
            .enumerate()
            .filter(|(i, _)| keep(*i))
            .map(|(_, row)| row)
            .collect();
        self
    }

    /// Parses a float column, failing fast on the first bad cell.
    pub fn float_column(&self, name: &str) -> Result<Vec<f64>, PipelineError> {
        let idx = self.require_column(name)?;
        (0..self.rows.len())
            .map(|row| {
                let raw = self.cell(row, idx).trim();
                raw.parse::<f64>().map_err(|_| {
                    PipelineError::malformed(row + 1, format!("{} '{}' is not a number", name, raw))
                })
            })
            .collect()
    }

    /// Parses every row into an [`Event`]. Any invalid row aborts the whole read.
    pub fn parse_events(&self, sum_tolerance: f64) -> Result<Vec<Event>, PipelineError> {
        let id_col = self.require_column(ID_COLUMN)?;
        let date_col = DATE_COLUMNS
            .iter()
            .find_map(|name| self.column(name))
            .ok_or_else(|| {
                PipelineError::malformed_file("missing required column 'date' or 'timestamp'")
            })?;
        let tickers_col = self.require_column(TICKERS_COLUMN)?;
        let bear = self.float_column(BEAR_COLUMN)?;
        let neutral = self.float_column(NEUTRAL_COLUMN)?;
        let bull = self.float_column(BULL_COLUMN)?;

        let mut seen_ids = HashSet::new();
        let mut events = Vec::with_capacity(self.rows.len());
        for row in 0..self.rows.len() {
            let line = row + 1;
            let id = self.cell(row, id_col).trim().to_string();
            if id.is_empty() {
                return Err(PipelineError::malformed(line, "empty id"));
            }
            if !seen_ids.insert(id.clone()) {
                return Err(PipelineError::malformed(line, format!("duplicate id '{}'", id)));
            }

            let raw_ts = self.cell(row, date_col);
            let timestamp = parse_event_timestamp(raw_ts).ok_or_else(|| {
                PipelineError::malformed(line, format!("unparseable timestamp '{}'", raw_ts))
            })?;

            let sentiment =
                SentimentTriple::try_new(bear[row], neutral[row], bull[row], sum_tolerance)
                    .map_err(|reason| PipelineError::malformed(line, reason))?;

            events.push(Event {
                id,
                timestamp,
                tickers: parse_ticker_list(self.cell(row, tickers_col)),
                sentiment,
            });
        }
        Ok(events)
    }

    /// Reads a move column keyed by event id. Blank cells read as `Unknown`.
    pub fn read_moves(&self, column: &str) -> Result<HashMap<String, Move>, PipelineError> {
        let id_col = self.require_column(ID_COLUMN)?;
        let move_col = self.require_column(column)?;
        (0..self.rows.len())
            .map(|row| {
                let parsed = self
                    .cell(row, move_col)
                    .parse::<Move>()
                    .map_err(|reason| PipelineError::malformed(row + 1, reason))?;
                Ok::<_, PipelineError>((self.cell(row, id_col).trim().to_string(), parsed))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
id,date,text,matched_tickers,sent_bear,sent_neut,sent_bull
1,2024-03-01 14:00:00+00:00,\"Apple, again\",\"AAPL,MSFT\",0.1,0.1,0.8
2,2024-03-02,meh,,0.4,0.5,0.1
";

    #[test]
    fn test_parse_events_keeps_ticker_order() {
        let table = CsvTable::from_reader(SAMPLE.as_bytes()).unwrap();
        let events = table.parse_events(0.01).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].tickers, vec!["AAPL", "MSFT"]);
        assert!(events[1].tickers.is_empty());
        assert_eq!(events[1].sentiment.neutral(), 0.5);
    }

    #[test]
    fn test_missing_probability_column_is_malformed() {
        let raw = "id,date,matched_tickers,sent_bear,sent_bull\n1,2024-01-01,AAPL,0.5,0.5\n";
        let table = CsvTable::from_reader(raw.as_bytes()).unwrap();
        let err = table.parse_events(0.01).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput { row: None, .. }));
    }

    #[test]
    fn test_bad_sum_reports_row() {
        let raw = "id,date,matched_tickers,sent_bear,sent_neut,sent_bull\n\
                   a,2024-01-01,AAPL,0.2,0.2,0.2\n";
        let table = CsvTable::from_reader(raw.as_bytes()).unwrap();
        let err = table.parse_events(0.01).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput { row: Some(1), .. }));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let raw = "id,date,matched_tickers,sent_bear,sent_neut,sent_bull\n\
                   a,2024-01-01,AAPL,0.2,0.2,0.6\n\
                   a,2024-01-02,AAPL,0.2,0.2,0.6\n";
        let table = CsvTable::from_reader(raw.as_bytes()).unwrap();
        assert!(table.parse_events(0.01).is_err());
    }

    #[test]
    fn test_with_column_appends_then_overwrites() {
        let table = CsvTable::from_reader(SAMPLE.as_bytes()).unwrap();
        let table = table
            .with_column(PRICE_MOVE_COLUMN, &["up".to_string(), String::new()])
            .unwrap();
        let table = table
            .with_column(PRICE_MOVE_COLUMN, &["down".to_string(), "neutral".to_string()])
            .unwrap();

        // Seven input columns plus one appended price_move, not two.
        assert_eq!(table.headers().len(), 8);
        let moves = table.read_moves(PRICE_MOVE_COLUMN).unwrap();
        assert_eq!(moves["1"], Move::Down);
        assert_eq!(moves["2"], Move::Neutral);

        let mut out = Vec::new();
        table.to_writer(&mut out).unwrap();
        let written = String::from_utf8(out).unwrap();
        assert!(written.starts_with("id,date,text,matched_tickers,sent_bear,sent_neut,sent_bull,price_move"));
        assert!(written.contains("\"Apple, again\""));
    }
}

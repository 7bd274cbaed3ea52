//! Price panel loading and management.

use crate::error::{IndexError, Result};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

/// Minimum number of price columns a panel file must carry.
pub const MIN_PANEL_COLUMNS: usize = 3;

/// Default date format of panel files (day/month/year).
pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

/// Data source configuration.
#[derive(Debug, Clone)]
pub struct DataConfig {
    /// Date format string for parsing. If None, common formats are tried day-first.
    pub date_format: Option<String>,
    /// CSV delimiter character. If None, delimiter is auto-detected.
    pub delimiter: Option<u8>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            date_format: Some(DEFAULT_DATE_FORMAT.to_string()),
            delimiter: None, // Auto-detect by default
        }
    }
}

/// Daily closing prices for a fixed universe of stocks.
///
/// Rows are strictly increasing, unique dates; every row holds one
/// non-negative price per symbol, in symbol (column) order.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePanel {
    symbols: Vec<String>,
    dates: Vec<NaiveDate>,
    prices: Vec<Vec<f64>>,
}

impl PricePanel {
    /// Build a panel from column identifiers and dated price rows.
    ///
    /// Rows out of date order are sorted. Duplicate dates, ragged rows,
    /// duplicate symbols and negative or non-finite prices are rejected.
    pub fn new(symbols: Vec<String>, mut rows: Vec<(NaiveDate, Vec<f64>)>) -> Result<Self> {
        if symbols.is_empty() {
            return Err(IndexError::MalformedPanel(
                "panel has no stock columns".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(symbols.len());
        for symbol in &symbols {
            if symbol.trim().is_empty() {
                return Err(IndexError::MalformedPanel(
                    "empty stock identifier".to_string(),
                ));
            }
            if !seen.insert(symbol.as_str()) {
                return Err(IndexError::MalformedPanel(format!(
                    "duplicate stock identifier '{}'",
                    symbol
                )));
            }
        }

        for (date, row) in &rows {
            if row.len() != symbols.len() {
                return Err(IndexError::MalformedPanel(format!(
                    "row {} has {} prices, expected {}",
                    date,
                    row.len(),
                    symbols.len()
                )));
            }
            if let Some((i, price)) = row
                .iter()
                .enumerate()
                .find(|(_, p)| !p.is_finite() || **p < 0.0)
            {
                return Err(IndexError::MalformedPanel(format!(
                    "invalid price {} for {} on {}",
                    price, symbols[i], date
                )));
            }
        }

        if rows.windows(2).any(|w| w[0].0 > w[1].0) {
            warn!("Price rows are not in date order, sorting");
            rows.sort_by_key(|(date, _)| *date);
        }

        if let Some(w) = rows.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(IndexError::MalformedPanel(format!(
                "duplicate date {}",
                w[0].0
            )));
        }

        let (dates, prices) = rows.into_iter().unzip();
        Ok(Self {
            symbols,
            dates,
            prices,
        })
    }

    /// Stock identifiers in column order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Panel dates in ascending order.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Number of dated rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Number of stock columns.
    pub fn num_symbols(&self) -> usize {
        self.symbols.len()
    }

    /// Prices of row `index`, in column order.
    pub fn row(&self, index: usize) -> &[f64] {
        &self.prices[index]
    }

    /// Row index of `date`, if present.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// Prices on `date`, if present.
    pub fn row_on(&self, date: NaiveDate) -> Option<&[f64]> {
        self.index_of(date).map(|i| self.row(i))
    }

    /// Column position of a symbol.
    pub fn column_of(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    /// Price of `symbol` on `date`.
    pub fn price(&self, date: NaiveDate, symbol: &str) -> Option<f64> {
        let column = self.column_of(symbol)?;
        self.row_on(date).map(|row| row[column])
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Summarize the panel for validation output.
    pub fn summary(&self) -> PanelSummary {
        let symbols = self
            .symbols
            .iter()
            .enumerate()
            .map(|(column, symbol)| {
                let column_prices = self.prices.iter().map(|row| row[column]);
                SymbolSummary {
                    symbol: symbol.clone(),
                    min: column_prices.clone().fold(f64::INFINITY, f64::min),
                    max: column_prices.clone().fold(f64::NEG_INFINITY, f64::max),
                    last: column_prices.last().unwrap_or(f64::NAN),
                }
            })
            .collect();

        PanelSummary {
            rows: self.len(),
            columns: self.num_symbols(),
            first_date: self.first_date(),
            last_date: self.last_date(),
            symbols,
        }
    }
}

/// Per-symbol price statistics.
#[derive(Debug, Clone, Serialize)]
pub struct SymbolSummary {
    pub symbol: String,
    pub min: f64,
    pub max: f64,
    pub last: f64,
}

/// Shape and range of a loaded panel.
#[derive(Debug, Clone, Serialize)]
pub struct PanelSummary {
    pub rows: usize,
    pub columns: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub symbols: Vec<SymbolSummary>,
}

/// Detect the CSV delimiter by analyzing the first few lines of the file.
///
/// Tries common delimiters (comma, tab, semicolon, pipe) and returns the one
/// that produces the most consistent column count across lines.
fn detect_delimiter(path: &Path) -> Result<u8> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let lines: Vec<String> = reader.lines().take(5).filter_map(|l| l.ok()).collect();
    Ok(detect_delimiter_in(&lines))
}

fn detect_delimiter_in(lines: &[String]) -> u8 {
    if lines.is_empty() {
        return b',';
    }

    let delimiters = [b',', b'\t', b';', b'|'];

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in &delimiters {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| line.as_bytes().iter().filter(|&&b| b == delim).count() + 1)
            .collect();

        // Date column plus at least three price columns
        let first_count = counts[0];
        let all_consistent = counts.iter().all(|&c| c == first_count);
        let has_enough_fields = first_count > MIN_PANEL_COLUMNS;

        if all_consistent && has_enough_fields && first_count > best_score {
            best_score = first_count;
            best_delimiter = delim;
        }
    }

    debug!(
        "Detected delimiter {:?} with score {}",
        best_delimiter as char, best_score
    );
    best_delimiter
}

/// Parse a panel date, trying day-first formats before month-first ones.
pub fn parse_date(s: &str, format: Option<&str>) -> Result<NaiveDate> {
    let s = s.trim();

    if let Some(fmt) = format {
        return NaiveDate::parse_from_str(s, fmt).map_err(IndexError::from);
    }

    let date_formats = [
        "%d/%m/%Y",
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%d-%m-%Y",
        "%d.%m.%Y",
        "%m/%d/%Y",
        "%d-%b-%Y", // 15-Jan-2024
        "%d %b %Y", // 15 Jan 2024
    ];

    for fmt in &date_formats {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }

    Err(IndexError::MalformedPanel(format!(
        "could not parse date '{}'",
        s
    )))
}

/// Load a price panel from a CSV file.
///
/// The first column holds dates; every other header names a stock.
pub fn load_csv(path: impl AsRef<Path>, config: &DataConfig) -> Result<PricePanel> {
    let path = path.as_ref();
    info!("Loading price panel from: {}", path.display());

    let delimiter = match config.delimiter {
        Some(d) => d,
        None => {
            let detected = detect_delimiter(path)?;
            debug!("Auto-detected delimiter: {:?}", char::from(detected));
            detected
        }
    };

    let file = File::open(path)?;
    let panel = read_panel(file, delimiter, config)?;

    info!(
        "Loaded {} rows x {} stocks from {} to {}",
        panel.len(),
        panel.num_symbols(),
        panel
            .first_date()
            .map(|d| d.to_string())
            .unwrap_or_default(),
        panel
            .last_date()
            .map(|d| d.to_string())
            .unwrap_or_default()
    );

    Ok(panel)
}

/// Parse a price panel from CSV text.
pub fn load_csv_from_str(csv_content: &str, config: &DataConfig) -> Result<PricePanel> {
    let delimiter = match config.delimiter {
        Some(d) => d,
        None => {
            let lines: Vec<String> = csv_content.lines().take(5).map(str::to_string).collect();
            detect_delimiter_in(&lines)
        }
    };

    read_panel(csv_content.as_bytes(), delimiter, config)
}

fn read_panel<R: Read>(source: R, delimiter: u8, config: &DataConfig) -> Result<PricePanel> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    if headers.len() < MIN_PANEL_COLUMNS + 1 {
        return Err(IndexError::MalformedPanel(format!(
            "expected a date column and at least {} price columns, found {} column(s)",
            MIN_PANEL_COLUMNS,
            headers.len()
        )));
    }

    let symbols: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();
    debug!("Panel columns: {}", symbols.join(", "));

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    // Header is line 1
    let mut line = 1;

    while reader.read_record(&mut record)? {
        line += 1;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        rows.push(parse_row(&record, &symbols, line, config)?);
    }

    if rows.is_empty() {
        return Err(IndexError::MalformedPanel(
            "panel has no data rows".to_string(),
        ));
    }

    PricePanel::new(symbols, rows)
}

fn parse_row(
    record: &StringRecord,
    symbols: &[String],
    line: usize,
    config: &DataConfig,
) -> Result<(NaiveDate, Vec<f64>)> {
    if record.len() != symbols.len() + 1 {
        return Err(IndexError::MalformedPanel(format!(
            "line {}: expected {} fields, found {}",
            line,
            symbols.len() + 1,
            record.len()
        )));
    }

    let date = parse_date(&record[0], config.date_format.as_deref()).map_err(|e| {
        IndexError::MalformedPanel(format!("line {}: bad date '{}': {}", line, &record[0], e))
    })?;

    let prices = record
        .iter()
        .skip(1)
        .zip(symbols)
        .map(|(field, symbol)| {
            field.parse::<f64>().map_err(|_| {
                IndexError::MalformedPanel(format!(
                    "line {}: non-numeric price '{}' for {}",
                    line, field, symbol
                ))
            })
        })
        .collect::<Result<Vec<f64>>>()?;

    Ok((date, prices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_csv() -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(file, "Date,Stock_A,Stock_B,Stock_C,Stock_D").unwrap();
        writeln!(file, "30/01/2024,8,7,10,5").unwrap();
        writeln!(file, "31/01/2024,8,7,10,5").unwrap();
        writeln!(file, "01/02/2024,9,8,12,5").unwrap();
        writeln!(file, "02/02/2024,9.5,8.5,12.5,6").unwrap();
        file
    }

    #[test]
    fn test_load_csv() {
        let file = create_test_csv();
        let panel = load_csv(file.path(), &DataConfig::default()).unwrap();

        assert_eq!(panel.len(), 4);
        assert_eq!(
            panel.symbols(),
            ["Stock_A", "Stock_B", "Stock_C", "Stock_D"]
        );
        assert_eq!(panel.first_date(), Some(date(2024, 1, 30)));
        assert_eq!(panel.price(date(2024, 2, 2), "Stock_A"), Some(9.5));
        assert_eq!(
            panel.row_on(date(2024, 2, 1)),
            Some(&[9.0, 8.0, 12.0, 5.0][..])
        );
    }

    #[test]
    fn test_semicolon_delimiter_detected() {
        let content = "Date;A;B;C\n01/03/2024;1;2;3\n04/03/2024;2;3;4\n";
        let panel = load_csv_from_str(content, &DataConfig::default()).unwrap();
        assert_eq!(panel.num_symbols(), 3);
        assert_eq!(panel.dates(), [date(2024, 3, 1), date(2024, 3, 4)]);
    }

    #[test]
    fn test_day_first_date_parsing() {
        // 02/03 must be the 2nd of March, not February 3rd
        assert_eq!(parse_date("02/03/2024", None).unwrap(), date(2024, 3, 2));
        assert_eq!(parse_date("2024-03-02", None).unwrap(), date(2024, 3, 2));
        assert_eq!(parse_date("2 Mar 2024", None).unwrap(), date(2024, 3, 2));
        assert_eq!(
            parse_date("03/02/2024", Some("%m/%d/%Y")).unwrap(),
            date(2024, 3, 2)
        );
        assert!(parse_date("yesterday", None).is_err());
    }

    #[test]
    fn test_too_few_columns_rejected() {
        let content = "Date,A,B\n01/03/2024,1,2\n";
        let err = load_csv_from_str(content, &DataConfig::default()).unwrap_err();
        assert!(matches!(err, IndexError::MalformedPanel(_)));
    }

    #[test]
    fn test_non_numeric_price_rejected() {
        let content = "Date,A,B,C\n01/03/2024,1,abc,3\n";
        let err = load_csv_from_str(content, &DataConfig::default()).unwrap_err();
        match err {
            IndexError::MalformedPanel(msg) => {
                assert!(msg.contains("line 2"));
                assert!(msg.contains("abc"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_date_rejected() {
        let content = "Date,A,B,C\n2024-13-45,1,2,3\n";
        let config = DataConfig {
            date_format: None,
            delimiter: Some(b','),
        };
        let err = load_csv_from_str(content, &config).unwrap_err();
        assert!(matches!(err, IndexError::MalformedPanel(_)));
    }

    #[test]
    fn test_duplicate_dates_rejected() {
        let content = "Date,A,B,C\n01/03/2024,1,2,3\n01/03/2024,2,3,4\n";
        let err = load_csv_from_str(content, &DataConfig::default()).unwrap_err();
        match err {
            IndexError::MalformedPanel(msg) => assert!(msg.contains("duplicate date")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ragged_row_rejected() {
        let content = "Date,A,B,C\n01/03/2024,1,2,3\n04/03/2024,2,3\n";
        let err = load_csv_from_str(content, &DataConfig::default()).unwrap_err();
        assert!(matches!(err, IndexError::MalformedPanel(_)));
    }

    #[test]
    fn test_unsorted_rows_are_sorted() {
        let panel = PricePanel::new(
            vec!["A".into(), "B".into(), "C".into()],
            vec![
                (date(2024, 3, 4), vec![2.0, 3.0, 4.0]),
                (date(2024, 3, 1), vec![1.0, 2.0, 3.0]),
            ],
        )
        .unwrap();
        assert_eq!(panel.dates(), [date(2024, 3, 1), date(2024, 3, 4)]);
        assert_eq!(panel.row(0), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_negative_price_rejected() {
        let err = PricePanel::new(
            vec!["A".into(), "B".into(), "C".into()],
            vec![(date(2024, 3, 1), vec![1.0, -2.0, 3.0])],
        )
        .unwrap_err();
        assert!(matches!(err, IndexError::MalformedPanel(_)));
    }

    #[test]
    fn test_duplicate_symbol_rejected() {
        let err = PricePanel::new(
            vec!["A".into(), "A".into(), "C".into()],
            vec![(date(2024, 3, 1), vec![1.0, 2.0, 3.0])],
        )
        .unwrap_err();
        assert!(matches!(err, IndexError::MalformedPanel(_)));
    }

    #[test]
    fn test_summary() {
        let file = create_test_csv();
        let panel = load_csv(file.path(), &DataConfig::default()).unwrap();
        let summary = panel.summary();

        assert_eq!(summary.rows, 4);
        assert_eq!(summary.columns, 4);
        assert_eq!(summary.last_date, Some(date(2024, 2, 2)));
        assert_eq!(summary.symbols[2].symbol, "Stock_C");
        assert_eq!(summary.symbols[2].min, 10.0);
        assert_eq!(summary.symbols[2].max, 12.5);
        assert_eq!(summary.symbols[2].last, 12.5);
    }
}

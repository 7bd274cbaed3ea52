//! Export utilities for index series.
//!
//! | Format | Use Case |
//! |--------|----------|
//! | CSV | Same date convention as the input panel, one level per row |
//! | JSON | API integration, structured data including baskets |

use crate::data::DEFAULT_DATE_FORMAT;
use crate::error::{IndexError, Result};
use crate::types::IndexSeries;
use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Configuration for exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Date format for CSV exports.
    pub date_format: String,
    /// Decimal precision for index levels.
    pub precision: usize,
    /// Whether to include headers in CSV.
    pub include_headers: bool,
    /// Append the three ranked constituents held on each day.
    pub include_basket: bool,
    /// Delimiter for CSV files.
    pub delimiter: char,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            precision: 2,
            include_headers: true,
            include_basket: false,
            delimiter: ',',
        }
    }
}

/// Reject date formats chrono cannot render for a calendar date.
///
/// Covers unknown specifiers such as `%Q` and time fields such as `%H`.
pub fn validate_date_format(format: &str) -> Result<()> {
    let unknown = StrftimeItems::new(format).any(|item| matches!(item, Item::Error));
    let mut rendered = String::new();
    if unknown || write!(rendered, "{}", NaiveDate::MIN.format(format)).is_err() {
        return Err(IndexError::ConfigError(format!(
            "invalid export date format '{}'",
            format
        )));
    }
    Ok(())
}

fn write_series_csv<W: Write>(
    writer: &mut W,
    series: &IndexSeries,
    config: &ExportConfig,
) -> Result<()> {
    validate_date_format(&config.date_format)?;
    let d = config.delimiter;

    if config.include_headers {
        if config.include_basket {
            writeln!(writer, "Date{d}Index_value{d}Rank1{d}Rank2{d}Rank3")?;
        } else {
            writeln!(writer, "Date{d}Index_value")?;
        }
    }

    let prec = config.precision;
    for point in series {
        write!(
            writer,
            "{}{d}{:.prec$}",
            point.date.format(&config.date_format),
            point.level,
        )?;
        if config.include_basket {
            let [first, second, third] = point.basket.symbols();
            write!(writer, "{d}{first}{d}{second}{d}{third}")?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

/// Render a series as CSV text.
pub fn series_to_csv_string(series: &IndexSeries, config: &ExportConfig) -> Result<String> {
    let mut buffer = Vec::new();
    write_series_csv(&mut buffer, series, config)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Export a series to a CSV file.
pub fn export_series_csv(
    series: &IndexSeries,
    path: impl AsRef<Path>,
    config: &ExportConfig,
) -> Result<()> {
    validate_date_format(&config.date_format)?;
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_series_csv(&mut writer, series, config)?;
    writer.flush()?;

    info!(
        "Exported {} index levels to {}",
        series.len(),
        path.display()
    );
    Ok(())
}

/// Export a series to pretty-printed JSON.
pub fn export_series_json(series: &IndexSeries, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), series.points())?;

    info!(
        "Exported {} index levels to {}",
        series.len(),
        path.display()
    );
    Ok(())
}

//! Configuration file support for index builds.
//!
//! Allows loading index configurations from TOML files for reproducibility.

use crate::data::{DataConfig, DEFAULT_DATE_FORMAT};
use crate::error::{IndexError, Result};
use crate::export::{validate_date_format, ExportConfig};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Date format of `start_date` / `end_date` in configuration files.
pub const CONFIG_DATE_FORMAT: &str = "%Y-%m-%d";

/// Complete index configuration loaded from a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexFileConfig {
    /// Backtest window.
    #[serde(default)]
    pub index: IndexSettings,
    /// Input panel settings.
    #[serde(default)]
    pub data: DataSettings,
    /// Output settings.
    #[serde(default)]
    pub export: ExportSettings,
}

/// Backtest window (YYYY-MM-DD format).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexSettings {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// Data settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSettings {
    /// Path to the price panel.
    #[serde(default = "default_data_path")]
    pub path: String,
    /// Date format in the CSV.
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// CSV delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

fn default_data_path() -> String { "data_sources/stock_prices.csv".to_string() }
fn default_date_format() -> String { DEFAULT_DATE_FORMAT.to_string() }
fn default_delimiter() -> char { ',' }

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            date_format: default_date_format(),
            delimiter: ',',
        }
    }
}

/// Export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Output CSV path.
    #[serde(default = "default_export_path")]
    pub path: String,
    /// Decimal places for index levels.
    #[serde(default = "default_precision")]
    pub precision: usize,
    /// Append the held constituents to each row.
    #[serde(default)]
    pub include_basket: bool,
    /// Output date format; the data date format when unset.
    #[serde(default)]
    pub date_format: Option<String>,
}

fn default_export_path() -> String { "export.csv".to_string() }
fn default_precision() -> usize { 2 }

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            path: default_export_path(),
            precision: 2,
            include_basket: false,
            date_format: None,
        }
    }
}

fn parse_config_date(field: &str, value: Option<&String>) -> Result<NaiveDate> {
    let value =
        value.ok_or_else(|| IndexError::ConfigError(format!("{} is not set", field)))?;
    NaiveDate::parse_from_str(value, CONFIG_DATE_FORMAT).map_err(|e| {
        IndexError::ConfigError(format!(
            "{} '{}' is not a {} date: {}",
            field, value, CONFIG_DATE_FORMAT, e
        ))
    })
}

impl IndexFileConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = fs::read_to_string(path)?;
        let config: IndexFileConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| IndexError::ConfigError(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Parsed `[start_date, end_date]` window.
    pub fn date_range(&self) -> Result<(NaiveDate, NaiveDate)> {
        let start = parse_config_date("start_date", self.index.start_date.as_ref())?;
        let end = parse_config_date("end_date", self.index.end_date.as_ref())?;
        Ok((start, end))
    }

    /// Panel loading options.
    pub fn data_config(&self) -> Result<DataConfig> {
        if !self.data.delimiter.is_ascii() {
            return Err(IndexError::ConfigError(format!(
                "delimiter '{}' must be a single ASCII character",
                self.data.delimiter
            )));
        }
        Ok(DataConfig {
            date_format: Some(self.data.date_format.clone()),
            delimiter: Some(self.data.delimiter as u8),
        })
    }

    /// Export options.
    pub fn export_config(&self) -> Result<ExportConfig> {
        let date_format = self
            .export
            .date_format
            .clone()
            .unwrap_or_else(|| self.data.date_format.clone());
        validate_date_format(&date_format)?;

        Ok(ExportConfig {
            date_format,
            precision: self.export.precision,
            include_basket: self.export.include_basket,
            ..Default::default()
        })
    }

    /// Generate an example configuration file content.
    pub fn example() -> String {
        r#"# Basket Index Configuration File
# Top-3 month-end basket, weighted 50/25/25, based at 100

[index]
start_date = "2020-01-01"
end_date = "2020-12-31"

[data]
path = "data_sources/stock_prices.csv"
date_format = "%d/%m/%Y"
delimiter = ","

[export]
path = "export.csv"
precision = 2
include_basket = false
# date_format = "%Y-%m-%d"   # defaults to the data date format
"#
        .to_string()
    }
}

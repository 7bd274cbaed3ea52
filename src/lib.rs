//! Basket Index - a top-3 rebalanced equity index builder.
//!
//! # Overview
//!
//! Builds a synthetic index from a daily price panel (dates x stocks):
//!
//! - On every month-end (the last date of a month present in the data) the
//!   three highest-priced stocks are selected, ties broken by column order
//! - The selection is held from the next trading day until the following
//!   month-end, so no basket ever uses information from its own holding period
//! - Each day's level is `0.5 * p1 + 0.25 * p2 + 0.25 * p3` at that day's prices,
//!   in rank order
//! - The first date of the requested window is pinned to 100
//!
//! # Quick Start
//!
//! ```no_run
//! use basket_index::{
//!     data::DataConfig,
//!     engine::IndexEngine,
//!     export::{export_series_csv, ExportConfig},
//! };
//! use chrono::NaiveDate;
//!
//! let config = DataConfig::default();
//! let engine = IndexEngine::from_csv("data_sources/stock_prices.csv", &config).unwrap();
//!
//! let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2020, 12, 31).unwrap();
//! let series = engine.build_index(start, end).unwrap();
//!
//! export_series_csv(&series, "export.csv", &ExportConfig::default()).unwrap();
//! ```
//!
//! # Modules
//!
//! - [`types`]: Core data types (Basket, Holding, IndexSeries)
//! - [`data`]: Price panel loading and validation
//! - [`selection`]: Month-end detection and top-3 ranking
//! - [`holdings`]: Carry-forward of selections into daily holdings
//! - [`engine`]: Weighted evaluation and index construction
//! - [`export`]: CSV and JSON output
//! - [`analytics`]: Series summary and report formatting
//! - [`config`]: TOML configuration file support

pub mod analytics;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod export;
pub mod holdings;
pub mod selection;
pub mod types;

pub use analytics::{ResultFormatter, SeriesSummary};
pub use config::IndexFileConfig;
pub use data::{load_csv, load_csv_from_str, DataConfig, PanelSummary, PricePanel};
pub use engine::{evaluate, IndexEngine};
pub use error::{IndexError, Result};
pub use export::{export_series_csv, export_series_json, series_to_csv_string, ExportConfig};
pub use holdings::{assign_holdings, HoldingAssignment};
pub use selection::{month_end_indices, rank_columns, select_top3, MonthEndSelection};
pub use types::{
    Basket, Constituent, Holding, IndexPoint, IndexSeries, BASKET_SIZE, BASKET_WEIGHTS,
    INDEX_BASE,
};

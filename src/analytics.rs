//! Summary statistics and report formatting for index series.

use crate::data::PanelSummary;
use crate::selection::MonthEndSelection;
use crate::types::IndexSeries;
use chrono::NaiveDate;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use tabled::{builder::Builder, settings::Style};

/// Headline figures of an index series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: usize,
    pub first_level: f64,
    pub last_level: f64,
    pub min_level: f64,
    pub max_level: f64,
    /// Change from first to last level, in percent.
    pub change_pct: f64,
    /// Number of days on which the held basket differs from the previous day.
    pub basket_changes: usize,
}

impl SeriesSummary {
    /// Summarize a series. Returns None for an empty series.
    pub fn from_series(series: &IndexSeries) -> Option<Self> {
        let first = series.first()?;
        let last = series.last()?;
        let levels = series.levels();

        let basket_changes = series
            .points()
            .windows(2)
            .filter(|w| w[0].basket != w[1].basket)
            .count();

        let change_pct = if first.level != 0.0 {
            (last.level / first.level - 1.0) * 100.0
        } else {
            0.0
        };

        Some(Self {
            start_date: first.date,
            end_date: last.date,
            days: series.len(),
            first_level: first.level,
            last_level: last.level,
            min_level: levels.iter().cloned().fold(f64::INFINITY, f64::min),
            max_level: levels.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            change_pct,
            basket_changes,
        })
    }
}

/// Result formatter for pretty printing.
pub struct ResultFormatter;

impl ResultFormatter {
    /// Print a results report to stdout.
    pub fn print_report(series: &IndexSeries) {
        println!();
        println!("{}", "═".repeat(60).blue());
        println!("{}", " INDEX RESULTS ".bold().blue());
        println!("{}", "═".repeat(60).blue());
        println!();

        let Some(summary) = SeriesSummary::from_series(series) else {
            println!("  (empty series)");
            return;
        };

        println!("{}", "Overview".bold().underline());
        println!(
            "  Period:          {} to {}",
            summary.start_date.format("%Y-%m-%d"),
            summary.end_date.format("%Y-%m-%d")
        );
        println!("  Trading Days:    {}", summary.days);
        println!("  Basket Changes:  {}", summary.basket_changes);
        println!();

        println!("{}", "Levels".bold().underline());
        println!("  Base Level:      {:>12.2}", summary.first_level);
        println!(
            "  Final Level:     {:>12.2}  {}",
            summary.last_level,
            Self::format_pct_change(summary.change_pct)
        );
        println!("  Minimum Level:   {:>12.2}", summary.min_level);
        println!("  Maximum Level:   {:>12.2}", summary.max_level);
        println!();

        if let Some(last) = series.last() {
            println!("{}", "Current Basket".bold().underline());
            let [first, second, third] = last.basket.symbols();
            println!("  50%  {}", first);
            println!("  25%  {}", second);
            println!("  25%  {}", third);
            println!();
        }

        println!("{}", "═".repeat(60).blue());
    }

    fn format_pct_change(pct: f64) -> String {
        let text = format!("({:+.2}%)", pct);
        if pct >= 0.0 {
            text.green().to_string()
        } else {
            text.red().to_string()
        }
    }

    /// Print the daily levels as a table.
    pub fn print_series_table(series: &IndexSeries) {
        println!("{}", Self::series_table(series));
    }

    /// Daily levels rendered as a rounded table.
    pub fn series_table(series: &IndexSeries) -> String {
        let mut builder = Builder::new();
        builder.push_record(["Date", "Level", "Rank 1", "Rank 2", "Rank 3"]);

        for point in series {
            let [first, second, third] = point.basket.symbols();
            builder.push_record([
                point.date.format("%Y-%m-%d").to_string(),
                format!("{:.2}", point.level),
                first.to_string(),
                second.to_string(),
                third.to_string(),
            ]);
        }

        builder.build().with(Style::rounded()).to_string()
    }

    /// Print the month-end selections as a table.
    pub fn print_selection_table(selection: &MonthEndSelection) {
        println!("{}", Self::selection_table(selection));
    }

    /// Month-end selections rendered as a rounded table.
    pub fn selection_table(selection: &MonthEndSelection) -> String {
        let mut builder = Builder::new();
        builder.push_record([
            "Month-End",
            "Rank 1 (50%)",
            "Rank 2 (25%)",
            "Rank 3 (25%)",
        ]);

        for (date, basket) in selection.iter() {
            let [first, second, third] = basket.symbols();
            builder.push_record([
                date.format("%Y-%m-%d").to_string(),
                first.to_string(),
                second.to_string(),
                third.to_string(),
            ]);
        }

        builder.build().with(Style::rounded()).to_string()
    }

    /// Print a panel summary.
    pub fn print_panel_summary(summary: &PanelSummary) {
        println!("\nPanel Summary:");
        println!("  Rows:    {}", summary.rows);
        println!("  Stocks:  {}", summary.columns);
        if let (Some(first), Some(last)) = (summary.first_date, summary.last_date) {
            println!("  Start:   {}", first);
            println!("  End:     {}", last);
        }
        println!();

        let mut builder = Builder::new();
        builder.push_record(["Stock", "Min", "Max", "Last"]);
        for s in &summary.symbols {
            builder.push_record([
                s.symbol.clone(),
                format!("{:.2}", s.min),
                format!("{:.2}", s.max),
                format!("{:.2}", s.last),
            ]);
        }
        println!("{}", builder.build().with(Style::rounded()));
    }

    /// Export a series summary to JSON.
    pub fn to_json(series: &IndexSeries) -> String {
        serde_json::to_string_pretty(&SeriesSummary::from_series(series))
            .unwrap_or_else(|_| "{}".to_string())
    }

    /// CSV header matching [`ResultFormatter::to_csv_line`].
    pub fn csv_header() -> String {
        "start_date,end_date,days,first_level,last_level,min_level,max_level,change_pct,basket_changes"
            .to_string()
    }

    /// Export a series summary as a CSV line.
    pub fn to_csv_line(series: &IndexSeries) -> String {
        match SeriesSummary::from_series(series) {
            Some(s) => format!(
                "{},{},{},{:.2},{:.2},{:.2},{:.2},{:.2},{}",
                s.start_date,
                s.end_date,
                s.days,
                s.first_level,
                s.last_level,
                s.min_level,
                s.max_level,
                s.change_pct,
                s.basket_changes
            ),
            None => String::new(),
        }
    }
}

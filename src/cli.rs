//! Command-line interface for the index builder.

use basket_index::analytics::ResultFormatter;
use basket_index::config::IndexFileConfig;
use basket_index::data::{DataConfig, DEFAULT_DATE_FORMAT};
use basket_index::engine::IndexEngine;
use basket_index::error::{IndexError, Result};
use basket_index::export::{
    export_series_csv, export_series_json, series_to_csv_string, ExportConfig,
};
use basket_index::types::IndexSeries;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Basket Index - top-3 month-end rebalanced equity index builder.
#[derive(Parser)]
#[command(name = "basket-index")]
#[command(version)]
#[command(about = "Build a 50/25/25 top-3 stock index from a daily price panel")]
#[command(long_about = None)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the index over a date window
    Build {
        /// Path to the price panel CSV
        #[arg(short, long)]
        data: PathBuf,

        /// First date of the window (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Last date of the window (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,

        /// Write the series to this file (.json for JSON, CSV otherwise)
        #[arg(short, long)]
        export: Option<PathBuf>,

        /// Date format of the panel and export
        #[arg(long, default_value = DEFAULT_DATE_FORMAT)]
        date_format: String,

        /// Include the held constituents in the CSV export
        #[arg(long)]
        include_basket: bool,

        /// Print every daily level as a table
        #[arg(long)]
        table: bool,
    },

    /// Show the top-3 selection of every month-end
    Selections {
        /// Path to the price panel CSV
        #[arg(short, long)]
        data: PathBuf,

        /// Date format of the panel
        #[arg(long, default_value = DEFAULT_DATE_FORMAT)]
        date_format: String,
    },

    /// Validate a price panel file
    Validate {
        /// Path to the price panel CSV
        #[arg(short, long)]
        data: PathBuf,

        /// Date format of the panel
        #[arg(long, default_value = DEFAULT_DATE_FORMAT)]
        date_format: String,
    },

    /// Generate an example configuration file
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "index.toml")]
        output: PathBuf,
    },

    /// Build and export the index from a configuration file
    RunConfig {
        /// Path to TOML configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl Cli {
    /// Initialize logging based on verbosity level.
    pub fn init_logging(&self) {
        let level = match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };

        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
    }
}

fn data_config(date_format: &str) -> DataConfig {
    DataConfig {
        date_format: Some(date_format.to_string()),
        ..Default::default()
    }
}

/// Run the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    cli.init_logging();

    match &cli.command {
        Commands::Build {
            data,
            start,
            end,
            export,
            date_format,
            include_basket,
            table,
        } => {
            let export_config = ExportConfig {
                date_format: date_format.clone(),
                include_basket: *include_basket,
                ..Default::default()
            };
            run_build(
                data,
                *start,
                *end,
                &data_config(date_format),
                export.as_deref(),
                &export_config,
                *table,
                cli.output,
            )
        }

        Commands::Selections { data, date_format } => {
            show_selections(data, &data_config(date_format), cli.output)
        }

        Commands::Validate { data, date_format } => {
            validate_data(data, &data_config(date_format))
        }

        Commands::Init { output } => init_config(output),

        Commands::RunConfig { config } => run_from_config(config, cli.output),
    }
}

fn write_series(series: &IndexSeries, path: &Path, config: &ExportConfig) -> Result<()> {
    let is_json = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        export_series_json(series, path)
    } else {
        export_series_csv(series, path, config)
    }
}

fn print_series(
    series: &IndexSeries,
    export_config: &ExportConfig,
    table: bool,
    output: OutputFormat,
) -> Result<()> {
    match output {
        OutputFormat::Text => {
            ResultFormatter::print_report(series);
            if table {
                ResultFormatter::print_series_table(series);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(series.points())?),
        OutputFormat::Csv => print!("{}", series_to_csv_string(series, export_config)?),
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_build(
    data_path: &Path,
    start: NaiveDate,
    end: NaiveDate,
    data_config: &DataConfig,
    export: Option<&Path>,
    export_config: &ExportConfig,
    table: bool,
    output: OutputFormat,
) -> Result<()> {
    info!("Loading data from: {}", data_path.display());
    let engine = IndexEngine::from_csv(data_path, data_config)?;
    let series = engine.build_index(start, end)?;

    print_series(&series, export_config, table, output)?;

    if let Some(path) = export {
        write_series(&series, path, export_config)?;
        if output == OutputFormat::Text {
            println!("Exported {} levels to {}", series.len(), path.display());
        }
    }

    Ok(())
}

fn show_selections(data_path: &Path, config: &DataConfig, output: OutputFormat) -> Result<()> {
    let engine = IndexEngine::from_csv(data_path, config)?;
    let selection = engine.selection()?;

    match output {
        OutputFormat::Text => {
            println!("\nMonth-end selections ({}):\n", selection.len());
            ResultFormatter::print_selection_table(&selection);
        }
        OutputFormat::Json => {
            let rows: Vec<_> = selection
                .iter()
                .map(|(date, basket)| (date, basket.symbols()))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Csv => {
            println!("month_end,rank1,rank2,rank3");
            for (date, basket) in selection.iter() {
                let [first, second, third] = basket.symbols();
                println!("{},{},{},{}", date, first, second, third);
            }
        }
    }

    Ok(())
}

fn validate_data(data_path: &Path, config: &DataConfig) -> Result<()> {
    println!("Validating data file: {}", data_path.display());

    let engine = IndexEngine::from_csv(data_path, config)?;
    ResultFormatter::print_panel_summary(&engine.panel().summary());

    let selection = engine.selection()?;
    let holdings = engine.holdings()?;
    println!("  Month-ends:          {}", selection.len());
    match holdings.first_held_date() {
        Some(first) => println!("  First index date:    {}", first),
        None => println!("  First index date:    none (needs data after the first month-end)"),
    }

    println!("\nValidation: PASSED");
    Ok(())
}

fn init_config(output: &Path) -> Result<()> {
    let example = IndexFileConfig::example();
    fs::write(output, example)?;
    println!("Created example configuration file: {}", output.display());
    println!("\nEdit this file to customize the index window, then run:");
    println!("  basket-index run-config -c {}", output.display());
    Ok(())
}

fn run_from_config(config_path: &Path, output: OutputFormat) -> Result<()> {
    info!("Loading configuration from: {}", config_path.display());

    let file_config = IndexFileConfig::load(config_path)?;
    let (start, end) = file_config.date_range()?;
    let data_config = file_config.data_config()?;
    let export_config = file_config.export_config()?;

    if file_config.data.path.is_empty() {
        return Err(IndexError::ConfigError(
            "No data path specified in config".to_string(),
        ));
    }

    run_build(
        Path::new(&file_config.data.path),
        start,
        end,
        &data_config,
        Some(Path::new(&file_config.export.path)),
        &export_config,
        false,
        output,
    )
}

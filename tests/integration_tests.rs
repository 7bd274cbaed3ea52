//! Integration tests for the index builder.

use basket_index::config::IndexFileConfig;
use basket_index::data::{load_csv, load_csv_from_str, DataConfig, PricePanel};
use basket_index::engine::{evaluate, IndexEngine};
use basket_index::error::IndexError;
use basket_index::export::{export_series_csv, ExportConfig};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::io::Write;
use tempfile::NamedTempFile;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Weekday calendar from `start` for `days` calendar days.
fn business_days(start: NaiveDate, days: i64) -> Vec<NaiveDate> {
    (0..days)
        .map(|i| start + Duration::days(i))
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

/// Synthetic panel of five stocks with deterministic, diverging trends.
fn create_synthetic_panel() -> PricePanel {
    let symbols: Vec<String> = ["Stock_A", "Stock_B", "Stock_C", "Stock_D", "Stock_E"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let rows = business_days(date(2019, 12, 2), 400)
        .into_iter()
        .enumerate()
        .map(|(i, d)| {
            let t = i as f64;
            let prices = vec![
                100.0 + t * 0.10,
                120.0 - t * 0.05,
                80.0 + t * 0.20 + (t * 0.3).sin(),
                90.0 + (t * 0.05).cos() * 20.0,
                60.0 + t * 0.15,
            ];
            (d, prices)
        })
        .collect();

    PricePanel::new(symbols, rows).unwrap()
}

/// The four-stock example: January's month-end ranks [C, A, B] with D=5.
const EXAMPLE_CSV: &str = "\
Date,A,B,C,D
29/01/2021,7,6,9,4
31/01/2021,8,7,10,5
01/02/2021,9,8,12,5
02/02/2021,9,8,12,5
26/02/2021,9,8,12,5
01/03/2021,10,9,11,30
31/03/2021,10,9,11,30
01/04/2021,10,9,11,31
";

#[test]
fn test_example_panel_holdings_and_level() {
    let panel = load_csv_from_str(EXAMPLE_CSV, &DataConfig::default()).unwrap();
    let engine = IndexEngine::new(panel);
    let holdings = engine.holdings().unwrap();

    // Every day of February holds the January selection
    for d in [date(2021, 2, 1), date(2021, 2, 2), date(2021, 2, 26)] {
        assert_eq!(holdings.basket_on(d).unwrap().symbols(), ["C", "A", "B"]);
    }

    // 12*0.5 + 9*0.25 + 8*0.25
    let raw = evaluate(engine.panel(), &holdings, date(2021, 2, 1)).unwrap();
    assert!((raw - 10.25).abs() < 1e-12);

    let series = engine.build_index(date(2021, 2, 1), date(2021, 4, 1)).unwrap();
    assert_eq!(series.first().unwrap().level, 100.0);
    let second = series.level_on(date(2021, 2, 2)).unwrap();
    assert!((second - 10.25).abs() < 1e-12);
}

#[test]
fn test_example_panel_no_look_ahead() {
    let panel = load_csv_from_str(EXAMPLE_CSV, &DataConfig::default()).unwrap();
    let engine = IndexEngine::new(panel);
    let holdings = engine.holdings().unwrap();

    // D tops the ranking only from the March month-end
    for (d, holding) in holdings.iter() {
        if let Some(basket) = holding.basket() {
            if d <= date(2021, 3, 31) {
                assert!(!basket.symbols().contains(&"D"), "D held early on {}", d);
            }
        }
    }
    assert_eq!(
        holdings.basket_on(date(2021, 4, 1)).unwrap().symbols(),
        ["D", "C", "A"]
    );
}

#[test]
fn test_every_held_basket_matches_prior_month_end() {
    let engine = IndexEngine::new(create_synthetic_panel());
    let selection = engine.selection().unwrap();
    let holdings = engine.holdings().unwrap();

    let month_ends: Vec<NaiveDate> = selection.dates().collect();

    for (d, holding) in holdings.iter() {
        let prior = month_ends.iter().rev().find(|me| **me < d);
        match (prior, holding.basket()) {
            (Some(me), Some(basket)) => assert_eq!(Some(basket), selection.get(*me)),
            (None, None) => {}
            (prior, basket) => panic!("mismatch on {}: {:?} vs {:?}", d, prior, basket),
        }
    }
}

#[test]
fn test_full_year_build() {
    let engine = IndexEngine::new(create_synthetic_panel());
    let series = engine.build_index(date(2020, 1, 1), date(2020, 12, 31)).unwrap();

    // The synthetic calendar trades on 1 Jan, the day after the first month-end
    assert_eq!(series.first().unwrap().date, date(2020, 1, 1));
    assert_eq!(series.first().unwrap().level, 100.0);
    assert_eq!(series.last().unwrap().date, date(2020, 12, 31));
    assert!(series.dates().windows(2).all(|w| w[0] < w[1]));
    assert!(series.levels().iter().all(|l| *l > 0.0));
}

#[test]
fn test_range_errors() {
    let engine = IndexEngine::new(create_synthetic_panel());

    // The first month-end is 31 Dec 2019, so nothing is held before 2020
    assert!(matches!(
        engine.build_index(date(2019, 12, 15), date(2020, 6, 30)),
        Err(IndexError::RangeBeforeData { .. })
    ));
    assert!(matches!(
        engine.build_index(date(2020, 6, 30), date(2020, 1, 1)),
        Err(IndexError::InvalidRange { .. })
    ));
    assert!(matches!(
        engine.build_index(date(2030, 1, 1), date(2030, 12, 31)),
        Err(IndexError::EmptyRange { .. })
    ));
}

#[test]
fn test_csv_round_trip_to_export() {
    let mut input = NamedTempFile::with_suffix(".csv").unwrap();
    write!(input, "{}", EXAMPLE_CSV).unwrap();

    let engine = IndexEngine::new(load_csv(input.path(), &DataConfig::default()).unwrap());
    let series = engine.build_index(date(2021, 2, 1), date(2021, 2, 26)).unwrap();

    let output = NamedTempFile::with_suffix(".csv").unwrap();
    export_series_csv(&series, output.path(), &ExportConfig::default()).unwrap();

    let content = std::fs::read_to_string(output.path()).unwrap();
    assert_eq!(
        content,
        "Date,Index_value\n01/02/2021,100.00\n02/02/2021,10.25\n26/02/2021,10.25\n"
    );
}

#[test]
fn test_build_from_config_file() {
    let mut input = NamedTempFile::with_suffix(".csv").unwrap();
    write!(input, "{}", EXAMPLE_CSV).unwrap();

    let mut config = IndexFileConfig::default();
    config.data.path = input.path().display().to_string();
    config.index.start_date = Some("2021-03-01".to_string());
    config.index.end_date = Some("2021-04-01".to_string());

    let (start, end) = config.date_range().unwrap();
    let data_config = config.data_config().unwrap();
    let engine = IndexEngine::from_csv(&config.data.path, &data_config).unwrap();
    let series = engine.build_index(start, end).unwrap();

    assert_eq!(series.len(), 3);
    assert_eq!(series.first().unwrap().level, 100.0);
    // 1 April holds the March selection [D, C, A]
    let april = series.level_on(date(2021, 4, 1)).unwrap();
    let expected = 0.5 * 31.0 + 0.25 * 11.0 + 0.25 * 10.0;
    assert!((april - expected).abs() < 1e-12);
}

//! Month-end top-3 selection.
//!
//! A month-end is the last date present in the panel for its calendar month,
//! so holidays and irregular calendars are handled by the data itself. On each
//! month-end the stocks are ranked by that day's price, highest first; equal
//! prices keep panel column order.

use crate::data::PricePanel;
use crate::error::{IndexError, Result};
use crate::types::{Basket, Constituent, BASKET_SIZE};
use chrono::{Datelike, NaiveDate};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

/// Top-3 basket selected on each month-end date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthEndSelection {
    baskets: BTreeMap<NaiveDate, Basket>,
}

impl MonthEndSelection {
    /// Basket selected on `date`, if `date` is a month-end.
    pub fn get(&self, date: NaiveDate) -> Option<&Basket> {
        self.baskets.get(&date)
    }

    /// Month-end dates in ascending order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.baskets.keys().copied()
    }

    /// (month-end, basket) pairs in date order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &Basket)> + '_ {
        self.baskets.iter().map(|(d, b)| (*d, b))
    }

    pub fn len(&self) -> usize {
        self.baskets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.baskets.is_empty()
    }

    pub fn first_month_end(&self) -> Option<NaiveDate> {
        self.baskets.keys().next().copied()
    }
}

/// Indices of the last observed date of every (year, month) group.
///
/// `dates` must be sorted ascending.
pub fn month_end_indices(dates: &[NaiveDate]) -> Vec<usize> {
    let month_of = |d: &NaiveDate| (d.year(), d.month());

    dates
        .iter()
        .enumerate()
        .filter(|&(i, date)| match dates.get(i + 1) {
            Some(next) => month_of(next) != month_of(date),
            None => true,
        })
        .map(|(i, _)| i)
        .collect()
}

/// Column indices ordered by price, highest first.
///
/// The sort is stable, so tied prices keep their column order. Prices are
/// finite, and `-0.0` ties with `0.0`.
pub fn rank_columns(prices: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..prices.len()).collect();
    order.sort_by(|&a, &b| {
        let (pa, pb) = (prices[a], prices[b]);
        pb.partial_cmp(&pa).unwrap_or(Ordering::Equal)
    });
    order
}

/// Select the three highest-priced stocks on every month-end of the panel.
pub fn select_top3(panel: &PricePanel) -> Result<MonthEndSelection> {
    if panel.num_symbols() < BASKET_SIZE {
        return Err(IndexError::InsufficientUniverse {
            available: panel.num_symbols(),
            required: BASKET_SIZE,
        });
    }

    let symbols = panel.symbols();
    let mut baskets = BTreeMap::new();

    for index in month_end_indices(panel.dates()) {
        let ranked = rank_columns(panel.row(index));
        let members = [ranked[0], ranked[1], ranked[2]].map(|column| Constituent {
            column,
            symbol: symbols[column].clone(),
        });
        let basket = Basket::new(members);

        let date = panel.dates()[index];
        debug!("Month-end {} selection: {}", date, basket);
        baskets.insert(date, basket);
    }

    Ok(MonthEndSelection { baskets })
}

//! Carry-forward of month-end selections into daily holdings.
//!
//! A basket selected on month-end M is held from the next panel date through
//! the next month-end inclusive. The basket in effect on any day was therefore
//! fully determined by prices observed before that day.

use crate::data::PricePanel;
use crate::selection::MonthEndSelection;
use crate::types::{Basket, Holding};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Basket in effect on every panel date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoldingAssignment {
    holdings: BTreeMap<NaiveDate, Holding>,
}

impl HoldingAssignment {
    /// Holding on `date`, or None if `date` is not a panel date.
    pub fn get(&self, date: NaiveDate) -> Option<&Holding> {
        self.holdings.get(&date)
    }

    /// Basket held on `date`, if one is in effect.
    pub fn basket_on(&self, date: NaiveDate) -> Option<&Basket> {
        self.get(date).and_then(Holding::basket)
    }

    /// First panel date with a basket in effect.
    pub fn first_held_date(&self) -> Option<NaiveDate> {
        self.holdings
            .iter()
            .find(|(_, holding)| holding.is_held())
            .map(|(date, _)| *date)
    }

    /// (date, holding) pairs in date order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &Holding)> + '_ {
        self.holdings.iter().map(|(d, h)| (*d, h))
    }

    /// Holdings for dates within `[start, end]`.
    pub fn range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Iterator<Item = (NaiveDate, &Holding)> + '_ {
        self.holdings.range(start..=end).map(|(d, h)| (*d, h))
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }
}

/// Assign every panel date the selection of the most recent prior month-end.
///
/// Single forward scan: a date first takes the current basket, and only then,
/// if it is itself a month-end, does its own selection become current.
pub fn assign_holdings(panel: &PricePanel, selection: &MonthEndSelection) -> HoldingAssignment {
    let mut holdings = BTreeMap::new();
    let mut current = Holding::NoHoldingYet;

    for &date in panel.dates() {
        holdings.insert(date, current.clone());
        if let Some(basket) = selection.get(date) {
            current = Holding::Held(basket.clone());
        }
    }

    HoldingAssignment { holdings }
}

//! Core data types for index construction.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of constituents held by the index.
pub const BASKET_SIZE: usize = 3;

/// Rank weights applied to the basket: rank 1 gets half, ranks 2 and 3 a quarter each.
pub const BASKET_WEIGHTS: [f64; BASKET_SIZE] = [0.50, 0.25, 0.25];

/// Level pinned on the first date of every index series.
pub const INDEX_BASE: f64 = 100.0;

/// A single ranked constituent of a basket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constituent {
    /// Column position in the price panel.
    pub column: usize,
    /// Stock identifier.
    pub symbol: String,
}

/// Three stocks held by the index, in rank order (rank 1 first).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Basket {
    members: [Constituent; BASKET_SIZE],
}

impl Basket {
    /// Create a basket from constituents already sorted by rank.
    pub fn new(members: [Constituent; BASKET_SIZE]) -> Self {
        Self { members }
    }

    /// Constituents in rank order.
    pub fn members(&self) -> &[Constituent; BASKET_SIZE] {
        &self.members
    }

    /// Panel columns in rank order.
    pub fn columns(&self) -> [usize; BASKET_SIZE] {
        [
            self.members[0].column,
            self.members[1].column,
            self.members[2].column,
        ]
    }

    /// Stock identifiers in rank order.
    pub fn symbols(&self) -> [&str; BASKET_SIZE] {
        [
            self.members[0].symbol.as_str(),
            self.members[1].symbol.as_str(),
            self.members[2].symbol.as_str(),
        ]
    }

    /// Weighted value of the basket given a full row of panel prices.
    ///
    /// Weights follow rank, not identifier: `0.5 * p[rank1] + 0.25 * p[rank2] + 0.25 * p[rank3]`.
    pub fn weighted_value(&self, row: &[f64]) -> f64 {
        self.members
            .iter()
            .zip(BASKET_WEIGHTS.iter())
            .map(|(member, weight)| row[member.column] * weight)
            .sum()
    }
}

impl fmt::Display for Basket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.symbols();
        write!(f, "[{}, {}, {}]", a, b, c)
    }
}

/// The basket in effect on a given date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Holding {
    /// No month-end selection has taken effect yet.
    NoHoldingYet,
    /// Basket carried forward from the most recent prior month-end.
    Held(Basket),
}

impl Holding {
    /// The held basket, if any.
    pub fn basket(&self) -> Option<&Basket> {
        match self {
            Holding::NoHoldingYet => None,
            Holding::Held(basket) => Some(basket),
        }
    }

    /// Check if a basket is held.
    pub fn is_held(&self) -> bool {
        matches!(self, Holding::Held(_))
    }
}

/// One day of the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexPoint {
    pub date: NaiveDate,
    pub level: f64,
    /// Basket the level was computed from.
    pub basket: Basket,
}

/// Index levels over a requested date range, ordered by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSeries {
    points: Vec<IndexPoint>,
}

impl IndexSeries {
    pub(crate) fn new(points: Vec<IndexPoint>) -> Self {
        Self { points }
    }

    /// All points in date order.
    pub fn points(&self) -> &[IndexPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&IndexPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&IndexPoint> {
        self.points.last()
    }

    /// Level on a specific date.
    pub fn level_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].level)
    }

    /// Levels in date order.
    pub fn levels(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.level).collect()
    }

    /// Dates in order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }
}

impl<'a> IntoIterator for &'a IndexSeries {
    type Item = &'a IndexPoint;
    type IntoIter = std::slice::Iter<'a, IndexPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

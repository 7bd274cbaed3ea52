//! Index construction engine.

use crate::data::{load_csv, DataConfig, PricePanel};
use crate::error::{IndexError, Result};
use crate::holdings::{assign_holdings, HoldingAssignment};
use crate::selection::{select_top3, MonthEndSelection};
use crate::types::{Holding, IndexPoint, IndexSeries, INDEX_BASE};
use chrono::NaiveDate;
use std::path::Path;
use tracing::{debug, info};

/// Weighted basket value on `date`, using that day's prices.
///
/// Fails with [`IndexError::MissingHolding`] when no month-end selection has
/// taken effect yet, and [`IndexError::DateNotInPanel`] for unknown dates.
pub fn evaluate(
    panel: &PricePanel,
    holdings: &HoldingAssignment,
    date: NaiveDate,
) -> Result<f64> {
    let row = panel.row_on(date).ok_or(IndexError::DateNotInPanel(date))?;

    match holdings.get(date) {
        Some(Holding::Held(basket)) => Ok(basket.weighted_value(row)),
        Some(Holding::NoHoldingYet) => Err(IndexError::MissingHolding(date)),
        None => Err(IndexError::DateNotInPanel(date)),
    }
}

/// Builds the top-3 index from an owned price panel.
///
/// The engine holds no state besides the panel: every call recomputes the
/// selections and holdings, so repeated calls with the same range return
/// identical series.
#[derive(Debug, Clone)]
pub struct IndexEngine {
    panel: PricePanel,
}

impl IndexEngine {
    /// Create an engine over a validated panel.
    pub fn new(panel: PricePanel) -> Self {
        Self { panel }
    }

    /// Load the panel from a CSV file.
    pub fn from_csv(path: impl AsRef<Path>, config: &DataConfig) -> Result<Self> {
        Ok(Self::new(load_csv(path, config)?))
    }

    /// The underlying price panel.
    pub fn panel(&self) -> &PricePanel {
        &self.panel
    }

    /// Month-end top-3 selections over the whole panel.
    pub fn selection(&self) -> Result<MonthEndSelection> {
        select_top3(&self.panel)
    }

    /// Daily holdings over the whole panel.
    pub fn holdings(&self) -> Result<HoldingAssignment> {
        Ok(assign_holdings(&self.panel, &self.selection()?))
    }

    /// Build the index for panel dates in `[start_date, end_date]`.
    ///
    /// The first date in range is pinned to 100. Every later level is the raw
    /// weighted basket value for that day; it is not rescaled against the
    /// anchor nor chained from the previous level.
    pub fn build_index(&self, start_date: NaiveDate, end_date: NaiveDate) -> Result<IndexSeries> {
        if start_date > end_date {
            return Err(IndexError::InvalidRange {
                start: start_date,
                end: end_date,
            });
        }

        info!("Building index from {} to {}", start_date, end_date);

        let selection = self.selection()?;
        debug!("{} month-end selections", selection.len());
        let holdings = assign_holdings(&self.panel, &selection);

        let first_available = holdings.first_held_date();
        match first_available {
            Some(first) if start_date >= first => {}
            _ => {
                return Err(IndexError::RangeBeforeData {
                    start: start_date,
                    first_available,
                })
            }
        }

        let mut points = holdings
            .range(start_date, end_date)
            .map(|(date, holding)| -> Result<IndexPoint> {
                let level = evaluate(&self.panel, &holdings, date)?;
                let basket = holding
                    .basket()
                    .cloned()
                    .ok_or(IndexError::MissingHolding(date))?;
                Ok(IndexPoint {
                    date,
                    level,
                    basket,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        match points.first_mut() {
            Some(anchor) => anchor.level = INDEX_BASE,
            None => {
                return Err(IndexError::EmptyRange {
                    start: start_date,
                    end: end_date,
                })
            }
        }

        info!(
            "Built {} index levels ({} to {})",
            points.len(),
            points[0].date,
            points[points.len() - 1].date
        );

        Ok(IndexSeries::new(points))
    }
}

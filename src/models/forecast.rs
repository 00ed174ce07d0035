//! Demand history and forecast models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One observation in an item's demand (or sales) history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandPoint {
    /// Date the demand was observed.
    pub date: NaiveDate,
    /// Units demanded or sold.
    pub quantity: Decimal,
}

impl DemandPoint {
    /// Creates a new observation.
    pub fn new(date: NaiveDate, quantity: Decimal) -> Self {
        Self { date, quantity }
    }
}

/// The output of the demand forecast for one item.
///
/// `confidence` ranges from 0 to 100. A forecast computed from too little
/// history is still returned, with neutral factors and `low_confidence` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastResult {
    /// Same-month average over the overall average.
    pub seasonal_factor: Decimal,
    /// Recent average over early average.
    pub trend_factor: Decimal,
    /// Expected demand for the coming period, in whole units.
    pub predicted_demand: Decimal,
    /// Inverted coefficient of variation, in percent.
    pub confidence: Decimal,
    /// Units to order to cover the predicted demand.
    pub recommended_order: Decimal,
    /// Number of history points the forecast was computed from.
    pub sample_size: usize,
    /// True when confidence is under the configured threshold.
    pub low_confidence: bool,
}

/// A forecast together with the item data it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastItem {
    /// Inventory item identifier.
    pub item_id: String,
    /// History the forecast was computed from, in chronological order.
    pub history: Vec<DemandPoint>,
    /// Stock on hand when the forecast was requested.
    pub current_stock: Decimal,
    /// The forecast itself.
    pub forecast: ForecastResult,
}

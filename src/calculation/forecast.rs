//! Demand forecasting from an item's sales history.
//!
//! The forecast scales the recent demand level by a seasonal factor
//! (same-month history against the overall average) and a trend factor
//! (recent average against early average). Sparse history never fails:
//! the factors fall back to 1 and confidence to 0, so dashboards keep
//! rendering.

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, warn};

use crate::config::ForecastSettings;
use crate::models::{DemandPoint, ForecastItem, ForecastResult};

use super::rounding::{round_money, round_units};

/// Newton iterations used by [`decimal_sqrt`].
const SQRT_ITERATIONS: usize = 30;

/// Decimal places kept for the reported seasonal and trend factors.
const FACTOR_DECIMAL_PLACES: u32 = 4;

fn round_factor(factor: Decimal) -> Decimal {
    factor.round_dp_with_strategy(FACTOR_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Arithmetic mean; `None` for an empty slice or if the sum overflows even
/// after scaling each value down by the count.
fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let count = Decimal::from(values.len());
    match values.iter().try_fold(Decimal::ZERO, |sum, v| sum.checked_add(*v)) {
        Some(sum) => sum.checked_div(count),
        None => values
            .iter()
            .try_fold(Decimal::ZERO, |sum, v| sum.checked_add(v.checked_div(count)?)),
    }
}

/// Square root by Newton's method. Non-positive input yields zero.
fn decimal_sqrt(value: Decimal) -> Decimal {
    if value <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    if value == Decimal::ONE {
        return Decimal::ONE;
    }

    let two = Decimal::TWO;
    let mut x = if value > Decimal::ONE { value / two } else { Decimal::ONE };
    for _ in 0..SQRT_ITERATIONS {
        let next = (x + value / x) / two;
        if next == x {
            break;
        }
        x = next;
    }
    x
}

/// Population standard deviation over the mean, `σ/μ`.
///
/// Deviations are taken relative to the mean before squaring, so large
/// quantities do not overflow. `None` if the mean is zero or an
/// intermediate value is out of range.
fn coefficient_of_variation(values: &[Decimal], mean: Decimal) -> Option<Decimal> {
    let squares = values.iter().try_fold(Decimal::ZERO, |sum, v| {
        let relative = v.checked_sub(mean)?.checked_div(mean)?;
        sum.checked_add(relative.checked_mul(relative)?)
    })?;
    Some(decimal_sqrt(squares.checked_div(Decimal::from(values.len()))?))
}

/// Same-month average over overall average; 1 when there is no same-month
/// history or the overall average is zero.
fn seasonal_factor(points: &[DemandPoint], overall_mean: Decimal, as_of: NaiveDate) -> Decimal {
    let same_month: Vec<Decimal> = points
        .iter()
        .filter(|p| p.date.month() == as_of.month())
        .map(|p| p.quantity)
        .collect();

    mean(&same_month)
        .and_then(|month_mean| month_mean.checked_div(overall_mean))
        .unwrap_or(Decimal::ONE)
}

/// Recent average over early average; 1 when history is too short or the
/// early average is zero.
fn trend_factor(quantities: &[Decimal], settings: &ForecastSettings) -> Decimal {
    if quantities.len() < settings.min_points_for_trend.max(1) {
        return Decimal::ONE;
    }

    let early_len = settings.early_window.min(quantities.len());
    let recent_len = settings.recent_window.min(quantities.len());
    let early = mean(&quantities[..early_len]);
    let recent = mean(&quantities[quantities.len() - recent_len..]);

    match (recent, early) {
        (Some(recent), Some(early)) => recent.checked_div(early).unwrap_or(Decimal::ONE),
        _ => Decimal::ONE,
    }
}

/// `100 × (1 − σ/μ)` clamped to `[0, 100]`; 0 when history is too short or
/// the mean is not positive.
fn confidence(quantities: &[Decimal], overall_mean: Decimal, settings: &ForecastSettings) -> Decimal {
    if quantities.len() < settings.min_points_for_confidence.max(2) || overall_mean <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    coefficient_of_variation(quantities, overall_mean)
        .and_then(|variation| Decimal::ONE.checked_sub(variation))
        .and_then(|remaining| Decimal::ONE_HUNDRED.checked_mul(remaining))
        .map(|score| round_money(score.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)))
        .unwrap_or(Decimal::ZERO)
}

fn neutral_forecast(predicted_demand: Decimal, current_stock: Decimal, sample_size: usize) -> ForecastResult {
    ForecastResult {
        seasonal_factor: Decimal::ONE,
        trend_factor: Decimal::ONE,
        predicted_demand,
        confidence: Decimal::ZERO,
        recommended_order: recommended_order(predicted_demand, current_stock),
        sample_size,
        low_confidence: true,
    }
}

/// Predicted demand less stock on hand, never negative.
fn recommended_order(predicted_demand: Decimal, current_stock: Decimal) -> Decimal {
    predicted_demand
        .checked_sub(current_stock)
        .unwrap_or(Decimal::MAX)
        .max(Decimal::ZERO)
}

/// Forecasts next-period demand from a history series.
///
/// - `seasonal_factor`: average of points in `as_of`'s calendar month over
///   the overall average (1 without same-month history).
/// - `trend_factor`: average of the most recent points over average of the
///   earliest points (1 with fewer than two points).
/// - `predicted_demand`: recent average × seasonal × trend, rounded to whole units.
/// - `confidence`: inverted coefficient of variation, 0-100 (0 with fewer
///   than two points).
/// - `recommended_order`: predicted demand less `current_stock`, never negative.
///
/// The history need not be sorted. An empty history yields neutral factors
/// and zero demand and confidence. Reported factors are rounded to four
/// decimal places; the prediction uses them at full precision. If the
/// projection leaves the decimal range, the factors fall back to 1, the
/// prediction to the recent average and confidence to 0.
///
/// # Examples
///
/// ```
/// use bizcalc_engine::calculation::forecast;
/// use bizcalc_engine::config::ForecastSettings;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let as_of = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
/// let result = forecast(&[], Decimal::ZERO, as_of, &ForecastSettings::default());
///
/// assert_eq!(result.seasonal_factor, Decimal::ONE);
/// assert_eq!(result.trend_factor, Decimal::ONE);
/// assert_eq!(result.predicted_demand, Decimal::ZERO);
/// assert_eq!(result.confidence, Decimal::ZERO);
/// ```
pub fn forecast(
    history: &[DemandPoint],
    current_stock: Decimal,
    as_of: NaiveDate,
    settings: &ForecastSettings,
) -> ForecastResult {
    let mut points = history.to_vec();
    points.sort_by_key(|p| p.date);
    let quantities: Vec<Decimal> = points.iter().map(|p| p.quantity).collect();

    if quantities.is_empty() {
        debug!("Empty demand history, returning neutral forecast");
        return neutral_forecast(Decimal::ZERO, current_stock, 0);
    }

    let recent_len = settings.recent_window.min(quantities.len());
    let recent_mean = mean(&quantities[quantities.len() - recent_len..]);

    let Some(overall_mean) = mean(&quantities) else {
        warn!(
            sample_size = quantities.len(),
            "Demand history out of range, returning neutral forecast"
        );
        return neutral_forecast(Decimal::ZERO, current_stock, quantities.len());
    };

    let seasonal = seasonal_factor(&points, overall_mean, as_of);
    let trend = trend_factor(&quantities, settings);

    let projected = recent_mean
        .and_then(|level| level.checked_mul(seasonal))
        .and_then(|level| level.checked_mul(trend));
    let Some(projected) = projected else {
        warn!(
            sample_size = quantities.len(),
            seasonal_factor = %seasonal,
            trend_factor = %trend,
            "Projected demand out of range, returning neutral forecast"
        );
        let level = round_units(recent_mean.unwrap_or(overall_mean)).max(Decimal::ZERO);
        return neutral_forecast(level, current_stock, quantities.len());
    };

    let predicted_demand = round_units(projected).max(Decimal::ZERO);
    let confidence = confidence(&quantities, overall_mean, settings);
    let low_confidence = confidence < settings.low_confidence_threshold;

    if low_confidence {
        warn!(
            sample_size = quantities.len(),
            confidence = %confidence,
            "Low-confidence demand forecast"
        );
    }

    ForecastResult {
        seasonal_factor: round_factor(seasonal),
        trend_factor: round_factor(trend),
        predicted_demand,
        confidence,
        recommended_order: recommended_order(predicted_demand, current_stock),
        sample_size: quantities.len(),
        low_confidence,
    }
}

/// Forecasts demand for one inventory item and bundles the result with the
/// item's history (sorted chronologically) and stock level.
pub fn forecast_item(
    item_id: &str,
    history: &[DemandPoint],
    current_stock: Decimal,
    as_of: NaiveDate,
    settings: &ForecastSettings,
) -> ForecastItem {
    let result = forecast(history, current_stock, as_of, settings);

    let mut sorted = history.to_vec();
    sorted.sort_by_key(|p| p.date);

    debug!(
        item_id = %item_id,
        predicted_demand = %result.predicted_demand,
        recommended_order = %result.recommended_order,
        "Forecast computed"
    );

    ForecastItem {
        item_id: item_id.to_string(),
        history: sorted,
        current_stock,
        forecast: result,
    }
}

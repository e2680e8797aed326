//! Next-month spending projection from a least-squares trend line.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

use super::aggregate::MonthlyTotal;
use crate::error::{CoreError, CoreResult};
use crate::models::YearMonth;

/// Distinct months needed before a trend line means anything.
pub(crate) const MIN_FORECAST_MONTHS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Forecast {
    /// The month being projected: the one after the last observed month.
    pub(crate) month: YearMonth,
    /// Projection clamped at zero and rounded to cents.
    pub(crate) projected: Decimal,
    pub(crate) raw_projection: Decimal,
    pub(crate) slope: Decimal,
    pub(crate) intercept: Decimal,
    pub(crate) months_used: usize,
    pub(crate) clamped: bool,
}

/// Fit `total = intercept + slope * x` where x counts calendar months from the
/// first observed month, then evaluate it one month past the last.
///
/// Input need not be sorted; entries for the same month are summed. The whole
/// computation is in decimal arithmetic, so equal input gives equal output.
pub(crate) fn forecast_next(monthly: &[MonthlyTotal]) -> CoreResult<Forecast> {
    let mut by_month: BTreeMap<YearMonth, Decimal> = BTreeMap::new();
    for entry in monthly {
        let slot = by_month.entry(entry.month).or_insert(Decimal::ZERO);
        *slot = slot.checked_add(entry.total).ok_or_else(overflow)?;
    }

    if by_month.len() < MIN_FORECAST_MONTHS {
        return Err(CoreError::InsufficientData {
            months: by_month.len(),
            required: MIN_FORECAST_MONTHS,
        });
    }

    let (first, last) = match (by_month.keys().next(), by_month.keys().next_back()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => {
            return Err(CoreError::InsufficientData {
                months: 0,
                required: MIN_FORECAST_MONTHS,
            })
        }
    };

    let points: Vec<(Decimal, Decimal)> = by_month
        .iter()
        .map(|(month, total)| (Decimal::from(month.index() - first.index()), *total))
        .collect();
    let (slope, intercept) = least_squares(&points).ok_or_else(overflow)?;

    let next_x = Decimal::from(last.index() - first.index() + 1);
    let raw_projection = slope
        .checked_mul(next_x)
        .and_then(|v| v.checked_add(intercept))
        .ok_or_else(overflow)?;
    let clamped = raw_projection.is_sign_negative() && !raw_projection.is_zero();
    let projected = if clamped {
        Decimal::ZERO
    } else {
        raw_projection.round_dp(2)
    };

    debug!(
        months = points.len(),
        %slope,
        %intercept,
        %raw_projection,
        "fitted spending trend"
    );

    Ok(Forecast {
        month: last.next(),
        projected,
        raw_projection,
        slope,
        intercept,
        months_used: points.len(),
        clamped,
    })
}

/// Ordinary least squares over (x, y) points. `None` on overflow or when all
/// x values coincide.
fn least_squares(points: &[(Decimal, Decimal)]) -> Option<(Decimal, Decimal)> {
    let n = Decimal::from(points.len() as u64);
    let mut sum_x = Decimal::ZERO;
    let mut sum_y = Decimal::ZERO;
    for (x, y) in points {
        sum_x = sum_x.checked_add(*x)?;
        sum_y = sum_y.checked_add(*y)?;
    }
    let mean_x = sum_x.checked_div(n)?;
    let mean_y = sum_y.checked_div(n)?;

    let mut sxx = Decimal::ZERO;
    let mut sxy = Decimal::ZERO;
    for (x, y) in points {
        let dx = x.checked_sub(mean_x)?;
        let dy = y.checked_sub(mean_y)?;
        sxx = sxx.checked_add(dx.checked_mul(dx)?)?;
        sxy = sxy.checked_add(dx.checked_mul(dy)?)?;
    }
    if sxx.is_zero() {
        return None;
    }
    let slope = sxy.checked_div(sxx)?;
    let intercept = mean_y.checked_sub(slope.checked_mul(mean_x)?)?;
    Some((slope, intercept))
}

fn overflow() -> CoreError {
    CoreError::Overflow("monthly totals exceed decimal range while fitting the trend".into())
}

#[cfg(test)]
#[path = "forecast_tests.rs"]
mod tests;

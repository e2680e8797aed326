#![allow(clippy::unwrap_used)]

use super::*;
use crate::analysis::aggregate::{aggregate, Granularity};
use crate::models::{ExpenseRecord, NewExpense};
use rust_decimal_macros::dec;

fn ym(y: i32, m: u32) -> YearMonth {
    YearMonth::new(y, m).unwrap()
}

fn mt(y: i32, m: u32, total: Decimal) -> MonthlyTotal {
    MonthlyTotal {
        month: ym(y, m),
        total,
    }
}

fn rec(date: &str, category: &str, amount: &str) -> ExpenseRecord {
    ExpenseRecord::create(NewExpense::parse(date, category, amount, "").unwrap())
}

#[test]
fn test_two_months_linear() {
    // Jan 100, Feb 200 -> March 300
    let records = vec![rec("2024-01-10", "Food", "100"), rec("2024-02-10", "Food", "200")];
    let monthly = aggregate(&records, Granularity::Month).monthly_totals();
    assert_eq!(monthly.iter().map(|m| m.total).collect::<Vec<_>>(), vec![dec!(100), dec!(200)]);

    let f = forecast_next(&monthly).unwrap();
    assert_eq!(f.month, ym(2024, 3));
    assert_eq!(f.projected, dec!(300));
    assert_eq!(f.slope, dec!(100));
    assert_eq!(f.intercept, dec!(100));
    assert_eq!(f.months_used, 2);
    assert!(!f.clamped);
}

#[test]
fn test_no_data_is_insufficient() {
    let err = forecast_next(&[]).unwrap_err();
    assert!(matches!(
        err,
        CoreError::InsufficientData {
            months: 0,
            required: 2
        }
    ));
}

#[test]
fn test_single_month_is_insufficient() {
    let err = forecast_next(&[mt(2024, 1, dec!(500))]).unwrap_err();
    assert!(matches!(err, CoreError::InsufficientData { months: 1, .. }));
}

#[test]
fn test_duplicate_month_counts_once() {
    let input = vec![mt(2024, 1, dec!(100)), mt(2024, 1, dec!(50))];
    let err = forecast_next(&input).unwrap_err();
    assert!(matches!(err, CoreError::InsufficientData { months: 1, .. }));
}

#[test]
fn test_duplicate_months_are_summed() {
    let split = vec![
        mt(2024, 1, dec!(60)),
        mt(2024, 2, dec!(200)),
        mt(2024, 1, dec!(40)),
    ];
    let merged = vec![mt(2024, 1, dec!(100)), mt(2024, 2, dec!(200))];
    assert_eq!(forecast_next(&split).unwrap(), forecast_next(&merged).unwrap());
}

#[test]
fn test_unsorted_input_matches_sorted() {
    let sorted = vec![
        mt(2024, 1, dec!(100)),
        mt(2024, 2, dec!(140)),
        mt(2024, 3, dec!(90)),
    ];
    let shuffled = vec![sorted[2], sorted[0], sorted[1]];
    assert_eq!(forecast_next(&sorted).unwrap(), forecast_next(&shuffled).unwrap());
}

#[test]
fn test_deterministic_across_calls() {
    let input = vec![
        mt(2023, 11, dec!(1234.56)),
        mt(2023, 12, dec!(987.65)),
        mt(2024, 1, dec!(1500.01)),
        mt(2024, 2, dec!(1100.10)),
    ];
    let first = forecast_next(&input).unwrap();
    for _ in 0..10 {
        assert_eq!(forecast_next(&input).unwrap(), first);
    }
}

#[test]
fn test_flat_history() {
    let input = vec![mt(2024, 1, dec!(500)), mt(2024, 2, dec!(500)), mt(2024, 3, dec!(500))];
    let f = forecast_next(&input).unwrap();
    assert_eq!(f.slope, Decimal::ZERO);
    assert_eq!(f.projected, dec!(500));
}

#[test]
fn test_three_point_fit() {
    // x = 0,1,2; y = 100,300,200 -> slope 50, intercept 150, next 300
    let input = vec![mt(2024, 1, dec!(100)), mt(2024, 2, dec!(300)), mt(2024, 3, dec!(200))];
    let f = forecast_next(&input).unwrap();
    assert_eq!(f.slope, dec!(50));
    assert_eq!(f.intercept, dec!(150));
    assert_eq!(f.projected, dec!(300));
    assert_eq!(f.month, ym(2024, 4));
}

#[test]
fn test_negative_projection_clamped_to_zero() {
    let input = vec![mt(2024, 1, dec!(1000)), mt(2024, 2, dec!(100))];
    let f = forecast_next(&input).unwrap();
    assert_eq!(f.raw_projection, dec!(-800));
    assert_eq!(f.projected, Decimal::ZERO);
    assert!(f.clamped);
}

#[test]
fn test_calendar_gap_keeps_spacing() {
    // Jan 100, Apr 400: slope 100 per month, May -> 500
    let input = vec![mt(2024, 1, dec!(100)), mt(2024, 4, dec!(400))];
    let f = forecast_next(&input).unwrap();
    assert_eq!(f.slope, dec!(100));
    assert_eq!(f.month, ym(2024, 5));
    assert_eq!(f.projected, dec!(500));
}

#[test]
fn test_year_boundary() {
    let input = vec![mt(2023, 12, dec!(100)), mt(2024, 1, dec!(150))];
    let f = forecast_next(&input).unwrap();
    assert_eq!(f.month, ym(2024, 2));
    assert_eq!(f.projected, dec!(200));
}

#[test]
fn test_projection_rounded_to_cents() {
    // x = 0,1,2; y = 10, 10, 10.01 -> slope 0.005, intercept 9.9983.., next ~10.0133
    let input = vec![mt(2024, 1, dec!(10)), mt(2024, 2, dec!(10)), mt(2024, 3, dec!(10.01))];
    let f = forecast_next(&input).unwrap();
    assert_eq!(f.projected.scale(), 2);
    assert_eq!(f.projected, dec!(10.01));
}

#[test]
fn test_duplicate_month_overflow_is_an_error() {
    let history = [
        mt(2024, 1, Decimal::MAX),
        mt(2024, 1, Decimal::MAX),
        mt(2024, 2, dec!(1)),
    ];
    assert!(matches!(
        forecast_next(&history),
        Err(CoreError::Overflow(_))
    ));
}

#[test]
fn test_totals_beyond_decimal_range_are_an_error() {
    let history = [mt(2024, 1, Decimal::MAX), mt(2024, 2, Decimal::MAX)];
    assert!(matches!(
        forecast_next(&history),
        Err(CoreError::Overflow(_))
    ));
}

#[test]
fn test_largest_valid_amounts_still_forecast() {
    let history = [
        mt(2024, 1, dec!(1000000000000000)),
        mt(2024, 2, dec!(1000000000000000)),
    ];
    let forecast = forecast_next(&history).unwrap();
    assert_eq!(forecast.projected, dec!(1000000000000000));
}

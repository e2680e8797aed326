#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::category::MAX_CATEGORY_LEN;
use super::expense::MAX_AMOUNT;
use super::*;
use crate::error::CoreError;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ── Category ──────────────────────────────────────────────────

#[test]
fn test_category_normalises_whitespace() {
    let cat = Category::new("  Food   &  Dining ").unwrap();
    assert_eq!(cat.as_str(), "Food & Dining");
    assert_eq!(format!("{cat}"), "Food & Dining");
}

#[test]
fn test_category_case_insensitive_equality() {
    let a = Category::new("Groceries").unwrap();
    let b = Category::new("GROCERIES").unwrap();
    assert_eq!(a, b);
    assert_eq!(a.cmp(&b), std::cmp::Ordering::Equal);
}

#[test]
fn test_category_rejects_empty() {
    assert!(matches!(Category::new("   "), Err(CoreError::Validation(_))));
    assert!(matches!(Category::new(""), Err(CoreError::Validation(_))));
}

#[test]
fn test_category_rejects_too_long() {
    let long = "x".repeat(MAX_CATEGORY_LEN + 1);
    assert!(Category::new(&long).is_err());
    let exact = "x".repeat(MAX_CATEGORY_LEN);
    assert!(Category::new(&exact).is_ok());
}

#[test]
fn test_category_rejects_control_chars() {
    assert!(Category::new("Food\u{7}").is_err());
}

#[test]
fn test_category_ordering_ignores_case() {
    let mut cats = vec![
        Category::new("travel").unwrap(),
        Category::new("Bills").unwrap(),
        Category::new("food").unwrap(),
    ];
    cats.sort();
    let names: Vec<&str> = cats.iter().map(|c| c.as_str()).collect();
    assert_eq!(names, vec!["Bills", "food", "travel"]);
}

// ── YearMonth ─────────────────────────────────────────────────

#[test]
fn test_year_month_parse_and_display() {
    let ym = YearMonth::parse("2024-03").unwrap();
    assert_eq!(ym, YearMonth::new(2024, 3).unwrap());
    assert_eq!(ym.to_string(), "2024-03");
}

#[test]
fn test_year_month_parse_invalid() {
    assert!(YearMonth::parse("2024-13").is_err());
    assert!(YearMonth::parse("2024").is_err());
    assert!(YearMonth::parse("march").is_err());
}

#[test]
fn test_year_month_wraps_years() {
    let dec_2023 = YearMonth::new(2023, 12).unwrap();
    assert_eq!(dec_2023.next(), YearMonth::new(2024, 1).unwrap());
    assert_eq!(YearMonth::new(2024, 1).unwrap().prev(), dec_2023);
    assert_eq!(dec_2023.next().index() - dec_2023.index(), 1);
}

#[test]
fn test_year_month_days() {
    assert_eq!(YearMonth::new(2024, 2).unwrap().days(), 29);
    assert_eq!(YearMonth::new(2023, 2).unwrap().days(), 28);
    assert_eq!(YearMonth::new(2024, 12).unwrap().last_day(), date(2024, 12, 31));
}

#[test]
fn test_year_month_contains() {
    let jan = YearMonth::new(2024, 1).unwrap();
    assert!(jan.contains(date(2024, 1, 31)));
    assert!(!jan.contains(date(2024, 2, 1)));
}

// ── Expenses ──────────────────────────────────────────────────

#[test]
fn test_new_expense_parse() {
    let e = NewExpense::parse("2024-01-15", "Food", "$1,234.50", "  lunch ").unwrap();
    assert_eq!(e.date, date(2024, 1, 15));
    assert_eq!(e.category.as_str(), "Food");
    assert_eq!(e.amount, dec!(1234.5));
    assert_eq!(e.description, "lunch");
}

#[test]
fn test_new_expense_accepts_us_date_and_rupee() {
    let e = NewExpense::parse("01/15/2024", "Travel", "₹250", "").unwrap();
    assert_eq!(e.date, date(2024, 1, 15));
    assert_eq!(e.amount, dec!(250));
}

#[test]
fn test_new_expense_rejects_negative_amount() {
    let err = NewExpense::parse("2024-01-15", "Food", "-5", "").unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

#[test]
fn test_new_expense_allows_zero_amount() {
    let e = NewExpense::parse("2024-01-15", "Food", "0", "").unwrap();
    assert_eq!(e.amount, Decimal::ZERO);
}

#[test]
fn test_new_expense_amount_upper_bound() {
    let at_max = NewExpense::parse("2024-01-15", "Food", "1,000,000,000,000,000", "").unwrap();
    assert_eq!(at_max.amount, MAX_AMOUNT);
    let err = NewExpense::parse("2024-01-15", "Food", "1000000000000000.01", "").unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    assert!(NewExpense::parse("2024-01-15", "Food", "50000000000000000000000000000", "").is_err());
}

#[test]
fn test_new_expense_rejects_bad_date() {
    assert!(NewExpense::parse("2024-02-30", "Food", "5", "").is_err());
    assert!(NewExpense::parse("yesterday", "Food", "5", "").is_err());
}

#[test]
fn test_new_expense_rejects_bad_amount() {
    assert!(NewExpense::parse("2024-01-15", "Food", "abc", "").is_err());
    assert!(NewExpense::parse("2024-01-15", "Food", "", "").is_err());
}

#[test]
fn test_parse_date_with_time_suffix() {
    assert_eq!(parse_date("2024-01-15 00:00:00").unwrap(), date(2024, 1, 15));
}

#[test]
fn test_expense_date_from_stored() {
    assert_eq!(
        ExpenseDate::from_stored("2024-01-15"),
        ExpenseDate::Valid(date(2024, 1, 15))
    );
    let bad = ExpenseDate::from_stored("15th Jan");
    assert_eq!(bad, ExpenseDate::Malformed("15th Jan".into()));
    assert!(bad.valid().is_none());
    assert_eq!(bad.to_stored(), "15th Jan");
}

#[test]
fn test_expense_record_create_assigns_unique_ids() {
    let input = NewExpense::parse("2024-01-15", "Food", "10", "").unwrap();
    let a = ExpenseRecord::create(input.clone());
    let b = ExpenseRecord::create(input);
    assert_ne!(a.id, b.id);
    assert_eq!(a.date, ExpenseDate::Valid(date(2024, 1, 15)));
}

#[test]
fn test_expense_id_prefix_and_roundtrip() {
    let id = ExpenseId::generate();
    assert!(id.matches_prefix(&id.short()));
    assert!(!id.matches_prefix(""));
    assert_eq!(ExpenseId::parse(&id.to_string()).unwrap(), id);
    assert!(ExpenseId::parse("not-an-id").is_err());
}

// ── Budgets ───────────────────────────────────────────────────

#[test]
fn test_budget_entry_rejects_negative() {
    let cat = Category::new("Food").unwrap();
    assert!(BudgetEntry::new(cat.clone(), dec!(-1)).is_err());
    assert!(BudgetEntry::new(cat, Decimal::ZERO).is_ok());
}

#[test]
fn test_budget_entry_rejects_limit_above_max() {
    let cat = Category::new("Rent").unwrap();
    assert!(BudgetEntry::new(cat.clone(), MAX_AMOUNT).is_ok());
    let err = BudgetEntry::new(cat, MAX_AMOUNT + dec!(1)).unwrap_err();
    assert!(matches!(&err, CoreError::Validation(msg) if msg.starts_with("budget for Rent")));
}

#[test]
fn test_budgets_one_entry_per_category() {
    let mut budgets = Budgets::new();
    let food = Category::new("Food").unwrap();
    assert!(budgets
        .set(BudgetEntry::new(food.clone(), dec!(500)).unwrap())
        .is_none());
    let previous = budgets.set(BudgetEntry::new(Category::new("FOOD").unwrap(), dec!(800)).unwrap());
    assert_eq!(previous, Some(dec!(500)));
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets.get(&food), Some(dec!(800)));
    // Latest spelling wins.
    assert_eq!(budgets.iter().next().unwrap().category.as_str(), "FOOD");
}

#[test]
fn test_budgets_remove() {
    let food = Category::new("Food").unwrap();
    let mut budgets: Budgets = vec![BudgetEntry::new(food.clone(), dec!(100)).unwrap()]
        .into_iter()
        .collect();
    let removed = budgets.remove(&food).unwrap();
    assert_eq!(removed.monthly_limit, dec!(100));
    assert!(budgets.is_empty());
    assert!(budgets.remove(&food).is_none());
}

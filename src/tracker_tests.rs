#![allow(clippy::unwrap_used)]

use super::*;
use crate::db::Database;
use rust_decimal_macros::dec;

fn tracker() -> Tracker<Database> {
    Tracker::new(Database::open_in_memory().unwrap())
}

fn input(date: &str, category: &str, amount: &str) -> NewExpense {
    NewExpense::parse(date, category, amount, "").unwrap()
}

fn cat(name: &str) -> Category {
    Category::new(name).unwrap()
}

// ── Expenses ──────────────────────────────────────────────────

#[test]
fn test_add_expense_persists() {
    let mut t = tracker();
    let record = t.add_expense(input("2024-01-10", "Food", "100")).unwrap();
    let all = t.expenses().unwrap();
    assert_eq!(all, vec![record]);
}

#[test]
fn test_edit_expense_replaces_in_full() {
    let mut t = tracker();
    let record = t.add_expense(input("2024-01-10", "Food", "100")).unwrap();
    let edited = t
        .edit_expense(record.id, NewExpense::parse("2024-02-01", "Travel", "40", "bus").unwrap())
        .unwrap();
    assert_eq!(edited.id, record.id);
    let all = t.expenses().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].category, cat("Travel"));
    assert_eq!(all[0].amount, dec!(40));
    assert_eq!(all[0].description, "bus");
}

#[test]
fn test_edit_unknown_id_is_not_found() {
    let mut t = tracker();
    t.add_expense(input("2024-01-10", "Food", "100")).unwrap();
    let before = t.expenses().unwrap();
    let err = t
        .edit_expense(ExpenseId::generate(), input("2024-01-10", "Food", "1"))
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
    assert_eq!(t.expenses().unwrap(), before);
}

#[test]
fn test_delete_expense() {
    let mut t = tracker();
    let keep = t.add_expense(input("2024-01-10", "Food", "100")).unwrap();
    let gone = t.add_expense(input("2024-01-11", "Food", "50")).unwrap();
    let removed = t.delete_expense(gone.id).unwrap();
    assert_eq!(removed.id, gone.id);
    assert_eq!(t.expenses().unwrap(), vec![keep]);
}

#[test]
fn test_delete_unknown_id_leaves_store_unchanged() {
    let mut t = tracker();
    t.add_expense(input("2024-01-10", "Food", "100")).unwrap();
    t.add_expense(input("2024-02-10", "Rent", "900")).unwrap();
    let before = t.store().load_expenses().unwrap();

    let err = t.delete_expense(ExpenseId::generate()).unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
    assert_eq!(t.store().load_expenses().unwrap(), before);
}

#[test]
fn test_expenses_in_month_sorted_newest_first() {
    let mut t = tracker();
    t.add_expense(input("2024-01-05", "Food", "1")).unwrap();
    t.add_expense(input("2024-01-20", "Food", "2")).unwrap();
    t.add_expense(input("2024-02-01", "Food", "3")).unwrap();
    let jan = t.expenses_in_month(YearMonth::new(2024, 1).unwrap()).unwrap();
    let amounts: Vec<_> = jan.iter().map(|r| r.amount).collect();
    assert_eq!(amounts, vec![dec!(2), dec!(1)]);
}

#[test]
fn test_import_expenses_appends() {
    let mut t = tracker();
    t.add_expense(input("2024-01-05", "Food", "1")).unwrap();
    let count = t
        .import_expenses(vec![input("2024-01-06", "Food", "2"), input("2024-01-07", "Food", "3")])
        .unwrap();
    assert_eq!(count, 2);
    assert_eq!(t.expenses().unwrap().len(), 3);
    assert_eq!(t.import_expenses(Vec::new()).unwrap(), 0);
}

#[test]
fn test_find_expense_by_full_id_and_prefix() {
    let mut t = tracker();
    let record = t.add_expense(input("2024-01-05", "Food", "1")).unwrap();
    assert_eq!(t.find_expense(&record.id.to_string()).unwrap(), record);
    assert_eq!(t.find_expense(&record.id.short()).unwrap(), record);
}

#[test]
fn test_find_expense_short_prefix_rejected() {
    let t = tracker();
    assert!(matches!(t.find_expense("ab"), Err(CoreError::Validation(_))));
}

#[test]
fn test_find_expense_no_match() {
    let mut t = tracker();
    t.add_expense(input("2024-01-05", "Food", "1")).unwrap();
    // Not hex, so no uuid can start with it.
    assert!(matches!(t.find_expense("zzzz"), Err(CoreError::NotFound(_))));
}

// ── Budgets ───────────────────────────────────────────────────

#[test]
fn test_set_budget_upserts() {
    let mut t = tracker();
    assert_eq!(t.set_budget(cat("Food"), dec!(500)).unwrap(), None);
    assert_eq!(t.set_budget(cat("food"), dec!(750)).unwrap(), Some(dec!(500)));
    let budgets = t.budgets().unwrap();
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets.get(&cat("Food")), Some(dec!(750)));
}

#[test]
fn test_set_budget_negative_rejected() {
    let mut t = tracker();
    let err = t.set_budget(cat("Food"), dec!(-1)).unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    assert!(t.budgets().unwrap().is_empty());
}

#[test]
fn test_remove_budget() {
    let mut t = tracker();
    t.set_budget(cat("Food"), dec!(500)).unwrap();
    let removed = t.remove_budget(&cat("Food")).unwrap();
    assert_eq!(removed.monthly_limit, dec!(500));
    assert!(matches!(
        t.remove_budget(&cat("Food")),
        Err(CoreError::NotFound(_))
    ));
}

#[test]
fn test_categories_union_sorted() {
    let mut t = tracker();
    t.add_expense(input("2024-01-05", "Travel", "1")).unwrap();
    t.add_expense(input("2024-01-06", "food", "1")).unwrap();
    t.set_budget(cat("Food"), dec!(10)).unwrap();
    t.set_budget(cat("Bills"), dec!(10)).unwrap();
    let names: Vec<String> = t
        .categories()
        .unwrap()
        .iter()
        .map(|c| c.as_str().to_lowercase())
        .collect();
    assert_eq!(names, vec!["bills", "food", "travel"]);
}

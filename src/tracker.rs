//! Expense and budget bookkeeping over an injected [`Store`].
//!
//! Nothing is cached: every call reloads the full state, and every mutation
//! writes the full collection back after modifying it.

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::{CoreError, CoreResult};
use crate::models::*;
use crate::store::Store;

/// Shortest id prefix accepted when addressing a record.
pub(crate) const MIN_ID_PREFIX: usize = 4;

pub(crate) struct Tracker<S: Store> {
    store: S,
}

impl<S: Store> Tracker<S> {
    pub(crate) fn new(store: S) -> Self {
        Self { store }
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    // ── Expenses ──────────────────────────────────────────────

    pub(crate) fn expenses(&self) -> CoreResult<Vec<ExpenseRecord>> {
        self.store.load_expenses()
    }

    /// Records dated in `month`, newest first. Malformed dates are excluded.
    pub(crate) fn expenses_in_month(&self, month: YearMonth) -> CoreResult<Vec<ExpenseRecord>> {
        let mut records: Vec<_> = self
            .store
            .load_expenses()?
            .into_iter()
            .filter(|r| r.date.valid().is_some_and(|d| month.contains(d)))
            .collect();
        records.sort_by(|a, b| b.date.valid().cmp(&a.date.valid()));
        Ok(records)
    }

    pub(crate) fn add_expense(&mut self, input: NewExpense) -> CoreResult<ExpenseRecord> {
        let mut records = self.store.load_expenses()?;
        let record = ExpenseRecord::create(input);
        records.push(record.clone());
        self.store.save_expenses(&records)?;
        info!(id = %record.id, category = %record.category, amount = %record.amount, "expense added");
        Ok(record)
    }

    /// Append many records at once (one read, one write).
    pub(crate) fn import_expenses(&mut self, inputs: Vec<NewExpense>) -> CoreResult<usize> {
        if inputs.is_empty() {
            return Ok(0);
        }
        let mut records = self.store.load_expenses()?;
        let count = inputs.len();
        records.extend(inputs.into_iter().map(ExpenseRecord::create));
        self.store.save_expenses(&records)?;
        info!(count, "expenses imported");
        Ok(count)
    }

    /// Replace the record with `id` in full, keeping its id.
    pub(crate) fn edit_expense(
        &mut self,
        id: ExpenseId,
        input: NewExpense,
    ) -> CoreResult<ExpenseRecord> {
        let mut records = self.store.load_expenses()?;
        let slot = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| CoreError::not_found(format!("expense {id}")))?;
        *slot = ExpenseRecord::with_id(id, input);
        let updated = slot.clone();
        self.store.save_expenses(&records)?;
        info!(%id, "expense updated");
        Ok(updated)
    }

    pub(crate) fn delete_expense(&mut self, id: ExpenseId) -> CoreResult<ExpenseRecord> {
        let mut records = self.store.load_expenses()?;
        let index = records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| CoreError::not_found(format!("expense {id}")))?;
        let removed = records.remove(index);
        self.store.save_expenses(&records)?;
        info!(%id, "expense deleted");
        Ok(removed)
    }

    /// Resolve a full id or a unique prefix of at least [`MIN_ID_PREFIX`] chars.
    pub(crate) fn find_expense(&self, id_or_prefix: &str) -> CoreResult<ExpenseRecord> {
        let records = self.store.load_expenses()?;
        if let Ok(id) = ExpenseId::parse(id_or_prefix) {
            return records
                .into_iter()
                .find(|r| r.id == id)
                .ok_or_else(|| CoreError::not_found(format!("expense {id}")));
        }

        let prefix = id_or_prefix.trim();
        if prefix.chars().count() < MIN_ID_PREFIX {
            return Err(CoreError::validation(format!(
                "id prefix '{prefix}' is too short (need at least {MIN_ID_PREFIX} characters)"
            )));
        }
        let mut matches = records.into_iter().filter(|r| r.id.matches_prefix(prefix));
        match (matches.next(), matches.next()) {
            (Some(record), None) => Ok(record),
            (None, _) => Err(CoreError::not_found(format!("expense {prefix}"))),
            (Some(_), Some(_)) => Err(CoreError::validation(format!(
                "id prefix '{prefix}' matches more than one expense"
            ))),
        }
    }

    // ── Budgets ───────────────────────────────────────────────

    pub(crate) fn budgets(&self) -> CoreResult<Budgets> {
        self.store.load_budgets()
    }

    /// Insert or replace the monthly limit for `category`.
    pub(crate) fn set_budget(
        &mut self,
        category: Category,
        monthly_limit: Decimal,
    ) -> CoreResult<Option<Decimal>> {
        let entry = BudgetEntry::new(category, monthly_limit)?;
        let mut budgets = self.store.load_budgets()?;
        let category = entry.category.clone();
        let previous = budgets.set(entry);
        self.store.save_budgets(&budgets)?;
        info!(%category, limit = %monthly_limit, "budget set");
        Ok(previous)
    }

    pub(crate) fn remove_budget(&mut self, category: &Category) -> CoreResult<BudgetEntry> {
        let mut budgets = self.store.load_budgets()?;
        let removed = budgets
            .remove(category)
            .ok_or_else(|| CoreError::not_found(format!("budget for {category}")))?;
        self.store.save_budgets(&budgets)?;
        info!(%category, "budget removed");
        Ok(removed)
    }

    /// Every category seen in records or budgets, sorted, without duplicates.
    pub(crate) fn categories(&self) -> CoreResult<Vec<Category>> {
        let mut categories: Vec<Category> = self
            .store
            .load_expenses()?
            .into_iter()
            .map(|r| r.category)
            .collect();
        categories.extend(self.store.load_budgets()?.categories().cloned());
        categories.sort();
        categories.dedup();
        debug!(count = categories.len(), "categories listed");
        Ok(categories)
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;

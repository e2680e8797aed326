use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::{check_amount, Category};
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BudgetEntry {
    pub(crate) category: Category,
    pub(crate) monthly_limit: Decimal,
}

impl BudgetEntry {
    pub(crate) fn new(category: Category, monthly_limit: Decimal) -> CoreResult<Self> {
        let monthly_limit = check_amount(monthly_limit).map_err(|e| match e {
            CoreError::Validation(msg) => {
                CoreError::validation(format!("budget for {category}: {msg}"))
            }
            other => other,
        })?;
        Ok(Self {
            category,
            monthly_limit,
        })
    }
}

/// Monthly limits keyed by category; at most one entry per category.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Budgets {
    entries: BTreeMap<Category, Decimal>,
}

impl Budgets {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; returns the previous limit if there was one.
    pub(crate) fn set(&mut self, entry: BudgetEntry) -> Option<Decimal> {
        // Re-insert the key so a respelled category replaces the stored spelling.
        let previous = self.entries.remove(&entry.category);
        self.entries.insert(entry.category, entry.monthly_limit);
        previous
    }

    pub(crate) fn remove(&mut self, category: &Category) -> Option<BudgetEntry> {
        self.entries
            .remove_entry(category)
            .map(|(category, monthly_limit)| BudgetEntry {
                category,
                monthly_limit,
            })
    }

    pub(crate) fn get(&self, category: &Category) -> Option<Decimal> {
        self.entries.get(category).copied()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = BudgetEntry> + '_ {
        self.entries.iter().map(|(category, limit)| BudgetEntry {
            category: category.clone(),
            monthly_limit: *limit,
        })
    }

    pub(crate) fn categories(&self) -> impl Iterator<Item = &Category> {
        self.entries.keys()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<BudgetEntry> for Budgets {
    fn from_iter<I: IntoIterator<Item = BudgetEntry>>(iter: I) -> Self {
        let mut budgets = Budgets::new();
        for entry in iter {
            budgets.set(entry);
        }
        budgets
    }
}

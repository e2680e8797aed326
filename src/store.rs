use crate::error::CoreResult;
use crate::models::{Budgets, ExpenseRecord};

/// Whole-collection persistence. Callers read the full state before
/// computing anything and write the full state back after a mutation.
pub(crate) trait Store {
    fn load_expenses(&self) -> CoreResult<Vec<ExpenseRecord>>;

    /// Replace every stored record with `records`.
    fn save_expenses(&mut self, records: &[ExpenseRecord]) -> CoreResult<()>;

    fn load_budgets(&self) -> CoreResult<Budgets>;

    /// Replace every stored budget with `budgets`.
    fn save_budgets(&mut self, budgets: &Budgets) -> CoreResult<()>;
}

mod budget;
mod category;
mod expense;
mod month;

pub(crate) use budget::{BudgetEntry, Budgets};
pub(crate) use category::Category;
pub(crate) use expense::{
    check_amount, parse_amount, parse_date, ExpenseDate, ExpenseId, ExpenseRecord, NewExpense,
};
pub(crate) use month::YearMonth;

#[cfg(test)]
mod tests;

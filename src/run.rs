mod cli;

use anyhow::Result;

use crate::config::Config;
use crate::models::YearMonth;
use crate::store::Store;
use crate::tracker::Tracker;

pub(crate) use cli::as_cli;

/// Overview shown when no command is given: this month's summary, the
/// insights for it and next month's forecast.
pub(crate) fn as_dashboard<S: Store>(tracker: &Tracker<S>, config: &Config) -> Result<()> {
    let records = tracker.expenses()?;
    let budgets = tracker.budgets()?;
    let month = YearMonth::current();

    cli::print_month_summary(&records, &budgets, month, &config.currency_symbol);
    println!();
    cli::print_insights(&records, &budgets, month, &config.currency_symbol);
    println!();
    cli::print_forecast(&records, &config.currency_symbol)?;
    println!();
    println!("Run `spendcast help` for commands.");
    Ok(())
}

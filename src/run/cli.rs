use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

use crate::analysis::{
    aggregate, budget_statuses, category_totals, compute_insights, forecast_next, summarize,
    top_expenses, Bucket, DateRange, Granularity, MonthlyTotal,
};
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::export::{render_report, write_category_summary_csv, write_expenses_csv};
use crate::format::{bar, format_amount, format_percent, truncate};
use crate::import::ExpenseCsvImporter;
use crate::models::{
    parse_amount, parse_date, Budgets, Category, ExpenseRecord, NewExpense, YearMonth,
};
use crate::store::Store;
use crate::tracker::Tracker;

/// Flags that consume the following argument.
const VALUE_FLAGS: &[&str] = &["--month", "--from", "--to", "-n", "--csv", "--summary-csv"];
const DEFAULT_TOP: usize = 10;
const BAR_WIDTH: usize = 24;
const TOP_CATEGORIES: usize = 3;

pub(crate) fn as_cli<S: Store>(
    args: &[String],
    tracker: &mut Tracker<S>,
    config: &Config,
) -> Result<()> {
    let rest = &args[2..];
    match args[1].as_str() {
        "add" | "a" => cli_add(rest, tracker, config),
        "edit" => cli_edit(rest, tracker, config),
        "delete" | "rm" => cli_delete(rest, tracker, config),
        "list" | "ls" => cli_list(rest, tracker, config),
        "categories" => cli_categories(tracker, config),
        "budget" => cli_budget(rest, tracker, config),
        "budgets" => cli_budgets(rest, tracker, config),
        "summary" | "s" => cli_summary(rest, tracker, config),
        "trend" => cli_trend(tracker, config),
        "top" => cli_top(rest, tracker, config),
        "forecast" | "f" => cli_forecast(tracker, config),
        "insights" | "i" => cli_insights(rest, tracker, config),
        "report" => cli_report(rest, tracker, config),
        "import" => cli_import(rest, tracker),
        "export" => cli_export(rest, tracker),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("spendcast {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("Spendcast - local expense tracker with budgets and a spending forecast");
    println!();
    println!("Usage: spendcast [command]");
    println!();
    println!("Commands:");
    println!("  (none)                                  Dashboard for the current month");
    println!("  add <date> <category> <amount> [note]   Record an expense");
    println!("  edit <id> <date> <category> <amount> [note]");
    println!("                                          Replace an expense");
    println!("  delete <id>                             Delete an expense (id or prefix)");
    println!("  list                                    List expenses, newest first");
    println!("    --month <YYYY-MM>                     Month to list (default: current)");
    println!("  categories                              List known categories");
    println!("  budget set <category> <amount>          Set a monthly budget");
    println!("  budget rm <category>                    Remove a budget");
    println!("  budgets [--month <YYYY-MM>]             Budget vs actual");
    println!("  summary [YYYY-MM]                       Monthly summary");
    println!("  trend                                   Monthly totals");
    println!("  top [-n N] [--from D] [--to D]          Largest expenses");
    println!("  forecast                                Project next month's spending");
    println!("  insights [YYYY-MM]                      Budget and trend findings");
    println!("  report [--from D] [--to D]              Text report over a date range");
    println!("    --csv <path>                          Also write the expenses as CSV");
    println!("    --summary-csv <path>                  Also write the category breakdown");
    println!("  import <file.csv>                       Import expenses from CSV");
    println!("  export [path]                           Export expenses to CSV");
    println!("    --month <YYYY-MM>                     Month to export (default: current)");
    println!("  --help, -h                              Show this help");
    println!("  --version, -V                           Show version");
    println!();
    println!("Dates are YYYY-MM-DD. Ranges default to the full history.");
}

// ── Expenses ─────────────────────────────────────────────────

fn cli_add<S: Store>(args: &[String], tracker: &mut Tracker<S>, config: &Config) -> Result<()> {
    let [date, category, amount, note @ ..] = args else {
        anyhow::bail!("Usage: spendcast add <YYYY-MM-DD> <category> <amount> [description]");
    };
    let input = NewExpense::parse(date, category, amount, &note.join(" "))?;
    let record = tracker.add_expense(input)?;
    println!(
        "Added {} {} {} on {}",
        record.id.short(),
        record.category,
        format_amount(record.amount, &config.currency_symbol),
        record.date
    );
    Ok(())
}

fn cli_edit<S: Store>(args: &[String], tracker: &mut Tracker<S>, config: &Config) -> Result<()> {
    let [id, date, category, amount, note @ ..] = args else {
        anyhow::bail!(
            "Usage: spendcast edit <id> <YYYY-MM-DD> <category> <amount> [description]"
        );
    };
    let existing = tracker.find_expense(id)?;
    let input = NewExpense::parse(date, category, amount, &note.join(" "))?;
    let record = tracker.edit_expense(existing.id, input)?;
    println!(
        "Updated {}: {} {} on {}",
        record.id.short(),
        record.category,
        format_amount(record.amount, &config.currency_symbol),
        record.date
    );
    Ok(())
}

fn cli_delete<S: Store>(args: &[String], tracker: &mut Tracker<S>, config: &Config) -> Result<()> {
    let [id] = args else {
        anyhow::bail!("Usage: spendcast delete <id>");
    };
    let existing = tracker.find_expense(id)?;
    let removed = tracker.delete_expense(existing.id)?;
    println!(
        "Deleted {} ({} {} on {})",
        removed.id.short(),
        removed.category,
        format_amount(removed.amount, &config.currency_symbol),
        removed.date
    );
    Ok(())
}

fn cli_list<S: Store>(args: &[String], tracker: &mut Tracker<S>, config: &Config) -> Result<()> {
    let month = month_flag(args)?;
    let records = tracker.expenses_in_month(month)?;
    if records.is_empty() {
        println!("No expenses for {month}");
        return Ok(());
    }
    print_expense_table(&records, &config.currency_symbol);
    let total: Decimal = records.iter().map(|r| r.amount).sum();
    println!("{}", "─".repeat(72));
    println!(
        "{} expense(s), total {}",
        records.len(),
        format_amount(total, &config.currency_symbol)
    );
    Ok(())
}

/// Every known category with what was spent on it this month.
fn cli_categories<S: Store>(tracker: &mut Tracker<S>, config: &Config) -> Result<()> {
    let categories = tracker.categories()?;
    if categories.is_empty() {
        println!("No categories yet");
        return Ok(());
    }
    let month = YearMonth::current();
    let records = tracker.expenses()?;
    let totals = category_totals(&records, Bucket::Month(month));

    println!("{:<24} {:>14} {:>6}", "Category", month.to_string(), "Count");
    for category in &categories {
        let (total, count) = totals
            .iter()
            .find(|t| &t.category == category)
            .map(|t| (t.total, t.count))
            .unwrap_or((Decimal::ZERO, 0));
        println!(
            "{:<24} {:>14} {:>6}",
            truncate(category.as_str(), 24),
            format_amount(total, &config.currency_symbol),
            count
        );
    }
    Ok(())
}

fn print_expense_table(records: &[ExpenseRecord], currency: &str) {
    println!(
        "{:<9} {:<10} {:<18} {:>14}  Description",
        "ID", "Date", "Category", "Amount"
    );
    println!("{}", "─".repeat(72));
    for r in records {
        println!(
            "{:<9} {:<10} {:<18} {:>14}  {}",
            r.id.short(),
            r.date.to_string(),
            truncate(r.category.as_str(), 18),
            format_amount(r.amount, currency),
            truncate(&r.description, 30)
        );
    }
}

// ── Budgets ──────────────────────────────────────────────────

fn cli_budget<S: Store>(args: &[String], tracker: &mut Tracker<S>, config: &Config) -> Result<()> {
    let currency = &config.currency_symbol;
    match args {
        [action, category, amount] if action == "set" => {
            let category = Category::new(category)?;
            let limit = parse_amount(amount)?;
            let previous = tracker.set_budget(category.clone(), limit)?;
            match previous {
                Some(old) => println!(
                    "Budget for {category}: {} (was {})",
                    format_amount(limit, currency),
                    format_amount(old, currency)
                ),
                None => println!("Budget for {category}: {}", format_amount(limit, currency)),
            }
            Ok(())
        }
        [action, category] if action == "rm" || action == "remove" => {
            let removed = tracker.remove_budget(&Category::new(category)?)?;
            println!(
                "Removed budget for {} ({})",
                removed.category,
                format_amount(removed.monthly_limit, currency)
            );
            Ok(())
        }
        _ => anyhow::bail!("Usage: spendcast budget set <category> <amount> | budget rm <category>"),
    }
}

fn cli_budgets<S: Store>(args: &[String], tracker: &mut Tracker<S>, config: &Config) -> Result<()> {
    let month = month_flag(args)?;
    let records = tracker.expenses()?;
    let budgets = tracker.budgets()?;
    print_budget_table(&records, &budgets, month, &config.currency_symbol);
    Ok(())
}

fn print_budget_table(
    records: &[ExpenseRecord],
    budgets: &Budgets,
    month: YearMonth,
    currency: &str,
) {
    let report = budget_statuses(records, budgets, month);
    if report.statuses.is_empty() {
        println!("No budgets or spending for {month}");
        return;
    }
    println!("Budgets — {}", report.month);
    println!(
        "  {:<20} {:>14} {:>14} {:>14} {:>8}  Status",
        "Category", "Spent", "Budget", "Left", "Used"
    );
    for s in &report.statuses {
        let limit = s
            .limit
            .map(|l| format_amount(l, currency))
            .unwrap_or_else(|| "-".into());
        let left = s
            .remaining
            .map(|r| format_amount(r, currency))
            .unwrap_or_else(|| "-".into());
        let used = s.ratio.map(format_percent).unwrap_or_else(|| "-".into());
        println!(
            "  {:<20} {:>14} {:>14} {:>14} {:>8}  {}",
            truncate(s.category.as_str(), 20),
            format_amount(s.actual, currency),
            limit,
            left,
            used,
            s.level
        );
    }
    let over = report.over_budget().count();
    if over > 0 {
        println!("  {over} categor{} over budget", if over == 1 { "y" } else { "ies" });
    }
    warn_skipped(report.skipped);
}

// ── Analysis ─────────────────────────────────────────────────

fn cli_summary<S: Store>(args: &[String], tracker: &mut Tracker<S>, config: &Config) -> Result<()> {
    let month = match positional(args).first() {
        Some(raw) => YearMonth::parse(raw)?,
        None => YearMonth::current(),
    };
    let records = tracker.expenses()?;
    let budgets = tracker.budgets()?;
    print_month_summary(&records, &budgets, month, &config.currency_symbol);
    Ok(())
}

pub(super) fn print_month_summary(
    records: &[ExpenseRecord],
    budgets: &Budgets,
    month: YearMonth,
    currency: &str,
) {
    let summary = summarize(records, DateRange::month(month));

    println!("Spendcast — {month}");
    println!("{}", "─".repeat(48));
    println!("  Spent:        {}", format_amount(summary.total, currency));
    println!("  Expenses:     {}", summary.count);
    println!("  Average:      {}", format_amount(summary.average, currency));
    println!(
        "  Per day:      {}",
        format_amount(summary.total / Decimal::from(month.days()), currency)
    );

    if !summary.categories.is_empty() {
        println!();
        println!("By category:");
        let max = summary.categories[0].total;
        for cat in &summary.categories {
            println!(
                "  {:<20} {:>14} {:>7}  {}",
                truncate(cat.category.as_str(), 20),
                format_amount(cat.total, currency),
                format_percent(cat.share),
                bar(cat.total, max, BAR_WIDTH)
            );
        }

        println!();
        println!("Daily trend:");
        let daily = aggregate(records, Granularity::Day);
        let days: Vec<(NaiveDate, Decimal)> = daily
            .period_totals
            .iter()
            .filter_map(|(bucket, total)| match bucket {
                Bucket::Day(d) if month.contains(*d) => Some((*d, *total)),
                _ => None,
            })
            .collect();
        let peak = days.iter().map(|(_, t)| *t).max().unwrap_or(Decimal::ZERO);
        for (day, total) in &days {
            println!(
                "  {} {:>14}  {}",
                day.format("%Y-%m-%d"),
                format_amount(*total, currency),
                bar(*total, peak, BAR_WIDTH)
            );
        }
    }

    if !budgets.is_empty() {
        println!();
        print_budget_table(records, budgets, month, currency);
    } else {
        warn_skipped(summary.skipped);
    }
}

fn cli_trend<S: Store>(tracker: &mut Tracker<S>, config: &Config) -> Result<()> {
    let records = tracker.expenses()?;
    let aggregated = aggregate(&records, Granularity::Month);
    let monthly = aggregated.monthly_totals();
    if monthly.is_empty() {
        println!("No expenses recorded yet");
        return Ok(());
    }
    let peak = monthly.iter().map(|m| m.total).max().unwrap_or(Decimal::ZERO);
    println!("Monthly spending");
    for m in &monthly {
        println!(
            "  {} {:>14}  {}",
            m.month,
            format_amount(m.total, &config.currency_symbol),
            bar(m.total, peak, BAR_WIDTH)
        );
    }
    println!(
        "  {} expense(s) over {} month(s), total {}",
        aggregated.record_count,
        monthly.len(),
        format_amount(aggregated.grand_total, &config.currency_symbol)
    );
    warn_skipped(aggregated.skipped);
    Ok(())
}

fn cli_top<S: Store>(args: &[String], tracker: &mut Tracker<S>, config: &Config) -> Result<()> {
    let n = match flag(args, "-n") {
        Some(raw) => raw
            .parse::<usize>()
            .with_context(|| format!("Invalid count: {raw}"))?,
        None => DEFAULT_TOP,
    };
    let records = tracker.expenses()?;
    let Some(range) = range_flags(args, &records)? else {
        println!("No expenses recorded yet");
        return Ok(());
    };
    let top = top_expenses(&records, range, n);
    if top.is_empty() {
        println!("No expenses between {range}");
        return Ok(());
    }
    println!("Top {} expense(s), {range}", top.len());
    print_expense_table(&top, &config.currency_symbol);
    Ok(())
}

fn cli_forecast<S: Store>(tracker: &mut Tracker<S>, config: &Config) -> Result<()> {
    let records = tracker.expenses()?;
    print_forecast(&records, &config.currency_symbol)
}

pub(super) fn print_forecast(records: &[ExpenseRecord], currency: &str) -> Result<()> {
    let monthly = aggregate(records, Granularity::Month).monthly_totals();
    match forecast_next(&monthly) {
        Ok(f) => {
            let direction = if f.slope.is_sign_negative() { "-" } else { "+" };
            println!(
                "Forecast for {}: {} (trend {direction}{}/month over {} months)",
                f.month,
                format_amount(f.projected, currency),
                format_amount(f.slope.abs(), currency),
                f.months_used
            );
            println!(
                "  Fit: {} + {} x month",
                f.intercept.round_dp(2),
                f.slope.round_dp(2)
            );
            if f.clamped {
                println!(
                    "  The trend line gives {}; held at zero.",
                    f.raw_projection.round_dp(2)
                );
            }
            Ok(())
        }
        Err(CoreError::InsufficientData { months, required }) => {
            println!(
                "Forecast unavailable: {months} month(s) of history, need at least {required}"
            );
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn cli_insights<S: Store>(
    args: &[String],
    tracker: &mut Tracker<S>,
    config: &Config,
) -> Result<()> {
    let month = match positional(args).first() {
        Some(raw) => YearMonth::parse(raw)?,
        None => YearMonth::current(),
    };
    let records = tracker.expenses()?;
    let budgets = tracker.budgets()?;
    print_insights(&records, &budgets, month, &config.currency_symbol);
    Ok(())
}

pub(super) fn print_insights(
    records: &[ExpenseRecord],
    budgets: &Budgets,
    month: YearMonth,
    currency: &str,
) {
    let aggregated = aggregate(records, Granularity::Month);
    let current = aggregated.month_snapshot(month);
    let previous = aggregated.month_snapshot(month.prev());
    let history: Vec<MonthlyTotal> = aggregated
        .monthly_totals()
        .into_iter()
        .filter(|m| m.month <= month)
        .collect();
    let findings = compute_insights(&current, Some(&previous), budgets, &history);
    if findings.is_empty() {
        println!("No insights for {month}");
    } else {
        println!("Insights — {month} ({} expense(s))", current.count);
        for finding in &findings {
            println!(
                "  [{:<7}] {:<13} {}",
                finding.severity,
                finding.rule.as_str(),
                finding.message
            );
        }
    }

    let Some(range) = DateRange::spanning(records) else {
        return;
    };
    let summary = summarize(records, range);
    println!();
    println!("Top categories ({range}):");
    for (rank, cat) in summary.top_categories(TOP_CATEGORIES).iter().enumerate() {
        println!(
            "  {}. {:<20} {:>14} {:>7}",
            rank + 1,
            truncate(cat.category.as_str(), 20),
            format_amount(cat.total, currency),
            format_percent(cat.share)
        );
    }
}

// ── Import / export ──────────────────────────────────────────

fn cli_import<S: Store>(args: &[String], tracker: &mut Tracker<S>) -> Result<()> {
    let [file_path] = args else {
        anyhow::bail!("Usage: spendcast import <file.csv>");
    };
    let path = Path::new(file_path);
    if !path.exists() {
        anyhow::bail!("File not found: {file_path}");
    }

    let report = ExpenseCsvImporter::read(path)
        .with_context(|| format!("Failed to import {file_path}"))?;
    for skipped in &report.skipped {
        eprintln!("  line {}: {}", skipped.line, skipped.reason);
    }
    let parsed = report.records.len();
    let count = tracker.import_expenses(report.records)?;
    info!(file = %file_path, imported = count, "import finished");
    println!(
        "Imported {count} of {} row(s) ({} skipped)",
        parsed + report.skipped.len(),
        report.skipped.len()
    );
    Ok(())
}

fn cli_export<S: Store>(args: &[String], tracker: &mut Tracker<S>) -> Result<()> {
    let month = month_flag(args)?;
    let output_path = positional(args)
        .first()
        .map(|a| shellexpand(a))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            format!("{home}/spendcast-export-{month}.csv")
        });

    let records = tracker.expenses()?;
    let count = write_csv_file(&output_path, |w| {
        write_expenses_csv(w, &records, DateRange::month(month))
    })?;
    if count == 0 {
        println!("No expenses for {month}");
    } else {
        println!("Exported {count} expense(s) to {output_path}");
    }
    Ok(())
}

fn cli_report<S: Store>(args: &[String], tracker: &mut Tracker<S>, config: &Config) -> Result<()> {
    let records = tracker.expenses()?;
    let Some(range) = range_flags(args, &records)? else {
        println!("No expenses recorded yet");
        return Ok(());
    };
    let summary = summarize(&records, range);
    print!("{}", render_report(&summary, &config.currency_symbol));

    if let Some(path) = flag(args, "--csv") {
        let path = shellexpand(path);
        let count = write_csv_file(&path, |w| write_expenses_csv(w, &records, range))?;
        println!("Wrote {count} expense(s) to {path}");
    }
    if let Some(path) = flag(args, "--summary-csv") {
        let path = shellexpand(path);
        write_csv_file(&path, |w| write_category_summary_csv(w, &summary))?;
        println!("Wrote category summary to {path}");
    }
    Ok(())
}

fn write_csv_file<T>(
    path: &str,
    write: impl FnOnce(BufWriter<File>) -> CoreResult<T>,
) -> Result<T> {
    let file = File::create(path).with_context(|| format!("Failed to create {path}"))?;
    let out = write(BufWriter::new(file)).with_context(|| format!("Failed to write {path}"))?;
    Ok(out)
}

// ── Argument helpers ─────────────────────────────────────────

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
}

/// Arguments that are neither flags nor flag values.
fn positional(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            iter.next();
        } else if !arg.starts_with('-') {
            out.push(arg.as_str());
        }
    }
    out
}

fn month_flag(args: &[String]) -> Result<YearMonth> {
    match flag(args, "--month") {
        Some(raw) => Ok(YearMonth::parse(raw)?),
        None => Ok(YearMonth::current()),
    }
}

/// Date range from `--from` / `--to`, each defaulting to the matching end of
/// the recorded history. `None` when there is no history to default to.
fn range_flags(args: &[String], records: &[ExpenseRecord]) -> Result<Option<DateRange>> {
    let from = flag(args, "--from").map(parse_date).transpose()?;
    let to = flag(args, "--to").map(parse_date).transpose()?;
    let span = DateRange::spanning(records);
    let (from, to) = match (from, to, span) {
        (Some(f), Some(t), _) => (f, t),
        (Some(f), None, Some(s)) => (f, s.to().max(f)),
        (None, Some(t), Some(s)) => (s.from().min(t), t),
        (None, None, Some(s)) => (s.from(), s.to()),
        (Some(d), None, None) | (None, Some(d), None) => (d, d),
        (None, None, None) => return Ok(None),
    };
    Ok(Some(DateRange::new(from, to)?))
}

pub(crate) fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}

fn warn_skipped(skipped: usize) {
    if skipped > 0 {
        eprintln!("Warning: {skipped} expense(s) have unreadable dates and were left out");
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;

//! CSV exports and the plain-text spending report.

use rust_decimal::Decimal;
use std::fmt::Write as _;
use std::io::Write;

use crate::analysis::{DateRange, RangeSummary};
use crate::error::CoreResult;
use crate::format::{format_amount, format_percent, truncate};
use crate::models::ExpenseRecord;

const EXPENSE_HEADER: [&str; 5] = ["id", "date", "category", "amount", "description"];
const SUMMARY_HEADER: [&str; 5] = ["category", "total", "count", "average", "share_percent"];

/// Write the records dated within `range`, newest first. Returns the number
/// of rows written. The columns read back through the CSV importer.
pub(crate) fn write_expenses_csv<W: Write>(
    writer: W,
    records: &[ExpenseRecord],
    range: DateRange,
) -> CoreResult<usize> {
    let mut rows: Vec<&ExpenseRecord> = records.iter().filter(|r| range.includes(r)).collect();
    rows.sort_by(|a, b| b.date.valid().cmp(&a.date.valid()));

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(EXPENSE_HEADER)?;
    for record in &rows {
        wtr.write_record([
            record.id.to_string(),
            record.date.to_stored(),
            record.category.to_string(),
            record.amount.to_string(),
            record.description.clone(),
        ])?;
    }
    wtr.flush()?;
    Ok(rows.len())
}

/// Write the per-category breakdown of a summary, largest category first.
pub(crate) fn write_category_summary_csv<W: Write>(
    writer: W,
    summary: &RangeSummary,
) -> CoreResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(SUMMARY_HEADER)?;
    for cat in &summary.categories {
        wtr.write_record([
            cat.category.to_string(),
            cat.total.round_dp(2).normalize().to_string(),
            cat.count.to_string(),
            cat.average.round_dp(2).normalize().to_string(),
            (cat.share * Decimal::ONE_HUNDRED)
                .round_dp(1)
                .normalize()
                .to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Render a summary as a fixed-width text report.
pub(crate) fn render_report(summary: &RangeSummary, currency: &str) -> String {
    let money = |v| format_amount(v, currency);
    let mut out = String::new();

    let _ = writeln!(out, "Spending report: {}", summary.range);
    let _ = writeln!(out, "{}", "─".repeat(56));
    let _ = writeln!(out, "  Total:              {}", money(summary.total));
    let _ = writeln!(out, "  Expenses:           {}", summary.count);
    let _ = writeln!(out, "  Average expense:    {}", money(summary.average));
    let _ = writeln!(
        out,
        "  Per active day:     {} ({} day{})",
        money(summary.average_per_active_day),
        summary.active_days,
        if summary.active_days == 1 { "" } else { "s" }
    );

    if summary.categories.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "No expenses in this period.");
    } else {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "  {:<24} {:>14} {:>6} {:>8}",
            "Category", "Total", "Count", "Share"
        );
        let _ = writeln!(out, "  {}", "─".repeat(55));
        for cat in &summary.categories {
            let _ = writeln!(
                out,
                "  {:<24} {:>14} {:>6} {:>8}",
                truncate(cat.category.as_str(), 24),
                money(cat.total),
                cat.count,
                format_percent(cat.share)
            );
        }
    }

    if summary.skipped > 0 {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Note: {} record(s) with unreadable dates were left out.",
            summary.skipped
        );
    }
    out
}

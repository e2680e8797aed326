//! Threshold rules that turn a month's totals into short findings.

use rust_decimal::{Decimal, MathematicalOps};
use std::collections::BTreeMap;

use super::aggregate::{MonthSnapshot, MonthlyTotal, NEAR_BUDGET_RATIO};
use crate::models::{Budgets, Category, YearMonth};

/// Months of history needed before spending consistency is judged.
pub(crate) const MIN_CONSISTENCY_MONTHS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Severity {
    Info,
    Warning,
}

impl Severity {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which rule produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InsightRule {
    BudgetOverrun,
    MonthOverMonth,
    Concentration,
    SmallExpenses,
    Consistency,
}

impl InsightRule {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::BudgetOverrun => "budget",
            Self::MonthOverMonth => "trend",
            Self::Concentration => "concentration",
            Self::SmallExpenses => "small",
            Self::Consistency => "consistency",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Finding {
    pub(crate) rule: InsightRule,
    pub(crate) severity: Severity,
    pub(crate) message: String,
}

impl Finding {
    fn new(rule: InsightRule, severity: Severity, message: String) -> Self {
        Self {
            rule,
            severity,
            message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InsightThresholds {
    /// Fraction of a budget at which an informational note is raised.
    pub(crate) near_budget_ratio: Decimal,
    /// Relative month-over-month change, as a fraction, beyond which spending
    /// counts as increased or decreased.
    pub(crate) change_ratio: Decimal,
    /// Share of the month total at which one category is flagged.
    pub(crate) concentration_share: Decimal,
    /// Expenses strictly below this amount count as small.
    pub(crate) small_expense_limit: Decimal,
    /// More small expenses than this in a month raises a note.
    pub(crate) small_expense_count: usize,
    /// Coefficient of variation of monthly totals above which spending is
    /// called inconsistent.
    pub(crate) variation_ratio: Decimal,
}

impl Default for InsightThresholds {
    fn default() -> Self {
        Self {
            near_budget_ratio: NEAR_BUDGET_RATIO,
            change_ratio: Decimal::new(10, 2),
            concentration_share: Decimal::new(5, 1),
            small_expense_limit: Decimal::ONE_HUNDRED,
            small_expense_count: 10,
            variation_ratio: Decimal::new(3, 1),
        }
    }
}

/// `history` holds the monthly totals the consistency rule looks at,
/// normally every month up to and including `current`.
pub(crate) fn compute_insights(
    current: &MonthSnapshot,
    previous: Option<&MonthSnapshot>,
    budgets: &Budgets,
    history: &[MonthlyTotal],
) -> Vec<Finding> {
    compute_insights_with(
        current,
        previous,
        budgets,
        history,
        &InsightThresholds::default(),
    )
}

/// Run every rule in order: budget overruns, month-over-month change,
/// category concentration, small expenses, then monthly consistency.
pub(crate) fn compute_insights_with(
    current: &MonthSnapshot,
    previous: Option<&MonthSnapshot>,
    budgets: &Budgets,
    history: &[MonthlyTotal],
    thresholds: &InsightThresholds,
) -> Vec<Finding> {
    let mut findings = budget_findings(current, budgets, thresholds);
    findings.extend(change_finding(current, previous, thresholds));
    findings.extend(concentration_finding(current, thresholds));
    findings.extend(small_expenses_finding(current, thresholds));
    findings.extend(consistency_finding(history, thresholds));
    findings
}

// ── Rules ─────────────────────────────────────────────────────

fn budget_findings(
    current: &MonthSnapshot,
    budgets: &Budgets,
    thresholds: &InsightThresholds,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    for entry in budgets.iter() {
        let spent = current.spent_on(&entry.category);
        let limit = entry.monthly_limit;
        if spent > limit {
            findings.push(Finding::new(
                InsightRule::BudgetOverrun,
                Severity::Warning,
                format!(
                    "{} is over budget: spent {} of {} ({} over)",
                    entry.category,
                    money(spent),
                    money(limit),
                    money(spent - limit)
                ),
            ));
        } else if !limit.is_zero() && spent / limit >= thresholds.near_budget_ratio {
            findings.push(Finding::new(
                InsightRule::BudgetOverrun,
                Severity::Info,
                format!(
                    "{} is at {}% of its budget: {} left of {}",
                    entry.category,
                    percent(spent / limit),
                    money(limit - spent),
                    money(limit)
                ),
            ));
        }
    }
    findings
}

fn change_finding(
    current: &MonthSnapshot,
    previous: Option<&MonthSnapshot>,
    thresholds: &InsightThresholds,
) -> Option<Finding> {
    let previous = previous?;
    if previous.total <= Decimal::ZERO {
        return None;
    }
    let versus = format!(
        "compared with {} ({} vs {})",
        previous.month,
        money(current.total),
        money(previous.total)
    );
    // Only a huge increase over a tiny previous total leaves decimal range.
    let change = (current.total - previous.total).checked_div(previous.total);
    let finding = match change {
        Some(change) if change < -thresholds.change_ratio => Finding::new(
            InsightRule::MonthOverMonth,
            Severity::Info,
            format!("Spending decreased by {}% {versus}", percent(change.abs())),
        ),
        Some(change) if change <= thresholds.change_ratio => Finding::new(
            InsightRule::MonthOverMonth,
            Severity::Info,
            format!("Spending is stable {versus}"),
        ),
        _ => {
            let by = change
                .and_then(|c| c.checked_mul(Decimal::ONE_HUNDRED))
                .map(|pct| format!(" by {}%", pct.round_dp(1).normalize()))
                .unwrap_or_default();
            Finding::new(
                InsightRule::MonthOverMonth,
                Severity::Warning,
                format!("Spending increased{by} {versus}"),
            )
        }
    };
    Some(finding)
}

fn concentration_finding(
    current: &MonthSnapshot,
    thresholds: &InsightThresholds,
) -> Option<Finding> {
    if current.total <= Decimal::ZERO {
        return None;
    }
    let (category, amount) = top_category(current)?;
    let share = amount / current.total;
    let finding = if share >= thresholds.concentration_share {
        Finding::new(
            InsightRule::Concentration,
            Severity::Warning,
            format!(
                "{category} makes up {}% of spending this month ({})",
                percent(share),
                money(amount)
            ),
        )
    } else {
        Finding::new(
            InsightRule::Concentration,
            Severity::Info,
            format!(
                "Top category is {category} at {}% of spending ({})",
                percent(share),
                money(amount)
            ),
        )
    };
    Some(finding)
}

fn small_expenses_finding(
    current: &MonthSnapshot,
    thresholds: &InsightThresholds,
) -> Option<Finding> {
    let small: Vec<Decimal> = current
        .amounts
        .iter()
        .copied()
        .filter(|amount| *amount < thresholds.small_expense_limit)
        .collect();
    if small.len() <= thresholds.small_expense_count {
        return None;
    }
    let total: Decimal = small.iter().sum();
    Some(Finding::new(
        InsightRule::SmallExpenses,
        Severity::Info,
        format!(
            "{} expenses under {} add up to {} this month",
            small.len(),
            money(thresholds.small_expense_limit),
            money(total)
        ),
    ))
}

fn consistency_finding(
    history: &[MonthlyTotal],
    thresholds: &InsightThresholds,
) -> Option<Finding> {
    let mut by_month: BTreeMap<YearMonth, Decimal> = BTreeMap::new();
    for entry in history {
        let slot = by_month.entry(entry.month).or_insert(Decimal::ZERO);
        *slot = slot.checked_add(entry.total)?;
    }
    let months = by_month.len();
    if months < MIN_CONSISTENCY_MONTHS {
        return None;
    }
    let variation = coefficient_of_variation(by_month.values().copied(), months)?;
    let finding = if variation > thresholds.variation_ratio {
        Finding::new(
            InsightRule::Consistency,
            Severity::Warning,
            format!(
                "Monthly spending varies widely: {}% variation across {months} months",
                percent(variation)
            ),
        )
    } else {
        Finding::new(
            InsightRule::Consistency,
            Severity::Info,
            format!(
                "Monthly spending is consistent: {}% variation across {months} months",
                percent(variation)
            ),
        )
    };
    Some(finding)
}

/// Sample standard deviation over the mean. Each value is scaled by the mean
/// first so the squares stay small. `None` when the mean is not positive.
fn coefficient_of_variation(
    values: impl Iterator<Item = Decimal> + Clone,
    n: usize,
) -> Option<Decimal> {
    let count = Decimal::from(n as u64);
    let mut sum = Decimal::ZERO;
    for value in values.clone() {
        sum = sum.checked_add(value)?;
    }
    let mean = sum.checked_div(count)?;
    if mean <= Decimal::ZERO {
        return None;
    }
    let mut squares = Decimal::ZERO;
    for value in values {
        let deviation = value.checked_div(mean)?.checked_sub(Decimal::ONE)?;
        squares = squares.checked_add(deviation.checked_mul(deviation)?)?;
    }
    squares.checked_div(count - Decimal::ONE)?.sqrt()
}

/// Largest category; ties go to the first name in order.
fn top_category(snapshot: &MonthSnapshot) -> Option<(&Category, Decimal)> {
    let mut best: Option<(&Category, Decimal)> = None;
    for (category, amount) in &snapshot.by_category {
        match best {
            Some((_, top)) if *amount <= top => {}
            _ => best = Some((category, *amount)),
        }
    }
    best
}

fn money(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

/// `ratio` as a percentage; callers pass ratios of a few units at most.
fn percent(ratio: Decimal) -> String {
    (ratio * Decimal::ONE_HUNDRED).round_dp(1).normalize().to_string()
}

#[cfg(test)]
#[path = "insights_tests.rs"]
mod tests;

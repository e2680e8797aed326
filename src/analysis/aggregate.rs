//! Grouped sums over expense records: per period, per category, budget
//! comparisons and range summaries.
//!
//! Records whose date did not parse never contribute to a total; they are
//! counted in `skipped` so callers can surface them.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::error::{CoreError, CoreResult};
use crate::models::{Budgets, Category, ExpenseRecord, YearMonth};

/// Fraction of a budget at which spending is reported as `Near`.
pub(crate) const NEAR_BUDGET_RATIO: Decimal = Decimal::from_parts(8, 0, 0, false, 1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Granularity {
    Day,
    Month,
}

/// One time bucket at a given granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum Bucket {
    Day(NaiveDate),
    Month(YearMonth),
}

impl Bucket {
    pub(crate) fn of(date: NaiveDate, granularity: Granularity) -> Self {
        match granularity {
            Granularity::Day => Self::Day(date),
            Granularity::Month => Self::Month(YearMonth::of(date)),
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Day(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Month(m) => write!(f, "{m}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MonthlyTotal {
    pub(crate) month: YearMonth,
    pub(crate) total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CategoryTotal {
    pub(crate) category: Category,
    pub(crate) total: Decimal,
    pub(crate) count: usize,
}

/// Totals for a single month, the input shape of the insight rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MonthSnapshot {
    pub(crate) month: YearMonth,
    pub(crate) total: Decimal,
    pub(crate) count: usize,
    pub(crate) by_category: BTreeMap<Category, Decimal>,
    /// Each expense amount in the month, in record order.
    pub(crate) amounts: Vec<Decimal>,
}

impl MonthSnapshot {
    #[cfg(test)]
    pub(crate) fn empty(month: YearMonth) -> Self {
        Self {
            month,
            total: Decimal::ZERO,
            count: 0,
            by_category: BTreeMap::new(),
            amounts: Vec::new(),
        }
    }

    pub(crate) fn spent_on(&self, category: &Category) -> Decimal {
        self.by_category
            .get(category)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AggregateResult {
    pub(crate) granularity: Granularity,
    pub(crate) period_totals: BTreeMap<Bucket, Decimal>,
    pub(crate) category_totals: BTreeMap<Bucket, BTreeMap<Category, Decimal>>,
    pub(crate) counts: BTreeMap<Bucket, usize>,
    /// Individual amounts per bucket, in record order.
    pub(crate) amounts: BTreeMap<Bucket, Vec<Decimal>>,
    pub(crate) grand_total: Decimal,
    pub(crate) record_count: usize,
    /// Records left out because their date is malformed.
    pub(crate) skipped: usize,
}

impl AggregateResult {
    fn empty(granularity: Granularity) -> Self {
        Self {
            granularity,
            period_totals: BTreeMap::new(),
            category_totals: BTreeMap::new(),
            counts: BTreeMap::new(),
            amounts: BTreeMap::new(),
            grand_total: Decimal::ZERO,
            record_count: 0,
            skipped: 0,
        }
    }

    /// Total for `bucket`; zero when nothing was spent in it.
    pub(crate) fn total_for(&self, bucket: Bucket) -> Decimal {
        self.period_totals
            .get(&bucket)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub(crate) fn count_for(&self, bucket: Bucket) -> usize {
        self.counts.get(&bucket).copied().unwrap_or(0)
    }

    /// Chronological monthly totals. Empty unless aggregated by month.
    pub(crate) fn monthly_totals(&self) -> Vec<MonthlyTotal> {
        if self.granularity != Granularity::Month {
            return Vec::new();
        }
        self.period_totals
            .iter()
            .filter_map(|(bucket, total)| match bucket {
                Bucket::Month(month) => Some(MonthlyTotal {
                    month: *month,
                    total: *total,
                }),
                Bucket::Day(_) => None,
            })
            .collect()
    }

    pub(crate) fn month_snapshot(&self, month: YearMonth) -> MonthSnapshot {
        let bucket = Bucket::Month(month);
        MonthSnapshot {
            month,
            total: self.total_for(bucket),
            count: self.count_for(bucket),
            by_category: self
                .category_totals
                .get(&bucket)
                .cloned()
                .unwrap_or_default(),
            amounts: self.amounts.get(&bucket).cloned().unwrap_or_default(),
        }
    }
}

/// Group `records` into buckets of the given granularity.
pub(crate) fn aggregate(records: &[ExpenseRecord], granularity: Granularity) -> AggregateResult {
    let mut result = AggregateResult::empty(granularity);
    for record in records {
        let Some(date) = record.date.valid() else {
            result.skipped += 1;
            continue;
        };
        let bucket = Bucket::of(date, granularity);
        *result.period_totals.entry(bucket).or_insert(Decimal::ZERO) += record.amount;
        *result
            .category_totals
            .entry(bucket)
            .or_default()
            .entry(record.category.clone())
            .or_insert(Decimal::ZERO) += record.amount;
        *result.counts.entry(bucket).or_insert(0) += 1;
        result.amounts.entry(bucket).or_default().push(record.amount);
        result.grand_total += record.amount;
        result.record_count += 1;
    }
    if result.skipped > 0 {
        tracing::warn!(skipped = result.skipped, "records with malformed dates left out of totals");
    }
    result
}

/// Per-category totals inside one bucket, largest first.
pub(crate) fn category_totals(records: &[ExpenseRecord], bucket: Bucket) -> Vec<CategoryTotal> {
    let granularity = match bucket {
        Bucket::Day(_) => Granularity::Day,
        Bucket::Month(_) => Granularity::Month,
    };
    let mut by_category: BTreeMap<Category, (Decimal, usize)> = BTreeMap::new();
    for record in records {
        let Some(date) = record.date.valid() else {
            continue;
        };
        if Bucket::of(date, granularity) != bucket {
            continue;
        }
        let slot = by_category
            .entry(record.category.clone())
            .or_insert((Decimal::ZERO, 0));
        slot.0 += record.amount;
        slot.1 += 1;
    }
    let mut totals: Vec<_> = by_category
        .into_iter()
        .map(|(category, (total, count))| CategoryTotal {
            category,
            total,
            count,
        })
        .collect();
    totals.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    totals
}

// ── Date ranges ───────────────────────────────────────────────

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    pub(crate) fn new(from: NaiveDate, to: NaiveDate) -> CoreResult<Self> {
        if from > to {
            return Err(CoreError::validation(format!(
                "range start {from} is after its end {to}"
            )));
        }
        Ok(Self { from, to })
    }

    pub(crate) fn month(month: YearMonth) -> Self {
        Self {
            from: month.first_day(),
            to: month.last_day(),
        }
    }

    /// Smallest range covering every valid record date, if any.
    pub(crate) fn spanning(records: &[ExpenseRecord]) -> Option<Self> {
        let mut dates = records.iter().filter_map(|r| r.date.valid());
        let first = dates.next()?;
        let (from, to) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some(Self { from, to })
    }

    pub(crate) fn from(&self) -> NaiveDate {
        self.from
    }

    pub(crate) fn to(&self) -> NaiveDate {
        self.to
    }

    pub(crate) fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    pub(crate) fn includes(&self, record: &ExpenseRecord) -> bool {
        record.date.valid().is_some_and(|d| self.contains(d))
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to {}",
            self.from.format("%Y-%m-%d"),
            self.to.format("%Y-%m-%d")
        )
    }
}

/// The `n` largest expenses in `range`. Ties go to the more recent record,
/// then to the lower id, so the ranking is stable.
pub(crate) fn top_expenses(
    records: &[ExpenseRecord],
    range: DateRange,
    n: usize,
) -> Vec<ExpenseRecord> {
    let mut ranked: Vec<&ExpenseRecord> = records.iter().filter(|r| range.includes(r)).collect();
    ranked.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then_with(|| b.date.valid().cmp(&a.date.valid()))
            .then_with(|| a.id.cmp(&b.id))
    });
    ranked.into_iter().take(n).cloned().collect()
}

// ── Budget vs actual ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BudgetLevel {
    Under,
    Near,
    Over,
    NoBudgetSet,
}

impl BudgetLevel {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Under => "under",
            Self::Near => "near",
            Self::Over => "over",
            Self::NoBudgetSet => "no_budget_set",
        }
    }

    /// Classify `actual` spending against a non-negative `limit`. The ratio is
    /// `None` for a zero limit, and for a limit so small that the ratio leaves
    /// decimal range, which only happens when spending is far over it.
    pub(crate) fn classify(actual: Decimal, limit: Decimal) -> (Self, Option<Decimal>) {
        if limit.is_zero() {
            let level = if actual > Decimal::ZERO {
                Self::Over
            } else {
                Self::Under
            };
            return (level, None);
        }
        let Some(ratio) = actual.checked_div(limit) else {
            return (Self::Over, None);
        };
        let level = if ratio > Decimal::ONE {
            Self::Over
        } else if ratio >= NEAR_BUDGET_RATIO {
            Self::Near
        } else {
            Self::Under
        };
        (level, Some(ratio))
    }
}

impl std::fmt::Display for BudgetLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BudgetStatus {
    pub(crate) category: Category,
    pub(crate) actual: Decimal,
    pub(crate) limit: Option<Decimal>,
    pub(crate) ratio: Option<Decimal>,
    pub(crate) remaining: Option<Decimal>,
    pub(crate) level: BudgetLevel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BudgetReport {
    pub(crate) month: YearMonth,
    pub(crate) statuses: Vec<BudgetStatus>,
    pub(crate) skipped: usize,
}

impl BudgetReport {
    pub(crate) fn over_budget(&self) -> impl Iterator<Item = &BudgetStatus> {
        self.statuses.iter().filter(|s| s.level == BudgetLevel::Over)
    }
}

/// Budget-vs-actual for `month`, one entry per category that has a budget or
/// spending in that month, ordered by category.
pub(crate) fn budget_statuses(
    records: &[ExpenseRecord],
    budgets: &Budgets,
    month: YearMonth,
) -> BudgetReport {
    let aggregated = aggregate(records, Granularity::Month);
    let snapshot = aggregated.month_snapshot(month);

    let mut categories: Vec<Category> = budgets.categories().cloned().collect();
    categories.extend(snapshot.by_category.keys().cloned());
    categories.sort();
    categories.dedup();

    let statuses = categories
        .into_iter()
        .map(|category| {
            let actual = snapshot.spent_on(&category);
            match budgets.get(&category) {
                Some(limit) => {
                    let (level, ratio) = BudgetLevel::classify(actual, limit);
                    BudgetStatus {
                        category,
                        actual,
                        limit: Some(limit),
                        ratio,
                        remaining: Some(limit - actual),
                        level,
                    }
                }
                None => BudgetStatus {
                    category,
                    actual,
                    limit: None,
                    ratio: None,
                    remaining: None,
                    level: BudgetLevel::NoBudgetSet,
                },
            }
        })
        .collect();

    BudgetReport {
        month,
        statuses,
        skipped: aggregated.skipped,
    }
}

// ── Range summary ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CategorySummary {
    pub(crate) category: Category,
    pub(crate) total: Decimal,
    pub(crate) count: usize,
    pub(crate) average: Decimal,
    /// Fraction of the range total, 0..=1.
    pub(crate) share: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RangeSummary {
    pub(crate) range: DateRange,
    pub(crate) total: Decimal,
    pub(crate) count: usize,
    pub(crate) average: Decimal,
    /// Total divided by the number of distinct days with spending.
    pub(crate) average_per_active_day: Decimal,
    pub(crate) active_days: usize,
    pub(crate) categories: Vec<CategorySummary>,
    pub(crate) skipped: usize,
}

impl RangeSummary {
    pub(crate) fn top_category(&self) -> Option<&CategorySummary> {
        self.categories.first()
    }

    /// Up to `n` categories with the largest totals.
    pub(crate) fn top_categories(&self, n: usize) -> &[CategorySummary] {
        &self.categories[..n.min(self.categories.len())]
    }
}

/// Totals, averages and a per-category breakdown over `range`.
pub(crate) fn summarize(records: &[ExpenseRecord], range: DateRange) -> RangeSummary {
    let skipped = records.iter().filter(|r| r.date.valid().is_none()).count();
    let in_range: Vec<&ExpenseRecord> = records.iter().filter(|r| range.includes(r)).collect();

    let total: Decimal = in_range.iter().map(|r| r.amount).sum();
    let count = in_range.len();
    let mut days: Vec<NaiveDate> = in_range.iter().filter_map(|r| r.date.valid()).collect();
    days.sort();
    days.dedup();

    let mut grouped: BTreeMap<Category, (Decimal, usize)> = BTreeMap::new();
    for record in &in_range {
        let slot = grouped
            .entry(record.category.clone())
            .or_insert((Decimal::ZERO, 0));
        slot.0 += record.amount;
        slot.1 += 1;
    }
    let mut categories: Vec<CategorySummary> = grouped
        .into_iter()
        .map(|(category, (cat_total, cat_count))| CategorySummary {
            category,
            total: cat_total,
            count: cat_count,
            average: mean(cat_total, cat_count),
            share: if total.is_zero() {
                Decimal::ZERO
            } else {
                cat_total / total
            },
        })
        .collect();
    categories.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));

    RangeSummary {
        range,
        total,
        count,
        average: mean(total, count),
        average_per_active_day: mean(total, days.len()),
        active_days: days.len(),
        categories,
        skipped,
    }
}

fn mean(total: Decimal, count: usize) -> Decimal {
    if count == 0 {
        Decimal::ZERO
    } else {
        total / Decimal::from(count as u64)
    }
}

#[cfg(test)]
#[path = "aggregate_tests.rs"]
mod tests;


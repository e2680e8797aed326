mod aggregate;
mod forecast;
mod insights;

pub(crate) use aggregate::{
    aggregate, budget_statuses, category_totals, summarize, top_expenses, Bucket, DateRange,
    Granularity, MonthlyTotal, RangeSummary,
};
pub(crate) use forecast::forecast_next;
pub(crate) use insights::compute_insights;

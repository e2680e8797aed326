use chrono::{Datelike, NaiveDate};

use crate::error::{CoreError, CoreResult};

/// A calendar month. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub(crate) fn new(year: i32, month: u32) -> CoreResult<Self> {
        if !(1..=12).contains(&month) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(CoreError::validation(format!(
                "invalid month: {year:04}-{month:02}"
            )));
        }
        Ok(Self { year, month })
    }

    /// Parse "YYYY-MM".
    pub(crate) fn parse(s: &str) -> CoreResult<Self> {
        let s = s.trim();
        let (y, m) = s
            .split_once('-')
            .ok_or_else(|| CoreError::validation(format!("expected YYYY-MM, got '{s}'")))?;
        let year = y
            .parse::<i32>()
            .map_err(|_| CoreError::validation(format!("expected YYYY-MM, got '{s}'")))?;
        let month = m
            .parse::<u32>()
            .map_err(|_| CoreError::validation(format!("expected YYYY-MM, got '{s}'")))?;
        Self::new(year, month)
    }

    pub(crate) fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Months since year 0; consecutive months differ by exactly one.
    pub(crate) fn index(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }

    pub(crate) fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub(crate) fn prev(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub(crate) fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub(crate) fn last_day(&self) -> NaiveDate {
        self.next()
            .first_day()
            .pred_opt()
            .unwrap_or_else(|| self.first_day())
    }

    pub(crate) fn days(&self) -> u32 {
        self.last_day().day()
    }

    pub(crate) fn contains(&self, date: NaiveDate) -> bool {
        Self::of(date) == *self
    }

    pub(crate) fn current() -> Self {
        Self::of(chrono::Local::now().date_naive())
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

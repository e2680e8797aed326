use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use super::Category;
use crate::error::{CoreError, CoreResult};

/// Storage and display format for expense dates.
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// Accepted input formats, tried in order. US month-first wins over
/// day-first when both parse.
const FALLBACK_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%m/%d/%y",
    "%d/%m/%Y",
    "%Y/%m/%d",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct ExpenseId(Uuid);

impl ExpenseId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub(crate) fn parse(s: &str) -> CoreResult<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| CoreError::validation(format!("'{s}' is not a valid expense id")))
    }

    /// First eight hex digits, enough to address a record from the CLI.
    pub(crate) fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }

    pub(crate) fn matches_prefix(&self, prefix: &str) -> bool {
        let wanted = prefix.trim().to_lowercase().replace('-', "");
        !wanted.is_empty() && self.0.simple().to_string().starts_with(&wanted)
    }
}

impl std::fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The date of a record. `Malformed` only comes from stored or legacy rows;
/// aggregation skips those and counts them instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ExpenseDate {
    Valid(NaiveDate),
    Malformed(String),
}

impl ExpenseDate {
    /// Interpret stored text, keeping it verbatim when it is not a date.
    pub(crate) fn from_stored(raw: &str) -> Self {
        match NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT) {
            Ok(d) => Self::Valid(d),
            Err(_) => Self::Malformed(raw.to_string()),
        }
    }

    pub(crate) fn valid(&self) -> Option<NaiveDate> {
        match self {
            Self::Valid(d) => Some(*d),
            Self::Malformed(_) => None,
        }
    }

    pub(crate) fn to_stored(&self) -> String {
        match self {
            Self::Valid(d) => d.format(DATE_FORMAT).to_string(),
            Self::Malformed(raw) => raw.clone(),
        }
    }
}

impl std::fmt::Display for ExpenseDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Valid(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Self::Malformed(raw) => write!(f, "?{raw}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExpenseRecord {
    pub(crate) id: ExpenseId,
    pub(crate) date: ExpenseDate,
    pub(crate) category: Category,
    pub(crate) amount: Decimal,
    pub(crate) description: String,
}

impl ExpenseRecord {
    pub(crate) fn create(input: NewExpense) -> Self {
        Self::with_id(ExpenseId::generate(), input)
    }

    pub(crate) fn with_id(id: ExpenseId, input: NewExpense) -> Self {
        Self {
            id,
            date: ExpenseDate::Valid(input.date),
            category: input.category,
            amount: input.amount,
            description: input.description,
        }
    }
}

/// Validated user input for creating or replacing a record.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NewExpense {
    pub(crate) date: NaiveDate,
    pub(crate) category: Category,
    pub(crate) amount: Decimal,
    pub(crate) description: String,
}

impl NewExpense {
    pub(crate) fn new(
        date: NaiveDate,
        category: Category,
        amount: Decimal,
        description: &str,
    ) -> CoreResult<Self> {
        let amount = check_amount(amount)?;
        Ok(Self {
            date,
            category,
            amount,
            description: description.trim().to_string(),
        })
    }

    /// Build from raw text fields as typed by a user or read from a file.
    pub(crate) fn parse(
        date: &str,
        category: &str,
        amount: &str,
        description: &str,
    ) -> CoreResult<Self> {
        let date = parse_date(date)?;
        let category = Category::new(category)?;
        let amount = parse_amount(amount)?;
        Self::new(date, category, amount, description)
    }
}

/// Largest amount accepted for an expense or a monthly limit. Sums of
/// bounded amounts stay far inside `Decimal` range.
pub(crate) const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// Reject negative amounts and amounts above [`MAX_AMOUNT`].
pub(crate) fn check_amount(amount: Decimal) -> CoreResult<Decimal> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(CoreError::validation(format!(
            "amount must not be negative (got {amount})"
        )));
    }
    if amount > MAX_AMOUNT {
        return Err(CoreError::validation(format!(
            "amount {amount} exceeds the maximum of {MAX_AMOUNT}"
        )));
    }
    Ok(amount.normalize())
}

/// Parse a calendar date, trying ISO first and then common local formats.
pub(crate) fn parse_date(s: &str) -> CoreResult<NaiveDate> {
    let s = s.trim();
    // Tolerate a trailing time component ("2024-01-15 00:00:00").
    let s = s.split_whitespace().next().unwrap_or(s);
    for fmt in FALLBACK_DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    Err(CoreError::validation(format!("could not parse date '{s}'")))
}

/// Parse a money amount, accepting currency symbols and thousands separators.
pub(crate) fn parse_amount(s: &str) -> CoreResult<Decimal> {
    let cleaned = s
        .replace(['$', '₹', '€', '£', ',', '"'], "")
        .trim()
        .to_string();
    if cleaned.is_empty() {
        return Err(CoreError::validation("amount must not be empty"));
    }
    Decimal::from_str(&cleaned)
        .map_err(|_| CoreError::validation(format!("could not parse amount '{}'", s.trim())))
}

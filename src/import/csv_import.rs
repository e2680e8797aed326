use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{CoreError, CoreResult};
use crate::models::{parse_amount, parse_date, Category, NewExpense};

/// Header names accepted for each column, compared case-insensitively.
const DATE_HEADERS: &[&str] = &["date", "day", "transaction date"];
const CATEGORY_HEADERS: &[&str] = &["category", "type"];
const AMOUNT_HEADERS: &[&str] = &["amount", "cost", "price", "value", "spent"];
const DESCRIPTION_HEADERS: &[&str] = &["description", "note", "notes", "memo", "details"];

/// Column positions found in the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ColumnMap {
    pub(crate) date: usize,
    pub(crate) category: Option<usize>,
    pub(crate) amount: usize,
    pub(crate) description: Option<usize>,
}

impl ColumnMap {
    pub(crate) fn from_headers<'a>(headers: impl IntoIterator<Item = &'a str>) -> CoreResult<Self> {
        let headers: Vec<String> = headers
            .into_iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_lowercase())
            .collect();
        let find = |names: &[&str]| headers.iter().position(|h| names.contains(&h.as_str()));

        let date = find(DATE_HEADERS)
            .ok_or_else(|| CoreError::validation("CSV header has no date column"))?;
        let amount = find(AMOUNT_HEADERS)
            .ok_or_else(|| CoreError::validation("CSV header has no amount column"))?;
        Ok(Self {
            date,
            category: find(CATEGORY_HEADERS),
            amount,
            description: find(DESCRIPTION_HEADERS),
        })
    }
}

/// A data row that was not imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SkippedRow {
    /// 1-based line in the file, header included.
    pub(crate) line: u64,
    pub(crate) reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ImportReport {
    pub(crate) records: Vec<NewExpense>,
    pub(crate) skipped: Vec<SkippedRow>,
}

pub(crate) struct ExpenseCsvImporter;

impl ExpenseCsvImporter {
    /// Read an expense CSV file. The first row must be a header naming at
    /// least a date and an amount column.
    pub(crate) fn read(path: &Path) -> CoreResult<ImportReport> {
        let file = File::open(path)?;
        debug!(path = %path.display(), "reading expense csv");
        Self::read_from(file)
    }

    pub(crate) fn read_from<R: Read>(reader: R) -> CoreResult<ImportReport> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(CoreError::validation("CSV file is empty"));
        }
        let columns = ColumnMap::from_headers(headers.iter())?;

        let mut records = Vec::new();
        let mut skipped = Vec::new();
        for result in rdr.records() {
            let row = result?;
            let line = row.position().map(|p| p.line()).unwrap_or(0);
            if row.iter().all(|field| field.is_empty()) {
                continue;
            }
            match parse_row(&row, &columns) {
                Ok(expense) => records.push(expense),
                Err(e) => {
                    let reason = match e {
                        CoreError::Validation(msg) => msg,
                        other => other.to_string(),
                    };
                    warn!(line, %reason, "skipping csv row");
                    skipped.push(SkippedRow { line, reason });
                }
            }
        }

        debug!(
            imported = records.len(),
            skipped = skipped.len(),
            "parsed expense csv"
        );
        Ok(ImportReport { records, skipped })
    }
}

fn parse_row(row: &csv::StringRecord, columns: &ColumnMap) -> CoreResult<NewExpense> {
    let field = |idx: Option<usize>| idx.and_then(|i| row.get(i)).unwrap_or("");

    let date = parse_date(field(Some(columns.date)))?;
    let amount = parse_amount(field(Some(columns.amount)))?;
    let category = match field(columns.category) {
        "" => Category::uncategorized(),
        raw => Category::new(raw)?,
    };
    NewExpense::new(date, category, amount, field(columns.description))
}

#[cfg(test)]
#[path = "csv_import_tests.rs"]
mod tests;

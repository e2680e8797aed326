mod schema;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::error::{CoreError, CoreResult};
use crate::models::*;
use crate::store::Store;

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        debug!(path = %path.display(), "database opened");
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            // Fresh database - apply full schema
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn schema_version(&self) -> Result<i32> {
        Ok(self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })?)
    }

    /// Write a raw row, bypassing validation. Used to simulate legacy data.
    #[cfg(test)]
    pub(crate) fn insert_raw_expense(
        &self,
        id: &str,
        date: &str,
        category: &str,
        amount: &str,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO expenses (id, position, date, category, amount, description)
             VALUES (?1, (SELECT COALESCE(MAX(position), -1) + 1 FROM expenses), ?2, ?3, ?4, '')",
            params![id, date, category, amount],
        )?;
        Ok(())
    }
}

impl Store for Database {
    fn load_expenses(&self) -> CoreResult<Vec<ExpenseRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, category, amount, description FROM expenses ORDER BY position, id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, date, category, amount, description) = row?;
            records.push(expense_from_row(&id, &date, &category, &amount, description)?);
        }
        debug!(count = records.len(), "loaded expenses");
        Ok(records)
    }

    fn save_expenses(&mut self, records: &[ExpenseRecord]) -> CoreResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM expenses", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO expenses (id, position, date, category, amount, description)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (position, record) in records.iter().enumerate() {
                stmt.execute(params![
                    record.id.to_string(),
                    position as i64,
                    record.date.to_stored(),
                    record.category.as_str(),
                    record.amount.to_string(),
                    record.description,
                ])?;
            }
        }
        tx.commit()?;
        debug!(count = records.len(), "saved expenses");
        Ok(())
    }

    fn load_budgets(&self) -> CoreResult<Budgets> {
        let mut stmt = self
            .conn
            .prepare("SELECT category, monthly_limit FROM budgets ORDER BY category")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut budgets = Budgets::new();
        for row in rows {
            let (category, limit) = row?;
            let category = match Category::new(&category) {
                Ok(c) => c,
                Err(e) => {
                    warn!(category = %category, error = %e, "dropping budget with invalid category");
                    continue;
                }
            };
            let limit = Decimal::from_str(&limit).map_err(|_| {
                CoreError::Corrupt(format!("budget for {category} has amount '{limit}'"))
            })?;
            let entry = BudgetEntry::new(category, limit)
                .map_err(|e| CoreError::Corrupt(e.to_string()))?;
            budgets.set(entry);
        }
        Ok(budgets)
    }

    fn save_budgets(&mut self, budgets: &Budgets) -> CoreResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM budgets", [])?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO budgets (category, monthly_limit) VALUES (?1, ?2)")?;
            for entry in budgets.iter() {
                stmt.execute(params![
                    entry.category.as_str(),
                    entry.monthly_limit.to_string()
                ])?;
            }
        }
        tx.commit()?;
        debug!(count = budgets.len(), "saved budgets");
        Ok(())
    }
}

fn expense_from_row(
    id: &str,
    date: &str,
    category: &str,
    amount: &str,
    description: String,
) -> CoreResult<ExpenseRecord> {
    let id = ExpenseId::parse(id)
        .map_err(|_| CoreError::Corrupt(format!("expense id '{id}' is not a UUID")))?;
    let amount = Decimal::from_str(amount)
        .map_err(|_| CoreError::Corrupt(format!("expense {id} has amount '{amount}'")))?;
    let amount = check_amount(amount).map_err(|e| match e {
        CoreError::Validation(msg) => CoreError::Corrupt(format!("expense {id}: {msg}")),
        other => other,
    })?;

    let date = ExpenseDate::from_stored(date);
    if let ExpenseDate::Malformed(raw) = &date {
        warn!(%id, date = %raw, "expense has a malformed date");
    }

    let category = Category::new(category).unwrap_or_else(|e| {
        warn!(%id, error = %e, "expense has an invalid category, treating as uncategorized");
        Category::uncategorized()
    });

    Ok(ExpenseRecord {
        id,
        date,
        category,
        amount,
        description,
    })
}

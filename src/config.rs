use anyhow::{Context, Result};
use std::path::PathBuf;

pub(crate) const DB_ENV: &str = "SPENDCAST_DB";
pub(crate) const CURRENCY_ENV: &str = "SPENDCAST_CURRENCY";
pub(crate) const LOG_ENV: &str = "SPENDCAST_LOG";

const DB_FILE_NAME: &str = "spendcast.db";
const DEFAULT_CURRENCY: &str = "$";
const DEFAULT_LOG_FILTER: &str = "spendcast=warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Config {
    pub(crate) db_path: PathBuf,
    pub(crate) currency_symbol: String,
    pub(crate) log_filter: String,
}

impl Config {
    /// Resolve configuration from the process environment and make sure the
    /// database directory exists.
    pub(crate) fn load() -> Result<Self> {
        let config = Self::from_lookup(|key| std::env::var(key).ok(), default_data_dir)?;
        if let Some(dir) = config.db_path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).with_context(|| {
                    format!("Failed to create data directory: {}", dir.display())
                })?;
            }
        }
        Ok(config)
    }

    /// Resolve configuration from an arbitrary variable lookup. `data_dir` is
    /// consulted only when no database path is given.
    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        data_dir: impl FnOnce() -> Result<PathBuf>,
    ) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_path = match non_empty(DB_ENV) {
            Some(path) => PathBuf::from(path),
            None => data_dir()?.join(DB_FILE_NAME),
        };
        let currency_symbol = lookup(CURRENCY_ENV).unwrap_or_else(|| DEFAULT_CURRENCY.into());
        let log_filter = non_empty(LOG_ENV)
            .or_else(|| non_empty("RUST_LOG"))
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.into());

        Ok(Self {
            db_path,
            currency_symbol,
            log_filter,
        })
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "spendcast", "Spendcast")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(proj_dirs.data_dir().to_path_buf())
}

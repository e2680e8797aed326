mod analysis;
mod config;
mod db;
mod error;
mod export;
mod format;
mod import;
mod logging;
mod models;
mod run;
mod store;
mod tracker;

use anyhow::Result;
use tracing::debug;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = config::Config::load()?;
    logging::init(&config.log_filter);
    debug!(db = %config.db_path.display(), "starting");

    let db = db::Database::open(&config.db_path)?;
    let mut tracker = tracker::Tracker::new(db);

    match args.len() {
        1 => run::as_dashboard(&tracker, &config),
        2.. => run::as_cli(&args, &mut tracker, &config),
        _ => {
            eprintln!("Usage: spendcast [command]");
            Ok(())
        }
    }
}

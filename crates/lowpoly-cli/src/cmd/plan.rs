use std::path::Path;

use chrono::{NaiveDate, Utc};
use lowpoly_core::cycle::{CycleEngine, Plan};
use lowpoly_core::store::RunLedger;

use crate::output::print_json;

pub fn run(config_path: &Path, date: Option<NaiveDate>, json: bool) -> anyhow::Result<()> {
    let today = date.unwrap_or_else(|| Utc::now().date_naive());

    // Read the ledger only when a database already exists; planning never creates one.
    let mut last_run = None;
    if config_path.exists() {
        let config = super::load_config(config_path)?;
        if config.database_path(config_path).exists() {
            last_run = super::open_db(&config, config_path)?.last_run()?;
        }
    }

    let plan = CycleEngine::plan(today, last_run.as_ref());
    if json {
        print_json(&serde_json::json!({ "date": today, "plan": plan }))?;
        return Ok(());
    }
    match plan {
        Plan::Idle => println!("{today}: nothing due"),
        Plan::Due(action) => println!("{today}: {action} due"),
        Plan::AlreadyDone(action) => println!("{today}: {action} already done"),
    }
    Ok(())
}

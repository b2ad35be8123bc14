use std::path::Path;

use lowpoly_core::store::{MetadataStore, RunLedger};

use crate::output::{or_dash, print_fields, print_json};

pub fn run(config_path: &Path, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let db = super::open_db(&config, config_path)?;
    let metadata = db.read()?;
    let last_run = db.last_run()?;

    if json {
        return print_json(&serde_json::json!({
            "metadata": metadata,
            "last_run": last_run,
        }));
    }
    let last = last_run
        .map(|stamp| format!("{} on {}", stamp.action, stamp.date))
        .unwrap_or_else(|| "-".to_string());
    print_fields(&[
        ("theme voting", or_dash(metadata.theme_voting_post_id.as_deref())),
        ("voting", or_dash(metadata.voting_post_id.as_deref())),
        ("theme", or_dash(metadata.theme_post_id.as_deref())),
        ("monthly winner", or_dash(metadata.monthly_winner_post_id.as_deref())),
        ("last run", last),
    ]);
    Ok(())
}

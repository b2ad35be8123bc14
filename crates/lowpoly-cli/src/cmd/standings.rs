use std::path::Path;

use lowpoly_core::ranking;

use crate::output::{or_dash, print_json, print_table};

pub fn run(config_path: &Path, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let db = super::open_db(&config, config_path)?;
    let ranked = ranking::standings(&db)?;

    if json {
        return print_json(&ranked);
    }
    if ranked.is_empty() {
        println!("No submissions.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = ranked
        .iter()
        .enumerate()
        .map(|(i, r)| {
            vec![
                (i + 1).to_string(),
                r.score.to_string(),
                r.submission.title.clone(),
                r.submission.author.clone(),
                or_dash(r.submission.image.as_deref()),
            ]
        })
        .collect();
    print_table(&["#", "VOTES", "TITLE", "AUTHOR", "IMAGE"], &rows);
    Ok(())
}

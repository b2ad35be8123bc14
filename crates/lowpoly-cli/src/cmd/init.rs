use std::path::Path;

use anyhow::Context;
use lowpoly_core::config::Config;

use super::open_db;

pub fn run(config_path: &Path, subreddit: &str, voting_url: &str) -> anyhow::Result<()> {
    let config = if config_path.exists() {
        println!("  exists:  {}", config_path.display());
        super::load_config(config_path)?
    } else {
        let config = Config::new(subreddit.trim_start_matches("r/"), voting_url);
        config
            .save(config_path)
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        println!("  created: {}", config_path.display());
        config
    };

    for w in config.validate() {
        println!("  warning: {}: {}", w.field, w.message);
    }

    let db_path = config.database_path(config_path);
    let existed = db_path.exists();
    open_db(&config, config_path)?;
    let verb = if existed { "exists: " } else { "created:" };
    println!("  {verb} {}", db_path.display());
    Ok(())
}

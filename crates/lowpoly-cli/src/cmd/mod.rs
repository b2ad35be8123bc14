pub mod colors;
pub mod init;
pub mod meta;
pub mod plan;
pub mod resolve;
pub mod run;
pub mod standings;
pub mod validate;

use std::path::Path;

use anyhow::Context;
use lowpoly_core::config::Config;
use lowpoly_core::db::ContestDb;

pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    Config::load(path).with_context(|| format!("failed to load {}", path.display()))
}

/// The config when one exists, defaults otherwise. For commands that work
/// without a configured subreddit.
pub fn config_or_default(path: &Path) -> anyhow::Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::new("", ""))
    }
}

pub fn open_db(config: &Config, config_path: &Path) -> anyhow::Result<ContestDb> {
    let path = config.database_path(config_path);
    ContestDb::open(&path).with_context(|| format!("failed to open database {}", path.display()))
}

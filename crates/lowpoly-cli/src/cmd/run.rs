use std::path::Path;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::Args;
use lowpoly_core::cycle::{CycleEngine, Plan, RunReport};
use lowpoly_core::http::{build_client, HttpFetcher};
use lowpoly_core::imgur::ImgurClient;
use lowpoly_core::reddit::{RedditClient, RedditCredentials};
use lowpoly_core::store::{MetadataStore, RunLedger};
use lowpoly_core::types::MetadataUpdate;

use crate::output::print_json;

/// API credentials, normally supplied through the environment.
#[derive(Args)]
pub struct Credentials {
    #[arg(long, env = "REDDIT_CLIENT_ID", hide_env_values = true)]
    reddit_client_id: String,
    #[arg(long, env = "REDDIT_CLIENT_SECRET", hide_env_values = true)]
    reddit_client_secret: String,
    #[arg(long, env = "REDDIT_REFRESH_TOKEN", hide_env_values = true)]
    reddit_refresh_token: String,
    #[arg(long, env = "IMGUR_CLIENT_ID", hide_env_values = true)]
    imgur_client_id: String,
}

impl Credentials {
    fn reddit(&self) -> RedditCredentials {
        RedditCredentials {
            client_id: self.reddit_client_id.clone(),
            client_secret: self.reddit_client_secret.clone(),
            refresh_token: self.reddit_refresh_token.clone(),
        }
    }
}

pub fn run(
    config_path: &Path,
    date: Option<NaiveDate>,
    force: bool,
    credentials: &Credentials,
    json: bool,
) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    for w in config.validate() {
        tracing::warn!(field = %w.field, "{}", w.message);
    }
    let db = super::open_db(&config, config_path)?;

    let today = date.unwrap_or_else(|| Utc::now().date_naive());
    let last_run = if force { None } else { db.last_run()? };
    let metadata = db.read()?;

    let http = build_client(&config.http.user_agent, config.http.timeout())?;
    let reddit = RedditClient::new(
        http.clone(),
        &config.http.reddit_auth_url,
        &config.http.reddit_api_url,
        &config.subreddit,
        credentials.reddit(),
    );
    let imgur = ImgurClient::new(
        http.clone(),
        &config.http.imgur_api_url,
        &credentials.imgur_client_id,
    );
    let fetcher = HttpFetcher::new(http);

    let engine = CycleEngine::new(&reddit, &imgur, &fetcher, &db, &config);
    let report = match engine.run(today, &metadata, last_run.as_ref()) {
        Ok(report) => report,
        Err(e) if e.is_precondition() => anyhow::bail!("{today}: nothing published: {e}"),
        Err(e) => return Err(e).context(format!("contest run for {today} failed")),
    };

    if json {
        return print_json(&report);
    }
    print_report(&report);
    Ok(())
}

fn print_report(report: &RunReport) {
    let date = report.date;
    match report.plan {
        Plan::Idle => {
            println!("{date}: nothing due");
            return;
        }
        Plan::AlreadyDone(action) => {
            println!("{date}: {action} already done (use --force to repeat)");
            return;
        }
        Plan::Due(action) => println!("{date}: {action} done"),
    }
    for update in &report.writes {
        for (field, id) in fields(update) {
            println!("  stored {field} = {id}");
        }
    }
    for failure in &report.step_failures {
        println!("  failed {}: {}", failure.step, failure.error);
    }
}

fn fields(update: &MetadataUpdate) -> Vec<(&'static str, &str)> {
    [
        ("theme_voting_post_id", &update.theme_voting_post_id),
        ("voting_post_id", &update.voting_post_id),
        ("theme_post_id", &update.theme_post_id),
        ("monthly_winner_post_id", &update.monthly_winner_post_id),
    ]
    .into_iter()
    .filter_map(|(field, id)| id.as_deref().map(|id| (field, id)))
    .collect()
}

mod cmd;
mod output;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use cmd::run::Credentials;
use lowpoly_core::config::DEFAULT_CONFIG_FILE;

#[derive(Parser)]
#[command(
    name = "lowpoly",
    about = "Monthly contest automation for an image subreddit",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file
    #[arg(long, global = true, env = "LOWPOLY_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file and create the database
    Init {
        /// Subreddit name, without the r/ prefix
        #[arg(long)]
        subreddit: String,
        /// Where members vote on submissions
        #[arg(long)]
        voting_url: String,
    },

    /// Check the config for common mistakes
    Validate,

    /// Perform today's contest action, if one is due
    Run {
        /// Act as if today were DATE (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Repeat an action already completed today
        #[arg(long)]
        force: bool,
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Show which action is due, without doing anything
    Plan {
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Current ranking of this cycle's submissions
    Standings,

    /// Stored post ids and the last completed run
    Meta,

    /// Resolve an Imgur page to a direct image link
    Resolve {
        url: String,
        #[arg(long, env = "IMGUR_CLIENT_ID", hide_env_values = true)]
        imgur_client_id: String,
    },

    /// Derive the accent color scheme of a local image
    Colors { image: PathBuf },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Run { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_path();
    let result = match cli.command {
        Commands::Init {
            subreddit,
            voting_url,
        } => cmd::init::run(config, &subreddit, &voting_url),
        Commands::Validate => cmd::validate::run(config, cli.json),
        Commands::Run {
            date,
            force,
            credentials,
        } => cmd::run::run(config, date, force, &credentials, cli.json),
        Commands::Plan { date } => cmd::plan::run(config, date, cli.json),
        Commands::Standings => cmd::standings::run(config, cli.json),
        Commands::Meta => cmd::meta::run(config, cli.json),
        Commands::Resolve {
            url,
            imgur_client_id,
        } => cmd::resolve::run(config, &url, &imgur_client_id, cli.json),
        Commands::Colors { image } => cmd::colors::run(config, &image, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::color::ColorCube;
use crate::error::{ContestError, Result};
use crate::header::BannerSize;

pub const DEFAULT_CONFIG_FILE: &str = "lowpoly.yaml";

// ---------------------------------------------------------------------------
// ConfigWarning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// MarkerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerConfig {
    #[serde(default = "default_sidebar_marker")]
    pub sidebar: String,
    #[serde(default = "default_stylesheet_marker")]
    pub stylesheet: String,
}

fn default_sidebar_marker() -> String {
    "BOTWINNER".to_string()
}

fn default_stylesheet_marker() -> String {
    "POLYGONAUTOMATON".to_string()
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            sidebar: default_sidebar_marker(),
            stylesheet: default_stylesheet_marker(),
        }
    }
}

// ---------------------------------------------------------------------------
// ColorConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorConfig {
    #[serde(default = "default_bright_threshold")]
    pub bright_threshold: f32,
    #[serde(default = "default_distinct_threshold")]
    pub distinct_threshold: f32,
    /// Colors never picked as the accent, as `[r, g, b]`.
    #[serde(default = "default_avoid")]
    pub avoid: Vec<[u8; 3]>,
}

fn default_bright_threshold() -> f32 {
    0.6
}

fn default_distinct_threshold() -> f32 {
    0.8
}

fn default_avoid() -> Vec<[u8; 3]> {
    vec![[255, 255, 255]]
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            bright_threshold: default_bright_threshold(),
            distinct_threshold: default_distinct_threshold(),
            avoid: default_avoid(),
        }
    }
}

impl ColorConfig {
    pub fn cube(&self) -> ColorCube {
        ColorCube::new(
            self.bright_threshold,
            self.distinct_threshold,
            self.avoid.clone(),
        )
    }
}

// ---------------------------------------------------------------------------
// HttpConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_reddit_auth_url")]
    pub reddit_auth_url: String,
    #[serde(default = "default_reddit_api_url")]
    pub reddit_api_url: String,
    #[serde(default = "default_imgur_api_url")]
    pub imgur_api_url: String,
}

fn default_user_agent() -> String {
    format!("lowpoly-contest-bot/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    crate::http::DEFAULT_TIMEOUT.as_secs()
}

fn default_reddit_auth_url() -> String {
    crate::reddit::DEFAULT_AUTH_URL.to_string()
}

fn default_reddit_api_url() -> String {
    crate::reddit::DEFAULT_API_URL.to_string()
}

fn default_imgur_api_url() -> String {
    crate::imgur::DEFAULT_BASE_URL.to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            reddit_auth_url: default_reddit_auth_url(),
            reddit_api_url: default_reddit_api_url(),
            imgur_api_url: default_imgur_api_url(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Subreddit name without the `r/` prefix.
    pub subreddit: String,
    /// Where members cast their votes; linked from the "voting now open" post.
    pub voting_url: String,
    #[serde(default = "default_database")]
    pub database: PathBuf,
    #[serde(default = "crate::flair::default_labels")]
    pub flair_labels: Vec<String>,
    /// Appended to every self post the bot writes.
    #[serde(default)]
    pub footer: String,
    #[serde(default)]
    pub markers: MarkerConfig,
    #[serde(default)]
    pub banner: BannerSize,
    #[serde(default)]
    pub colors: ColorConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

fn default_version() -> u32 {
    1
}

fn default_database() -> PathBuf {
    PathBuf::from("lowpoly.redb")
}

impl Config {
    pub fn new(subreddit: impl Into<String>, voting_url: impl Into<String>) -> Self {
        Self {
            version: 1,
            subreddit: subreddit.into(),
            voting_url: voting_url.into(),
            database: default_database(),
            flair_labels: crate::flair::default_labels(),
            footer: String::new(),
            markers: MarkerConfig::default(),
            banner: BannerSize::default(),
            colors: ColorConfig::default(),
            http: HttpConfig::default(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ContestError::InvalidConfig(format!(
                "{} not found: run 'lowpoly init'",
                path.display()
            )));
        }
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    /// Database path, relative paths resolved against the config file's directory.
    pub fn database_path(&self, config_path: &Path) -> PathBuf {
        if self.database.is_absolute() {
            return self.database.clone();
        }
        match config_path.parent() {
            Some(dir) => dir.join(&self.database),
            None => self.database.clone(),
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut warn = |field: &str, message: String| {
            warnings.push(ConfigWarning {
                field: field.to_string(),
                message,
            })
        };

        if self.subreddit.trim().is_empty() || self.subreddit.starts_with("r/") {
            warn(
                "subreddit",
                format!("'{}' should be a bare subreddit name", self.subreddit),
            );
        }
        if url::Url::parse(&self.voting_url).is_err() {
            warn(
                "voting_url",
                format!("'{}' is not an absolute URL", self.voting_url),
            );
        }
        if self.flair_labels.is_empty() {
            warn("flair_labels", "no flair labels; entries cannot be tagged".into());
        }
        if self.markers.sidebar == self.markers.stylesheet {
            warn(
                "markers",
                "sidebar and stylesheet markers are identical".into(),
            );
        }
        if !(0.0..=1.0).contains(&self.colors.bright_threshold) {
            warn(
                "colors.bright_threshold",
                format!("{} is outside 0..1", self.colors.bright_threshold),
            );
        }
        if self.colors.distinct_threshold <= 0.0 {
            warn(
                "colors.distinct_threshold",
                "must be positive or every color is a duplicate".into(),
            );
        }
        if self.banner.width == 0 || self.banner.height == 0 {
            warn("banner", "banner dimensions must be non-zero".into());
        }
        if self.http.timeout_secs == 0 {
            warn("http.timeout_secs", "a zero timeout fails every request".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContestError {
    #[error("no submissions to rank")]
    NoSubmissions,

    #[error("no theme suggestions on post {0}")]
    NoThemeSuggestions(String),

    #[error("marker '{0}' not found in content")]
    MarkerNotFound(String),

    #[error("metadata field '{0}' is not set")]
    MissingPostId(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("upstream returned {status} for {url}")]
    Upstream { status: u16, url: String },

    #[error("unexpected response from {url}: {reason}")]
    BadResponse { url: String, reason: String },

    #[error("database error: {0}")]
    Db(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ContestError {
    /// Errors that end the day's action before anything is published.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ContestError::NoSubmissions
                | ContestError::NoThemeSuggestions(_)
                | ContestError::MissingPostId(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ContestError>;

//! Shared blocking HTTP plumbing for the image host, forum and downloads.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;

use crate::error::{ContestError, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub fn build_client(user_agent: &str, timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()?)
}

/// Turn a non-success response into [`ContestError::Upstream`].
pub fn ensure_success(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    Err(ContestError::Upstream {
        status: status.as_u16(),
        url: resp.url().to_string(),
    })
}

/// Statuses a lookup may treat as "no result for this step".
pub fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

// ---------------------------------------------------------------------------
// ImageFetcher
// ---------------------------------------------------------------------------

/// Downloads image bytes (the winning submission, for the header banner).
pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let resp = ensure_success(self.http.get(url).send()?)?;
        Ok(resp.bytes()?.to_vec())
    }
}

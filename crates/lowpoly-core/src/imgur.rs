//! Imgur API v3 implementation of [`ImageHost`].

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ContestError, Result};
use crate::http::{ensure_success, is_transient};
use crate::resolver::{ImageHost, Lookup};

pub const DEFAULT_BASE_URL: &str = "https://api.imgur.com";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    link: String,
}

#[derive(Debug, Deserialize)]
struct AlbumData {
    #[serde(default)]
    images: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct GalleryData {
    link: String,
    #[serde(default)]
    is_album: bool,
    #[serde(default)]
    images: Vec<ImageData>,
}

pub struct ImgurClient {
    http: Client,
    base_url: String,
    client_id: String,
}

impl ImgurClient {
    pub fn new(http: Client, base_url: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
        }
    }

    /// GET `/3/<kind>/<id>`. `Err(lookup)` carries the non-`Found` outcome.
    fn get<T: DeserializeOwned>(&self, kind: &str, id: &str) -> Result<std::result::Result<T, Lookup>> {
        let url = format!("{}/3/{kind}/{id}", self.base_url);
        let resp = match self
            .http
            .get(&url)
            .header("Authorization", format!("Client-ID {}", self.client_id))
            .send()
        {
            Ok(resp) => resp,
            Err(e) if e.is_timeout() => {
                tracing::warn!(%url, "imgur lookup timed out");
                return Ok(Err(Lookup::TimedOut));
            }
            Err(e) => return Err(e.into()),
        };

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(Err(Lookup::NotFound));
        }
        if is_transient(status) {
            tracing::warn!(%url, status = status.as_u16(), "imgur lookup unavailable");
            return Ok(Err(if status == StatusCode::TOO_MANY_REQUESTS {
                Lookup::RateLimited
            } else {
                Lookup::ServerError
            }));
        }

        let resp = ensure_success(resp)?;
        let envelope: Envelope<T> = resp.json().map_err(|e| ContestError::BadResponse {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        Ok(Ok(envelope.data))
    }
}

impl ImageHost for ImgurClient {
    fn album(&self, id: &str) -> Result<Lookup> {
        Ok(match self.get::<AlbumData>("album", id)? {
            Ok(album) => album
                .images
                .into_iter()
                .next()
                .map(|img| Lookup::found(img.link))
                .unwrap_or(Lookup::NotFound),
            Err(lookup) => lookup,
        })
    }

    fn gallery(&self, id: &str) -> Result<Lookup> {
        Ok(match self.get::<GalleryData>("gallery", id)? {
            Ok(gallery) => {
                // Gallery albums link to the album page; prefer the first image.
                match (gallery.is_album, gallery.images.into_iter().next()) {
                    (true, Some(first)) => Lookup::found(first.link),
                    _ => Lookup::found(gallery.link),
                }
            }
            Err(lookup) => lookup,
        })
    }

    fn image(&self, id: &str) -> Result<Lookup> {
        Ok(match self.get::<ImageData>("image", id)? {
            Ok(img) => Lookup::found(img.link),
            Err(lookup) => lookup,
        })
    }
}

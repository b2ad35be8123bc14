//! Normalizes submission links into a single direct image URL.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

// ---------------------------------------------------------------------------
// ImageHost
// ---------------------------------------------------------------------------

/// Outcome of a single image-host API lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Lookup {
    Found { link: String },
    NotFound,
    RateLimited,
    ServerError,
    TimedOut,
}

impl Lookup {
    pub fn found(link: impl Into<String>) -> Self {
        Lookup::Found { link: link.into() }
    }

    pub fn link(self) -> Option<String> {
        match self {
            Lookup::Found { link } => Some(link),
            _ => None,
        }
    }
}

/// Image host API. Lookups that fail with a status the resolver can fall
/// through on come back as a non-`Found` [`Lookup`]; anything else is an `Err`.
pub trait ImageHost {
    /// First image of an album.
    fn album(&self, id: &str) -> Result<Lookup>;
    fn gallery(&self, id: &str) -> Result<Lookup>;
    fn image(&self, id: &str) -> Result<Lookup>;
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

static ALBUM_RE: OnceLock<Regex> = OnceLock::new();
static GALLERY_RE: OnceLock<Regex> = OnceLock::new();
static IMAGE_RE: OnceLock<Regex> = OnceLock::new();

fn album_re() -> &'static Regex {
    ALBUM_RE.get_or_init(|| {
        Regex::new(r"^https?://(?:www\.)?(?:m\.)?imgur\.com/a/([a-zA-Z0-9]+)(?:#[0-9]+)?").unwrap()
    })
}

fn gallery_re() -> &'static Regex {
    GALLERY_RE
        .get_or_init(|| Regex::new(r"^https?://(?:www\.)?imgur\.com/gallery/([a-zA-Z0-9]+)").unwrap())
}

fn image_re() -> &'static Regex {
    IMAGE_RE.get_or_init(|| {
        Regex::new(r"^(?:https?://)?(?:www\.)?(?:m\.)?(?:i\.)?imgur\.com/([a-zA-Z0-9]+)").unwrap()
    })
}

fn capture<'a>(re: &Regex, url: &'a str) -> Option<&'a str> {
    re.captures(url).and_then(|c| c.get(1)).map(|m| m.as_str())
}

fn force_https(url: &str) -> String {
    match url.strip_prefix("http:") {
        Some(rest) => format!("https:{rest}"),
        None => url.to_string(),
    }
}

fn has_image_extension(url: &str) -> bool {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_ascii_lowercase(),
        Err(_) => url.to_ascii_lowercase(),
    };
    path.ends_with(".png") || path.ends_with(".jpg")
}

// ---------------------------------------------------------------------------
// ImageResolver
// ---------------------------------------------------------------------------

pub struct ImageResolver<'a> {
    host: &'a dyn ImageHost,
}

impl<'a> ImageResolver<'a> {
    pub fn new(host: &'a dyn ImageHost) -> Self {
        Self { host }
    }

    /// Resolve `raw` to a direct image link.
    ///
    /// Album, gallery and single-image pages are looked up through the host
    /// in that order; a lookup that comes back without a link falls through to
    /// the next pattern. Links that already point at a `.png`/`.jpg` are
    /// returned as-is. `Ok(None)` means nothing could be determined.
    pub fn resolve(&self, raw: &str) -> Result<Option<String>> {
        let url = force_https(raw.trim());

        if let Some(id) = capture(album_re(), &url) {
            if let Some(link) = self.step("album", id, self.host.album(id)?) {
                return Ok(Some(link));
            }
        }

        if let Some(id) = capture(gallery_re(), &url) {
            if let Some(link) = self.step("gallery", id, self.host.gallery(id)?) {
                return Ok(Some(link));
            }
        }

        if let Some(id) = capture(image_re(), &url) {
            if let Some(link) = self.step("image", id, self.host.image(id)?) {
                return Ok(Some(link));
            }
        }

        if has_image_extension(&url) {
            return Ok(Some(url));
        }

        Ok(None)
    }

    fn step(&self, kind: &str, id: &str, lookup: Lookup) -> Option<String> {
        if !matches!(lookup, Lookup::Found { .. }) {
            tracing::debug!(kind, id, outcome = ?lookup, "image lookup fell through");
        }
        lookup.link()
    }
}

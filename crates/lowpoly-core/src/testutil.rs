//! In-memory collaborators shared by the engine tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use crate::error::{ContestError, Result};
use crate::forum::{Comment, FlairTemplate, ForumClient, Post, PostBody};
use crate::http::ImageFetcher;
use crate::resolver::{ImageHost, Lookup};

pub fn post(id: &str, title: &str, url: &str) -> Post {
    Post {
        id: id.into(),
        title: title.into(),
        author: Some(format!("u_{id}")),
        url: url.into(),
        short_link: format!("https://redd.it/{id}"),
    }
}

pub fn comment(body: &str, author: &str, score: i64) -> Comment {
    Comment {
        id: format!("c_{author}"),
        body: body.into(),
        author: author.into(),
        score,
    }
}

pub fn png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb(color));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

// ---------------------------------------------------------------------------
// FakeForum
// ---------------------------------------------------------------------------

/// Records every call as `"method:arg"`; methods named in `failing` error out.
#[derive(Default)]
pub struct FakeForum {
    pub calls: RefCell<Vec<String>>,
    pub search_results: Vec<Post>,
    pub top: Option<Comment>,
    pub sidebar: RefCell<String>,
    pub stylesheet: RefCell<String>,
    pub flairs: RefCell<Vec<FlairTemplate>>,
    pub submitted: RefCell<Vec<(String, PostBody)>>,
    pub uploads: RefCell<Vec<Vec<u8>>>,
    pub failing: HashSet<&'static str>,
    pub next_id: Cell<u32>,
}

impl FakeForum {
    pub fn failing_on(mut self, method: &'static str) -> Self {
        self.failing.insert(method);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.submitted.borrow().iter().map(|(t, _)| t.clone()).collect()
    }

    fn record(&self, method: &'static str, arg: &str) -> Result<()> {
        self.calls.borrow_mut().push(format!("{method}:{arg}"));
        if self.failing.contains(method) {
            return Err(ContestError::Upstream {
                status: 500,
                url: format!("fake://{method}"),
            });
        }
        Ok(())
    }
}

impl ForumClient for FakeForum {
    fn search_by_flair(&self, tag: &str) -> Result<Vec<Post>> {
        self.record("search", tag)?;
        Ok(self.search_results.clone())
    }

    fn submit(&self, title: &str, body: &PostBody) -> Result<Post> {
        self.record("submit", title)?;
        let n = self.next_id.get() + 1;
        self.next_id.set(n);
        let id = format!("p{n}");
        self.submitted
            .borrow_mut()
            .push((title.to_string(), body.clone()));
        Ok(post(&id, title, &format!("https://forum.test/{id}")))
    }

    fn pin(&self, post_id: &str, bottom: bool) -> Result<()> {
        let slot = if bottom { "bottom" } else { "top" };
        self.record("pin", &format!("{post_id}:{slot}"))
    }

    fn unpin(&self, post_id: &str) -> Result<()> {
        self.record("unpin", post_id)
    }

    fn lock(&self, post_id: &str) -> Result<()> {
        self.record("lock", post_id)
    }

    fn set_contest_mode(&self, post_id: &str) -> Result<()> {
        self.record("contest_mode", post_id)
    }

    fn top_comment(&self, post_id: &str) -> Result<Option<Comment>> {
        self.record("top_comment", post_id)?;
        Ok(self.top.clone())
    }

    fn sidebar_text(&self) -> Result<String> {
        self.record("sidebar", "")?;
        Ok(self.sidebar.borrow().clone())
    }

    fn set_sidebar_text(&self, text: &str) -> Result<()> {
        self.record("set_sidebar", "")?;
        *self.sidebar.borrow_mut() = text.to_string();
        Ok(())
    }

    fn stylesheet_text(&self) -> Result<String> {
        self.record("stylesheet", "")?;
        Ok(self.stylesheet.borrow().clone())
    }

    fn set_stylesheet_text(&self, text: &str) -> Result<()> {
        self.record("set_stylesheet", "")?;
        *self.stylesheet.borrow_mut() = text.to_string();
        Ok(())
    }

    fn upload_header_image(&self, jpeg: &[u8]) -> Result<()> {
        self.record("upload_header", &jpeg.len().to_string())?;
        self.uploads.borrow_mut().push(jpeg.to_vec());
        Ok(())
    }

    fn replace_flair_templates(&self, templates: &[FlairTemplate]) -> Result<()> {
        self.record("replace_flairs", &templates.len().to_string())?;
        *self.flairs.borrow_mut() = templates.to_vec();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Image host and fetcher
// ---------------------------------------------------------------------------

/// Answers image lookups from a table; anything unknown is `NotFound`.
#[derive(Default)]
pub struct TableHost {
    pub images: HashMap<String, Lookup>,
    pub fail_for: HashSet<String>,
}

impl TableHost {
    fn answer(&self, id: &str) -> Result<Lookup> {
        if self.fail_for.contains(id) {
            return Err(ContestError::Upstream {
                status: 403,
                url: format!("fake://imgur/{id}"),
            });
        }
        Ok(self.images.get(id).cloned().unwrap_or(Lookup::NotFound))
    }
}

impl ImageHost for TableHost {
    fn album(&self, id: &str) -> Result<Lookup> {
        self.answer(id)
    }

    fn gallery(&self, id: &str) -> Result<Lookup> {
        self.answer(id)
    }

    fn image(&self, id: &str) -> Result<Lookup> {
        self.answer(id)
    }
}

#[derive(Default)]
pub struct FakeFetcher {
    pub body: Option<Vec<u8>>,
    pub fetched: RefCell<Vec<String>>,
}

impl ImageFetcher for FakeFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.fetched.borrow_mut().push(url.to_string());
        self.body.clone().ok_or_else(|| ContestError::Upstream {
            status: 404,
            url: url.to_string(),
        })
    }
}

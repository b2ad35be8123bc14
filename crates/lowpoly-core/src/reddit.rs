//! Reddit OAuth API implementation of [`ForumClient`].
//!
//! Authenticates with a long-lived refresh token and caches the access token
//! for the lifetime of the client (one daily run).

use std::cell::RefCell;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ContestError, Result};
use crate::forum::{Comment, FlairTemplate, ForumClient, Post, PostBody};
use crate::http::ensure_success;

pub const DEFAULT_AUTH_URL: &str = "https://www.reddit.com";
pub const DEFAULT_API_URL: &str = "https://oauth.reddit.com";

const SIDEBAR_PAGE: &str = "config/sidebar";
const HEADER_IMAGE_NAME: &str = "headerimg";
const SEARCH_PAGE_SIZE: &str = "100";

#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct LinkData {
    id: String,
    title: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct CommentData {
    id: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    score: i64,
}

fn fullname(post_id: &str) -> String {
    if post_id.starts_with("t3_") {
        post_id.to_string()
    } else {
        format!("t3_{post_id}")
    }
}

fn short_link(id: &str) -> String {
    format!("https://redd.it/{id}")
}

/// `children[].data` of a listing, keeping only things of `kind`.
fn listing_children(listing: &Value, kind: &str) -> Vec<Value> {
    listing["data"]["children"]
        .as_array()
        .map(|children| {
            children
                .iter()
                .filter(|c| c["kind"] == kind)
                .map(|c| c["data"].clone())
                .collect()
        })
        .unwrap_or_default()
}

pub struct RedditClient {
    http: Client,
    auth_url: String,
    api_url: String,
    subreddit: String,
    credentials: RedditCredentials,
    token: RefCell<Option<String>>,
}

impl RedditClient {
    pub fn new(
        http: Client,
        auth_url: impl Into<String>,
        api_url: impl Into<String>,
        subreddit: impl Into<String>,
        credentials: RedditCredentials,
    ) -> Self {
        Self {
            http,
            auth_url: auth_url.into().trim_end_matches('/').to_string(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            subreddit: subreddit.into(),
            credentials,
            token: RefCell::new(None),
        }
    }

    fn access_token(&self) -> Result<String> {
        if let Some(token) = self.token.borrow().as_ref() {
            return Ok(token.clone());
        }
        let url = format!("{}/api/v1/access_token", self.auth_url);
        let resp = self
            .http
            .post(&url)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.credentials.refresh_token.as_str()),
            ])
            .send()?;
        let token: TokenResponse = ensure_success(resp)?.json()?;
        tracing::debug!("obtained reddit access token");
        *self.token.borrow_mut() = Some(token.access_token.clone());
        Ok(token.access_token)
    }

    fn send(&self, req: RequestBuilder, url: &str) -> Result<Value> {
        let resp = ensure_success(req.bearer_auth(self.access_token()?).send()?)?;
        let text = resp.text()?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        let value: Value = serde_json::from_str(&text).map_err(|e| ContestError::BadResponse {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        check_api_errors(&value, url)?;
        Ok(value)
    }

    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}{path}", self.api_url);
        let req = self.http.get(&url).query(query).query(&[("raw_json", "1")]);
        self.send(req, &url)
    }

    fn post(&self, path: &str, form: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}{path}", self.api_url);
        let req = self.http.post(&url).form(form);
        self.send(req, &url)
    }

    fn sub_path(&self, rest: &str) -> String {
        format!("/r/{}/{rest}", self.subreddit)
    }

    fn sticky(&self, post_id: &str, state: bool, bottom: bool) -> Result<()> {
        let id = fullname(post_id);
        let state = if state { "true" } else { "false" };
        let mut form = vec![("id", id.as_str()), ("state", state), ("api_type", "json")];
        if !bottom {
            form.push(("num", "1"));
        }
        self.post("/api/set_subreddit_sticky", &form)?;
        Ok(())
    }
}

/// `api_type=json` endpoints report failures inside a 200 response.
fn check_api_errors(value: &Value, url: &str) -> Result<()> {
    let errors = value
        .get("json")
        .and_then(|j| j.get("errors"))
        .or_else(|| value.get("errors"));
    match errors.and_then(Value::as_array) {
        Some(list) if !list.is_empty() => Err(ContestError::BadResponse {
            url: url.to_string(),
            reason: Value::Array(list.clone()).to_string(),
        }),
        _ => Ok(()),
    }
}

impl ForumClient for RedditClient {
    fn search_by_flair(&self, tag: &str) -> Result<Vec<Post>> {
        let query = format!("flair:\"*{tag}\"");
        let path = self.sub_path("search");
        let mut posts = Vec::new();
        let mut after: Option<String> = None;
        loop {
            let mut params = vec![
                ("q", query.as_str()),
                ("restrict_sr", "on"),
                ("sort", "new"),
                ("limit", SEARCH_PAGE_SIZE),
            ];
            if let Some(cursor) = after.as_deref() {
                params.push(("after", cursor));
            }
            let listing = self.get(&path, &params)?;
            let children = listing_children(&listing, "t3");
            if children.is_empty() {
                break;
            }
            for data in children {
                let link: LinkData = serde_json::from_value(data)?;
                posts.push(Post {
                    short_link: short_link(&link.id),
                    id: link.id,
                    title: link.title,
                    author: link.author,
                    url: link.url,
                });
            }
            match listing["data"]["after"].as_str() {
                Some(next) if !next.is_empty() => after = Some(next.to_string()),
                _ => break,
            }
        }
        tracing::debug!(tag, found = posts.len(), "flair search finished");
        Ok(posts)
    }

    fn submit(&self, title: &str, body: &PostBody) -> Result<Post> {
        let (kind, field, content) = match body {
            PostBody::Text(text) => ("self", "text", text.as_str()),
            PostBody::Link(url) => ("link", "url", url.as_str()),
        };
        let value = self.post(
            "/api/submit",
            &[
                ("sr", self.subreddit.as_str()),
                ("kind", kind),
                ("title", title),
                (field, content),
                ("resubmit", "true"),
                ("api_type", "json"),
            ],
        )?;
        let data = &value["json"]["data"];
        let id = data["id"]
            .as_str()
            .ok_or_else(|| ContestError::BadResponse {
                url: format!("{}/api/submit", self.api_url),
                reason: "submit response has no post id".into(),
            })?
            .to_string();
        tracing::info!(post = %id, title, "submitted post");
        Ok(Post {
            short_link: short_link(&id),
            url: data["url"].as_str().unwrap_or_default().to_string(),
            id,
            title: title.to_string(),
            author: None,
        })
    }

    fn pin(&self, post_id: &str, bottom: bool) -> Result<()> {
        self.sticky(post_id, true, bottom)
    }

    fn unpin(&self, post_id: &str) -> Result<()> {
        self.sticky(post_id, false, true)
    }

    fn lock(&self, post_id: &str) -> Result<()> {
        self.post("/api/lock", &[("id", fullname(post_id).as_str())])?;
        Ok(())
    }

    fn set_contest_mode(&self, post_id: &str) -> Result<()> {
        self.post(
            "/api/set_contest_mode",
            &[
                ("id", fullname(post_id).as_str()),
                ("state", "true"),
                ("api_type", "json"),
            ],
        )?;
        Ok(())
    }

    fn top_comment(&self, post_id: &str) -> Result<Option<Comment>> {
        let id = post_id.trim_start_matches("t3_");
        let value = self.get(&format!("/comments/{id}"), &[("sort", "top")])?;
        // [post listing, comment listing]
        let mut best: Option<Comment> = None;
        for data in listing_children(&value[1], "t1") {
            let c: CommentData = serde_json::from_value(data)?;
            if best.as_ref().map_or(true, |b| c.score > b.score) {
                best = Some(Comment {
                    id: c.id,
                    body: c.body,
                    author: c.author,
                    score: c.score,
                });
            }
        }
        Ok(best)
    }

    fn sidebar_text(&self) -> Result<String> {
        let value = self.get(&self.sub_path(&format!("wiki/{SIDEBAR_PAGE}")), &[])?;
        Ok(value["data"]["content_md"]
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    fn set_sidebar_text(&self, text: &str) -> Result<()> {
        self.post(
            &self.sub_path("api/wiki/edit"),
            &[
                ("page", SIDEBAR_PAGE),
                ("content", text),
                ("reason", "monthly winner"),
            ],
        )?;
        Ok(())
    }

    fn stylesheet_text(&self) -> Result<String> {
        let value = self.get(&self.sub_path("about/stylesheet"), &[])?;
        Ok(value["data"]["stylesheet"]
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    fn set_stylesheet_text(&self, text: &str) -> Result<()> {
        self.post(
            &self.sub_path("api/subreddit_stylesheet"),
            &[
                ("op", "save"),
                ("stylesheet_contents", text),
                ("reason", "monthly accent colors"),
                ("api_type", "json"),
            ],
        )?;
        Ok(())
    }

    fn upload_header_image(&self, jpeg: &[u8]) -> Result<()> {
        let url = format!("{}{}", self.api_url, self.sub_path("api/upload_sr_img"));
        let file = Part::bytes(jpeg.to_vec())
            .file_name("header.jpg")
            .mime_str("image/jpeg")?;
        let form = Form::new()
            .text("name", HEADER_IMAGE_NAME)
            .text("upload_type", "img")
            .text("img_type", "jpg")
            .part("file", file);
        self.send(self.http.post(&url).multipart(form), &url)?;
        tracing::info!(bytes = jpeg.len(), "uploaded header image");
        Ok(())
    }

    fn replace_flair_templates(&self, templates: &[FlairTemplate]) -> Result<()> {
        self.post(
            &self.sub_path("api/clearflairtemplates"),
            &[("flair_type", "LINK_FLAIR"), ("api_type", "json")],
        )?;
        for template in templates {
            let editable = if template.text_editable { "true" } else { "false" };
            self.post(
                &self.sub_path("api/flairtemplate"),
                &[
                    ("flair_type", "LINK_FLAIR"),
                    ("text", template.text.as_str()),
                    ("css_class", template.css_class.as_str()),
                    ("text_editable", editable),
                    ("api_type", "json"),
                ],
            )?;
        }
        tracing::info!(count = templates.len(), "replaced link flair templates");
        Ok(())
    }
}

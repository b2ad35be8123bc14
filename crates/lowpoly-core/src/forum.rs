//! The forum (subreddit) operations the contest needs.

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    /// Linked URL for link posts, the post's own page for self posts.
    pub url: String,
    pub short_link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub body: String,
    pub author: String,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostBody {
    Text(String),
    Link(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlairTemplate {
    pub text: String,
    pub css_class: String,
    pub text_editable: bool,
}

pub trait ForumClient {
    /// Posts whose link flair text matches `tag`.
    fn search_by_flair(&self, tag: &str) -> Result<Vec<Post>>;
    fn submit(&self, title: &str, body: &PostBody) -> Result<Post>;
    /// Pin a post. `bottom` places it beneath the existing pins.
    fn pin(&self, post_id: &str, bottom: bool) -> Result<()>;
    fn unpin(&self, post_id: &str) -> Result<()>;
    fn lock(&self, post_id: &str) -> Result<()>;
    /// Hide vote counts and randomize comment order.
    fn set_contest_mode(&self, post_id: &str) -> Result<()>;
    /// Highest-scored top-level comment, if any.
    fn top_comment(&self, post_id: &str) -> Result<Option<Comment>>;
    fn sidebar_text(&self) -> Result<String>;
    fn set_sidebar_text(&self, text: &str) -> Result<()>;
    fn stylesheet_text(&self) -> Result<String>;
    fn set_stylesheet_text(&self, text: &str) -> Result<()>;
    fn upload_header_image(&self, jpeg: &[u8]) -> Result<()>;
    fn replace_flair_templates(&self, templates: &[FlairTemplate]) -> Result<()>;
}

//! Collect last month's contest entries into the submission store.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::calendar::{month_name, previous_month};
use crate::error::Result;
use crate::forum::{ForumClient, Post};
use crate::resolver::ImageResolver;
use crate::store::SubmissionStore;
use crate::types::Submission;

const DELETED_AUTHOR: &str = "[deleted]";

static BRACKETED_RE: OnceLock<Regex> = OnceLock::new();

fn bracketed_re() -> &'static Regex {
    BRACKETED_RE.get_or_init(|| Regex::new(r"\[[^\]]*\]").unwrap())
}

/// Flair suffix carried by entries submitted in the month before `today`.
pub fn submission_tag(today: NaiveDate) -> String {
    let (year, month) = previous_month(today);
    format!("{} {year} SUBMISSION", month_name(month))
}

/// `"[OC] Fox [WIP]"` becomes `"Fox"`.
pub fn clean_title(title: &str) -> String {
    bracketed_re().replace_all(title, "").trim().to_string()
}

fn to_submission(post: &Post, resolver: &ImageResolver<'_>) -> Submission {
    let image = match resolver.resolve(&post.url) {
        Ok(link) => link,
        Err(e) => {
            tracing::warn!(post = %post.id, url = %post.url, error = %e, "image resolution failed");
            None
        }
    };
    Submission {
        id: post.id.clone(),
        title: clean_title(&post.title),
        image,
        author: post
            .author
            .clone()
            .unwrap_or_else(|| DELETED_AUTHOR.to_string()),
        source_url: post.short_link.clone(),
    }
}

/// Search the forum for last month's entries and replace the stored set.
pub fn ingest(
    forum: &dyn ForumClient,
    resolver: &ImageResolver<'_>,
    store: &(impl SubmissionStore + ?Sized),
    today: NaiveDate,
) -> Result<Vec<Submission>> {
    let tag = submission_tag(today);
    let posts = forum.search_by_flair(&tag)?;
    let submissions: Vec<Submission> = posts
        .iter()
        .map(|post| to_submission(post, resolver))
        .collect();
    store.replace_all(&submissions)?;
    tracing::info!(
        tag,
        count = submissions.len(),
        unresolved = submissions.iter().filter(|s| s.image.is_none()).count(),
        "ingested submissions"
    );
    Ok(submissions)
}

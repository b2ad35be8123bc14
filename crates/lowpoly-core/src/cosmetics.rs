//! Sidebar, header banner and stylesheet refresh after a winner is chosen.

use image::DynamicImage;

use crate::color::ColorDeriver;
use crate::cycle::StepFailure;
use crate::error::Result;
use crate::forum::ForumClient;
use crate::header::{self, BannerSize};
use crate::http::ImageFetcher;
use crate::splice::splice_or_skip;
use crate::templates;
use crate::types::Submission;

pub struct Cosmetics<'a> {
    pub forum: &'a dyn ForumClient,
    pub fetcher: &'a dyn ImageFetcher,
    pub deriver: ColorDeriver,
    pub banner: BannerSize,
    pub sidebar_marker: &'a str,
    pub stylesheet_marker: &'a str,
}

impl Cosmetics<'_> {
    /// Refresh every cosmetic. Each step fails on its own; failures are
    /// returned rather than propagated.
    pub fn publish(&self, month: &str, winner: &Submission) -> Vec<StepFailure> {
        let mut failures = Vec::new();

        if let Err(e) = self.update_sidebar(month, winner) {
            failures.push(StepFailure::new("sidebar", &e));
        }

        let Some(url) = winner.image.as_deref() else {
            tracing::warn!(winner = %winner.id, "winner has no image; header and colors unchanged");
            return failures;
        };
        let banner = match self.prepare_banner(url) {
            Ok(banner) => banner,
            Err(e) => {
                failures.push(StepFailure::new("banner", &e));
                return failures;
            }
        };
        if let Err(e) = self.upload_header(&banner) {
            failures.push(StepFailure::new("header", &e));
        }
        if let Err(e) = self.update_stylesheet(&banner) {
            failures.push(StepFailure::new("stylesheet", &e));
        }
        failures
    }

    /// Returns whether the sidebar was written.
    pub fn update_sidebar(&self, month: &str, winner: &Submission) -> Result<bool> {
        let current = self.forum.sidebar_text()?;
        let block = templates::sidebar_winner(month, winner);
        let Some(updated) = splice_or_skip(&current, &block, self.sidebar_marker) else {
            return Ok(false);
        };
        self.forum.set_sidebar_text(&updated)?;
        tracing::info!(winner = %winner.id, "sidebar updated");
        Ok(true)
    }

    pub fn prepare_banner(&self, image_url: &str) -> Result<DynamicImage> {
        let bytes = self.fetcher.fetch(image_url)?;
        let source = header::decode(&bytes)?;
        Ok(header::banner(&source, self.banner))
    }

    pub fn upload_header(&self, banner: &DynamicImage) -> Result<()> {
        let jpeg = header::encode_jpeg(banner)?;
        self.forum.upload_header_image(&jpeg)
    }

    /// Returns whether the stylesheet was written.
    pub fn update_stylesheet(&self, banner: &DynamicImage) -> Result<bool> {
        let Some(colors) = self.deriver.derive(banner) else {
            tracing::warn!("no accent color found in banner; stylesheet unchanged");
            return Ok(false);
        };
        let current = self.forum.stylesheet_text()?;
        let css = templates::accent_css(&colors);
        let Some(updated) = splice_or_skip(&current, &css, self.stylesheet_marker) else {
            return Ok(false);
        };
        self.forum.set_stylesheet_text(&updated)?;
        tracing::info!(primary = %colors.primary, "stylesheet accent colors updated");
        Ok(true)
    }
}

//! Banner preparation for the forum header image.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerSize {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// Distance above the vertical centre where the crop band starts.
    #[serde(default = "default_offset")]
    pub centre_offset: u32,
}

fn default_width() -> u32 {
    1920
}

fn default_height() -> u32 {
    416
}

fn default_offset() -> u32 {
    260
}

impl Default for BannerSize {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            centre_offset: default_offset(),
        }
    }
}

/// Cut the banner band out of `source` and scale it to the banner size.
///
/// The band is located as if the whole image were scaled to the banner width,
/// but only the band itself is resampled.
pub fn banner(source: &DynamicImage, size: BannerSize) -> DynamicImage {
    let (w, h) = (u64::from(source.width().max(1)), u64::from(source.height().max(1)));
    let width = u64::from(size.width.max(1));
    let scaled_height = (h * width / w).max(1);

    let band = u64::from(size.height).min(scaled_height);
    let top = (scaled_height / 2)
        .saturating_sub(u64::from(size.centre_offset))
        .min(scaled_height - band);

    // back to source rows
    let src_top = (top * w / width).min(h - 1);
    let src_band = (band * w).div_ceil(width).clamp(1, h - src_top);
    let region = source.crop_imm(0, src_top as u32, w as u32, src_band as u32);
    DynamicImage::ImageRgb8(region.to_rgb8()).resize_exact(
        size.width,
        band as u32,
        FilterType::Lanczos3,
    )
}

pub fn encode_jpeg(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut buf, ImageFormat::Jpeg)?;
    Ok(buf.into_inner())
}

pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

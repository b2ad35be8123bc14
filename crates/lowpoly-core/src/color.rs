//! Accent color derivation for the forum stylesheet.
//!
//! The dominant color comes from a color cube: pixels are binned into a
//! `resolution³` RGB histogram, local maxima of that histogram become
//! candidate colors, and candidates too close to an avoided color (white) or
//! to a stronger candidate are dropped.

use image::imageops::FilterType;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

pub const SAMPLE_SIZE: u32 = 50;
pub const HOVER_SCALE: f64 = 1.1;
pub const ACTIVE_SCALE: f64 = 0.75;

// ---------------------------------------------------------------------------
// ColorScheme
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorScheme {
    pub primary: String,
    pub hover: String,
    pub active: String,
}

impl ColorScheme {
    pub fn from_primary(primary: &str) -> Self {
        Self {
            primary: primary.to_string(),
            hover: scale(primary, HOVER_SCALE),
            active: scale(primary, ACTIVE_SCALE),
        }
    }
}

pub fn to_hex(rgb: [u8; 3]) -> String {
    format!("#{:02X}{:02X}{:02X}", rgb[0], rgb[1], rgb[2])
}

/// Scale every channel of a `#RRGGBB` color by `factor`, clamped to 0..=255.
///
/// Factors below 1 darken, above 1 brighten. A negative factor or a string
/// that is not six hex digits is returned unchanged.
pub fn scale(hex: &str, factor: f64) -> String {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if factor < 0.0 || factor.is_nan() || digits.len() != 6 || !digits.is_ascii() {
        return hex.to_string();
    }

    let mut rgb = [0u8; 3];
    for (i, channel) in rgb.iter_mut().enumerate() {
        let Ok(value) = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16) else {
            return hex.to_string();
        };
        *channel = (f64::from(value) * factor).clamp(0.0, 255.0) as u8;
    }
    to_hex(rgb)
}

// ---------------------------------------------------------------------------
// ColorCube
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ColorCube {
    resolution: usize,
    /// Pixels whose brightest channel is below this (0..1) are ignored.
    bright_threshold: f32,
    /// Minimum distance (0..1 RGB space) between returned colors.
    distinct_threshold: f32,
    avoid: Vec<[u8; 3]>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Cell {
    hits: u32,
    sum: [u64; 3],
}

#[derive(Debug, Clone, Copy)]
struct Maximum {
    hits: u32,
    color: [u8; 3],
}

impl Default for ColorCube {
    fn default() -> Self {
        Self::new(0.6, 0.8, vec![[255, 255, 255]])
    }
}

impl ColorCube {
    pub fn new(bright_threshold: f32, distinct_threshold: f32, avoid: Vec<[u8; 3]>) -> Self {
        Self {
            resolution: 30,
            bright_threshold,
            distinct_threshold,
            avoid,
        }
    }

    fn index(&self, r: usize, g: usize, b: usize) -> usize {
        (r * self.resolution + g) * self.resolution + b
    }

    fn bin(&self, channel: u8) -> usize {
        let scaled = f32::from(channel) / 255.0 * (self.resolution - 1) as f32;
        scaled.round() as usize
    }

    /// Candidate colors, strongest first.
    pub fn colors(&self, image: &image::RgbImage) -> Vec<[u8; 3]> {
        let res = self.resolution;
        let mut cells = vec![Cell::default(); res * res * res];

        for pixel in image.pixels() {
            let [r, g, b] = pixel.0;
            let brightest = r.max(g).max(b);
            if f32::from(brightest) / 255.0 < self.bright_threshold {
                continue;
            }
            let cell = &mut cells[self.index(self.bin(r), self.bin(g), self.bin(b))];
            cell.hits += 1;
            cell.sum[0] += u64::from(r);
            cell.sum[1] += u64::from(g);
            cell.sum[2] += u64::from(b);
        }

        let mut maxima = self.local_maxima(&cells);
        maxima.sort_by(|a, b| b.hits.cmp(&a.hits));

        let avoided: Vec<Maximum> = maxima
            .into_iter()
            .filter(|m| {
                self.avoid
                    .iter()
                    .all(|&c| distance(m.color, c) >= self.distinct_threshold)
            })
            .collect();

        let mut distinct: Vec<Maximum> = Vec::new();
        for m in avoided {
            if distinct
                .iter()
                .all(|kept| distance(kept.color, m.color) >= self.distinct_threshold)
            {
                distinct.push(m);
            }
        }
        distinct.into_iter().map(|m| m.color).collect()
    }

    fn local_maxima(&self, cells: &[Cell]) -> Vec<Maximum> {
        let res = self.resolution as isize;
        let mut maxima = Vec::new();
        for r in 0..res {
            for g in 0..res {
                for b in 0..res {
                    let cell = cells[self.index(r as usize, g as usize, b as usize)];
                    if cell.hits == 0 {
                        continue;
                    }
                    let mut is_max = true;
                    'neighbours: for dr in -1..=1 {
                        for dg in -1..=1 {
                            for db in -1..=1 {
                                if dr == 0 && dg == 0 && db == 0 {
                                    continue;
                                }
                                let (nr, ng, nb) = (r + dr, g + dg, b + db);
                                if !(0..res).contains(&nr)
                                    || !(0..res).contains(&ng)
                                    || !(0..res).contains(&nb)
                                {
                                    continue;
                                }
                                let n = cells[self.index(nr as usize, ng as usize, nb as usize)];
                                if n.hits > cell.hits {
                                    is_max = false;
                                    break 'neighbours;
                                }
                            }
                        }
                    }
                    if is_max {
                        let hits = u64::from(cell.hits);
                        maxima.push(Maximum {
                            hits: cell.hits,
                            color: [
                                (cell.sum[0] / hits) as u8,
                                (cell.sum[1] / hits) as u8,
                                (cell.sum[2] / hits) as u8,
                            ],
                        });
                    }
                }
            }
        }
        maxima
    }
}

fn distance(a: [u8; 3], b: [u8; 3]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = (f32::from(x) - f32::from(y)) / 255.0;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

// ---------------------------------------------------------------------------
// ColorDeriver
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ColorDeriver {
    cube: ColorCube,
}

impl ColorDeriver {
    pub fn new(cube: ColorCube) -> Self {
        Self { cube }
    }

    /// Dominant accent color of `image` and its hover/active shades.
    ///
    /// `None` when no pixel survives the brightness and avoid filters.
    pub fn derive(&self, image: &DynamicImage) -> Option<ColorScheme> {
        let sample = image
            .resize_exact(SAMPLE_SIZE, SAMPLE_SIZE, FilterType::Nearest)
            .to_rgb8();
        let primary = self.cube.colors(&sample).into_iter().next()?;
        Some(ColorScheme::from_primary(&to_hex(primary)))
    }
}

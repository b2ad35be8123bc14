use std::path::Path;

use anyhow::Context;
use lowpoly_core::color::ColorDeriver;
use lowpoly_core::header;

use crate::output::{print_fields, print_json};

pub fn run(config_path: &Path, image: &Path, json: bool) -> anyhow::Result<()> {
    let config = super::config_or_default(config_path)?;
    let bytes =
        std::fs::read(image).with_context(|| format!("failed to read {}", image.display()))?;
    let decoded =
        header::decode(&bytes).with_context(|| format!("failed to decode {}", image.display()))?;

    let Some(scheme) = ColorDeriver::new(config.colors.cube()).derive(&decoded) else {
        anyhow::bail!("no accent color found in {}", image.display());
    };

    if json {
        return print_json(&scheme);
    }
    print_fields(&[
        ("primary", scheme.primary),
        ("hover", scheme.hover),
        ("active", scheme.active),
    ]);
    Ok(())
}

//! Marker-delimited text substitution for sidebar and stylesheet text.
//!
//! A region is delimited by the empty markdown links `[](#NAME)` and
//! `[](/NAME)`. They render as nothing on the forum, so the bot can own a
//! slice of otherwise hand-edited text.

use regex::Regex;

use crate::error::{ContestError, Result};

pub fn opening_anchor(marker: &str) -> String {
    format!("[](#{marker})")
}

pub fn closing_anchor(marker: &str) -> String {
    format!("[](/{marker})")
}

/// Replace the region owned by `marker` with `replacement`.
///
/// Anything between the first opening anchor and the last closing anchor is
/// collapsed first, so applying the same splice twice gives the same text.
/// Returns [`ContestError::MarkerNotFound`] when the opening anchor is absent.
pub fn splice(content: &str, replacement: &str, marker: &str) -> Result<String> {
    let open = opening_anchor(marker);
    let close = closing_anchor(marker);

    // (?s) so the region may span lines; greedy to the last closing anchor.
    let region = Regex::new(&format!(
        r"(?s)({}).*({})",
        regex::escape(&open),
        regex::escape(&close)
    ))
    .map_err(|e| ContestError::InvalidConfig(format!("marker '{marker}': {e}")))?;
    let collapsed = region.replace(content, "${1}${2}");

    let Some(pos) = collapsed.find(&open) else {
        return Err(ContestError::MarkerNotFound(open));
    };
    let insert_at = pos + open.len();

    let mut updated = String::with_capacity(collapsed.len() + replacement.len());
    updated.push_str(&collapsed[..insert_at]);
    updated.push_str(replacement);
    updated.push_str(&collapsed[insert_at..]);
    Ok(updated)
}

/// Like [`splice`], but hands back `None` (after logging) when the marker is
/// missing so the caller can skip the write.
pub fn splice_or_skip(content: &str, replacement: &str, marker: &str) -> Option<String> {
    match splice(content, replacement, marker) {
        Ok(updated) => Some(updated),
        Err(e) => {
            tracing::warn!(marker, error = %e, "leaving content unchanged");
            None
        }
    }
}

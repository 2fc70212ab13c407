//! Query segmentation on conjunction and punctuation boundaries.
//!
//! Separators are `,`/`;` followed by whitespace, or a whitespace-delimited
//! conjunction (Ukrainian `і та и а й`, English `and or`). Segments are the
//! raw text between separators; whitespace-only pieces are dropped. A text
//! with no usable piece is a single segment covering everything.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::text::QueryText;

static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*[,;]\s+|\s+(?:і|та|и|а|й|and|or)\s+").expect("valid regex")
});

/// A contiguous span of the query between separators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    /// Start character position (inclusive)
    pub start: usize,
    /// End character position (exclusive)
    pub end: usize,
    pub index: usize,
}

impl Segment {
    pub fn contains(&self, position: usize) -> bool {
        self.start <= position && position < self.end
    }

    /// True when `[start, end)` overlaps this segment widened by `tolerance` on both sides.
    pub fn overlaps(&self, start: usize, end: usize, tolerance: usize) -> bool {
        start < self.end + tolerance && self.start.saturating_sub(tolerance) < end
    }
}

/// Split `text` into ordered, non-overlapping segments.
pub fn segment(text: &QueryText) -> Vec<Segment> {
    let mut bounds: Vec<(usize, usize)> = Vec::new();
    let mut last = 0usize;

    for sep in SEPARATOR_RE.find_iter(text.as_str()) {
        let (sep_start, sep_end) = (text.char_offset(sep.start()), text.char_offset(sep.end()));
        if !text.slice(last, sep_start).trim().is_empty() {
            bounds.push((last, sep_start));
        }
        last = sep_end;
    }
    if !text.slice(last, text.len()).trim().is_empty() {
        bounds.push((last, text.len()));
    }
    if bounds.is_empty() {
        bounds.push((0, text.len()));
    }

    let segments: Vec<Segment> = bounds
        .into_iter()
        .enumerate()
        .map(|(index, (start, end))| Segment {
            text: text.slice(start, end).to_string(),
            start,
            end,
            index,
        })
        .collect();

    tracing::debug!(
        segments = segments.len(),
        texts = ?segments.iter().map(|s| s.text.as_str()).collect::<Vec<_>>(),
        "Segmented query"
    );
    segments
}

/// Index of the segment containing `position`.
pub fn segment_of(segments: &[Segment], position: usize) -> Option<usize> {
    segments.iter().position(|s| s.contains(position))
}

//! Text normalization for entity mentions
//!
//! Provides the cleaning applied to every NER mention before registry lookup:
//! - Unicode NFKC normalization
//! - Non-breaking hyphen and space folding
//! - Leading/trailing punctuation stripping (internal `-` and `.` survive)
//! - Whitespace collapsing

use unicode_normalization::UnicodeNormalization;

use crate::text::lower_aligned;

/// Clean a raw mention for lookup, keeping its case.
///
/// # Examples
///
/// ```
/// use ipg_core::entity::normalize::clean_mention;
///
/// assert_eq!(clean_mention("  «SUN2000-15KTL-M2»,"), "SUN2000-15KTL-M2");
/// assert_eq!(clean_mention("HVS 10.2."), "HVS 10.2");
/// ```
pub fn clean_mention(s: &str) -> String {
    let folded: String = s
        .nfkc()
        .map(|c| match c {
            // NFKC turns U+2011 into U+2010
            '\u{2010}' | '\u{2011}' => '-',
            '\u{00A0}' => ' ',
            other => other,
        })
        .collect();

    folded
        .trim_matches(|c: char| !c.is_alphanumeric())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Case-insensitive lookup key: cleaned and lowercased.
pub fn lookup_key(s: &str) -> String {
    lower_aligned(&clean_mention(s))
}

/// Alphanumeric-only lowercase form (`LXP-LB-EU 10k` -> `lxplbeu10k`).
pub fn compact_key(s: &str) -> String {
    lower_aligned(s)
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

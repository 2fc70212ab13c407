//! Fuzzy string scoring for parameter detection.
//!
//! All scores are on a 0-100 scale and computed over Unicode characters:
//! - `ratio`: normalized indel similarity, `2 * LCS / (len_a + len_b)`
//! - `partial_ratio`: best `ratio` of the shorter string against every
//!   equal-length window of the longer one
//! - `token_sort_ratio`: `ratio` after sorting whitespace tokens
//! - `token_set_ratio`: `ratio` over shared/unshared token sets

use std::collections::BTreeSet;
use std::sync::LazyLock;

use rapidfuzz::distance::lcs_seq;
use regex::Regex;

static UK_PLURAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(ів|ами|ах|ям|ях)$").expect("valid regex"));
static UK_CASE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(и|і)$").expect("valid regex"));
static RU_PLURAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(ов|ами|ах|ам|ях)$").expect("valid regex"));
static EN_PLURAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(s|es)$").expect("valid regex"));
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Lowercase, strip one plural/case suffix per language group, collapse whitespace.
///
/// The strips run in sequence (Ukrainian plural, Ukrainian case, Russian,
/// English), each removing at most one trailing suffix.
pub fn normalize_for_matching(text: &str) -> String {
    let lowered = crate::text::lower_aligned(text.trim());
    let stripped = [&*UK_PLURAL_RE, &*UK_CASE_RE, &*RU_PLURAL_RE, &*EN_PLURAL_RE]
        .iter()
        .fold(lowered, |acc, re| re.replace(&acc, "").into_owned());
    WS_RE.replace_all(&stripped, " ").trim().to_string()
}

// =============================================================================
// Scorers
// =============================================================================

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    let lcs = lcs_seq::similarity(a.iter().copied(), b.iter().copied());
    100.0 * 2.0 * lcs as f64 / total as f64
}

pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let mut best = 0.0f64;
    for window in long.windows(short.len()) {
        best = best.max(ratio_chars(&short, window));
        if best >= 100.0 {
            break;
        }
    }
    best
}

pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let ta: BTreeSet<&str> = a.split_whitespace().collect();
    let tb: BTreeSet<&str> = b.split_whitespace().collect();

    let shared: Vec<&str> = ta.intersection(&tb).copied().collect();
    let only_a: Vec<&str> = ta.difference(&tb).copied().collect();
    let only_b: Vec<&str> = tb.difference(&ta).copied().collect();

    if !shared.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 100.0;
    }

    let sect = shared.join(" ");
    let with_a = shared.iter().chain(only_a.iter()).copied().collect::<Vec<_>>().join(" ");
    let with_b = shared.iter().chain(only_b.iter()).copied().collect::<Vec<_>>().join(" ");

    let mut best = ratio(&with_a, &with_b);
    if !sect.is_empty() {
        best = best.max(ratio(&sect, &with_a)).max(ratio(&sect, &with_b));
    }
    best
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Score a normalized candidate against a normalized synonym.
///
/// Multi-word synonyms score on word order-insensitive metrics, with a
/// 5-point bonus when the word counts match exactly, and are pulled toward
/// the partial score when that is higher. Single-word synonyms take the best
/// of the plain and partial ratios.
pub fn blended_score(
    candidate: &str,
    candidate_words: usize,
    synonym: &str,
    synonym_words: usize,
) -> f64 {
    if synonym_words > 1 {
        let mut score = token_sort_ratio(candidate, synonym).max(token_set_ratio(candidate, synonym));
        if candidate_words == synonym_words {
            score = (score + 5.0).min(100.0);
        }
        let partial = partial_ratio(candidate, synonym);
        if partial > score {
            score = (score + partial) / 2.0;
        }
        score
    } else {
        ratio(candidate, synonym).max(partial_ratio(candidate, synonym))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_normalize_strips_suffixes() {
        assert_eq!(normalize_for_matching("Ємності"), "ємност");
        assert_eq!(normalize_for_matching("weights"), "weight");
        assert_eq!(normalize_for_matching("  Кількість   MPPT "), "кількість mppt");
        assert_eq!(normalize_for_matching("трекерів"), "трекер");
    }

    #[test]
    fn test_ratio_counts_unicode_chars() {
        // One transposition in a Cyrillic phrase: LCS is 28 of 29 chars
        let score = ratio("максимальний струм заряджання", "максимальний струм заряджанян");
        assert!(approx(score, 100.0 * 56.0 / 58.0));
        assert!(approx(ratio(&"x".repeat(70), &"xy".repeat(20)), 100.0 * 40.0 / 110.0));
    }

    #[test]
    fn test_ratio_basics() {
        assert!(approx(ratio("", ""), 100.0));
        assert!(approx(ratio("abc", ""), 0.0));
        assert!(approx(ratio("weight", "weight"), 100.0));
        // waight/weight share 5 of 6 chars
        assert!(approx(ratio("waight", "weight"), 100.0 * 10.0 / 12.0));
    }

    #[test]
    fn test_partial_ratio_finds_substring() {
        assert!(approx(partial_ratio("ємність", "ємність батареї"), 100.0));
        assert!(approx(partial_ratio("", "abc"), 0.0));
    }

    #[test]
    fn test_token_scores_ignore_order() {
        assert!(approx(token_sort_ratio("струм максимальний", "максимальний струм"), 100.0));
        assert!(approx(token_set_ratio("max current", "max charge current"), 100.0));
        assert!(token_set_ratio("alpha beta", "gamma delta") < 60.0);
    }

    #[test]
    fn test_blended_score_word_count_bonus() {
        let exact_words = blended_score("charge current max", 3, "max charge current", 3);
        assert!(approx(exact_words, 100.0));
        let single = blended_score("waight", 1, "weight", 1);
        assert!(approx(single, 100.0 * 10.0 / 12.0));
    }
}

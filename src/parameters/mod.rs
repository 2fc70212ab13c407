//! Parameter detection: exact then fuzzy matching against the glossary.
//!
//! ## Phases
//!
//! 1. **Exact**: synonyms longest first; every word-bounded occurrence in the
//!    lowercase text that is not near an already claimed position becomes a
//!    match with fixed confidence.
//! 2. **Fuzzy**: every 2..N word window and every long non-stopword word is
//!    normalized and scored against every synonym; the best synonym at or
//!    above the threshold wins and is relocated onto the text. Candidates
//!    overlapping an exact hit are skipped.
//! 3. **Conflict resolution**: overlapping matches keep the strictly more
//!    confident one (earliest start, then the longer span, wins ties);
//!    same-key matches closer than the independence distance collapse.

pub mod fuzzy;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::config::MatchingConfig;
use crate::registry::{GlossaryEntry, ParameterGlossary};
use crate::text::{is_stopword, QueryText};

use fuzzy::{blended_score, normalize_for_matching, ratio};

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[\w\-]+\b").expect("valid regex"));

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Fuzzy,
}

/// A glossary parameter located in the query text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterMatch {
    pub key: String,
    pub matched_synonym: String,
    pub match_type: MatchType,
    pub confidence: f64,
    /// Start character position (inclusive)
    pub start: usize,
    /// End character position (exclusive)
    pub end: usize,
    /// Raw text covered by the match
    pub context: String,
}

impl ParameterMatch {
    fn overlaps(&self, other: &ParameterMatch) -> bool {
        self.start < other.end && other.start < self.end
    }

    fn span_len(&self) -> usize {
        self.end - self.start
    }
}

/// A word of the query with its character range.
#[derive(Debug, Clone, Copy)]
struct Word<'t> {
    text: &'t str,
    start: usize,
    end: usize,
}

/// Fuzzy candidate: a single word or a contiguous word window.
#[derive(Debug)]
struct Candidate {
    phrase: String,
    start: usize,
    end: usize,
    word_index: usize,
    word_count: usize,
}

// =============================================================================
// Matcher
// =============================================================================

/// Finds glossary parameters in query text.
pub struct ParameterMatcher<'a> {
    glossary: &'a ParameterGlossary,
    config: &'a MatchingConfig,
}

impl<'a> ParameterMatcher<'a> {
    pub fn new(glossary: &'a ParameterGlossary, config: &'a MatchingConfig) -> Self {
        Self { glossary, config }
    }

    /// All retained parameter matches, ordered by start position.
    pub fn find(&self, text: &QueryText) -> Vec<ParameterMatch> {
        let mut claimed: SmallVec<[usize; 8]> = SmallVec::new();
        let mut results = self.exact_phase(text, &mut claimed);
        self.fuzzy_phase(text, &mut claimed, &mut results);
        let resolved = self.resolve_conflicts(results);

        tracing::debug!(
            matches = resolved.len(),
            keys = ?resolved.iter().map(|m| m.key.as_str()).collect::<Vec<_>>(),
            "Parameter matching complete"
        );
        resolved
    }

    fn is_claimed(&self, claimed: &[usize], position: usize) -> bool {
        claimed
            .iter()
            .any(|&c| c.abs_diff(position) < self.config.claim_radius)
    }

    fn exact_phase(&self, text: &QueryText, claimed: &mut SmallVec<[usize; 8]>) -> Vec<ParameterMatch> {
        let mut results = Vec::new();
        for entry in self.glossary.longest_first() {
            for start in text.find_lower(&entry.synonym_chars) {
                if self.is_claimed(claimed, start) {
                    continue;
                }
                let end = start + entry.synonym_chars.len();
                if !text.is_word_bounded(start, end) {
                    continue;
                }
                results.push(ParameterMatch {
                    key: entry.key.clone(),
                    matched_synonym: entry.synonym.clone(),
                    match_type: MatchType::Exact,
                    confidence: self.config.exact_confidence,
                    start,
                    end,
                    context: text.slice(start, end).trim().to_string(),
                });
                claimed.push(start);
            }
        }
        results
    }

    fn words<'t>(text: &'t QueryText) -> Vec<Word<'t>> {
        WORD_RE
            .find_iter(text.as_str())
            .map(|m| Word {
                text: m.as_str(),
                start: text.char_offset(m.start()),
                end: text.char_offset(m.end()),
            })
            .collect()
    }

    fn candidates(&self, words: &[Word<'_>]) -> Vec<Candidate> {
        let mut out = Vec::new();
        for i in 0..words.len() {
            for size in (2..=self.config.max_window_words).rev() {
                if i + size > words.len() {
                    continue;
                }
                let window = &words[i..i + size];
                let phrase = window.iter().map(|w| w.text).collect::<Vec<_>>().join(" ");
                if phrase.chars().count() >= self.config.min_word_len {
                    out.push(Candidate {
                        phrase,
                        start: window[0].start,
                        end: window[size - 1].end,
                        word_index: i,
                        word_count: size,
                    });
                }
            }

            let word = words[i];
            if word.text.chars().count() >= self.config.min_word_len && !is_stopword(word.text) {
                out.push(Candidate {
                    phrase: word.text.to_string(),
                    start: word.start,
                    end: word.end,
                    word_index: i,
                    word_count: 1,
                });
            }
        }
        out
    }

    /// Best-scoring synonym for a candidate, if it clears the threshold.
    fn best_synonym(&self, candidate: &Candidate) -> Option<(&'a GlossaryEntry, f64)> {
        let normalized = normalize_for_matching(&candidate.phrase);
        let candidate_len = normalized.chars().count() as f64;
        let mut best: Option<(&'a GlossaryEntry, f64)> = None;

        for entry in self.glossary.entries() {
            if entry.normalized_len < self.config.min_synonym_len {
                continue;
            }
            if entry.normalized_words > 1
                && entry.normalized_words.abs_diff(candidate.word_count) > 3
            {
                continue;
            }
            if candidate_len < entry.normalized_len as f64 * 0.3 {
                continue;
            }

            let score = blended_score(
                &normalized,
                candidate.word_count,
                &entry.normalized,
                entry.normalized_words,
            );
            let improves = best.map_or(true, |(_, s)| score > s);
            if score >= self.config.fuzzy_threshold && improves {
                best = Some((entry, score));
            }
        }
        best
    }

    /// Place an accepted synonym onto the text near the candidate.
    fn relocate(
        &self,
        text: &QueryText,
        words: &[Word<'_>],
        candidate: &Candidate,
        entry: &GlossaryEntry,
    ) -> (usize, usize) {
        let nearest = text
            .find_lower(&entry.synonym_chars)
            .min_by_key(|&at| at.abs_diff(candidate.start));
        if let Some(at) = nearest {
            return (at, at + entry.synonym_chars.len());
        }

        let synonym_words = entry.normalized_words;
        if candidate.word_count > synonym_words {
            let window = &words[candidate.word_index..candidate.word_index + candidate.word_count];
            let mut best: Option<(usize, usize, f64)> = None;
            for sub in window.windows(synonym_words) {
                let phrase = sub.iter().map(|w| w.text).collect::<Vec<_>>().join(" ");
                let score = ratio(&normalize_for_matching(&phrase), &entry.normalized);
                if best.map_or(true, |(_, _, s)| score > s) {
                    best = Some((sub[0].start, sub[synonym_words - 1].end, score));
                }
            }
            if let Some((start, end, _)) = best {
                return (start, end);
            }
        }

        (candidate.start, candidate.end)
    }

    fn fuzzy_phase(
        &self,
        text: &QueryText,
        claimed: &mut SmallVec<[usize; 8]>,
        results: &mut Vec<ParameterMatch>,
    ) {
        let exact_spans: Vec<(usize, usize)> = results.iter().map(|r| (r.start, r.end)).collect();
        let covers_exact =
            |start: usize, end: usize| exact_spans.iter().any(|&(s, e)| start < e && s < end);

        let words = Self::words(text);
        for candidate in self.candidates(&words) {
            if self.is_claimed(claimed, candidate.start) || covers_exact(candidate.start, candidate.end) {
                continue;
            }
            let Some((entry, score)) = self.best_synonym(&candidate) else {
                continue;
            };
            let confidence = score / 100.0;

            let already_found = results.iter().any(|r| {
                r.key == entry.key
                    && r.start.abs_diff(candidate.start) < self.config.independent_distance
                    && r.confidence > confidence
            });
            if already_found {
                continue;
            }

            let (start, end) = self.relocate(text, &words, &candidate, entry);
            if self.is_claimed(claimed, start) || covers_exact(start, end) {
                continue;
            }

            tracing::trace!(
                candidate = %candidate.phrase,
                key = %entry.key,
                score,
                start,
                end,
                "Fuzzy parameter hit"
            );
            results.push(ParameterMatch {
                key: entry.key.clone(),
                matched_synonym: entry.synonym.clone(),
                match_type: MatchType::Fuzzy,
                confidence,
                start,
                end,
                context: text.slice(start, end).trim().to_string(),
            });
            claimed.push(start);
        }
    }

    fn resolve_conflicts(&self, mut results: Vec<ParameterMatch>) -> Vec<ParameterMatch> {
        results.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then_with(|| b.confidence.total_cmp(&a.confidence))
                .then_with(|| b.span_len().cmp(&a.span_len()))
        });

        let mut kept: Vec<ParameterMatch> = Vec::with_capacity(results.len());
        for candidate in results {
            let overlapping: Vec<usize> = kept
                .iter()
                .enumerate()
                .filter(|(_, k)| k.overlaps(&candidate))
                .map(|(i, _)| i)
                .collect();
            if !overlapping.is_empty() {
                let beats_all = overlapping
                    .iter()
                    .all(|&i| candidate.confidence > kept[i].confidence);
                if !beats_all {
                    continue;
                }
                for &i in overlapping.iter().rev() {
                    kept.remove(i);
                }
            }

            let same_key = kept.iter().position(|k| {
                k.key == candidate.key
                    && k.start.abs_diff(candidate.start) <= self.config.independent_distance
            });
            if let Some(i) = same_key {
                if candidate.confidence > kept[i].confidence {
                    kept.remove(i);
                } else {
                    continue;
                }
            }

            kept.push(candidate);
        }

        kept.sort_by_key(|m| m.start);
        kept
    }
}

/// Convenience wrapper over [`ParameterMatcher::find`].
pub fn find_parameters(
    text: &str,
    glossary: &ParameterGlossary,
    config: &MatchingConfig,
) -> Vec<ParameterMatch> {
    ParameterMatcher::new(glossary, config).find(&QueryText::new(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn glossary() -> ParameterGlossary {
        let mut map = BTreeMap::new();
        let mut add = |k: &str, syns: &[&str]| {
            map.insert(k.to_string(), syns.iter().map(|s| s.to_string()).collect());
        };
        add(
            "max_charge_current_a",
            &["максимальний струм заряджання", "максимальний зарядний струм", "max charge current"],
        );
        add("max_discharge_current_a", &["максимальний струм розряджання", "max discharge current"]);
        add("capacity_kwh", &["ємність", "capacity", "емкость"]);
        add("weight_kg", &["вага", "weight", "вес"]);
        add("number_of_mppt", &["кількість mppt", "mppt trackers"]);
        ParameterGlossary::from_map(&map).unwrap()
    }

    fn find(text: &str) -> Vec<ParameterMatch> {
        find_parameters(text, &glossary(), &MatchingConfig::default())
    }

    #[test]
    fn test_exact_match_positions() {
        let found = find("Вага Pylontech US5000");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key, "weight_kg");
        assert_eq!(found[0].match_type, MatchType::Exact);
        assert_eq!((found[0].start, found[0].end), (0, 4));
        assert_eq!(found[0].context, "Вага");
        assert!((found[0].confidence - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_longer_synonym_wins_over_prefix() {
        let found = find("Максимальний струм розряджання US5000");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key, "max_discharge_current_a");
        assert_eq!((found[0].start, found[0].end), (0, 30));
    }

    #[test]
    fn test_word_boundary_required() {
        // "вага" glued to a suffix is only a fuzzy hit
        let found = find("вагами");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].match_type, MatchType::Fuzzy);
    }

    #[test]
    fn test_fuzzy_typo() {
        let found = find("Waight of BYD HVS 10.2");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key, "weight_kg");
        assert_eq!(found[0].match_type, MatchType::Fuzzy);
        assert_eq!((found[0].start, found[0].end), (0, 6));
        assert!((found[0].confidence - 10.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_fuzzy_inflection() {
        let found = find("Які ємності у Pylontech US5000?");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key, "capacity_kwh");
        assert_eq!(found[0].match_type, MatchType::Fuzzy);
        assert_eq!(found[0].context, "ємності");
    }

    #[test]
    fn test_inflected_forms_keep_their_key() {
        for (text, key) in [
            ("weights", "weight_kg"),
            ("capacities", "capacity_kwh"),
            ("ємності", "capacity_kwh"),
            ("вагами", "weight_kg"),
        ] {
            let found = find(text);
            assert_eq!(found.len(), 1, "{text}");
            assert_eq!(found[0].key, key, "{text}");
        }
        for text in ["Weight", "ВАГА US5000", "CAPACITY"] {
            assert_eq!(find(text)[0].match_type, MatchType::Exact, "{text}");
        }
    }

    #[test]
    fn test_far_apart_same_key_kept() {
        let text = "Weight of Pylontech US5000 for the wall mounted rack installation, and the weight of Dyness A48100";
        let found = find(text);
        let weights: Vec<_> = found.iter().filter(|m| m.key == "weight_kg").collect();
        assert_eq!(weights.len(), 2);
        assert_eq!(weights[0].start, 0);
        assert_eq!(weights[1].start, 75);
    }

    #[test]
    fn test_close_same_key_collapses() {
        let found = find("weight and weight");
        assert_eq!(found.iter().filter(|m| m.key == "weight_kg").count(), 1);
    }

    #[test]
    fn test_fuzzy_window_cannot_take_over_exact_span() {
        let found = find("Кількість MPPT у Huawei SUN2000-15KTL-M2");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key, "number_of_mppt");
        assert_eq!(found[0].match_type, MatchType::Exact);
        assert_eq!((found[0].start, found[0].end), (0, 14));
    }

    #[test]
    fn test_no_parameters() {
        assert!(find("Скільки коштує Victron MultiPlus 48/5000?").is_empty());
    }

    fn m(key: &str, start: usize, end: usize, confidence: f64) -> ParameterMatch {
        ParameterMatch {
            key: key.to_string(),
            matched_synonym: key.to_string(),
            match_type: MatchType::Fuzzy,
            confidence,
            start,
            end,
            context: String::new(),
        }
    }

    #[test]
    fn test_conflicts_keep_more_confident_overlap() {
        let g = glossary();
        let config = MatchingConfig::default();
        let matcher = ParameterMatcher::new(&g, &config);
        let kept = matcher.resolve_conflicts(vec![m("a", 0, 10, 0.85), m("b", 5, 12, 0.9)]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].key, "b");
    }

    #[test]
    fn test_conflicts_tie_goes_to_earliest_then_longest() {
        let g = glossary();
        let config = MatchingConfig::default();
        let matcher = ParameterMatcher::new(&g, &config);

        let kept = matcher.resolve_conflicts(vec![m("late", 3, 9, 0.9), m("early", 0, 6, 0.9)]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].key, "early");

        let kept = matcher.resolve_conflicts(vec![m("short", 0, 4, 0.9), m("long", 0, 8, 0.9)]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].key, "long");
    }
}

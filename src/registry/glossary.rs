//! Parameter glossary: canonical parameter key -> multilingual synonyms.
//!
//! The YAML mapping is flattened once into a list of entries in sorted key
//! order, then synonym order. A synonym claimed by two keys belongs to the
//! first one; the later claim is logged and dropped.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::RegistryError;
use crate::parameters::fuzzy::normalize_for_matching;
use crate::text::lower_aligned;

/// One flattened synonym of a parameter key.
#[derive(Debug, Clone)]
pub struct GlossaryEntry {
    pub key: String,
    /// Lowercased, trimmed synonym as searched in the text
    pub synonym: String,
    /// Suffix-stripped form used by fuzzy scoring
    pub normalized: String,
    pub(crate) synonym_chars: Vec<char>,
    pub(crate) normalized_len: usize,
    pub(crate) normalized_words: usize,
}

/// Immutable synonym index for parameter detection.
#[derive(Debug, Clone)]
pub struct ParameterGlossary {
    entries: Vec<GlossaryEntry>,
    /// Indices into `entries`, longest synonym first (stable)
    longest_first: Vec<usize>,
    by_synonym: HashMap<String, usize>,
    key_count: usize,
}

impl ParameterGlossary {
    /// Build from an in-memory `key -> synonyms` mapping.
    pub fn from_map(map: &BTreeMap<String, Vec<String>>) -> Result<Self, RegistryError> {
        let mut entries = Vec::new();
        let mut by_synonym: HashMap<String, usize> = HashMap::new();

        for (key, synonyms) in map {
            for raw in synonyms {
                let synonym = lower_aligned(raw.trim());
                if synonym.is_empty() {
                    continue;
                }
                if let Some(&owner) = by_synonym.get(&synonym) {
                    let owner: &GlossaryEntry = &entries[owner];
                    if owner.key != *key {
                        tracing::debug!(
                            synonym = %synonym,
                            kept = %owner.key,
                            dropped = %key,
                            "Synonym claimed by two parameter keys"
                        );
                    }
                    continue;
                }

                let normalized = normalize_for_matching(&synonym);
                let entry = GlossaryEntry {
                    key: key.clone(),
                    synonym_chars: synonym.chars().collect(),
                    normalized_len: normalized.chars().count(),
                    normalized_words: normalized.split_whitespace().count(),
                    normalized,
                    synonym: synonym.clone(),
                };
                by_synonym.insert(synonym, entries.len());
                entries.push(entry);
            }
        }

        if entries.is_empty() {
            return Err(RegistryError::EmptyGlossary);
        }

        let mut longest_first: Vec<usize> = (0..entries.len()).collect();
        longest_first.sort_by_key(|&i| std::cmp::Reverse(entries[i].synonym_chars.len()));

        let key_count = map
            .iter()
            .filter(|(k, _)| entries.iter().any(|e| &e.key == *k))
            .count();

        Ok(Self {
            entries,
            longest_first,
            by_synonym,
            key_count,
        })
    }

    /// Parse a YAML `key -> [synonyms]` document.
    pub fn from_yaml_str(yaml: &str, origin: &Path) -> Result<Self, RegistryError> {
        let map: BTreeMap<String, Vec<String>> =
            serde_yaml::from_str(yaml).map_err(|source| RegistryError::Yaml {
                path: origin.to_path_buf(),
                source,
            })?;
        Self::from_map(&map)
    }

    /// Load the glossary file. A missing file is an error.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let content = super::read_registry_file(path)?;
        Self::from_yaml_str(&content, path)
    }

    /// All entries in key order, then synonym order.
    pub fn entries(&self) -> &[GlossaryEntry] {
        &self.entries
    }

    /// Entries ordered by descending synonym length.
    pub fn longest_first(&self) -> impl Iterator<Item = &GlossaryEntry> {
        self.longest_first.iter().map(move |&i| &self.entries[i])
    }

    /// Parameter key owning an exact (case-insensitive) synonym.
    pub fn key_of(&self, synonym: &str) -> Option<&str> {
        self.by_synonym
            .get(&lower_aligned(synonym.trim()))
            .map(|&i| self.entries[i].key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of parameter keys with at least one synonym.
    pub fn key_count(&self) -> usize {
        self.key_count
    }
}

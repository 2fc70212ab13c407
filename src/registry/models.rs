//! Canonical-model registry and model metadata.
//!
//! ## Canonical models
//!
//! Line-oriented `original -> canonical` text. `#` comments and blank lines
//! are ignored. Each original is indexed twice: by its lowercased cleaned
//! form and by its compact alphanumeric form, so `LXP-LB-EU 10k` and
//! `lxp lb eu 10K` resolve alike. Lookup is exact; there is no fuzzy
//! fallback for models.
//!
//! ## Metadata
//!
//! CSV export of the equipment table. Only active rows are kept.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::entity::normalize::{compact_key, lookup_key};
use crate::error::RegistryError;

// =============================================================================
// Canonical models
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct CanonicalModels {
    by_key: HashMap<String, String>,
    by_compact: HashMap<String, String>,
}

impl CanonicalModels {
    /// Parse the `original -> canonical` format.
    pub fn parse(content: &str) -> Self {
        let mut models = Self::default();
        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((original, canonical)) = line.split_once("->") else {
                tracing::warn!(line = lineno + 1, content = %line, "Skipping model line without '->'");
                continue;
            };
            let (original, canonical) = (original.trim(), canonical.trim());
            if original.is_empty() || canonical.is_empty() {
                tracing::warn!(line = lineno + 1, "Skipping model line with empty side");
                continue;
            }
            models.insert(original, canonical);
        }
        models
    }

    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let content = super::read_registry_file(path)?;
        Ok(Self::parse(&content))
    }

    fn insert(&mut self, original: &str, canonical: &str) {
        let key = lookup_key(original);
        let compact = compact_key(&key);
        self.by_key
            .entry(key)
            .or_insert_with(|| canonical.to_string());
        if !compact.is_empty() {
            self.by_compact
                .entry(compact)
                .or_insert_with(|| canonical.to_string());
        }
    }

    /// Resolve a raw mention; `None` when the registry has no entry.
    pub fn resolve(&self, mention: &str) -> Option<&str> {
        let key = lookup_key(mention);
        if key.is_empty() {
            return None;
        }
        self.by_key
            .get(&key)
            .or_else(|| self.by_compact.get(&compact_key(&key)))
            .map(String::as_str)
    }

    /// Registry key most similar to `mention` (Jaro-Winkler), for diagnostics only.
    pub fn closest_key(&self, mention: &str) -> Option<&str> {
        let key = lookup_key(mention);
        self.by_key
            .keys()
            .map(|k| (k, strsim::jaro_winkler(&key, k)))
            .filter(|(_, score)| *score >= 0.7)
            .max_by(|a, b| a.1.total_cmp(&b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

// =============================================================================
// Model metadata
// =============================================================================

/// Manufacturer and equipment type recorded for a canonical model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub manufacturer: Option<String>,
    pub equipment_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MetadataRow {
    model_code: String,
    #[serde(default)]
    equipment_type_id: String,
    #[serde(default)]
    manufacturer_id: String,
    #[serde(default)]
    is_active: String,
}

#[derive(Debug, Clone, Default)]
pub struct ModelMetadata {
    by_model: HashMap<String, ModelInfo>,
}

impl ModelMetadata {
    pub fn from_reader<R: std::io::Read>(reader: R, origin: &Path) -> Result<Self, RegistryError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut by_model = HashMap::new();
        let mut inactive = 0usize;

        for row in csv_reader.deserialize::<MetadataRow>() {
            let row = row.map_err(|source| RegistryError::Csv {
                path: origin.to_path_buf(),
                source,
            })?;
            if row.is_active.trim() != "1" {
                inactive += 1;
                continue;
            }
            let model = row.model_code.trim().to_lowercase();
            if model.is_empty() {
                continue;
            }
            by_model.insert(
                model,
                ModelInfo {
                    manufacturer: non_empty_lower(&row.manufacturer_id),
                    equipment_type: non_empty_lower(&row.equipment_type_id),
                },
            );
        }

        tracing::debug!(active = by_model.len(), inactive, "Loaded model metadata");
        Ok(Self { by_model })
    }

    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let content = super::read_registry_file(path)?;
        Self::from_reader(content.as_bytes(), path)
    }

    pub fn insert(&mut self, model: &str, info: ModelInfo) {
        self.by_model.insert(model.to_lowercase(), info);
    }

    pub fn get(&self, canonical_model: &str) -> Option<&ModelInfo> {
        self.by_model.get(&canonical_model.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.by_model.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_model.is_empty()
    }
}

fn non_empty_lower(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_lowercase())
}

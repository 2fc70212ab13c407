//! Manufacturer and equipment-type synonym tables.
//!
//! Both vocabularies are closed and curated: inflected Ukrainian/Russian
//! forms are listed explicitly in the YAML, never derived. Lookup is an
//! exact match on the cleaned, lowercased mention.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use crate::entity::normalize::lookup_key;
use crate::error::RegistryError;

/// On-disk shape of `entity_synonyms.yaml`.
#[derive(Debug, Default, Deserialize)]
pub struct SynonymsFile {
    #[serde(default)]
    pub manufacturers: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub equipment_types: BTreeMap<String, Vec<String>>,
}

/// Flattened variant -> canonical maps.
#[derive(Debug, Clone, Default)]
pub struct EntitySynonyms {
    manufacturers: HashMap<String, String>,
    equipment_types: HashMap<String, String>,
}

impl EntitySynonyms {
    pub fn from_file(file: &SynonymsFile) -> Self {
        Self {
            manufacturers: flatten(&file.manufacturers),
            equipment_types: flatten(&file.equipment_types),
        }
    }

    pub fn from_yaml_str(yaml: &str, origin: &Path) -> Result<Self, RegistryError> {
        let file: SynonymsFile =
            serde_yaml::from_str(yaml).map_err(|source| RegistryError::Yaml {
                path: origin.to_path_buf(),
                source,
            })?;
        Ok(Self::from_file(&file))
    }

    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let content = super::read_registry_file(path)?;
        Self::from_yaml_str(&content, path)
    }

    pub fn manufacturer(&self, mention: &str) -> Option<&str> {
        self.manufacturers
            .get(&lookup_key(mention))
            .map(String::as_str)
    }

    pub fn equipment_type(&self, mention: &str) -> Option<&str> {
        self.equipment_types
            .get(&lookup_key(mention))
            .map(String::as_str)
    }

    pub fn manufacturer_count(&self) -> usize {
        self.manufacturers.len()
    }

    pub fn equipment_type_count(&self) -> usize {
        self.equipment_types.len()
    }
}

fn flatten(table: &BTreeMap<String, Vec<String>>) -> HashMap<String, String> {
    let mut out: HashMap<String, String> = HashMap::new();
    for (canonical, variants) in table {
        let canonical_key = lookup_key(canonical);
        for variant in std::iter::once(canonical).chain(variants.iter()) {
            let key = lookup_key(variant);
            if key.is_empty() {
                continue;
            }
            match out.get(&key) {
                Some(existing) if *existing != canonical_key => {
                    tracing::debug!(
                        variant = %key,
                        kept = %existing,
                        dropped = %canonical_key,
                        "Variant claimed by two canonical values"
                    );
                }
                Some(_) => {}
                None => {
                    out.insert(key, canonical_key.clone());
                }
            }
        }
    }
    out
}

//! Read-only lookup registries
//!
//! `RegistryContext` bundles the parameter glossary, the entity synonym
//! tables, the canonical-model registry and the model metadata. It is built
//! once at startup, never mutated afterwards, and shared across requests
//! through an `Arc`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let config = EngineConfig::load("config/ipg.yaml")?;
//! let registry = Arc::new(RegistryContext::load(&config.registries)?);
//! ```

pub mod glossary;
pub mod models;
pub mod synonyms;

use std::path::Path;

use crate::config::RegistryPaths;
use crate::entity::normalize::clean_mention;
use crate::entity::EntityKind;
use crate::error::RegistryError;

pub use glossary::{GlossaryEntry, ParameterGlossary};
pub use models::{CanonicalModels, ModelInfo, ModelMetadata};
pub use synonyms::EntitySynonyms;

/// Immutable registry bundle shared by every pipeline call.
#[derive(Debug, Clone)]
pub struct RegistryContext {
    pub glossary: ParameterGlossary,
    pub synonyms: EntitySynonyms,
    pub models: CanonicalModels,
    pub metadata: ModelMetadata,
}

impl RegistryContext {
    pub fn new(
        glossary: ParameterGlossary,
        synonyms: EntitySynonyms,
        models: CanonicalModels,
        metadata: ModelMetadata,
    ) -> Self {
        Self {
            glossary,
            synonyms,
            models,
            metadata,
        }
    }

    /// Load every registry file. Any missing or malformed file aborts the load.
    pub fn load(paths: &RegistryPaths) -> Result<Self, RegistryError> {
        let glossary = ParameterGlossary::load(&paths.glossary)?;
        let synonyms = EntitySynonyms::load(&paths.synonyms)?;
        let models = CanonicalModels::load(&paths.canonical_models)?;
        let metadata = ModelMetadata::load(&paths.model_metadata)?;

        tracing::info!(
            parameter_keys = glossary.key_count(),
            synonyms = glossary.len(),
            manufacturers = synonyms.manufacturer_count(),
            equipment_types = synonyms.equipment_type_count(),
            models = models.len(),
            active_metadata = metadata.len(),
            "Registries loaded"
        );

        Ok(Self::new(glossary, synonyms, models, metadata))
    }

    /// Canonicalize a raw mention of the given kind.
    ///
    /// Manufacturer and equipment type fall back to the cleaned mention when
    /// the synonym table has no entry. Models never fall back: an unknown
    /// model is `None`.
    pub fn canonicalize(&self, raw_text: &str, kind: EntityKind) -> Option<String> {
        let cleaned = clean_mention(raw_text);
        if cleaned.is_empty() {
            return None;
        }
        match kind {
            EntityKind::Manufacturer => Some(
                self.synonyms
                    .manufacturer(&cleaned)
                    .map(str::to_string)
                    .unwrap_or(cleaned),
            ),
            EntityKind::EquipmentType => Some(
                self.synonyms
                    .equipment_type(&cleaned)
                    .map(str::to_string)
                    .unwrap_or(cleaned),
            ),
            EntityKind::Model => self.models.resolve(&cleaned).map(str::to_string),
        }
    }
}

/// Read a registry file, distinguishing a missing file from other I/O failures.
pub(crate) fn read_registry_file(path: &Path) -> Result<String, RegistryError> {
    if !path.exists() {
        return Err(RegistryError::MissingFile(path.to_path_buf()));
    }
    std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
        path: path.to_path_buf(),
        source,
    })
}

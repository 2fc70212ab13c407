//! Engine configuration types
//!
//! Defines the serde schema for `config/ipg.yaml`: where the registries live
//! and the tunables of the parameter matcher and binder.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub registries: RegistryPaths,

    #[serde(default)]
    pub matching: MatchingConfig,
}

/// Locations of the read-only registry files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryPaths {
    #[serde(default = "default_glossary")]
    pub glossary: PathBuf,

    #[serde(default = "default_synonyms")]
    pub synonyms: PathBuf,

    #[serde(default = "default_canonical_models")]
    pub canonical_models: PathBuf,

    #[serde(default = "default_model_metadata")]
    pub model_metadata: PathBuf,
}

fn default_glossary() -> PathBuf {
    PathBuf::from("data/param_glossary.yaml")
}

fn default_synonyms() -> PathBuf {
    PathBuf::from("data/entity_synonyms.yaml")
}

fn default_canonical_models() -> PathBuf {
    PathBuf::from("data/canon_models.txt")
}

fn default_model_metadata() -> PathBuf {
    PathBuf::from("data/equipment_models.csv")
}

impl Default for RegistryPaths {
    fn default() -> Self {
        Self {
            glossary: default_glossary(),
            synonyms: default_synonyms(),
            canonical_models: default_canonical_models(),
            model_metadata: default_model_metadata(),
        }
    }
}

impl RegistryPaths {
    /// Resolve relative paths against `base` (usually the config file's directory).
    pub fn resolved_against(&self, base: &Path) -> Self {
        let join = |p: &PathBuf| {
            if p.is_absolute() {
                p.clone()
            } else {
                base.join(p)
            }
        };
        Self {
            glossary: join(&self.glossary),
            synonyms: join(&self.synonyms),
            canonical_models: join(&self.canonical_models),
            model_metadata: join(&self.model_metadata),
        }
    }
}

/// Tunables for parameter matching and binding.
///
/// All distances are in characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Minimum fuzzy score (0-100) for a candidate to be accepted
    pub fuzzy_threshold: f64,
    /// Confidence assigned to exact synonym hits
    pub exact_confidence: f64,
    /// Minimum length of a single-word fuzzy candidate
    pub min_word_len: usize,
    /// Synonyms shorter than this after normalization never fuzzy-match
    pub min_synonym_len: usize,
    /// A new match may not start this close to an already claimed position
    pub claim_radius: usize,
    /// Same-key matches further apart than this are independent occurrences
    pub independent_distance: usize,
    /// Slack when assigning a parameter to a segment it straddles
    pub border_tolerance: usize,
    /// Largest multi-word window considered by the fuzzy phase
    pub max_window_words: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 80.0,
            exact_confidence: 0.95,
            min_word_len: 4,
            min_synonym_len: 4,
            claim_radius: 5,
            independent_distance: 50,
            border_tolerance: 2,
            max_window_words: 5,
        }
    }
}

impl MatchingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&self.fuzzy_threshold) {
            return Err(ConfigError::Invalid(format!(
                "fuzzy_threshold must be within 0..=100, got {}",
                self.fuzzy_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.exact_confidence) {
            return Err(ConfigError::Invalid(format!(
                "exact_confidence must be within 0..=1, got {}",
                self.exact_confidence
            )));
        }
        if self.max_window_words < 2 {
            return Err(ConfigError::Invalid(
                "max_window_words must be at least 2".to_string(),
            ));
        }
        if self.min_word_len == 0 || self.min_synonym_len == 0 {
            return Err(ConfigError::Invalid(
                "min_word_len and min_synonym_len must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl EngineConfig {
    /// Load configuration from a YAML file.
    ///
    /// Relative registry paths are resolved against the file's directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: EngineConfig =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.registries = config.registries.resolved_against(base);
        config.matching.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string (for testing). Paths are left as given.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            serde_yaml::from_str(yaml).map_err(|source| ConfigError::Yaml {
                path: PathBuf::from("<inline>"),
                source,
            })?;
        config.matching.validate()?;
        Ok(config)
    }
}

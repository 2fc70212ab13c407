//! Error types for the binding engine
//!
//! Registry and configuration failures are fatal and surface as `Result`
//! errors built with thiserror. Problems with a single request (bad NER
//! spans, unknown labels, unresolved models) are never errors: they are
//! collected as [`Diagnostic`] values on the query result.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error for engine construction
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Failures while loading the read-only lookup registries
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to read registry file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Registry file not found: {0}")]
    MissingFile(PathBuf),

    #[error("Invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Parameter glossary contains no usable synonyms")]
    EmptyGlossary,
}

/// Failures while loading or validating engine configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Recoverable, per-request observations attached to a query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// An NER span with an empty or out-of-range character range.
    MalformedSpan {
        label: String,
        start: usize,
        end: usize,
    },
    /// An NER label the engine does not handle.
    UnknownLabel { label: String, text: String },
    /// A MODEL mention with no canonical registry entry.
    UnresolvedModel {
        raw: String,
        closest_known: Option<String>,
    },
    /// A MANUFACTURER mention that canonicalized to a stopword.
    StopwordManufacturer { raw: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::MalformedSpan { label, start, end } => {
                write!(f, "malformed {} span [{}, {})", label, start, end)
            }
            Diagnostic::UnknownLabel { label, text } => {
                write!(f, "unknown entity label {} for '{}'", label, text)
            }
            Diagnostic::UnresolvedModel { raw, closest_known } => match closest_known {
                Some(k) => write!(f, "model '{}' not in registry (closest: {})", raw, k),
                None => write!(f, "model '{}' not in registry", raw),
            },
            Diagnostic::StopwordManufacturer { raw } => {
                write!(f, "manufacturer '{}' is a stopword", raw)
            }
        }
    }
}

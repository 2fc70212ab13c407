//! Entity-parameter binding and query classification engine.
//!
//! Turns a free-form Ukrainian/Russian/English question about power
//! equipment, plus the NER spans detected in it, into structured
//! (manufacturer, model, parameter) lookups or a flag that the query needs
//! heavier processing.
//!
//! ## Modules
//!
//! - `registry`: read-only glossary, synonym tables, canonical models, metadata
//! - `entity`: canonicalized entities from NER spans
//! - `parameters`: exact + fuzzy parameter detection
//! - `segment`: conjunction/punctuation segmentation
//! - `binder`: segment-aware parameter-to-model binding
//! - `classifier`: status and intent
//! - `router`: final routing decision
//! - `pipeline`: the end-to-end entry point
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ipg_core::{EngineConfig, EntitySpan, Pipeline};
//!
//! let config = EngineConfig::load("config/ipg.yaml")?;
//! let pipeline = Pipeline::from_config(&config)?;
//! let result = pipeline.process(
//!     "Вага Pylontech US5000",
//!     &[EntitySpan::new("MANUFACTURER", "Pylontech", 5, 14), EntitySpan::new("MODEL", "US5000", 15, 21)],
//! );
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! ```

pub mod binder;
pub mod classifier;
pub mod config;
pub mod entity;
pub mod error;
pub mod parameters;
pub mod pipeline;
pub mod registry;
pub mod router;
pub mod segment;
pub mod text;

pub use binder::{Binding, BoundParameter};
pub use classifier::{Classification, QuestionIntent, QuestionType, Status};
pub use config::{EngineConfig, MatchingConfig, RegistryPaths};
pub use entity::{Entity, EntityKind, EntitySpan};
pub use error::{ConfigError, Diagnostic, EngineError, RegistryError};
pub use parameters::{MatchType, ParameterMatch};
pub use pipeline::{ExtractedEntities, Pipeline, QueryRequest, QueryResult};
pub use registry::RegistryContext;
pub use router::{ComplexReason, RoutingDecision, Strategy, SubQuery};
pub use segment::Segment;

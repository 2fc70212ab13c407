//! End-to-end query processing.
//!
//! Data flows strictly forward: raw text + NER spans -> entities ->
//! parameter matches -> segments -> bindings -> classification -> routing.
//! A `Pipeline` holds only the shared, immutable registries and the matching
//! config, so one instance serves any number of concurrent requests.

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::binder::{Binder, Binding};
use crate::classifier::{classify, QuestionIntent, QuestionType, Status};
use crate::config::{EngineConfig, MatchingConfig};
use crate::entity::{extract_entities, Entity, EntityKind, EntitySpan};
use crate::error::{Diagnostic, EngineError};
use crate::parameters::{ParameterMatch, ParameterMatcher};
use crate::registry::RegistryContext;
use crate::router::{route, RoutingDecision, Strategy};
use crate::segment::{segment, Segment};
use crate::text::QueryText;

/// One request: raw question text plus the NER spans detected in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub text: String,
    #[serde(default)]
    pub entities: Vec<EntitySpan>,
}

/// Entities and parameters extracted from a query, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntities {
    pub manufacturer: Vec<Entity>,
    pub model: Vec<Entity>,
    pub equipment_type: Vec<Entity>,
    pub parameters: Vec<ParameterMatch>,
}

impl ExtractedEntities {
    fn new(entities: Vec<Entity>, parameters: Vec<ParameterMatch>) -> Self {
        let mut out = Self {
            parameters,
            ..Self::default()
        };
        for entity in entities {
            match entity.kind {
                EntityKind::Manufacturer => out.manufacturer.push(entity),
                EntityKind::Model => out.model.push(entity),
                EntityKind::EquipmentType => out.equipment_type.push(entity),
            }
        }
        out
    }
}

/// Structured outcome of one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub question_raw: String,
    pub status: Status,
    pub question_type: Option<QuestionType>,
    pub question_intent: QuestionIntent,
    pub extracted_entities: ExtractedEntities,
    pub segments: Vec<Segment>,
    pub bindings: Vec<Binding>,
    pub routing: RoutingDecision,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl QueryResult {
    pub fn strategy(&self) -> Strategy {
        self.routing.strategy()
    }
}

/// The binding and classification engine.
#[derive(Debug, Clone)]
pub struct Pipeline {
    registry: Arc<RegistryContext>,
    config: MatchingConfig,
}

impl Pipeline {
    pub fn new(registry: Arc<RegistryContext>, config: MatchingConfig) -> Self {
        Self { registry, config }
    }

    /// Load registries named by `config` and build a pipeline.
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        config.matching.validate()?;
        let registry = RegistryContext::load(&config.registries)?;
        Ok(Self::new(Arc::new(registry), config.matching.clone()))
    }

    pub fn registry(&self) -> &RegistryContext {
        &self.registry
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Process one query. Never fails: problems end up in `diagnostics`.
    #[instrument(skip_all, fields(chars = text.chars().count(), spans = spans.len()))]
    pub fn process(&self, text: &str, spans: &[EntitySpan]) -> QueryResult {
        let query = QueryText::new(text);
        let mut diagnostics = Vec::new();

        let entities = extract_entities(&query, spans, &self.registry, &mut diagnostics);
        let parameters = ParameterMatcher::new(&self.registry.glossary, &self.config).find(&query);
        let segments = segment(&query);
        let bindings =
            Binder::new(&self.registry.metadata, &self.config).bind(&entities, &parameters, &segments);
        let classification = classify(text, &entities, parameters.len());
        let routing = route(&classification, &bindings, &entities);

        tracing::info!(
            status = ?classification.status,
            strategy = ?routing.strategy(),
            entities = entities.len(),
            parameters = parameters.len(),
            bindings = bindings.len(),
            "Query processed"
        );

        QueryResult {
            question_raw: text.to_string(),
            status: classification.status,
            question_type: classification.question_type,
            question_intent: classification.intent,
            extracted_entities: ExtractedEntities::new(entities, parameters),
            segments,
            bindings,
            routing,
            diagnostics,
        }
    }

    pub fn process_request(&self, request: &QueryRequest) -> QueryResult {
        self.process(&request.text, &request.entities)
    }

    /// Process independent requests in parallel; results keep input order.
    pub fn process_batch(&self, requests: &[QueryRequest]) -> Vec<QueryResult> {
        requests
            .par_iter()
            .map(|request| self.process_request(request))
            .collect()
    }
}

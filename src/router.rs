//! Routing: turn a classification and its bindings into a dispatch decision.

use serde::{Deserialize, Serialize};

use crate::binder::Binding;
use crate::classifier::{Classification, Status};
use crate::entity::{of_kind, Entity, EntityKind};
use crate::parameters::MatchType;

/// A single direct lookup for the downstream data store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubQuery {
    pub manufacturer: Option<String>,
    pub model: String,
    pub equipment_type: Option<String>,
    pub parameter: String,
    pub context: String,
    pub confidence: f64,
    pub match_type: MatchType,
}

/// Why a query could not be answered by direct lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexReason {
    NoEntities,
    UnresolvedEntities,
    NoResolvedModels,
    NeedsAdvancedProcessing,
    NoValidBindings,
}

impl ComplexReason {
    pub fn message(self) -> &'static str {
        match self {
            ComplexReason::NoEntities => "no entities detected in the query",
            ComplexReason::UnresolvedEntities => "entities present but none resolved",
            ComplexReason::NoResolvedModels => "no resolved models in the query",
            ComplexReason::NeedsAdvancedProcessing => "query needs advanced processing",
            ComplexReason::NoValidBindings => "no valid parameter bindings",
        }
    }
}

/// Entities seen in a compatibility question (canonical, else raw).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatEntities {
    pub manufacturers: Vec<String>,
    pub models: Vec<String>,
    pub equipment_types: Vec<String>,
}

/// Terminal routing instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "recommended_strategy")]
pub enum RoutingDecision {
    #[serde(rename = "noEntities")]
    NoEntities,
    #[serde(rename = "single_query")]
    SingleQuery { query: SubQuery },
    #[serde(rename = "multi_query")]
    MultiQuery { queries: Vec<SubQuery> },
    #[serde(rename = "compatibility_check")]
    CompatibilityCheck {
        message: String,
        entities: CompatEntities,
    },
    #[serde(rename = "complex_query")]
    ComplexQuery {
        reason: ComplexReason,
        message: String,
    },
}

/// Closed set of strategies, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    #[serde(rename = "noEntities")]
    NoEntities,
    #[serde(rename = "single_query")]
    SingleQuery,
    #[serde(rename = "multi_query")]
    MultiQuery,
    #[serde(rename = "compatibility_check")]
    CompatibilityCheck,
    #[serde(rename = "complex_query")]
    ComplexQuery,
}

impl RoutingDecision {
    pub fn strategy(&self) -> Strategy {
        match self {
            RoutingDecision::NoEntities => Strategy::NoEntities,
            RoutingDecision::SingleQuery { .. } => Strategy::SingleQuery,
            RoutingDecision::MultiQuery { .. } => Strategy::MultiQuery,
            RoutingDecision::CompatibilityCheck { .. } => Strategy::CompatibilityCheck,
            RoutingDecision::ComplexQuery { .. } => Strategy::ComplexQuery,
        }
    }

    /// Sub-queries carried by the decision (empty unless single/multi).
    pub fn sub_queries(&self) -> &[SubQuery] {
        match self {
            RoutingDecision::SingleQuery { query } => std::slice::from_ref(query),
            RoutingDecision::MultiQuery { queries } => queries,
            _ => &[],
        }
    }

    fn complex(reason: ComplexReason) -> Self {
        RoutingDecision::ComplexQuery {
            reason,
            message: reason.message().to_string(),
        }
    }
}

fn display_values(entities: &[Entity], kind: EntityKind) -> Vec<String> {
    of_kind(entities, kind)
        .map(|e| e.display_value().to_string())
        .collect()
}

/// Route a classified query.
pub fn route(
    classification: &Classification,
    bindings: &[Binding],
    entities: &[Entity],
) -> RoutingDecision {
    let decision = match classification.status {
        Status::Compat => RoutingDecision::CompatibilityCheck {
            message: "compatibility check requested".to_string(),
            entities: CompatEntities {
                manufacturers: display_values(entities, EntityKind::Manufacturer),
                models: display_values(entities, EntityKind::Model),
                equipment_types: display_values(entities, EntityKind::EquipmentType),
            },
        },
        Status::Simple if bindings.is_empty() => {
            tracing::warn!("Simple query without bindings, routing as complex");
            RoutingDecision::complex(ComplexReason::NoValidBindings)
        }
        Status::Simple => {
            let mut queries: Vec<SubQuery> = bindings
                .iter()
                .flat_map(|b| {
                    b.parameters.iter().map(move |p| SubQuery {
                        manufacturer: b.manufacturer.clone(),
                        model: b.model.clone(),
                        equipment_type: b.equipment_type.clone(),
                        parameter: p.key.clone(),
                        context: p.context.clone(),
                        confidence: p.confidence,
                        match_type: p.match_type,
                    })
                })
                .collect();
            match queries.len() {
                1 => RoutingDecision::SingleQuery {
                    query: queries.remove(0),
                },
                _ => RoutingDecision::MultiQuery { queries },
            }
        }
        Status::Complex | Status::Parallel => {
            if entities.is_empty() && classification.parameter_count == 0 {
                RoutingDecision::NoEntities
            } else if entities.is_empty() {
                RoutingDecision::complex(ComplexReason::NoEntities)
            } else if classification.valid_models == 0 {
                if entities.iter().any(|e| !e.is_resolved()) {
                    RoutingDecision::complex(ComplexReason::UnresolvedEntities)
                } else {
                    RoutingDecision::complex(ComplexReason::NoResolvedModels)
                }
            } else {
                RoutingDecision::complex(ComplexReason::NeedsAdvancedProcessing)
            }
        }
    };

    tracing::debug!(strategy = ?decision.strategy(), "Routed query");
    decision
}

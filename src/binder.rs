//! Segment-aware binding of parameters to models.
//!
//! Each parameter goes to the nearest model in its own segment, or to the
//! globally nearest resolved model when its segment names no model at all.
//! A parameter whose nearest model is unresolved is dropped. Manufacturer and equipment
//! type of a binding come from the nearest explicit mention in the model's
//! segment, then from the model metadata registry, then from the nearest
//! explicit mention anywhere in the query.

use serde::{Deserialize, Serialize};

use crate::config::MatchingConfig;
use crate::entity::{of_kind, Entity, EntityKind};
use crate::parameters::{MatchType, ParameterMatch};
use crate::registry::ModelMetadata;
use crate::segment::{segment_of, Segment};

/// A parameter attributed to a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundParameter {
    pub key: String,
    pub context: String,
    pub confidence: f64,
    pub match_type: MatchType,
}

/// One resolved model with the parameters attributed to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub model: String,
    pub manufacturer: Option<String>,
    pub equipment_type: Option<String>,
    pub parameters: Vec<BoundParameter>,
}

impl Binding {
    pub fn parameter_keys(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.key.as_str())
    }
}

pub struct Binder<'a> {
    metadata: &'a ModelMetadata,
    config: &'a MatchingConfig,
}

impl<'a> Binder<'a> {
    pub fn new(metadata: &'a ModelMetadata, config: &'a MatchingConfig) -> Self {
        Self { metadata, config }
    }

    /// Segment a parameter belongs to: the one containing its start, else the
    /// first one it overlaps within the border tolerance.
    fn parameter_segment(&self, segments: &[Segment], param: &ParameterMatch) -> Option<usize> {
        segment_of(segments, param.start).or_else(|| {
            segments
                .iter()
                .position(|s| s.overlaps(param.start, param.end, self.config.border_tolerance))
        })
    }

    pub fn bind(
        &self,
        entities: &[Entity],
        parameters: &[ParameterMatch],
        segments: &[Segment],
    ) -> Vec<Binding> {
        let models: Vec<&Entity> = of_kind(entities, EntityKind::Model).collect();
        let resolved: Vec<&Entity> = models.iter().copied().filter(|e| e.is_resolved()).collect();
        if resolved.is_empty() {
            return Vec::new();
        }

        let mut bindings: Vec<Binding> = Vec::new();
        for param in parameters {
            let segment = self.parameter_segment(segments, param);
            let in_segment: Vec<&Entity> = models
                .iter()
                .copied()
                .filter(|m| segment.is_some() && segment_of(segments, m.start) == segment)
                .collect();
            let pool = if in_segment.is_empty() { &resolved } else { &in_segment };

            let Some(model) = nearest(pool.iter().copied(), param.start) else {
                continue;
            };
            let Some(canonical) = model.canonical_value.as_deref() else {
                tracing::debug!(
                    parameter = %param.key,
                    model = %model.raw_text,
                    "Dropped parameter of unresolved model"
                );
                continue;
            };

            tracing::debug!(
                parameter = %param.key,
                model = %canonical,
                segment = ?segment,
                local = !in_segment.is_empty(),
                "Bound parameter"
            );

            let index = match bindings.iter().position(|b| b.model == canonical) {
                Some(i) => i,
                None => {
                    bindings.push(self.new_binding(model, canonical, entities, segments));
                    bindings.len() - 1
                }
            };
            let binding = &mut bindings[index];
            if binding.parameters.iter().all(|p| p.key != param.key) {
                binding.parameters.push(BoundParameter {
                    key: param.key.clone(),
                    context: param.context.clone(),
                    confidence: param.confidence,
                    match_type: param.match_type,
                });
            }
        }
        bindings
    }

    fn new_binding(
        &self,
        model: &Entity,
        canonical: &str,
        entities: &[Entity],
        segments: &[Segment],
    ) -> Binding {
        let info = self.metadata.get(canonical);
        let manufacturer = self.attribute(
            model,
            entities,
            segments,
            EntityKind::Manufacturer,
            info.and_then(|i| i.manufacturer.clone()),
        );
        let equipment_type = self.attribute(
            model,
            entities,
            segments,
            EntityKind::EquipmentType,
            info.and_then(|i| i.equipment_type.clone()),
        );
        Binding {
            model: canonical.to_string(),
            manufacturer,
            equipment_type,
            parameters: Vec::new(),
        }
    }

    /// Resolve a manufacturer or equipment type for a model.
    fn attribute(
        &self,
        model: &Entity,
        entities: &[Entity],
        segments: &[Segment],
        kind: EntityKind,
        from_metadata: Option<String>,
    ) -> Option<String> {
        let model_segment = segment_of(segments, model.start);
        let local = nearest(
            of_kind(entities, kind)
                .filter(|e| model_segment.is_some() && segment_of(segments, e.start) == model_segment),
            model.start,
        );
        local
            .map(|e| e.display_value().to_string())
            .or(from_metadata)
            .or_else(|| nearest(of_kind(entities, kind), model.start).map(|e| e.display_value().to_string()))
    }
}

/// Entity closest to `position` by start offset; the first one wins ties.
fn nearest<'e>(candidates: impl Iterator<Item = &'e Entity>, position: usize) -> Option<&'e Entity> {
    candidates.min_by_key(|e| e.start.abs_diff(position))
}

/// Convenience wrapper over [`Binder::bind`].
pub fn bind(
    entities: &[Entity],
    parameters: &[ParameterMatch],
    segments: &[Segment],
    metadata: &ModelMetadata,
    config: &MatchingConfig,
) -> Vec<Binding> {
    Binder::new(metadata, config).bind(entities, parameters, segments)
}

//! Entities built from NER spans.
//!
//! The NER collaborator hands over labeled character spans. Each usable span
//! is cleaned, canonicalized against the registries and turned into an
//! immutable [`Entity`]. Malformed spans and unknown labels are skipped with
//! a diagnostic; they never abort the request.

pub mod normalize;

use serde::{Deserialize, Serialize};

use crate::error::Diagnostic;
use crate::registry::RegistryContext;
use crate::text::{is_stopword, lower_aligned, QueryText};

use normalize::clean_mention;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Manufacturer,
    Model,
    EquipmentType,
}

impl EntityKind {
    /// Map an NER label to a kind. `EQ_TYPE` and `EQUIPMENT_TYPE` are synonyms.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "MANUFACTURER" => Some(EntityKind::Manufacturer),
            "MODEL" => Some(EntityKind::Model),
            "EQ_TYPE" | "EQUIPMENT_TYPE" => Some(EntityKind::EquipmentType),
            _ => None,
        }
    }
}

/// One labeled span as produced by the NER subsystem (character offsets).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub label: String,
    #[serde(default)]
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl EntitySpan {
    pub fn new(label: &str, text: &str, start: usize, end: usize) -> Self {
        Self {
            label: label.to_string(),
            text: text.to_string(),
            start,
            end,
        }
    }
}

/// A canonicalized entity mention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    pub raw_text: String,
    /// `None` for a model missing from the canonical registry
    pub canonical_value: Option<String>,
    pub confidence: f64,
    pub start: usize,
    pub end: usize,
}

impl Entity {
    pub fn is_resolved(&self) -> bool {
        self.canonical_value.is_some()
    }

    /// Canonical value if resolved, raw text otherwise.
    pub fn display_value(&self) -> &str {
        self.canonical_value.as_deref().unwrap_or(&self.raw_text)
    }

    fn dedup_key(&self) -> String {
        match &self.canonical_value {
            Some(c) => c.clone(),
            None => lower_aligned(&clean_mention(&self.raw_text)),
        }
    }
}

/// Heuristic confidence: longer mentions are more trustworthy, capped at 0.95.
pub fn mention_confidence(raw_text: &str) -> f64 {
    (0.7 + raw_text.chars().count() as f64 / 50.0).min(0.95)
}

/// Build canonicalized entities from NER spans, in span order.
///
/// Entities of the same kind with the same canonical value (or, when
/// unresolved, the same cleaned text) are collapsed onto the first mention.
pub fn extract_entities(
    text: &QueryText,
    spans: &[EntitySpan],
    registry: &RegistryContext,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Entity> {
    let mut entities: Vec<Entity> = Vec::with_capacity(spans.len());

    for span in spans {
        if span.end <= span.start || span.end > text.len() {
            tracing::warn!(
                label = %span.label,
                start = span.start,
                end = span.end,
                text_len = text.len(),
                "Skipping malformed entity span"
            );
            diagnostics.push(Diagnostic::MalformedSpan {
                label: span.label.clone(),
                start: span.start,
                end: span.end,
            });
            continue;
        }

        let Some(kind) = EntityKind::from_label(&span.label) else {
            tracing::warn!(label = %span.label, "Skipping span with unknown label");
            diagnostics.push(Diagnostic::UnknownLabel {
                label: span.label.clone(),
                text: span.text.clone(),
            });
            continue;
        };

        let raw_text = if span.text.trim().is_empty() {
            text.slice(span.start, span.end).to_string()
        } else {
            span.text.clone()
        };
        if clean_mention(&raw_text).is_empty() {
            diagnostics.push(Diagnostic::MalformedSpan {
                label: span.label.clone(),
                start: span.start,
                end: span.end,
            });
            continue;
        }

        let canonical_value = registry.canonicalize(&raw_text, kind);

        if kind == EntityKind::Manufacturer
            && canonical_value.as_deref().is_some_and(is_stopword)
        {
            tracing::debug!(raw = %raw_text, "Dropping stopword manufacturer");
            diagnostics.push(Diagnostic::StopwordManufacturer {
                raw: raw_text.clone(),
            });
            continue;
        }

        if kind == EntityKind::Model && canonical_value.is_none() {
            let closest_known = registry.models.closest_key(&raw_text).map(str::to_string);
            tracing::debug!(raw = %raw_text, closest = ?closest_known, "Unresolved model");
            diagnostics.push(Diagnostic::UnresolvedModel {
                raw: raw_text.clone(),
                closest_known,
            });
        }

        let entity = Entity {
            kind,
            confidence: mention_confidence(&raw_text),
            raw_text,
            canonical_value,
            start: span.start,
            end: span.end,
        };

        let duplicate = entities
            .iter()
            .any(|e| e.kind == entity.kind && e.dedup_key() == entity.dedup_key());
        if duplicate {
            continue;
        }
        entities.push(entity);
    }

    entities
}

/// Entities of one kind, in mention order.
pub fn of_kind(entities: &[Entity], kind: EntityKind) -> impl Iterator<Item = &Entity> {
    entities.iter().filter(move |e| e.kind == kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CanonicalModels, EntitySynonyms, ModelMetadata, ParameterGlossary};
    use std::collections::BTreeMap;
    use std::path::Path;

    fn registry() -> RegistryContext {
        let mut gloss = BTreeMap::new();
        gloss.insert("weight_kg".to_string(), vec!["вага".to_string()]);
        RegistryContext::new(
            ParameterGlossary::from_map(&gloss).unwrap(),
            EntitySynonyms::from_yaml_str(
                "manufacturers:\n  pylontech: [Pylontech]\n  battery: [Battery]\nequipment_types: {}\n",
                Path::new("<test>"),
            )
            .unwrap(),
            CanonicalModels::parse("US5000 -> us5000\nPylontech US5000 -> us5000\n"),
            ModelMetadata::default(),
        )
    }

    fn extract(text: &str, spans: &[EntitySpan]) -> (Vec<Entity>, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let entities = extract_entities(&QueryText::new(text), spans, &registry(), &mut diagnostics);
        (entities, diagnostics)
    }

    #[test]
    fn test_label_mapping() {
        assert_eq!(EntityKind::from_label("EQ_TYPE"), Some(EntityKind::EquipmentType));
        assert_eq!(EntityKind::from_label("equipment_type"), Some(EntityKind::EquipmentType));
        assert_eq!(EntityKind::from_label("PRICE"), None);
    }

    #[test]
    fn test_canonicalizes_spans() {
        let text = "Вага Pylontech US5000";
        let (entities, diagnostics) = extract(
            text,
            &[
                EntitySpan::new("MANUFACTURER", "Pylontech", 5, 14),
                EntitySpan::new("MODEL", "US5000", 15, 21),
            ],
        );
        assert!(diagnostics.is_empty());
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].canonical_value.as_deref(), Some("pylontech"));
        assert_eq!(entities[1].canonical_value.as_deref(), Some("us5000"));
        assert!((entities[1].confidence - 0.82).abs() < 1e-9);
    }

    #[test]
    fn test_malformed_spans_are_skipped() {
        let (entities, diagnostics) = extract(
            "US5000",
            &[
                EntitySpan::new("MODEL", "US5000", 4, 2),
                EntitySpan::new("MODEL", "US5000", 0, 99),
                EntitySpan::new("MODEL", "US5000", 0, 6),
            ],
        );
        assert_eq!(entities.len(), 1);
        assert_eq!(diagnostics.len(), 2);
        assert!(matches!(diagnostics[0], Diagnostic::MalformedSpan { start: 4, end: 2, .. }));
    }

    #[test]
    fn test_unknown_label_diagnostic() {
        let (entities, diagnostics) = extract("5 kW", &[EntitySpan::new("POWER", "5 kW", 0, 4)]);
        assert!(entities.is_empty());
        assert!(matches!(&diagnostics[0], Diagnostic::UnknownLabel { label, .. } if label == "POWER"));
    }

    #[test]
    fn test_unresolved_model_kept_with_diagnostic() {
        let (entities, diagnostics) = extract("US5001", &[EntitySpan::new("MODEL", "US5001", 0, 6)]);
        assert_eq!(entities.len(), 1);
        assert!(!entities[0].is_resolved());
        assert_eq!(
            diagnostics[0],
            Diagnostic::UnresolvedModel {
                raw: "US5001".into(),
                closest_known: Some("us5000".into())
            }
        );
    }

    #[test]
    fn test_stopword_manufacturer_dropped() {
        let (entities, diagnostics) =
            extract("Battery US5000", &[EntitySpan::new("MANUFACTURER", "Battery", 0, 7)]);
        assert!(entities.is_empty());
        assert!(matches!(diagnostics[0], Diagnostic::StopwordManufacturer { .. }));
    }

    #[test]
    fn test_duplicates_collapse_on_canonical() {
        let text = "US5000 vs Pylontech US5000";
        let (entities, _) = extract(
            text,
            &[
                EntitySpan::new("MODEL", "US5000", 0, 6),
                EntitySpan::new("MODEL", "Pylontech US5000", 10, 26),
            ],
        );
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].start, 0);
    }

    #[test]
    fn test_empty_span_text_falls_back_to_slice() {
        let (entities, _) = extract("Вага US5000", &[EntitySpan::new("MODEL", "", 5, 11)]);
        assert_eq!(entities[0].raw_text, "US5000");
        assert_eq!(entities[0].canonical_value.as_deref(), Some("us5000"));
    }

    #[test]
    fn test_confidence_caps() {
        assert!((mention_confidence("ab") - 0.74).abs() < 1e-9);
        assert!((mention_confidence(&"x".repeat(40)) - 0.95).abs() < 1e-9);
    }
}

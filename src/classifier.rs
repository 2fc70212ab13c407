//! Deterministic query classification.
//!
//! Priority order, first match wins:
//! 1. parallel/stacking pattern -> `parallel`
//! 2. compatibility pattern -> `compat`
//! 3. 1..=2 resolved models and 1..=2 parameters -> `simple`
//! 4. anything else -> `complex`

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::entity::{of_kind, Entity, EntityKind};

static COMPAT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Ukrainian
        r"\bсумісн\w*",
        r"\bчи можна (?:підключити|з'єднати|використати)\b",
        r"\bв одну систему\b",
        // Russian
        r"\bсовмест\w*",
        r"\bможно ли (?:подключить|соединить|использовать)\b",
        // English
        r"\b(?:compat|compatible|compatibility)\b",
        r"\bcan (?:i|we) (?:connect|use|combine)\b",
        r"\bwork (?:with|together)\b",
        r"\bac[- ]?coupling\b",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){p}")).expect("valid regex"))
    .collect()
});

static PARALLEL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\bпаралел\w*",
        r"\bпараллел\w*",
        r"\bparallel\w*",
        r"\bstack(?:ing|ed|able)?\b",
        r"\bстек(?:ув|ир)\w*",
        // Action verb up to four words before a 3-phase mention
        r"\b(?:зібрати|зробити|побудувати|підключити|об'єднати|собрать|сделать|построить|подключить|объединить|build|make|connect|combine|create)\b(?:\W+\w+){0,4}\W+(?:3[- ]?ф\w*|трифаз\w*|три фаз\w*|3[- ]?phase|three[- ]phase)",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){p}")).expect("valid regex"))
    .collect()
});

/// The classifier's top-level verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Simple,
    Complex,
    Compat,
    Parallel,
}

/// Intent label derived from status and extracted entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionIntent {
    CompatibilityQuery,
    SqlQuery,
    MultiModelQuery,
    Uncertain,
    NoEntities,
}

/// Special question shapes reported alongside the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Compat,
    Parallel,
}

/// Outcome of one classification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub status: Status,
    pub intent: QuestionIntent,
    pub question_type: Option<QuestionType>,
    pub valid_models: usize,
    pub parameter_count: usize,
}

pub fn is_parallel_query(text: &str) -> bool {
    PARALLEL_PATTERNS.iter().any(|re| re.is_match(text))
}

pub fn is_compat_query(text: &str) -> bool {
    COMPAT_PATTERNS.iter().any(|re| re.is_match(text))
}

/// Classify a query from its text, entities and retained parameter count.
pub fn classify(text: &str, entities: &[Entity], parameter_count: usize) -> Classification {
    let valid_models = of_kind(entities, EntityKind::Model)
        .filter(|e| e.is_resolved())
        .count();

    let status = if is_parallel_query(text) {
        Status::Parallel
    } else if is_compat_query(text) {
        Status::Compat
    } else if (1..=2).contains(&valid_models) && (1..=2).contains(&parameter_count) {
        Status::Simple
    } else {
        Status::Complex
    };

    let has_model_entities = of_kind(entities, EntityKind::Model).next().is_some();
    let intent = match status {
        Status::Compat => QuestionIntent::CompatibilityQuery,
        Status::Simple => QuestionIntent::SqlQuery,
        Status::Complex | Status::Parallel if parameter_count > 0 => QuestionIntent::MultiModelQuery,
        Status::Complex | Status::Parallel if has_model_entities => QuestionIntent::Uncertain,
        Status::Complex | Status::Parallel => QuestionIntent::NoEntities,
    };

    let question_type = match status {
        Status::Compat => Some(QuestionType::Compat),
        Status::Parallel => Some(QuestionType::Parallel),
        _ => None,
    };

    tracing::debug!(
        ?status,
        ?intent,
        valid_models,
        parameter_count,
        "Classified query"
    );

    Classification {
        status,
        intent,
        question_type,
        valid_models,
        parameter_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(canonical: Option<&str>) -> Entity {
        Entity {
            kind: EntityKind::Model,
            raw_text: "M".into(),
            canonical_value: canonical.map(str::to_string),
            confidence: 0.9,
            start: 0,
            end: 1,
        }
    }

    #[test]
    fn test_compat_patterns() {
        assert!(is_compat_query("Чи сумісний Pylontech US5000 з Victron MultiPlus?"));
        assert!(is_compat_query("Совместимы ли эти устройства"));
        assert!(is_compat_query("Can I connect a Deye to BYD?"));
        assert!(is_compat_query("does it support AC-coupling"));
        assert!(is_compat_query("чи можна підключити два інвертори"));
        assert!(!is_compat_query("Вага Pylontech US5000"));
    }

    #[test]
    fn test_parallel_patterns() {
        assert!(is_parallel_query("Скільки інверторів можна паралелити?"));
        assert!(is_parallel_query("Are these batteries stackable"));
        assert!(is_parallel_query("Як зібрати з трьох інверторів 3-фазну систему"));
        assert!(is_parallel_query("can I build a three-phase system"));
        assert!(!is_parallel_query("Яка ємність у трифазного інвертора"));
    }

    #[test]
    fn test_parallel_beats_compat() {
        let c = classify("Are these compatible for parallel operation?", &[], 0);
        assert_eq!(c.status, Status::Parallel);
        assert_eq!(c.question_type, Some(QuestionType::Parallel));
    }

    #[test]
    fn test_simple_bounds() {
        let one = [model(Some("a"))];
        assert_eq!(classify("x", &one, 1).status, Status::Simple);
        assert_eq!(classify("x", &one, 2).status, Status::Simple);
        assert_eq!(classify("x", &one, 3).status, Status::Complex);
        assert_eq!(classify("x", &one, 0).status, Status::Complex);

        let three = [model(Some("a")), model(Some("b")), model(Some("c"))];
        assert_eq!(classify("x", &three, 1).status, Status::Complex);
    }

    #[test]
    fn test_unresolved_models_do_not_count() {
        let c = classify("x", &[model(None)], 1);
        assert_eq!(c.status, Status::Complex);
        assert_eq!(c.valid_models, 0);
        assert_eq!(c.intent, QuestionIntent::MultiModelQuery);
    }

    #[test]
    fn test_intent_derivation() {
        assert_eq!(classify("x", &[model(None)], 0).intent, QuestionIntent::Uncertain);
        assert_eq!(classify("x", &[], 0).intent, QuestionIntent::NoEntities);
        assert_eq!(
            classify("x", &[model(Some("a"))], 1).intent,
            QuestionIntent::SqlQuery
        );
        let compat = classify("compatible?", &[], 0);
        assert_eq!(compat.intent, QuestionIntent::CompatibilityQuery);
        assert_eq!(compat.question_type, Some(QuestionType::Compat));
    }
}

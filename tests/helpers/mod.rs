//! Shared in-memory registries for the integration tests.
//!
//! The fixture glossary is small on purpose: every expected match position
//! in the scenario tests depends on exactly these synonyms.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use ipg_core::registry::{CanonicalModels, EntitySynonyms, ModelMetadata, ParameterGlossary};
use ipg_core::{EntitySpan, MatchingConfig, Pipeline, RegistryContext};

pub const GLOSSARY: &str = r#"
max_charge_current_a:
  - максимальний струм заряджання
  - максимальний зарядний струм
  - max charge current
max_discharge_current_a:
  - максимальний струм розряджання
  - max discharge current
capacity_kwh: [ємність, capacity, емкость]
weight_kg: [вага, weight, вес]
number_of_mppt: [кількість mppt, mppt trackers]
nominal_ac_power_w: [номінальна потужність, nominal ac power]
"#;

pub const SYNONYMS: &str = r#"
manufacturers:
  pylontech: [Pylontech, Пілонтек]
  dyness: [Dyness, Дайнес]
  victron: [Victron, Victron Energy, Віктрон]
  deye: [Deye, Деє]
  huawei: [Huawei, Хуавей]
  byd: [BYD]
  solaredge: [SolarEdge, Solar Edge]
  sofar: [Sofar, Sofar Solar]
  fronius: [Fronius]
equipment_types:
  battery: [акумулятор, батарея, battery]
  inverter: [інвертор, inverter]
"#;

pub const MODELS: &str = "\
US5000 -> us5000
Pylontech US5000 -> us5000
US3000C -> us3000c
A48100 -> a48100
HVS 10.2 -> battery_box_premium_hvs_10_2
SE7600H -> se7600h
MultiPlus -> multiplus_ii_48_5000_70_50
SUN2000-15KTL-M2 -> sun2000_15ktl_m2
SUN-12K-SG04LP3 -> sun_12k_sg04lp3
Symo 10.0-3-M -> symo_10_0_3_m
BOS-G25 -> bos_g25
HYD 10KTL -> hyd_10ktl
";

pub const METADATA: &str = "\
model_code,equipment_type_id,manufacturer_id,is_active
us5000,battery,Pylontech,1
us3000c,battery,Pylontech,1
a48100,battery,Dyness,1
battery_box_premium_hvs_10_2,battery,BYD,1
se7600h,inverter,SolarEdge,1
multiplus_ii_48_5000_70_50,inverter,Victron,1
sun2000_15ktl_m2,inverter,Huawei,1
sun_12k_sg04lp3,inverter,Deye,1
symo_10_0_3_m,inverter,Fronius,1
bos_g25,battery,Deye,1
hyd_10ktl,inverter,Sofar,0
";

pub fn registry() -> RegistryContext {
    let origin = Path::new("<fixture>");
    RegistryContext::new(
        ParameterGlossary::from_yaml_str(GLOSSARY, origin).expect("fixture glossary"),
        EntitySynonyms::from_yaml_str(SYNONYMS, origin).expect("fixture synonyms"),
        CanonicalModels::parse(MODELS),
        ModelMetadata::from_reader(METADATA.as_bytes(), origin).expect("fixture metadata"),
    )
}

pub fn pipeline() -> Pipeline {
    Pipeline::new(Arc::new(registry()), MatchingConfig::default())
}

/// Span for the first occurrence of `needle` in `text`, in character offsets.
pub fn span(text: &str, label: &str, needle: &str) -> EntitySpan {
    let byte = text
        .find(needle)
        .unwrap_or_else(|| panic!("'{}' not found in '{}'", needle, text));
    let start = text[..byte].chars().count();
    let end = start + needle.chars().count();
    EntitySpan::new(label, needle, start, end)
}

/// Spans for `(label, needle)` pairs, in order.
pub fn spans(text: &str, mentions: &[(&str, &str)]) -> Vec<EntitySpan> {
    mentions
        .iter()
        .map(|(label, needle)| span(text, label, needle))
        .collect()
}

//! Cross-field consistency
//!
//! Static correlations between fields of one document, plus the
//! composition-derived hazard check. Both operate on the current
//! extraction map only, so they can be re-run at any time.

use crate::types::{add_note, meta};
use sds_composition::{parse_declared_codes, HazardRuleEngine};
use sds_domain::{
    fields, ConsistencyReport, ExtractionSource, FieldExtraction, Ingredient, ValidationStatus,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Hazard codes compatible with a transport class
fn class_hazard_codes(class: &str) -> Option<&'static [&'static str]> {
    let codes: &'static [&'static str] = match class {
        "3" => &["H224", "H225", "H226"],
        "8" => &["H290", "H314", "H318"],
        "2.1" => &["H220", "H221"],
        "6.1" => &["H300", "H301", "H310", "H311", "H330", "H331"],
        _ => return None,
    };
    Some(codes)
}

/// Codes whose classification always carries the signal word "Danger"
const DANGER_ONLY_CODES: &[&str] = &[
    "H220", "H222", "H224", "H225", "H240", "H241", "H250", "H260", "H271", "H300", "H301",
    "H304", "H310", "H311", "H314", "H318", "H330", "H331", "H340", "H350", "H360", "H370",
    "H372",
];

/// An inconsistency between two fields
#[derive(Debug, Clone, PartialEq)]
pub struct CrossFieldFinding {
    /// Field whose confidence was reduced
    pub penalized: String,

    /// Field it disagreed with
    pub other: String,

    /// Corrective message attached to the penalized field
    pub message: String,
}

/// Apply the static correlation table
///
/// On a mismatch the weaker field (lower confidence; on a tie the dependent
/// one) is multiplied by `penalty` and annotated. Values are never changed.
/// A transport class corroborated by the declared hazard codes is marked
/// cross-validated.
pub fn apply_cross_field_rules(
    extractions: &mut BTreeMap<String, FieldExtraction>,
    penalty: f64,
) -> Vec<CrossFieldFinding> {
    let mut findings = Vec::new();
    let codes = declared_codes(extractions);

    // Transport class <-> hazard statements
    if let (Some(class), false) = (present_value(extractions, fields::TRANSPORT_CLASS), codes.is_empty()) {
        if let Some(expected) = class_hazard_codes(&class) {
            if expected.iter().any(|c| codes.contains(*c)) {
                for field in [fields::TRANSPORT_CLASS, fields::H_STATEMENTS] {
                    if let Some(e) = extractions.get_mut(field) {
                        e.metadata.insert(meta::CROSS_VALIDATED.to_string(), "true".to_string());
                    }
                }
            } else {
                let message = format!(
                    "transport class {} implies one of {} but none is declared",
                    class,
                    expected.join("/")
                );
                findings.extend(penalize_weaker(
                    extractions,
                    fields::H_STATEMENTS,
                    fields::TRANSPORT_CLASS,
                    penalty,
                    message,
                ));
            }
        }
    }

    // Signal word <-> category-1 hazards
    if present_value(extractions, fields::SIGNAL_WORD).as_deref() == Some("Warning") {
        let severe: Vec<&str> = DANGER_ONLY_CODES
            .iter()
            .copied()
            .filter(|c| codes.contains(*c))
            .collect();
        if !severe.is_empty() {
            let message = format!("signal word Warning conflicts with {}", severe.join(", "));
            findings.extend(penalize_weaker(
                extractions,
                fields::H_STATEMENTS,
                fields::SIGNAL_WORD,
                penalty,
                message,
            ));
        }
    }

    // Packing group needs a UN number
    if present_value(extractions, fields::PACKING_GROUP).is_some()
        && present_value(extractions, fields::UN_NUMBER).is_none()
    {
        if let Some(e) = extractions.get_mut(fields::PACKING_GROUP) {
            e.scale_confidence(penalty);
            let message = "packing group given without a UN number".to_string();
            add_note(e, &message);
            findings.push(CrossFieldFinding {
                penalized: fields::PACKING_GROUP.to_string(),
                other: fields::UN_NUMBER.to_string(),
                message,
            });
        }
    }

    for finding in &findings {
        warn!("Cross-field mismatch on {}: {}", finding.penalized, finding.message);
    }
    findings
}

fn penalize_weaker(
    extractions: &mut BTreeMap<String, FieldExtraction>,
    primary: &str,
    dependent: &str,
    penalty: f64,
    message: String,
) -> Option<CrossFieldFinding> {
    let primary_conf = extractions.get(primary)?.confidence();
    let dependent_conf = extractions.get(dependent)?.confidence();

    let (weaker, other) = if primary_conf < dependent_conf {
        (primary, dependent)
    } else {
        (dependent, primary)
    };

    let extraction = extractions.get_mut(weaker)?;
    extraction.scale_confidence(penalty);
    add_note(extraction, &message);

    Some(CrossFieldFinding {
        penalized: weaker.to_string(),
        other: other.to_string(),
        message,
    })
}

fn present_value(extractions: &BTreeMap<String, FieldExtraction>, field: &str) -> Option<String> {
    extractions
        .get(field)
        .filter(|e| !e.is_empty())
        .map(|e| e.value.trim().to_string())
}

fn declared_codes(extractions: &BTreeMap<String, FieldExtraction>) -> BTreeSet<String> {
    extractions
        .get(fields::H_STATEMENTS)
        .map(|e| parse_declared_codes(&e.value))
        .unwrap_or_default()
}

/// Compare composition-implied hazards with the declared `h_statements`
///
/// A pure function of the ingredient list and the current extractions.
pub fn recompute_consistency(
    engine: &HazardRuleEngine,
    ingredients: &[Ingredient],
    extractions: &BTreeMap<String, FieldExtraction>,
) -> ConsistencyReport {
    let declared = extractions
        .get(fields::H_STATEMENTS)
        .map(|e| e.value.as_str())
        .unwrap_or_default();
    engine.check(ingredients, declared)
}

/// Record a consistency report in the `_hazard_consistency` pseudo-field
///
/// An inconsistent report inserts or replaces the pseudo-field; a
/// consistent one removes it.
pub fn attach_consistency_report(
    extractions: &mut BTreeMap<String, FieldExtraction>,
    report: &ConsistencyReport,
) {
    if !report.is_inconsistent() {
        extractions.remove(fields::HAZARD_CONSISTENCY);
        return;
    }

    let missing = report.missing_codes();
    let basis = report
        .missing_hazards
        .iter()
        .map(|h| h.basis.as_str())
        .collect::<Vec<_>>()
        .join("; ");

    let mut pseudo = FieldExtraction::new(
        fields::HAZARD_CONSISTENCY,
        missing.clone(),
        1.0,
        ExtractionSource::CrossValidated,
        basis,
    );
    pseudo.validation_status = ValidationStatus::Warning;
    pseudo.message = Some(format!("composition implies undeclared hazards: {}", missing));
    pseudo
        .metadata
        .insert("calculated_count".to_string(), report.calculated_count.to_string());
    pseudo
        .metadata
        .insert("declared_count".to_string(), report.declared_count.to_string());
    pseudo
        .metadata
        .insert("missing_count".to_string(), report.missing_hazards.len().to_string());

    debug!("Hazard consistency: missing {}", missing);
    extractions.insert(fields::HAZARD_CONSISTENCY.to_string(), pseudo);
}

/// Whether the document describes dangerous goods
///
/// True when a UN number or transport class is present, the signal word is
/// "Danger", or any physical or health hazard code (H2xx/H3xx) is declared.
pub fn is_dangerous(extractions: &BTreeMap<String, FieldExtraction>) -> bool {
    if present_value(extractions, fields::UN_NUMBER).is_some()
        || present_value(extractions, fields::TRANSPORT_CLASS).is_some()
    {
        return true;
    }
    if present_value(extractions, fields::SIGNAL_WORD).is_some_and(|s| s.eq_ignore_ascii_case("danger")) {
        return true;
    }
    declared_codes(extractions)
        .iter()
        .any(|code| code.starts_with("H2") || code.starts_with("H3"))
}

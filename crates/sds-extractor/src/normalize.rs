//! Decoding of raw oracle answers
//!
//! Oracles answer in whatever shape they like. Every answer is decoded
//! here, once, into an [`OracleFinding`]; nothing downstream looks at the
//! raw payload again.

use sds_domain::clamp_confidence;
use sds_domain::traits::OracleResponse;
use sds_oracle::is_not_found;
use serde_json::{Map, Value};

/// Wrapper keys an answer may be nested under
const WRAPPER_KEYS: &[&str] = &["answer", "result", "data", "extraction", "output"];

/// Keys that may carry the value itself
const VALUE_KEYS: &[&str] = &["value", "answer", "result", "text"];

/// Deepest nesting followed before giving up
const MAX_DEPTH: usize = 4;

/// A decoded oracle answer
#[derive(Debug, Clone, PartialEq)]
pub struct OracleFinding {
    /// Answer text
    pub value: String,

    /// Confidence in [0, 1]
    pub confidence: f64,

    /// Supporting text, if the oracle gave any
    pub context: String,
}

/// Decode an oracle answer for `field`
///
/// Returns `None` for "not found" answers and for payloads that carry no
/// usable value. Missing or out-of-range confidences fall back to
/// `default_confidence`.
pub fn normalize_oracle_response(
    field: &str,
    response: &OracleResponse,
    default_confidence: f64,
) -> Option<OracleFinding> {
    let finding = match response {
        OracleResponse::NotFound => return None,
        OracleResponse::Text(text) => text_finding(field, text, default_confidence),
        OracleResponse::Structured(value) => decode_value(field, value, default_confidence, 0),
    }?;

    if is_not_found(&finding.value) {
        return None;
    }
    Some(finding)
}

fn text_finding(field: &str, text: &str, default_confidence: f64) -> Option<OracleFinding> {
    // A string payload may itself be JSON
    let trimmed = sds_oracle::strip_code_fence(text).trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            return decode_value(field, &value, default_confidence, 0);
        }
    }

    let value = trimmed.trim_matches('"').trim();
    (!value.is_empty()).then(|| OracleFinding {
        value: value.to_string(),
        confidence: default_confidence,
        context: String::new(),
    })
}

fn decode_value(field: &str, value: &Value, default_confidence: f64, depth: usize) -> Option<OracleFinding> {
    if depth > MAX_DEPTH {
        return None;
    }

    match value {
        Value::Null | Value::Bool(_) => None,
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| OracleFinding {
                value: s.to_string(),
                confidence: default_confidence,
                context: String::new(),
            })
        }
        Value::Number(n) => Some(OracleFinding {
            value: n.to_string(),
            confidence: default_confidence,
            context: String::new(),
        }),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(scalar_text).collect();
            (!parts.is_empty()).then(|| OracleFinding {
                value: parts.join(", "),
                confidence: default_confidence,
                context: String::new(),
            })
        }
        Value::Object(map) => decode_object(field, map, default_confidence, depth),
    }
}

fn decode_object(
    field: &str,
    map: &Map<String, Value>,
    default_confidence: f64,
    depth: usize,
) -> Option<OracleFinding> {
    // Field-keyed wrapper: {"cas_number": ...}
    if !field.is_empty() {
        if let Some(inner) = map.get(field) {
            return decode_value(field, inner, default_confidence, depth + 1);
        }
    }

    // Canonical shape: {"value": ..., "confidence": ..., "context": ...}
    if let Some(raw) = VALUE_KEYS.iter().find_map(|k| map.get(*k)) {
        if raw.is_object() {
            return decode_value(field, raw, default_confidence, depth + 1);
        }
        let mut finding = decode_value(field, raw, default_confidence, depth + 1)?;
        finding.confidence = read_confidence(map).unwrap_or(default_confidence);
        finding.context = map
            .get("context")
            .or_else(|| map.get("evidence"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();
        return Some(finding);
    }

    // Generic wrapper: {"data": {...}}
    WRAPPER_KEYS
        .iter()
        .filter_map(|k| map.get(*k))
        .find_map(|inner| decode_value(field, inner, default_confidence, depth + 1))
}

fn read_confidence(map: &Map<String, Value>) -> Option<f64> {
    let raw = map.get("confidence").or_else(|| map.get("score"))?;
    let confidence = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    // Percentages are accepted, anything else out of range is ignored
    let confidence = if confidence > 1.0 && confidence <= 100.0 {
        confidence / 100.0
    } else {
        confidence
    };
    (0.0..=1.0).contains(&confidence).then(|| clamp_confidence(confidence))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => VALUE_KEYS
            .iter()
            .find_map(|k| map.get(*k))
            .and_then(scalar_text),
        _ => None,
    }
}

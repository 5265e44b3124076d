//! Field-specific normalization and structural checks

use crate::ValidationConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use sds_domain::{fields, CasNumber};
use std::collections::BTreeSet;

static CAS_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{2,7}-\d{2}-\d\b").unwrap());

static UN_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:UN|U\.N\.)?\s*(?:no\.?|number)?\s*-?\s*(\d{4})$").unwrap());

static TRANSPORT_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:class\s*)?(\d(?:\.\d)?)\b").unwrap());

static PACKING_GROUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:packing\s+group|pg)?\s*[:.]?\s*(III|II|I|3|2|1)$").unwrap()
});

static HAZARD_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(EUH\d{3}|H[234]\d{2}[a-zA-Z]{0,2})\b").unwrap());

static FLASH_POINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([<>]=?|≤|≥)?\s*(-?\d{1,3}(?:[.,]\d+)?)\s*°?\s*([CF])\b").unwrap()
});

static DATE_DMY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})[./-](\d{1,2})[./-](\d{4})$").unwrap());

static DATE_ISO: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").unwrap());

const TRANSPORT_CLASSES: &[&str] = &[
    "1", "1.1", "1.2", "1.3", "1.4", "1.5", "1.6", "2", "2.1", "2.2", "2.3", "3", "4.1", "4.2",
    "4.3", "5.1", "5.2", "6.1", "6.2", "7", "8", "9",
];

/// Outcome of a structural check
#[derive(Debug, Clone, PartialEq)]
pub enum StructuralCheck {
    /// Value has the expected shape
    Ok,

    /// Value is well-formed but implausible
    Soft(String),

    /// Value does not have the expected shape
    Fail(String),
}

/// Canonical form of a value, or `None` when it cannot be read
pub fn normalize(field: &str, value: &str) -> Option<String> {
    let value = collapse_whitespace(value);
    if value.is_empty() {
        return None;
    }

    match field {
        fields::CAS_NUMBER => CAS_SHAPE
            .find_iter(&value)
            .find_map(|m| CasNumber::parse(m.as_str()).ok())
            .map(|cas| cas.to_string()),
        fields::UN_NUMBER => UN_NUMBER
            .captures(&value)
            .and_then(|c| c.get(1))
            .map(|m| format!("UN{}", m.as_str())),
        fields::TRANSPORT_CLASS => TRANSPORT_CLASS
            .captures(&value)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string()),
        fields::PACKING_GROUP => PACKING_GROUP
            .captures(&value)
            .and_then(|c| c.get(1))
            .map(|m| roman_packing_group(m.as_str()).to_string()),
        fields::H_STATEMENTS => normalize_hazard_codes(&value),
        fields::SIGNAL_WORD => match value.trim_matches(|c: char| !c.is_alphabetic()).to_lowercase().as_str() {
            "danger" => Some("Danger".to_string()),
            "warning" => Some("Warning".to_string()),
            _ => None,
        },
        fields::FLASH_POINT => parse_flash_point(&value).map(|(prefix, celsius)| {
            format!("{}{} °C", prefix, format_number(celsius))
        }),
        fields::REVISION_DATE => parse_date(&value).map(|(y, m, d)| format!("{y:04}-{m:02}-{d:02}")),
        fields::PRODUCT_NAME | fields::MANUFACTURER => {
            let trimmed = value.trim_matches(|c: char| c == ':' || c == ';' || c == ',' || c.is_whitespace());
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => Some(value),
    }
}

/// Check that a value has the shape its field requires
pub fn check(field: &str, value: &str, config: &ValidationConfig) -> StructuralCheck {
    let value = value.trim();

    match field {
        fields::CAS_NUMBER => match CasNumber::parse(value) {
            Ok(_) => StructuralCheck::Ok,
            Err(e) => StructuralCheck::Fail(e),
        },
        fields::UN_NUMBER => {
            let ok = value.len() == 6
                && value.starts_with("UN")
                && value[2..].chars().all(|c| c.is_ascii_digit());
            if ok {
                StructuralCheck::Ok
            } else {
                StructuralCheck::Fail(format!("'{}' is not a UN number (UNnnnn)", value))
            }
        }
        fields::TRANSPORT_CLASS => {
            if TRANSPORT_CLASSES.contains(&value) {
                StructuralCheck::Ok
            } else {
                StructuralCheck::Fail(format!("'{}' is not a transport hazard class", value))
            }
        }
        fields::PACKING_GROUP => match value {
            "I" | "II" | "III" => StructuralCheck::Ok,
            _ => StructuralCheck::Fail(format!("'{}' is not a packing group", value)),
        },
        fields::H_STATEMENTS => {
            let codes: Vec<&str> = value.split(',').map(str::trim).collect();
            let all_codes = !codes.is_empty()
                && codes
                    .iter()
                    .all(|c| HAZARD_CODE.find(c).is_some_and(|m| m.as_str().len() == c.len()));
            if all_codes {
                StructuralCheck::Ok
            } else {
                StructuralCheck::Fail("no hazard statement codes".to_string())
            }
        }
        fields::SIGNAL_WORD => match value {
            "Danger" | "Warning" => StructuralCheck::Ok,
            _ => StructuralCheck::Fail(format!("'{}' is not a signal word", value)),
        },
        fields::FLASH_POINT => match parse_flash_point(value) {
            Some((_, celsius)) if celsius < config.flash_point_min_c || celsius > config.flash_point_max_c => {
                StructuralCheck::Soft(format!("flash point {} °C is implausible", format_number(celsius)))
            }
            Some(_) => StructuralCheck::Ok,
            None => StructuralCheck::Fail(format!("'{}' has no temperature", value)),
        },
        fields::EMERGENCY_PHONE => {
            let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
            if digits >= config.min_phone_digits {
                StructuralCheck::Ok
            } else {
                StructuralCheck::Fail(format!("phone number has only {} digits", digits))
            }
        }
        fields::REVISION_DATE => match parse_date(value) {
            Some(_) => StructuralCheck::Ok,
            None => StructuralCheck::Fail(format!("'{}' is not a date", value)),
        },
        fields::PRODUCT_NAME | fields::MANUFACTURER => {
            if value.chars().filter(|c| c.is_alphanumeric()).count() >= 2 {
                StructuralCheck::Ok
            } else {
                StructuralCheck::Fail("name too short".to_string())
            }
        }
        _ => StructuralCheck::Ok,
    }
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn roman_packing_group(raw: &str) -> &'static str {
    match raw.to_uppercase().as_str() {
        "I" | "1" => "I",
        "II" | "2" => "II",
        _ => "III",
    }
}

/// Unique hazard codes, sorted, joined with ", "
fn normalize_hazard_codes(value: &str) -> Option<String> {
    let codes: BTreeSet<String> = HAZARD_CODE
        .find_iter(value)
        .map(|m| {
            let raw = m.as_str();
            let prefix_len = if raw.to_uppercase().starts_with("EUH") { 6 } else { 4 };
            let (head, tail) = raw.split_at(prefix_len);
            format!("{}{}", head.to_uppercase(), tail.to_lowercase())
        })
        .collect();

    (!codes.is_empty()).then(|| codes.into_iter().collect::<Vec<_>>().join(", "))
}

/// Comparator prefix and temperature in °C
fn parse_flash_point(value: &str) -> Option<(String, f64)> {
    let caps = FLASH_POINT.captures(value)?;
    let prefix = caps.get(1).map_or("", |m| m.as_str());
    let number: f64 = caps.get(2)?.as_str().replace(',', ".").parse().ok()?;
    let celsius = match caps.get(3)?.as_str() {
        "F" | "f" => ((number - 32.0) * 5.0 / 9.0 * 10.0).round() / 10.0,
        _ => number,
    };
    Some((prefix.to_string(), celsius))
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

/// (year, month, day) from dd.mm.yyyy, dd/mm/yyyy, dd-mm-yyyy or yyyy-mm-dd
fn parse_date(value: &str) -> Option<(u32, u32, u32)> {
    let (y, m, d) = if let Some(c) = DATE_ISO.captures(value) {
        (c[1].parse().ok()?, c[2].parse().ok()?, c[3].parse().ok()?)
    } else {
        let c = DATE_DMY.captures(value)?;
        (c[3].parse().ok()?, c[2].parse().ok()?, c[1].parse().ok()?)
    };

    let leap = (y % 4 == 0 && y % 100 != 0) || y % 400 == 0;
    let days_in_month = match m {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if leap => 29,
        2 => 28,
        _ => return None,
    };

    (d >= 1 && d <= days_in_month).then_some((y, m, d))
}

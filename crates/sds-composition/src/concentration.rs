//! Concentration expressions: ranges, inequalities and bare percentages

use once_cell::sync::Lazy;
use regex::Regex;

static RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:>=?|≥)?\s*(\d{1,3}(?:[.,]\d+)?)\s*%?\s*(?:-|to)\s*(?:<=?|≤)?\s*(\d{1,3}(?:[.,]\d+)?)\s*%",
    )
    .unwrap()
});

static INEQUALITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(<=|>=|≤|≥|<|>)\s*(\d{1,3}(?:[.,]\d+)?)\s*%").unwrap());

static BARE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{1,3}(?:[.,]\d+)?)\s*%").unwrap());

/// How a concentration was expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcentrationKind {
    /// "60-70%"
    Range,
    /// "≥90%" or "<5%"
    Inequality,
    /// "30%"
    Bare,
}

/// A parsed concentration in percent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Concentration {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
    /// Expression kind
    pub kind: ConcentrationKind,
}

fn number(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse::<f64>().ok()
}

fn in_percent_range(v: f64) -> bool {
    (0.0..=100.0).contains(&v)
}

/// Find a concentration in text, preferring a range over an inequality
/// over a bare percentage
pub fn find_concentration(text: &str) -> Option<Concentration> {
    find_range(text)
        .or_else(|| find_inequality(text))
        .or_else(|| find_bare(text))
}

fn find_range(text: &str) -> Option<Concentration> {
    RANGE.captures_iter(text).find_map(|caps| {
        let min = number(caps.get(1)?.as_str())?;
        let max = number(caps.get(2)?.as_str())?;
        (min <= max && in_percent_range(min) && in_percent_range(max)).then_some(Concentration {
            min,
            max,
            kind: ConcentrationKind::Range,
        })
    })
}

fn find_inequality(text: &str) -> Option<Concentration> {
    INEQUALITY.captures_iter(text).find_map(|caps| {
        let op = caps.get(1)?.as_str();
        let value = number(caps.get(2)?.as_str())?;
        if !in_percent_range(value) {
            return None;
        }
        let (min, max) = match op {
            ">" | ">=" | "≥" => (value, 100.0),
            _ => (0.0, value),
        };
        Some(Concentration {
            min,
            max,
            kind: ConcentrationKind::Inequality,
        })
    })
}

fn find_bare(text: &str) -> Option<Concentration> {
    BARE.captures_iter(text).find_map(|caps| {
        let value = number(caps.get(1)?.as_str())?;
        in_percent_range(value).then_some(Concentration {
            min: value,
            max: value,
            kind: ConcentrationKind::Bare,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range() {
        let c = find_concentration(" 60-70%").unwrap();
        assert_eq!((c.min, c.max, c.kind), (60.0, 70.0, ConcentrationKind::Range));

        let c = find_concentration("10 to 20 %").unwrap();
        assert_eq!((c.min, c.max), (10.0, 20.0));

        let c = find_concentration("≥10 - <20%").unwrap();
        assert_eq!((c.min, c.max), (10.0, 20.0));
    }

    #[test]
    fn test_decimal_comma() {
        let c = find_concentration("0,5 - 1,5 %").unwrap();
        assert_eq!((c.min, c.max), (0.5, 1.5));
    }

    #[test]
    fn test_inequality() {
        let c = find_concentration("≥90%").unwrap();
        assert_eq!((c.min, c.max, c.kind), (90.0, 100.0, ConcentrationKind::Inequality));

        let c = find_concentration("< 5 %").unwrap();
        assert_eq!((c.min, c.max), (0.0, 5.0));
    }

    #[test]
    fn test_bare() {
        let c = find_concentration("Water 30%").unwrap();
        assert_eq!((c.min, c.max, c.kind), (30.0, 30.0, ConcentrationKind::Bare));
    }

    #[test]
    fn test_range_preferred_over_bare() {
        let c = find_concentration("approx. 5% (range 3-7%)").unwrap();
        assert_eq!(c.kind, ConcentrationKind::Range);
        assert_eq!((c.min, c.max), (3.0, 7.0));
    }

    #[test]
    fn test_inverted_range_skipped() {
        let c = find_concentration("70-60%").unwrap();
        assert_eq!(c.kind, ConcentrationKind::Bare);
    }

    #[test]
    fn test_nothing_found() {
        assert!(find_concentration("no numbers here").is_none());
        assert!(find_concentration("250%").is_none());
    }
}

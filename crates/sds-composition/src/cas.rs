//! CAS token scanning with OCR repair

use once_cell::sync::Lazy;
use regex::Regex;
use sds_domain::CasNumber;

/// CAS-shaped token; digit positions also admit the usual OCR confusions
static CAS_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9SOlI]{2,7}-[0-9SOlI]{2}-[0-9SOlI]").unwrap());

/// Letters tolerated inside one token before it is treated as prose
const MAX_REPAIRED_CHARS: usize = 2;

/// A checksum-valid CAS number found in a line
#[derive(Debug, Clone, PartialEq)]
pub struct CasMatch {
    /// Validated number
    pub cas: CasNumber,
    /// Byte offset of the token start in the scanned text
    pub start: usize,
    /// Byte offset just past the token
    pub end: usize,
    /// Whether OCR repair changed any character
    pub repaired: bool,
}

/// Map OCR look-alikes to digits
fn repair_char(c: char) -> char {
    match c {
        'S' => '5',
        'O' => '0',
        'l' | 'I' => '1',
        other => other,
    }
}

/// Whether the token is delimited on both sides
fn is_delimited(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    let blocks = |c: Option<char>| matches!(c, Some(ch) if ch.is_alphanumeric() || ch == '-');
    !blocks(before) && !blocks(after)
}

/// Find every checksum-valid CAS number in the text
///
/// Tokens that fail the checksum after OCR repair are skipped.
pub fn find_cas_numbers(text: &str) -> Vec<CasMatch> {
    let mut found = Vec::new();

    for m in CAS_TOKEN.find_iter(text) {
        if !is_delimited(text, m.start(), m.end()) {
            continue;
        }

        let raw = m.as_str();
        let letters = raw.chars().filter(|c| c.is_ascii_alphabetic()).count();
        if letters > MAX_REPAIRED_CHARS {
            continue;
        }

        let repaired: String = raw.chars().map(repair_char).collect();
        if let Ok(cas) = CasNumber::parse(&repaired) {
            found.push(CasMatch {
                cas,
                start: m.start(),
                end: m.end(),
                repaired: letters > 0,
            });
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_valid_numbers() {
        let found = find_cas_numbers("Ethanol 64-17-5 and Water 7732-18-5");
        let values: Vec<&str> = found.iter().map(|m| m.cas.as_str()).collect();
        assert_eq!(values, vec!["64-17-5", "7732-18-5"]);
    }

    #[test]
    fn test_rejects_bad_check_digit() {
        assert!(find_cas_numbers("Ethanol 64-17-6").is_empty());
    }

    #[test]
    fn test_repairs_ocr_last_digit() {
        let found = find_cas_numbers("Ethanol 64-17-S 60%");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].cas.as_str(), "64-17-5");
        assert!(found[0].repaired);
    }

    #[test]
    fn test_repairs_interior_confusions() {
        let found = find_cas_numbers("Acetone 67-64-l");
        assert_eq!(found[0].cas.as_str(), "67-64-1");

        let found = find_cas_numbers("Formaldehyde 5O-00-0");
        assert_eq!(found[0].cas.as_str(), "50-00-0");
    }

    #[test]
    fn test_requires_delimiters() {
        assert!(find_cas_numbers("X64-17-5").is_empty());
        assert!(find_cas_numbers("64-17-5-1").is_empty());
        assert_eq!(find_cas_numbers("(64-17-5)").len(), 1);
    }

    #[test]
    fn test_offsets_point_at_token() {
        let text = "Ethanol 64-17-5";
        let found = find_cas_numbers(text);
        assert_eq!(&text[found[0].start..found[0].end], "64-17-5");
    }
}

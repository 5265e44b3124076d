//! Ingredient parser for composition sections
//!
//! Every returned [`Ingredient`] with a CAS number has passed the registry
//! checksum. Names and concentrations are located around each CAS token on
//! the same line; rows without a CAS number are accepted only from a real
//! section 3 and at reduced confidence.

use crate::cas::{find_cas_numbers, CasMatch};
use crate::concentration::find_concentration;
use once_cell::sync::Lazy;
use regex::Regex;
use sds_domain::Ingredient;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument};

/// Section number holding the composition table
pub const COMPOSITION_SECTION: u32 = 3;

static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

static CAS_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bcas\b").unwrap());

/// Column labels that sit between a name and its numbers
const MARKER_WORDS: &[&str] = &[
    "cas",
    "no",
    "nr",
    "number",
    "ec",
    "index",
    "reach",
    "registration",
    "wt",
    "weight",
    "w/w",
    "concentration",
    "content",
];

/// Parser tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Characters searched on each side of a CAS token for a name
    pub name_window_chars: usize,

    /// Maximum words in a chemical name
    pub max_name_words: usize,

    /// Lines longer than this are split on runs of whitespace
    pub long_line_chars: usize,

    /// Starting confidence for a CAS-anchored row
    pub base_confidence: f64,

    /// Bonus when the line carries a "CAS" label
    pub marker_bonus: f64,

    /// Bonus when a name was found
    pub name_bonus: f64,

    /// Bonus when a concentration was found
    pub concentration_bonus: f64,

    /// Confidence of a name-and-percentage row without a CAS number
    pub nameless_confidence: f64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            name_window_chars: 80,
            max_name_words: 6,
            long_line_chars: 400,
            base_confidence: 0.60,
            marker_bonus: 0.10,
            name_bonus: 0.15,
            concentration_bonus: 0.10,
            nameless_confidence: 0.50,
        }
    }
}

/// Replace typographic dashes with ASCII hyphen-minus
pub fn normalize_dashes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2212}' => '-',
            other => other,
        })
        .collect()
}

/// Extracts ingredient rows from SDS text
#[derive(Debug, Clone, Default)]
pub struct IngredientParser {
    config: ParserConfig,
}

impl IngredientParser {
    /// Create a parser with the given tuning
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parser tuning in use
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse ingredients from the composition section, or the whole text
    ///
    /// When section 3 yields nothing the full text is scanned instead.
    /// Results keep first-appearance order; a duplicate replaces the earlier
    /// row only when its confidence is higher.
    #[instrument(skip(self, text, sections), fields(text_len = text.len()))]
    pub fn extract(&self, text: &str, sections: &BTreeMap<u32, String>) -> Vec<Ingredient> {
        let ingredients = match sections.get(&COMPOSITION_SECTION) {
            Some(section) => {
                let found = self.parse_block(&normalize_dashes(section), true);
                if found.is_empty() {
                    debug!("Composition section yielded nothing, scanning full text");
                    self.parse_block(&normalize_dashes(text), false)
                } else {
                    found
                }
            }
            None => self.parse_block(&normalize_dashes(text), false),
        };

        debug!(count = ingredients.len(), "Parsed ingredients");
        ingredients
    }

    fn parse_block(&self, block: &str, allow_nameless: bool) -> Vec<Ingredient> {
        let mut ingredients: Vec<Ingredient> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for line in block.lines() {
            for piece in self.split_line(line) {
                for ingredient in self.parse_line(piece, allow_nameless) {
                    let key = match (&ingredient.cas_number, ingredient.name_key()) {
                        (Some(cas), _) => format!("cas:{cas}"),
                        (None, Some(name)) => format!("name:{name}"),
                        (None, None) => continue,
                    };
                    match positions.get(&key) {
                        Some(&idx) if ingredients[idx].confidence() < ingredient.confidence() => {
                            ingredients[idx] = ingredient;
                        }
                        Some(_) => {}
                        None => {
                            positions.insert(key, ingredients.len());
                            ingredients.push(ingredient);
                        }
                    }
                }
            }
        }

        ingredients
    }

    fn split_line<'a>(&self, line: &'a str) -> Vec<&'a str> {
        if line.chars().count() > self.config.long_line_chars {
            MULTI_SPACE.split(line).filter(|p| !p.trim().is_empty()).collect()
        } else {
            vec![line]
        }
    }

    fn parse_line(&self, line: &str, allow_nameless: bool) -> Vec<Ingredient> {
        let matches = find_cas_numbers(line);

        if matches.is_empty() {
            if allow_nameless {
                return self.parse_nameless(line).into_iter().collect();
            }
            return Vec::new();
        }

        let has_marker = CAS_MARKER.is_match(line);
        let evidence = line.trim();

        matches
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let segment_end = matches.get(i + 1).map_or(line.len(), |next| next.start);
                self.build(line, m, segment_end, has_marker, evidence)
            })
            .collect()
    }

    fn build(
        &self,
        line: &str,
        m: &CasMatch,
        segment_end: usize,
        has_marker: bool,
        evidence: &str,
    ) -> Ingredient {
        let name = self
            .name_before(line, m.start)
            .or_else(|| self.name_after(&line[m.end..segment_end]));

        let concentration =
            find_concentration(&line[m.end..segment_end]).or_else(|| find_concentration(line));

        let mut confidence = self.config.base_confidence;
        if has_marker {
            confidence += self.config.marker_bonus;
        }
        if name.is_some() {
            confidence += self.config.name_bonus;
        }
        if concentration.is_some() {
            confidence += self.config.concentration_bonus;
        }

        let ingredient = Ingredient::new(Some(m.cas.clone()), name, confidence.min(0.99), evidence);
        match concentration {
            Some(c) => ingredient.with_concentration(Some(c.min), Some(c.max)),
            None => ingredient,
        }
    }

    /// Name-and-percentage row with no CAS number
    fn parse_nameless(&self, line: &str) -> Option<Ingredient> {
        let concentration = find_concentration(line)?;
        let name = self.collect_name(line.split_whitespace())?;

        Some(
            Ingredient::new(None, Some(name), self.config.nameless_confidence, line.trim())
                .with_concentration(Some(concentration.min), Some(concentration.max)),
        )
    }

    fn name_before(&self, line: &str, start: usize) -> Option<String> {
        let window = tail_chars(&line[..start], self.config.name_window_chars);
        let mut words: Vec<&str> = Vec::new();

        for raw in window.split_whitespace().rev() {
            if raw.contains('%') {
                break;
            }
            let word = clean_token(raw);
            let skippable = word.is_empty() || is_marker(word) || !has_letter(word);
            if skippable {
                if words.is_empty() {
                    continue;
                }
                break;
            }
            words.push(word);
            if words.len() >= self.config.max_name_words {
                break;
            }
        }

        words.reverse();
        join_name(&words)
    }

    fn name_after(&self, segment: &str) -> Option<String> {
        let window = head_chars(segment, self.config.name_window_chars);
        self.collect_name(window.split_whitespace())
    }

    /// Collect leading name words, skipping labels until the first word
    fn collect_name<'a>(&self, tokens: impl Iterator<Item = &'a str>) -> Option<String> {
        let mut words: Vec<&str> = Vec::new();

        for raw in tokens {
            if raw.contains('%') {
                break;
            }
            let word = clean_token(raw);
            if word.is_empty() || is_marker(word) {
                if words.is_empty() {
                    continue;
                }
                break;
            }
            if !has_letter(word) {
                break;
            }
            words.push(word);
            if words.len() >= self.config.max_name_words {
                break;
            }
        }

        join_name(&words)
    }
}

fn clean_token(raw: &str) -> &str {
    raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '/' && c != '(' && c != ')')
        .trim_matches(|c: char| c == '(' || c == ')' || c == '/')
}

fn is_marker(word: &str) -> bool {
    let lower = word.to_lowercase();
    MARKER_WORDS.contains(&lower.as_str())
}

fn has_letter(word: &str) -> bool {
    word.chars().any(char::is_alphabetic)
}

fn join_name(words: &[&str]) -> Option<String> {
    let name = words.join(" ");
    (name.chars().filter(|c| c.is_alphabetic()).count() >= 3).then_some(name)
}

fn tail_chars(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

fn head_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn no_sections() -> BTreeMap<u32, String> {
        BTreeMap::new()
    }

    #[test]
    fn test_name_cas_range() {
        let parser = IngredientParser::default();
        let found = parser.extract("Ethanol 64-17-5 60-70%", &no_sections());

        assert_eq!(found.len(), 1);
        let ethanol = &found[0];
        assert_eq!(ethanol.cas_number.as_ref().unwrap().as_str(), "64-17-5");
        assert_eq!(ethanol.chemical_name.as_deref(), Some("Ethanol"));
        assert_eq!(ethanol.concentration_min, Some(60.0));
        assert_eq!(ethanol.concentration_max, Some(70.0));
        assert!(ethanol.confidence() >= 0.60);
    }

    #[test]
    fn test_bad_check_digit_rejected() {
        let parser = IngredientParser::default();
        assert!(parser.extract("Ethanol 64-17-6 60-70%", &no_sections()).is_empty());
    }

    #[test]
    fn test_marker_words_skipped() {
        let parser = IngredientParser::default();
        let found = parser.extract("Sodium hydroxide CAS No. 1310-73-2 <5%", &no_sections());

        assert_eq!(found[0].chemical_name.as_deref(), Some("Sodium hydroxide"));
        assert_eq!(found[0].concentration_min, Some(0.0));
        assert_eq!(found[0].concentration_max, Some(5.0));
        // marker + name + concentration
        assert!((found[0].confidence() - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_name_after_token() {
        let parser = IngredientParser::default();
        let found = parser.extract("64-17-5 Ethanol 30%", &no_sections());
        assert_eq!(found[0].chemical_name.as_deref(), Some("Ethanol"));
        assert_eq!(found[0].concentration_max, Some(30.0));
    }

    #[test]
    fn test_multiple_tokens_on_one_line() {
        let parser = IngredientParser::default();
        let found = parser.extract("Ethanol 64-17-5 60-70% Water 7732-18-5 30%", &no_sections());

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].concentration_max, Some(70.0));
        assert_eq!(found[1].chemical_name.as_deref(), Some("Water"));
        assert_eq!(found[1].concentration_max, Some(30.0));
    }

    #[test]
    fn test_duplicates_keep_highest_confidence() {
        let parser = IngredientParser::default();
        let text = "64-17-5\nWater 7732-18-5 30%\nEthanol CAS 64-17-5 60-70%";
        let found = parser.extract(text, &no_sections());

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].cas_number.as_ref().unwrap().as_str(), "64-17-5");
        assert_eq!(found[0].chemical_name.as_deref(), Some("Ethanol"));
        assert_eq!(found[0].concentration_max, Some(70.0));
    }

    #[test]
    fn test_equal_confidence_keeps_first() {
        let parser = IngredientParser::default();
        let text = "Ethanol 64-17-5 60-70%\nEthanol 64-17-5 10%";
        let found = parser.extract(text, &no_sections());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].concentration_max, Some(70.0));
    }

    #[test]
    fn test_typographic_dashes() {
        let parser = IngredientParser::default();
        let found = parser.extract("Ethanol 64\u{2013}17\u{2013}5 60\u{2013}70%", &no_sections());
        assert_eq!(found[0].cas_number.as_ref().unwrap().as_str(), "64-17-5");
        assert_eq!(found[0].concentration_min, Some(60.0));
    }

    #[test]
    fn test_section_preferred_over_full_text() {
        let parser = IngredientParser::default();
        let mut sections = BTreeMap::new();
        sections.insert(3, "Acetone 67-64-1 10-20%".to_string());

        let text = "Ethanol 64-17-5 60-70%\nAcetone 67-64-1 10-20%";
        let found = parser.extract(text, &sections);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].chemical_name.as_deref(), Some("Acetone"));
    }

    #[test]
    fn test_empty_section_falls_back() {
        let parser = IngredientParser::default();
        let mut sections = BTreeMap::new();
        sections.insert(3, "Composition: see below".to_string());

        let found = parser.extract("Ethanol 64-17-5 60-70%", &sections);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_nameless_rows_only_in_section() {
        let parser = IngredientParser::default();
        let mut sections = BTreeMap::new();
        sections.insert(3, "Ethanol 64-17-5 60-70%\nWater 30%".to_string());

        let found = parser.extract("", &sections);
        assert_eq!(found.len(), 2);
        assert!(found[1].cas_number.is_none());
        assert_eq!(found[1].chemical_name.as_deref(), Some("Water"));
        assert_eq!(found[1].confidence(), 0.50);

        let found = parser.extract("Ethanol 64-17-5 60-70%\nWater 30%", &no_sections());
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_long_lines_split() {
        let parser = IngredientParser::default();
        let padding = "x".repeat(420);
        let text = format!("{padding}  Ethanol 64-17-5 60-70%");
        let found = parser.extract(&text, &no_sections());
        assert_eq!(found[0].chemical_name.as_deref(), Some("Ethanol"));
    }

    proptest! {
        #[test]
        fn prop_results_are_valid(text in "[A-Za-z0-9 %\\-\\n.,<>]{0,200}") {
            let parser = IngredientParser::default();
            for ingredient in parser.extract(&text, &BTreeMap::new()) {
                let cas = ingredient.cas_number.as_ref().unwrap();
                prop_assert!(sds_domain::cas_checksum_valid(cas.as_str()));
                prop_assert!((0.0..=1.0).contains(&ingredient.confidence()));
                if let (Some(min), Some(max)) = (ingredient.concentration_min, ingredient.concentration_max) {
                    prop_assert!(min <= max);
                }
            }
        }

        #[test]
        fn prop_extraction_is_deterministic(text in "[A-Za-z0-9 %\\-\\n]{0,200}") {
            let parser = IngredientParser::default();
            let sections = BTreeMap::new();
            prop_assert_eq!(parser.extract(&text, &sections), parser.extract(&text, &sections));
        }
    }
}

//! Hazard rule engine
//!
//! Derives the hazard codes a mixture should carry from its ingredients and
//! compares them against the declared codes. Rules always use the maximum
//! declared concentration of an ingredient.

use crate::error::CompositionError;
use once_cell::sync::Lazy;
use regex::Regex;
use sds_domain::{CalculatedHazard, ConsistencyReport, ConsistencyStatus, Ingredient};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, instrument};

static DECLARED_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,;+\s]+").unwrap());

static HAZARD_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:EU)?H\d{3}[A-Za-z]{0,2}$").unwrap());

/// One concentration threshold rule for a hazard code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardRule {
    /// Lower-case name fragments; any one matching is enough
    pub keywords: Vec<String>,

    /// Minimum maximum-concentration in percent
    pub threshold: f64,

    /// Hazard category, e.g. "1A"
    pub category: String,

    /// Only match a keyword where it starts a word
    #[serde(default)]
    pub word_start: bool,
}

impl HazardRule {
    fn new(keywords: &[&str], threshold: f64, category: &str) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            threshold,
            category: category.to_string(),
            word_start: false,
        }
    }

    /// First keyword contained in the lower-cased name
    fn matched_keyword(&self, name: &str) -> Option<&str> {
        self.keywords
            .iter()
            .filter(|k| !k.is_empty())
            .find(|k| {
                if self.word_start {
                    contains_at_word_start(name, k)
                } else {
                    name.contains(k.as_str())
                }
            })
            .map(String::as_str)
    }
}

/// Substring match that refuses to start inside a word
fn contains_at_word_start(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(idx, _)| {
        haystack[..idx]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphabetic())
    })
}

/// Hazard code → rules table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HazardRuleTable {
    /// Rules keyed by hazard code
    #[serde(default)]
    pub rules: BTreeMap<String, Vec<HazardRule>>,
}

impl HazardRuleTable {
    /// Load a table from TOML
    pub fn from_toml(s: &str) -> Result<Self, CompositionError> {
        let table: HazardRuleTable = toml::from_str(s)?;
        table.validate()?;
        Ok(table)
    }

    /// Check codes, keywords and thresholds
    pub fn validate(&self) -> Result<(), CompositionError> {
        for (code, rules) in &self.rules {
            if !HAZARD_CODE.is_match(code) {
                return Err(CompositionError::InvalidRule {
                    code: code.clone(),
                    reason: "not a hazard statement code".to_string(),
                });
            }
            for rule in rules {
                if rule.keywords.iter().all(|k| k.trim().is_empty()) {
                    return Err(CompositionError::InvalidRule {
                        code: code.clone(),
                        reason: "rule has no keywords".to_string(),
                    });
                }
                if !(0.0..=100.0).contains(&rule.threshold) {
                    return Err(CompositionError::InvalidRule {
                        code: code.clone(),
                        reason: format!("threshold {} outside 0-100%", rule.threshold),
                    });
                }
            }
        }
        Ok(())
    }

    /// Number of hazard codes covered
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the table has no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn add(&mut self, code: &str, rule: HazardRule) {
        self.rules.entry(code.to_string()).or_default().push(rule);
    }

    /// Built-in table of common mixture components
    pub fn builtin() -> Self {
        let mut t = HazardRuleTable::default();

        // Flammable liquids
        t.add("H225", HazardRule::new(&["ethanol", "ethyl alcohol"], 20.0, "2"));
        t.add("H225", HazardRule::new(&["methanol", "methyl alcohol"], 10.0, "2"));
        t.add("H225", HazardRule::new(&["acetone"], 10.0, "2"));
        t.add("H225", HazardRule::new(&["isopropanol", "propan-2-ol", "isopropyl alcohol"], 10.0, "2"));
        t.add("H225", HazardRule::new(&["toluene"], 10.0, "2"));
        t.add("H225", HazardRule::new(&["ethyl acetate"], 10.0, "2"));
        t.add("H226", HazardRule::new(&["xylene"], 10.0, "3"));

        // Acute toxicity and target organs
        t.add("H301", HazardRule::new(&["methanol", "methyl alcohol"], 10.0, "3"));
        t.add("H311", HazardRule::new(&["methanol", "methyl alcohol"], 10.0, "3"));
        t.add("H331", HazardRule::new(&["methanol", "methyl alcohol"], 10.0, "3"));
        t.add("H370", HazardRule::new(&["methanol", "methyl alcohol"], 10.0, "1"));
        t.add("H373", HazardRule::new(&["toluene"], 10.0, "2"));
        t.add("H304", HazardRule::new(&["toluene", "xylene"], 10.0, "1"));

        // Corrosion and irritation
        t.add("H314", HazardRule::new(&["sulfuric acid", "sulphuric acid"], 10.0, "1A"));
        t.add("H314", HazardRule::new(&["sodium hydroxide", "caustic soda"], 2.0, "1A"));
        t.add("H314", HazardRule::new(&["potassium hydroxide"], 2.0, "1A"));
        t.add("H314", HazardRule::new(&["hydrochloric acid"], 25.0, "1B"));
        t.add("H314", HazardRule::new(&["nitric acid"], 20.0, "1A"));
        t.add("H314", HazardRule::new(&["phosphoric acid"], 25.0, "1B"));
        t.add("H315", HazardRule::new(&["sulfuric acid", "sulphuric acid"], 5.0, "2"));
        t.add("H315", HazardRule::new(&["hydrochloric acid"], 10.0, "2"));
        t.add("H315", HazardRule::new(&["sodium hydroxide"], 0.5, "2"));
        t.add("H315", HazardRule::new(&["xylene", "toluene"], 10.0, "2"));
        t.add("H319", HazardRule::new(&["ethanol", "ethyl alcohol"], 50.0, "2"));
        t.add("H319", HazardRule::new(&["isopropanol", "propan-2-ol", "isopropyl alcohol"], 10.0, "2"));
        t.add("H319", HazardRule::new(&["acetone", "ethyl acetate"], 10.0, "2"));
        t.add("H336", HazardRule::new(&["acetone", "isopropanol", "toluene", "ethyl acetate"], 20.0, "3"));

        // Long-term effects
        t.add("H350", HazardRule::new(&["formaldehyde"], 0.1, "1B"));
        t.add("H350", HazardRule::new(&["benzene"], 0.1, "1A"));
        t.add("H340", HazardRule::new(&["benzene"], 0.1, "1B"));
        t.add("H361d", HazardRule::new(&["toluene"], 3.0, "2"));

        t
    }
}

static BUILTIN_RULES: Lazy<Arc<HazardRuleTable>> = Lazy::new(|| Arc::new(HazardRuleTable::builtin()));

/// Parse declared codes from a free-form list
///
/// Accepts comma, semicolon, whitespace and `+` separators. Codes are
/// upper-cased except for trailing category letters ("H361d").
pub fn parse_declared_codes(declared: &str) -> BTreeSet<String> {
    DECLARED_SPLIT
        .split(declared)
        .filter_map(|token| {
            let token = token.trim_matches(|c: char| !c.is_alphanumeric());
            normalize_code(token)
        })
        .collect()
}

fn normalize_code(token: &str) -> Option<String> {
    if token.len() < 4 {
        return None;
    }
    let upper = token.to_uppercase();
    let (prefix, rest) = if let Some(rest) = upper.strip_prefix("EUH") {
        ("EUH", rest)
    } else if let Some(rest) = upper.strip_prefix('H') {
        ("H", rest)
    } else {
        return None;
    };

    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    if digits.len() != 3 {
        return None;
    }
    let suffix = rest[digits.len()..].to_lowercase();
    if suffix.len() > 2 || !suffix.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some(format!("{prefix}{digits}{suffix}"))
}

/// Derives and compares composition hazards
#[derive(Debug, Clone)]
pub struct HazardRuleEngine {
    table: Arc<HazardRuleTable>,
}

impl Default for HazardRuleEngine {
    fn default() -> Self {
        Self {
            table: Arc::clone(&BUILTIN_RULES),
        }
    }
}

impl HazardRuleEngine {
    /// Engine over a custom rule table
    pub fn with_table(table: HazardRuleTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    /// Rule table in use
    pub fn table(&self) -> &HazardRuleTable {
        &self.table
    }

    /// Hazards implied by the ingredient list, sorted by code
    ///
    /// Ingredients without a name or an upper concentration bound
    /// contribute nothing.
    #[instrument(skip(self, ingredients), fields(ingredients = ingredients.len()))]
    pub fn calculate(&self, ingredients: &[Ingredient]) -> Vec<CalculatedHazard> {
        let mut hazards = Vec::new();

        for (code, rules) in &self.table.rules {
            let hit = rules.iter().find_map(|rule| {
                ingredients.iter().find_map(|ingredient| {
                    let name = ingredient.chemical_name.as_deref()?;
                    let max = ingredient.concentration_max?;
                    let lower = name.to_lowercase();
                    rule.matched_keyword(&lower)?;
                    (max >= rule.threshold).then(|| CalculatedHazard {
                        hazard_code: code.clone(),
                        category: rule.category.clone(),
                        basis: format!("{} at max {}% >= {}%", name.trim(), max, rule.threshold),
                    })
                })
            });

            if let Some(hazard) = hit {
                hazards.push(hazard);
            }
        }

        debug!(count = hazards.len(), "Calculated hazards");
        hazards
    }

    /// Compare calculated hazards against the declared code list
    pub fn compare(&self, calculated: &[CalculatedHazard], declared: &str) -> ConsistencyReport {
        let declared_codes = parse_declared_codes(declared);

        let missing_hazards: Vec<CalculatedHazard> = calculated
            .iter()
            .filter(|h| {
                normalize_code(&h.hazard_code)
                    .map_or(true, |code| !declared_codes.contains(&code))
            })
            .cloned()
            .collect();

        let status = if missing_hazards.is_empty() {
            ConsistencyStatus::Valid
        } else {
            ConsistencyStatus::Inconsistent
        };

        ConsistencyReport {
            status,
            missing_hazards,
            calculated_count: calculated.len(),
            declared_count: declared_codes.len(),
        }
    }

    /// Calculate and compare in one step
    pub fn check(&self, ingredients: &[Ingredient], declared: &str) -> ConsistencyReport {
        let calculated = self.calculate(ingredients);
        self.compare(&calculated, declared)
    }
}

//! Rule-based field extraction
//!
//! Every field has an ordered list of [`FieldRule`]s. Rules are tried in
//! order, first against the field's home SDS section and then against the
//! full text; the first capture that survives gatekeeper normalization and
//! structural validation wins.

use once_cell::sync::Lazy;
use regex::Regex;
use sds_domain::{fields, ExtractionSource, FieldExtraction};
use sds_gatekeeper::FieldValidator;
use std::collections::{BTreeMap, HashMap};

/// Base confidence of a rule anchored on a field label
pub const LABELLED_CONFIDENCE: f64 = 0.85;

/// Base confidence of a rule matching a bare value
pub const LOOSE_CONFIDENCE: f64 = 0.65;

/// Metadata key holding the rule quality of a pattern match
pub const PATTERN_QUALITY_KEY: &str = "pattern_quality";

/// Metadata key holding the text before normalization
pub const RAW_VALUE_KEY: &str = "raw_value";

/// One extraction rule
#[derive(Debug, Clone)]
pub struct FieldRule {
    /// Regex whose first group (or whole match) is the value
    pub regex: Regex,

    /// Rule quality in [0, 1]
    pub quality: f64,

    /// Whether the regex is anchored on a field label
    pub labelled: bool,

    /// Join every match in scope instead of taking the first
    pub collect_all: bool,
}

impl FieldRule {
    /// Compile a rule
    pub fn new(pattern: &str, quality: f64, labelled: bool) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            quality: quality.clamp(0.0, 1.0),
            labelled,
            collect_all: false,
        })
    }

    /// Join every match in scope
    pub fn collecting(mut self) -> Self {
        self.collect_all = true;
        self
    }

    /// Base confidence of a match of this rule
    pub fn base_confidence(&self) -> f64 {
        let base = if self.labelled { LABELLED_CONFIDENCE } else { LOOSE_CONFIDENCE };
        base * self.quality
    }

    /// Raw candidates in scope with their byte span
    fn candidates(&self, scope: &str) -> Vec<(String, usize, usize)> {
        let found = self.regex.captures_iter(scope).filter_map(|caps| {
            let whole = caps.get(0)?;
            let value = caps.get(1).unwrap_or(whole);
            Some((value.as_str().trim().to_string(), whole.start(), whole.end()))
        });

        if !self.collect_all {
            return found.filter(|(v, _, _)| !v.is_empty()).collect();
        }

        let all: Vec<_> = found.collect();
        match (all.first(), all.last()) {
            (Some(first), Some(last)) => {
                let joined = all.iter().map(|(v, _, _)| v.as_str()).collect::<Vec<_>>().join(", ");
                vec![(joined, first.1, last.2)]
            }
            _ => Vec::new(),
        }
    }
}

fn rule(pattern: &str, quality: f64, labelled: bool) -> FieldRule {
    // Built-in patterns are constants; a failure here is a programming error
    FieldRule::new(pattern, quality, labelled).unwrap()
}

static GENERIC_RULES: Lazy<HashMap<&'static str, Vec<FieldRule>>> = Lazy::new(|| {
    let mut rules = HashMap::new();
    rules.insert(
        fields::PRODUCT_NAME,
        vec![
            rule(
                r"(?im)^[ \t]*(?:product\s+name|trade\s+name|product\s+identifier)[ \t]*[:\-]?[ \t]*(\S.*?)[ \t]*$",
                1.0,
                true,
            ),
            rule(r"(?im)^[ \t]*(?:name|product)[ \t]*:[ \t]*(\S.*?)[ \t]*$", 0.7, false),
        ],
    );
    rules.insert(
        fields::MANUFACTURER,
        vec![
            rule(
                r"(?im)^[ \t]*(?:manufacturer|supplier|company(?:\s+name)?|distributor)[ \t]*[:\-]?[ \t]*(\S.*?)[ \t]*$",
                1.0,
                true,
            ),
        ],
    );
    rules.insert(
        fields::CAS_NUMBER,
        vec![
            rule(r"(?i)\bCAS(?:[\s-]*(?:No\.?|Number|Nr\.?|RN))?\s*[:.#]?\s*(\d{2,7}-\d{2}-\d)\b", 1.0, true),
            rule(r"\b(\d{2,7}-\d{2}-\d)\b", 0.75, false),
        ],
    );
    rules.insert(
        fields::UN_NUMBER,
        vec![
            rule(r"(?i)\bUN[\s-]*(?:No\.?|Number)\s*[:.]?\s*(?:UN\s*)?(\d{4})\b", 1.0, true),
            rule(r"\bUN\s?(\d{4})\b", 0.8, false),
        ],
    );
    rules.insert(
        fields::TRANSPORT_CLASS,
        vec![
            rule(
                r"(?i)\b(?:transport\s+hazard\s+class(?:\(es\))?|hazard\s+class|class)\s*[:.]?\s*(\d(?:\.\d)?)\b",
                1.0,
                true,
            ),
            rule(r"(?i)\b(?:ADR|RID|IMDG|IATA)(?:/[A-Z]+)*\s*[:.]?\s*(\d(?:\.\d)?)\b", 0.7, false),
        ],
    );
    rules.insert(
        fields::PACKING_GROUP,
        vec![
            rule(r"(?i)\bpack(?:ing|aging)\s+group\s*[:.]?\s*(III|II|I|[123])\b", 1.0, true),
            rule(r"\bPG\s*[:.]?\s*(III|II|I)\b", 0.8, false),
        ],
    );
    rules.insert(
        fields::H_STATEMENTS,
        vec![rule(r"\b(?:EUH|H)[234]\d{2}[a-zA-Z]{0,2}\b", 0.9, false).collecting()],
    );
    rules.insert(
        fields::SIGNAL_WORD,
        vec![
            rule(r"(?i)\bsignal\s+word\s*[:.]?\s*(danger|warning)\b", 1.0, true),
            rule(r"\b(DANGER|Danger|WARNING|Warning)\b", 0.6, false),
        ],
    );
    rules.insert(
        fields::FLASH_POINT,
        vec![rule(
            r"(?i)\bflash\s*point\s*(?:\([^)]*\))?\s*[:.]?\s*((?:[<>]=?|≤|≥)?\s*-?\d{1,3}(?:[.,]\d+)?\s*°?\s*[CF])\b",
            1.0,
            true,
        )],
    );
    rules.insert(
        fields::EMERGENCY_PHONE,
        vec![
            rule(
                r"(?i)\bemergency(?:\s+(?:tele)?phone(?:\s+number)?|\s+contact|\s+number)?\s*[:.]?\s*(\+?[\d(][\d \t()/.-]{5,}\d)",
                1.0,
                true,
            ),
            rule(r"(?i)\b(?:tel(?:ephone)?|phone)\.?\s*[:.]?\s*(\+?[\d(][\d \t()/.-]{5,}\d)", 0.7, false),
        ],
    );
    rules.insert(
        fields::REVISION_DATE,
        vec![
            rule(
                r"(?i)\b(?:revision\s+date|date\s+of\s+(?:issue|revision)|revised(?:\s+on)?|issue\s+date)\s*[:.]?\s*(\d{1,2}[./-]\d{1,2}[./-]\d{4}|\d{4}-\d{1,2}-\d{1,2})",
                1.0,
                true,
            ),
            rule(r"\b(\d{4}-\d{2}-\d{2})\b", 0.6, false),
        ],
    );
    rules
});

/// Generic rules for a field (empty for unknown fields)
pub fn generic_rules(field: &str) -> &'static [FieldRule] {
    GENERIC_RULES.get(field).map(Vec::as_slice).unwrap_or(&[])
}

/// A field value found by a rule
#[derive(Debug, Clone, PartialEq)]
pub struct PatternMatch {
    /// Field name
    pub field: String,

    /// Canonical value
    pub value: String,

    /// Text as matched
    pub raw: String,

    /// Confidence before scoring
    pub base_confidence: f64,

    /// Quality of the rule that matched
    pub pattern_quality: f64,

    /// Surrounding text
    pub context: String,
}

impl PatternMatch {
    /// Convert into a pending pattern extraction
    pub fn into_extraction(self) -> FieldExtraction {
        let mut extraction = FieldExtraction::new(
            self.field,
            self.value,
            self.base_confidence,
            ExtractionSource::Pattern,
            self.context,
        );
        extraction
            .metadata
            .insert(PATTERN_QUALITY_KEY.to_string(), self.pattern_quality.to_string());
        extraction.metadata.insert(RAW_VALUE_KEY.to_string(), self.raw);
        extraction
    }
}

/// Runs field rules over document text
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    validator: FieldValidator,
    context_chars: usize,
}

impl PatternExtractor {
    /// Create an extractor validating through `validator`
    pub fn new(validator: FieldValidator, context_chars: usize) -> Self {
        Self {
            validator,
            context_chars,
        }
    }

    /// Extract one field with the given rules, in order
    pub fn extract_field(
        &self,
        field: &str,
        text: &str,
        sections: &BTreeMap<u32, String>,
        rules: &[&FieldRule],
    ) -> Option<PatternMatch> {
        let home = fields::home_section(field)
            .and_then(|n| sections.get(&n))
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty());

        let scopes: Vec<&str> = home.into_iter().chain(std::iter::once(text)).collect();

        for rule in rules {
            for scope in &scopes {
                for (raw, start, end) in rule.candidates(scope) {
                    if !self.validator.is_structurally_valid(field, &raw) {
                        continue;
                    }
                    let value = self.validator.normalize(field, &raw).unwrap_or_else(|| raw.clone());
                    return Some(PatternMatch {
                        field: field.to_string(),
                        value,
                        raw,
                        base_confidence: rule.base_confidence(),
                        pattern_quality: rule.quality,
                        context: context_window(scope, start, end, self.context_chars),
                    });
                }
            }
        }
        None
    }
}

/// Text around a byte span, widened by `chars` characters on each side
pub fn context_window(text: &str, start: usize, end: usize, chars: usize) -> String {
    let from = text[..start]
        .char_indices()
        .rev()
        .nth(chars.saturating_sub(1))
        .map_or(0, |(i, _)| i);
    let to = text[end..]
        .char_indices()
        .nth(chars)
        .map_or(text.len(), |(i, _)| end + i);
    text[from..to].split_whitespace().collect::<Vec<_>>().join(" ")
}

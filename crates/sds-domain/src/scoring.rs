//! Confidence scoring
//!
//! Fuses the heterogeneous evidence behind one field value into a single
//! normalized score:
//!
//! 1. Start from the extractor's base confidence
//! 2. Add source reliability (`weight * 0.15`)
//! 3. Apply validation and cross-validation boosts against the remaining
//!    uncertainty (`boost * (1 - score)`)
//! 4. Scale by the mean of pattern quality and context evidence
//! 5. Clamp to [0, 1]

use crate::extraction::{clamp_confidence, ExtractionSource, FieldExtraction};
use crate::fields;
use crate::quality::QualityTier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Multiplier applied to the source weight (default: 0.15)
pub const SOURCE_WEIGHT_FACTOR: f64 = 0.15;

/// Threshold for ordinary fields (default: 0.70)
pub const DEFAULT_FIELD_THRESHOLD: f64 = 0.70;

/// Threshold for registry-style identifiers (default: 0.80)
pub const IDENTIFIER_FIELD_THRESHOLD: f64 = 0.80;

/// Reliability weight of an extraction source
pub fn source_weight(source: ExtractionSource) -> f64 {
    match source {
        ExtractionSource::Pattern => 1.0,
        ExtractionSource::Oracle => 0.85,
        ExtractionSource::DomainCompletion => 0.70,
        ExtractionSource::ExternalApi => 0.90,
        ExtractionSource::Normalized | ExtractionSource::CrossValidated => 0.95,
    }
}

/// Configuration for confidence scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Multiplier for the source weight
    pub source_weight_factor: f64,
    /// Threshold for ordinary fields
    pub default_threshold: f64,
    /// Threshold for `cas_number` and `un_number`
    pub identifier_threshold: f64,
    /// Boost granted when a value is corroborated by another field
    pub cross_validation_boost: f64,
    /// Context score when no indicators are supplied
    pub no_context_score: f64,
    /// Context score for fields outside the schema
    pub unknown_field_context_score: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            source_weight_factor: SOURCE_WEIGHT_FACTOR,
            default_threshold: DEFAULT_FIELD_THRESHOLD,
            identifier_threshold: IDENTIFIER_FIELD_THRESHOLD,
            cross_validation_boost: 0.20,
            no_context_score: 0.70,
            unknown_field_context_score: 0.75,
        }
    }
}

/// Everything known about one value at scoring time
#[derive(Debug, Clone)]
pub struct ScoreRequest<'a> {
    /// Field name
    pub field: &'a str,
    /// Candidate value
    pub value: &'a str,
    /// Source of the value
    pub source: ExtractionSource,
    /// Confidence reported by the extractor
    pub base_confidence: f64,
    /// Boost from external validation, if any was performed
    pub validation_boost: Option<f64>,
    /// Whether an independent field corroborated the value
    pub cross_validated: bool,
    /// Quality of the rule that produced the value, in [0, 1]
    pub pattern_quality: f64,
    /// Text fragments surrounding the value
    pub context_indicators: &'a [String],
}

/// Result of scoring one value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreOutcome {
    /// Final confidence in [0, 1]
    pub confidence: f64,
    /// Tier relative to the field threshold
    pub quality_tier: QualityTier,
    /// Whether the confidence meets the field threshold
    pub passes_threshold: bool,
    /// Intermediate values, keyed by step name
    pub factors: BTreeMap<String, f64>,
}

/// Aggregate confidence over all fields of one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentConfidence {
    /// Arithmetic mean of field confidences
    pub overall_confidence: f64,
    /// Document tier
    pub quality_tier: QualityTier,
    /// Fields whose confidence meets their threshold
    pub fields_above_threshold: usize,
    /// Fields included in the mean
    pub total_fields: usize,
    /// Whether every critical field is present and passing
    pub critical_fields_ok: bool,
    /// Fraction of required fields that carry a value
    pub completeness: f64,
}

impl DocumentConfidence {
    /// Confidence of a document with no extractions
    pub fn empty() -> Self {
        Self {
            overall_confidence: 0.0,
            quality_tier: QualityTier::Unreliable,
            fields_above_threshold: 0,
            total_fields: 0,
            critical_fields_ok: false,
            completeness: 0.0,
        }
    }
}

/// Deterministic confidence scorer
#[derive(Debug, Clone, Default)]
pub struct ConfidenceScorer {
    config: ScoringConfig,
}

impl ConfidenceScorer {
    /// Create a scorer with the given configuration
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Threshold that a field's confidence must meet
    pub fn threshold_for(&self, field: &str) -> f64 {
        match field {
            fields::CAS_NUMBER | fields::UN_NUMBER => self.config.identifier_threshold,
            _ => self.config.default_threshold,
        }
    }

    /// Score one value
    ///
    /// # Examples
    ///
    /// ```
    /// use sds_domain::scoring::{ConfidenceScorer, ScoreRequest};
    /// use sds_domain::ExtractionSource;
    ///
    /// let scorer = ConfidenceScorer::default();
    /// let outcome = scorer.score(&ScoreRequest {
    ///     field: "signal_word",
    ///     value: "Danger",
    ///     source: ExtractionSource::Pattern,
    ///     base_confidence: 0.70,
    ///     validation_boost: None,
    ///     cross_validated: false,
    ///     pattern_quality: 0.8,
    ///     context_indicators: &[],
    /// });
    /// assert!((outcome.confidence - 0.6375).abs() < 1e-9);
    /// ```
    pub fn score(&self, request: &ScoreRequest<'_>) -> ScoreOutcome {
        let mut factors = BTreeMap::new();

        // Step 1: base confidence
        let base = clamp_confidence(request.base_confidence);
        factors.insert("base_confidence".to_string(), base);

        // Step 2: source reliability; capped so the boost term stays non-negative
        let weight = source_weight(request.source);
        factors.insert("source_weight".to_string(), weight);
        let mut score = (base + weight * self.config.source_weight_factor).min(1.0);

        // Step 3: boosts with diminishing returns
        let validation_boost = request.validation_boost.unwrap_or(0.0).max(0.0);
        let cross_boost = if request.cross_validated {
            self.config.cross_validation_boost
        } else {
            0.0
        };
        let total_boost = (validation_boost + cross_boost).min(1.0);
        factors.insert("validation_boost".to_string(), validation_boost);
        factors.insert("cross_validation_boost".to_string(), cross_boost);
        score += total_boost * (1.0 - score);

        // Step 4: evidence quality
        let pattern_quality = clamp_confidence(request.pattern_quality);
        let context_score = self.context_score(request.field, request.context_indicators);
        factors.insert("pattern_quality".to_string(), pattern_quality);
        factors.insert("context_score".to_string(), context_score);
        score *= (pattern_quality + context_score) / 2.0;

        // Step 5: clamp
        let confidence = clamp_confidence(score);
        let threshold = self.threshold_for(request.field);
        factors.insert("threshold".to_string(), threshold);

        ScoreOutcome {
            confidence,
            quality_tier: QualityTier::classify(confidence, threshold),
            passes_threshold: confidence >= threshold,
            factors,
        }
    }

    /// Context evidence score for a field
    ///
    /// No indicators → 0.70; otherwise the number of field keywords found
    /// maps 0 → 0.60, 1 → 0.80, 2+ → 0.95. Unknown fields score 0.75.
    pub fn context_score(&self, field: &str, indicators: &[String]) -> f64 {
        let Some(keywords) = fields::context_keywords(field) else {
            return self.config.unknown_field_context_score;
        };

        if indicators.iter().all(|i| i.trim().is_empty()) {
            return self.config.no_context_score;
        }

        let haystack: Vec<String> = indicators.iter().map(|i| i.to_lowercase()).collect();
        let matches = keywords
            .iter()
            .filter(|kw| haystack.iter().any(|h| contains_keyword(h, kw)))
            .count();

        match matches {
            0 => 0.60,
            1 => 0.80,
            _ => 0.95,
        }
    }

    /// Aggregate field confidences into a document summary
    ///
    /// Pseudo-fields are excluded. The mean is taken over the supplied
    /// extractions; `required` only feeds the completeness ratio.
    pub fn aggregate<'a, I>(&self, extractions: I, required: &[String]) -> DocumentConfidence
    where
        I: IntoIterator<Item = &'a FieldExtraction>,
    {
        let real: Vec<&FieldExtraction> = extractions
            .into_iter()
            .filter(|e| !fields::is_pseudo_field(&e.field_name))
            .collect();

        let completeness = self.completeness(real.iter().copied(), required);

        if real.is_empty() {
            return DocumentConfidence {
                completeness,
                ..DocumentConfidence::empty()
            };
        }

        let total = real.len();
        let sum: f64 = real.iter().map(|e| e.confidence()).sum();
        let overall = clamp_confidence(sum / total as f64);

        let fields_above_threshold = real
            .iter()
            .filter(|e| e.confidence() >= self.threshold_for(&e.field_name))
            .count();

        let critical_fields_ok = fields::CRITICAL_FIELDS.iter().all(|critical| {
            real.iter().any(|e| {
                e.field_name == *critical
                    && !e.is_empty()
                    && e.confidence() >= self.threshold_for(critical)
            })
        });

        let mut tier = QualityTier::classify(overall, self.config.default_threshold);
        if tier == QualityTier::Excellent && !critical_fields_ok {
            tier = tier.downgrade();
        }

        DocumentConfidence {
            overall_confidence: overall,
            quality_tier: tier,
            fields_above_threshold,
            total_fields: total,
            critical_fields_ok,
            completeness,
        }
    }

    /// Fraction of required fields carrying a non-empty value
    pub fn completeness<'a, I>(&self, extractions: I, required: &[String]) -> f64
    where
        I: IntoIterator<Item = &'a FieldExtraction>,
    {
        if required.is_empty() {
            return 1.0;
        }
        let present: Vec<&str> = extractions
            .into_iter()
            .filter(|e| !e.is_empty())
            .map(|e| e.field_name.as_str())
            .collect();
        let found = required.iter().filter(|r| present.contains(&r.as_str())).count();
        found as f64 / required.len() as f64
    }
}

/// Keyword match; short keywords must sit on word boundaries
fn contains_keyword(haystack: &str, keyword: &str) -> bool {
    if keyword.len() > 3 {
        return haystack.contains(keyword);
    }
    haystack
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == keyword)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn any_source() -> impl Strategy<Value = ExtractionSource> {
        prop_oneof![
            Just(ExtractionSource::Pattern),
            Just(ExtractionSource::Oracle),
            Just(ExtractionSource::DomainCompletion),
            Just(ExtractionSource::Normalized),
            Just(ExtractionSource::ExternalApi),
            Just(ExtractionSource::CrossValidated),
        ]
    }

    proptest! {
        /// Property: scores always land in [0, 1]
        #[test]
        fn test_score_bounded(
            base in -1.0f64..2.0,
            boost in proptest::option::of(-1.0f64..2.0),
            cross in any::<bool>(),
            quality in -1.0f64..2.0,
            source in any_source(),
        ) {
            let scorer = ConfidenceScorer::default();
            let indicators = vec!["CAS registry".to_string()];
            let outcome = scorer.score(&ScoreRequest {
                field: "cas_number",
                value: "64-17-5",
                source,
                base_confidence: base,
                validation_boost: boost,
                cross_validated: cross,
                pattern_quality: quality,
                context_indicators: &indicators,
            });
            prop_assert!(outcome.confidence >= 0.0 && outcome.confidence <= 1.0);
        }

        /// Property: the document mean equals the mean of field confidences
        #[test]
        fn test_aggregate_is_mean(values in proptest::collection::vec(0.0f64..1.0, 1..10)) {
            let scorer = ConfidenceScorer::default();
            let fields: Vec<FieldExtraction> = values
                .iter()
                .enumerate()
                .map(|(i, c)| FieldExtraction::new(format!("f{}", i), "v", *c, ExtractionSource::Pattern, ""))
                .collect();
            let summary = scorer.aggregate(&fields, &[]);
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            prop_assert!((summary.overall_confidence - mean).abs() < 1e-9);
        }
    }
}

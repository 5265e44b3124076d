//! Quality tiers - discretized confidence buckets

use serde::{Deserialize, Serialize};

/// Quality tier of a scored value, relative to a field threshold
///
/// With threshold `t`:
/// - Excellent: `>= t + 0.15`
/// - Good: `>= t`
/// - Acceptable: `>= t - 0.10`
/// - Poor: `>= t - 0.20`
/// - Unreliable: below that
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    /// Well above threshold
    Excellent,

    /// At or above threshold
    Good,

    /// Slightly below threshold
    Acceptable,

    /// Clearly below threshold
    Poor,

    /// Not usable without review
    Unreliable,
}

impl QualityTier {
    /// Classify a confidence against a threshold
    pub fn classify(confidence: f64, threshold: f64) -> Self {
        // Small epsilon so that e.g. 0.85 vs 0.70 + 0.15 lands on the upper tier
        const EPS: f64 = 1e-9;
        if confidence + EPS >= threshold + 0.15 {
            QualityTier::Excellent
        } else if confidence + EPS >= threshold {
            QualityTier::Good
        } else if confidence + EPS >= threshold - 0.10 {
            QualityTier::Acceptable
        } else if confidence + EPS >= threshold - 0.20 {
            QualityTier::Poor
        } else {
            QualityTier::Unreliable
        }
    }

    /// Get the tier name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Excellent => "excellent",
            QualityTier::Good => "good",
            QualityTier::Acceptable => "acceptable",
            QualityTier::Poor => "poor",
            QualityTier::Unreliable => "unreliable",
        }
    }

    /// Parse a tier from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "excellent" => Some(QualityTier::Excellent),
            "good" => Some(QualityTier::Good),
            "acceptable" => Some(QualityTier::Acceptable),
            "poor" => Some(QualityTier::Poor),
            "unreliable" => Some(QualityTier::Unreliable),
            _ => None,
        }
    }

    /// The next lower tier (used when critical fields fail)
    pub fn downgrade(&self) -> Self {
        match self {
            QualityTier::Excellent => QualityTier::Good,
            QualityTier::Good => QualityTier::Acceptable,
            QualityTier::Acceptable => QualityTier::Poor,
            QualityTier::Poor | QualityTier::Unreliable => QualityTier::Unreliable,
        }
    }
}

impl std::str::FromStr for QualityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid quality tier: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_default_threshold() {
        assert_eq!(QualityTier::classify(0.90, 0.70), QualityTier::Excellent);
        assert_eq!(QualityTier::classify(0.85, 0.70), QualityTier::Excellent);
        assert_eq!(QualityTier::classify(0.75, 0.70), QualityTier::Good);
        assert_eq!(QualityTier::classify(0.62, 0.70), QualityTier::Acceptable);
        assert_eq!(QualityTier::classify(0.55, 0.70), QualityTier::Poor);
        assert_eq!(QualityTier::classify(0.30, 0.70), QualityTier::Unreliable);
    }

    #[test]
    fn test_classify_identifier_threshold() {
        assert_eq!(QualityTier::classify(0.75, 0.80), QualityTier::Acceptable);
        assert_eq!(QualityTier::classify(0.95, 0.80), QualityTier::Excellent);
    }

    #[test]
    fn test_downgrade() {
        assert_eq!(QualityTier::Excellent.downgrade(), QualityTier::Good);
        assert_eq!(QualityTier::Unreliable.downgrade(), QualityTier::Unreliable);
    }

    #[test]
    fn test_parse() {
        assert_eq!("Good".parse::<QualityTier>(), Ok(QualityTier::Good));
        assert!("great".parse::<QualityTier>().is_err());
    }
}

//! Composition error types

use thiserror::Error;

/// Errors raised while loading composition rule data
#[derive(Error, Debug)]
pub enum CompositionError {
    /// Rule table is not valid TOML
    #[error("Rule table parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A rule is structurally wrong
    #[error("Invalid rule for {code}: {reason}")]
    InvalidRule {
        /// Hazard code the rule belongs to
        code: String,
        /// What is wrong with it
        reason: String,
    },
}

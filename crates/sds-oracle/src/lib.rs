//! SDS Oracle Layer
//!
//! Implementations of the oracle extractor and domain-completion traits
//! from `sds-domain`.
//!
//! # Implementations
//!
//! - `MockOracle`: scripted answers for testing
//! - `OllamaOracle`: local Ollama model over HTTP
//! - `StaticKnowledgeBase`: fixed substance table, loadable from TOML
//!
//! # Examples
//!
//! ```
//! use sds_oracle::MockOracle;
//! use sds_domain::traits::{OracleExtractor, OracleResponse};
//!
//! let oracle = MockOracle::new();
//! oracle.add_text("signal_word", "Danger");
//!
//! let answer = oracle.extract("signal_word", "Signal word: Danger").unwrap();
//! assert_eq!(answer, OracleResponse::Text("Danger".to_string()));
//! assert_eq!(oracle.extract("flash_point", "").unwrap(), OracleResponse::NotFound);
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod knowledge;
pub mod mock;
pub mod ollama;
pub mod prompt;

pub use config::OracleConfig;
pub use error::OracleError;
pub use knowledge::{KnowledgeEntry, StaticKnowledgeBase};
pub use mock::MockOracle;
pub use ollama::{parse_answer, parse_batch_answer, strip_code_fence, OllamaOracle};

/// Answers that mean "nothing found"
const NOT_FOUND_ANSWERS: &[&str] = &[
    "",
    "not found",
    "not_found",
    "notfound",
    "n/a",
    "na",
    "unknown",
    "none",
    "null",
    "-",
    "not available",
    "not applicable",
];

/// Whether an answer is a "not found" sentinel rather than a value
pub fn is_not_found(answer: &str) -> bool {
    let cleaned = answer
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '.')
        .trim()
        .to_lowercase();
    NOT_FOUND_ANSWERS.contains(&cleaned.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_sentinels() {
        assert!(is_not_found("Not found."));
        assert!(is_not_found("  \"N/A\" "));
        assert!(is_not_found(""));
        assert!(is_not_found("unknown"));
        assert!(!is_not_found("Danger"));
        assert!(!is_not_found("UN1170"));
    }
}

//! Scripted oracle for tests

use crate::OracleError;
use sds_domain::traits::{DomainCompletionService, IdentifierHint, OracleExtractor, OracleResponse};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
struct Script {
    answers: HashMap<String, OracleResponse>,
    errors: HashSet<String>,
    completions: HashMap<(String, String), String>,
    fail_batch: bool,
    calls: usize,
    batch_calls: usize,
    completion_calls: usize,
}

/// Mock oracle for deterministic testing
///
/// Answers are scripted per field; unscripted fields answer `NotFound`.
/// Clones share the same script and counters.
///
/// # Examples
///
/// ```
/// use sds_oracle::MockOracle;
/// use sds_domain::traits::OracleExtractor;
///
/// let oracle = MockOracle::new();
/// oracle.add_error("un_number");
/// assert!(oracle.extract("un_number", "text").is_err());
/// assert_eq!(oracle.call_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockOracle {
    script: Arc<Mutex<Script>>,
}

impl MockOracle {
    /// Create a mock with no scripted answers
    pub fn new() -> Self {
        Self::default()
    }

    fn with_script<T>(&self, f: impl FnOnce(&mut Script) -> T) -> T {
        let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut script)
    }

    /// Script any response for a field
    pub fn add_response(&self, field: impl Into<String>, response: OracleResponse) {
        let field = field.into();
        self.with_script(|s| {
            s.errors.remove(&field);
            s.answers.insert(field, response);
        });
    }

    /// Script a bare string answer
    pub fn add_text(&self, field: impl Into<String>, value: impl Into<String>) {
        self.add_response(field, OracleResponse::Text(value.into()));
    }

    /// Script a canonical `{value, confidence, context}` answer
    pub fn add_answer(&self, field: impl Into<String>, value: &str, confidence: f64) {
        self.add_response(
            field,
            OracleResponse::Structured(serde_json::json!({
                "value": value,
                "confidence": confidence,
                "context": value,
            })),
        );
    }

    /// Configure to return an error for a field
    pub fn add_error(&self, field: impl Into<String>) {
        let field = field.into();
        self.with_script(|s| {
            s.answers.remove(&field);
            s.errors.insert(field);
        });
    }

    /// Make batched calls fail so callers fall back to single calls
    pub fn fail_batches(&self) {
        self.with_script(|s| s.fail_batch = true);
    }

    /// Script a domain-completion answer for an identifier and field
    pub fn add_completion(&self, identifier: impl Into<String>, field: impl Into<String>, value: impl Into<String>) {
        self.with_script(|s| {
            s.completions.insert((identifier.into(), field.into()), value.into());
        });
    }

    /// Number of single-field extract calls
    pub fn call_count(&self) -> usize {
        self.with_script(|s| s.calls)
    }

    /// Number of batched extract calls
    pub fn batch_call_count(&self) -> usize {
        self.with_script(|s| s.batch_calls)
    }

    /// Number of completion calls
    pub fn completion_call_count(&self) -> usize {
        self.with_script(|s| s.completion_calls)
    }

    /// Reset all counters
    pub fn reset_call_count(&self) {
        self.with_script(|s| {
            s.calls = 0;
            s.batch_calls = 0;
            s.completion_calls = 0;
        });
    }

    fn answer(script: &Script, field: &str) -> Result<OracleResponse, OracleError> {
        if script.errors.contains(field) {
            return Err(OracleError::Mock(format!("scripted failure for {}", field)));
        }
        Ok(script.answers.get(field).cloned().unwrap_or(OracleResponse::NotFound))
    }
}

impl OracleExtractor for MockOracle {
    type Error = OracleError;

    fn extract(&self, field: &str, _text: &str) -> Result<OracleResponse, Self::Error> {
        self.with_script(|s| {
            s.calls += 1;
            Self::answer(s, field)
        })
    }

    fn extract_many(
        &self,
        fields: &[String],
        _text: &str,
    ) -> Result<BTreeMap<String, OracleResponse>, Self::Error> {
        self.with_script(|s| {
            s.batch_calls += 1;
            if s.fail_batch {
                return Err(OracleError::Mock("scripted batch failure".to_string()));
            }
            fields
                .iter()
                .map(|field| Ok((field.clone(), Self::answer(s, field)?)))
                .collect()
        })
    }
}

impl DomainCompletionService for MockOracle {
    type Error = OracleError;

    fn complete(&self, hint: &IdentifierHint, field: &str) -> Result<Option<String>, Self::Error> {
        self.with_script(|s| {
            s.completion_calls += 1;
            if s.errors.contains(field) {
                return Err(OracleError::Mock(format!("scripted failure for {}", field)));
            }
            Ok(s.completions
                .get(&(hint.as_str().to_string(), field.to_string()))
                .cloned())
        })
    }
}

//! Ollama Oracle Implementation
//!
//! Field extraction and domain completion backed by a local Ollama model.
//!
//! # Features
//!
//! - Blocking HTTP communication with the Ollama API
//! - Configurable endpoint and model
//! - Retry logic with exponential backoff
//! - JSON answers read through code fences
//!
//! Calls block the current thread. The client must be built outside an
//! async task and invoked from a blocking thread (`spawn_blocking`).
//!
//! # Examples
//!
//! ```no_run
//! use sds_oracle::{OllamaOracle, OracleConfig};
//!
//! let oracle = OllamaOracle::with_config(OracleConfig::default()).unwrap();
//! ```

use crate::prompt::{completion_prompt, PromptBuilder};
use crate::{is_not_found, OracleConfig, OracleError};
use reqwest::blocking::Client;
use sds_domain::traits::{DomainCompletionService, IdentifierHint, OracleExtractor, OracleResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Oracle backed by a local Ollama instance
pub struct OllamaOracle {
    client: Client,
    config: OracleConfig,
}

/// Request body for Ollama generate API
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Response from Ollama generate API
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

impl OllamaOracle {
    /// Create an oracle with the given configuration
    pub fn with_config(config: OracleConfig) -> Result<Self, OracleError> {
        config.validate().map_err(OracleError::Config)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OracleError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Create an oracle for a model on the default endpoint
    pub fn with_model(model: impl Into<String>) -> Result<Self, OracleError> {
        Self::with_config(OracleConfig {
            model: model.into(),
            ..OracleConfig::default()
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// Generate text, retrying with exponential backoff
    pub fn generate(&self, prompt: &str) -> Result<String, OracleError> {
        let url = format!("{}/api/generate", self.config.endpoint.trim_end_matches('/'));
        let body = OllamaGenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
        };

        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.config.max_retries {
            match self.client.post(&url).json(&body).send() {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let parsed: OllamaGenerateResponse = response.json().map_err(|e| {
                            OracleError::InvalidResponse(format!("Failed to parse response: {}", e))
                        })?;
                        return Ok(parsed.response);
                    } else if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(OracleError::ModelNotAvailable(self.config.model.clone()));
                    }
                    let text = response.text().unwrap_or_default();
                    last_error = Some(OracleError::Communication(format!("HTTP {}: {}", status, text)));
                }
                Err(e) => {
                    last_error = Some(OracleError::Communication(format!("Request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.config.max_retries {
                let delay = self.config.backoff_base_ms.saturating_mul(1u64 << (attempts - 1).min(16));
                warn!(attempts, delay_ms = delay, "Oracle request failed, retrying");
                std::thread::sleep(Duration::from_millis(delay));
            }
        }

        Err(last_error.unwrap_or_else(|| OracleError::Communication("Max retries exceeded".to_string())))
    }
}

/// Strip a surrounding markdown code fence
pub fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }

    let body = match trimmed.find('\n') {
        Some(idx) => &trimmed[idx + 1..],
        None => return "",
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Read a raw model answer into an oracle response
pub fn parse_answer(raw: &str) -> OracleResponse {
    let body = strip_code_fence(raw);
    if is_not_found(body) {
        return OracleResponse::NotFound;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Null) => OracleResponse::NotFound,
        Ok(Value::String(s)) if is_not_found(&s) => OracleResponse::NotFound,
        Ok(Value::String(s)) => OracleResponse::Text(s),
        Ok(value) => OracleResponse::Structured(value),
        Err(_) => OracleResponse::Text(body.to_string()),
    }
}

/// Split a batched answer into per-field responses
///
/// Fields the model left out come back as `NotFound`. An answer that is
/// not a JSON object is an error so the caller can retry per field.
pub fn parse_batch_answer(
    raw: &str,
    fields: &[String],
) -> Result<BTreeMap<String, OracleResponse>, OracleError> {
    let value: Value = serde_json::from_str(strip_code_fence(raw))?;
    let object = value
        .as_object()
        .ok_or_else(|| OracleError::InvalidResponse("Expected a JSON object".to_string()))?;

    Ok(fields
        .iter()
        .map(|field| {
            let response = match object.get(field) {
                None | Some(Value::Null) => OracleResponse::NotFound,
                Some(Value::String(s)) if is_not_found(s) => OracleResponse::NotFound,
                Some(Value::String(s)) => OracleResponse::Text(s.clone()),
                Some(other) => OracleResponse::Structured(other.clone()),
            };
            (field.clone(), response)
        })
        .collect())
}

impl OracleExtractor for OllamaOracle {
    type Error = OracleError;

    fn extract(&self, field: &str, text: &str) -> Result<OracleResponse, Self::Error> {
        let prompt = PromptBuilder::single(field, text).build();
        let raw = self.generate(&prompt)?;
        debug!(field, len = raw.len(), "Oracle answered");
        Ok(parse_answer(&raw))
    }

    fn extract_many(
        &self,
        fields: &[String],
        text: &str,
    ) -> Result<BTreeMap<String, OracleResponse>, Self::Error> {
        let prompt = PromptBuilder::batch(fields, text).build();
        let raw = self.generate(&prompt)?;
        parse_batch_answer(&raw, fields)
    }
}

impl DomainCompletionService for OllamaOracle {
    type Error = OracleError;

    fn complete(&self, hint: &IdentifierHint, field: &str) -> Result<Option<String>, Self::Error> {
        let raw = self.generate(&completion_prompt(hint, field))?;
        let answer = strip_code_fence(&raw).lines().next().unwrap_or("").trim();
        let answer = answer.trim_matches('"').trim();

        if is_not_found(answer) {
            Ok(None)
        } else {
            Ok(Some(answer.to_string()))
        }
    }
}

//! Prompt construction for field extraction and domain completion

use sds_domain::fields;
use sds_domain::traits::IdentifierHint;

/// Longest document excerpt sent to a model
pub const MAX_PROMPT_TEXT_CHARS: usize = 12_000;

/// Builds prompts for a model-backed oracle
pub struct PromptBuilder<'a> {
    fields: Vec<&'a str>,
    text: &'a str,
}

impl<'a> PromptBuilder<'a> {
    /// Prompt for one field
    pub fn single(field: &'a str, text: &'a str) -> Self {
        Self {
            fields: vec![field],
            text,
        }
    }

    /// Prompt for several fields answered in one JSON object
    pub fn batch(fields: &'a [String], text: &'a str) -> Self {
        Self {
            fields: fields.iter().map(String::as_str).collect(),
            text,
        }
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(EXTRACTION_INSTRUCTIONS);
        prompt.push_str("\n\nFields:\n");
        for field in &self.fields {
            prompt.push_str(&format!("- {}: {}\n", field, describe(field)));
        }
        prompt.push('\n');

        prompt.push_str("Document text:\n---\n");
        prompt.push_str(truncate(self.text, MAX_PROMPT_TEXT_CHARS));
        prompt.push_str("\n---\n\n");

        if self.fields.len() == 1 {
            prompt.push_str(SINGLE_FORMAT);
        } else {
            prompt.push_str(BATCH_FORMAT);
        }

        prompt
    }
}

/// Prompt asking for general knowledge about a substance
pub fn completion_prompt(hint: &IdentifierHint, field: &str) -> String {
    let subject = match hint {
        IdentifierHint::Registry(cas) => format!("the substance with CAS number {}", cas),
        IdentifierHint::Name(name) => format!("the product or substance named \"{}\"", name),
        IdentifierHint::TransportNumber(un) => format!("the dangerous good {}", un),
    };

    format!(
        "Using established regulatory data, give the {} ({}) for {}.\n\
         Answer with the value only. If you do not know it, answer exactly: not found",
        field,
        describe(field),
        subject
    )
}

/// Human description of a schema field
pub fn describe(field: &str) -> &'static str {
    match field {
        fields::PRODUCT_NAME => "trade name of the product from section 1",
        fields::MANUFACTURER => "company that supplies the product",
        fields::CAS_NUMBER => "CAS registry number, format NNNNNNN-NN-N",
        fields::UN_NUMBER => "UN transport number, format UN1234",
        fields::TRANSPORT_CLASS => "transport hazard class, e.g. 3 or 2.1",
        fields::PACKING_GROUP => "packing group I, II or III",
        fields::H_STATEMENTS => "all hazard statement codes, comma separated, e.g. H225, H319",
        fields::SIGNAL_WORD => "GHS signal word, Danger or Warning",
        fields::FLASH_POINT => "flash point with unit, e.g. 13 °C",
        fields::EMERGENCY_PHONE => "emergency telephone number",
        fields::REVISION_DATE => "revision date of the sheet",
        _ => "value as printed",
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

const EXTRACTION_INSTRUCTIONS: &str = r#"You read safety data sheets and extract regulatory fields.

Rules:
- Copy values exactly as printed; do not guess
- If a field is not present in the text, answer "not found"
- Confidence is your certainty between 0.0 and 1.0
- Context is the shortest text span that contains the value"#;

const SINGLE_FORMAT: &str = r#"Output format (JSON only, no additional text):
{"value": "...", "confidence": 0.0-1.0, "context": "..."}"#;

const BATCH_FORMAT: &str = r#"Output format (one JSON object keyed by field name, no additional text):
{
  "<field>": {"value": "...", "confidence": 0.0-1.0, "context": "..."}
}"#;

#[cfg(test)]
mod tests {
    use super::*;
    use sds_domain::CasNumber;

    #[test]
    fn test_single_prompt() {
        let prompt = PromptBuilder::single("un_number", "UN 1170 Ethanol").build();
        assert!(prompt.contains("- un_number: UN transport number"));
        assert!(prompt.contains("UN 1170 Ethanol"));
        assert!(prompt.contains("{\"value\""));
    }

    #[test]
    fn test_batch_prompt_lists_every_field() {
        let fields = vec!["signal_word".to_string(), "flash_point".to_string()];
        let prompt = PromptBuilder::batch(&fields, "text").build();
        assert!(prompt.contains("- signal_word:"));
        assert!(prompt.contains("- flash_point:"));
        assert!(prompt.contains("keyed by field name"));
    }

    #[test]
    fn test_text_is_truncated() {
        let text = "a".repeat(MAX_PROMPT_TEXT_CHARS + 500);
        let prompt = PromptBuilder::single("signal_word", &text).build();
        assert!(prompt.len() < text.len() + 1000);
        assert!(!prompt.contains(&text));
    }

    #[test]
    fn test_completion_prompt_uses_hint() {
        let hint = IdentifierHint::Registry(CasNumber::parse("67-64-1").unwrap());
        let prompt = completion_prompt(&hint, "flash_point");
        assert!(prompt.contains("CAS number 67-64-1"));
        assert!(prompt.contains("not found"));
    }
}

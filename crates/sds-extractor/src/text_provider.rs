//! Plain-text document provider

use crate::ExtractorError;
use once_cell::sync::Lazy;
use regex::Regex;
use sds_domain::traits::DocumentTextProvider;
use sds_domain::DocumentText;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

static SECTION_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:section[ \t]*(\d{1,2})\b|(\d{1,2})[ \t]*[.:)][ \t]+\p{L})").unwrap()
});

/// Highest SDS section number
const LAST_SECTION: u32 = 16;

/// Reads UTF-8 text files that already went through OCR
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextProvider;

impl DocumentTextProvider for PlainTextProvider {
    type Error = ExtractorError;

    fn extract(&self, path: &Path) -> Result<DocumentText, Self::Error> {
        let text = std::fs::read_to_string(path)?;
        let sections = split_sections(&text);
        debug!("Read {} ({} chars, {} sections)", path.display(), text.len(), sections.len());
        Ok(DocumentText { text, sections })
    }
}

/// Split text into numbered SDS sections
///
/// Headings look like "SECTION 3: Composition" or "3. Composition". Only
/// headings numbered 1-16 in increasing order start a section, so numbered
/// list items inside a section are not mistaken for headings.
pub fn split_sections(text: &str) -> BTreeMap<u32, String> {
    let mut starts: Vec<(u32, usize)> = Vec::new();

    for caps in SECTION_HEADING.captures_iter(text) {
        let Some(number) = caps
            .get(1)
            .or_else(|| caps.get(2))
            .and_then(|m| m.as_str().parse::<u32>().ok())
        else {
            continue;
        };
        let previous = starts.last().map_or(0, |(n, _)| *n);
        if (1..=LAST_SECTION).contains(&number) && number > previous {
            if let Some(whole) = caps.get(0) {
                starts.push((number, whole.start()));
            }
        }
    }

    let mut sections = BTreeMap::new();
    for (i, (number, start)) in starts.iter().enumerate() {
        let end = starts.get(i + 1).map_or(text.len(), |(_, s)| *s);
        let body = text[*start..end].trim();
        if !body.is_empty() {
            sections.insert(*number, body.to_string());
        }
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = "SAFETY DATA SHEET\n\
        SECTION 1: Identification\nProduct name: Acetone\n\
        SECTION 2: Hazards identification\nSignal word: Danger\n\
        1. Keep away from heat\n\
        SECTION 3: Composition\nAcetone 67-64-1 >90%\n\
        14. Transport information\nUN 1090\n";

    #[test]
    fn test_split_sections() {
        let sections = split_sections(SHEET);
        assert_eq!(sections.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3, 14]);
        assert!(sections[&1].contains("Acetone"));
        assert!(sections[&2].contains("Keep away from heat"));
        assert!(sections[&3].contains("67-64-1"));
        assert!(sections[&14].contains("UN 1090"));
    }

    #[test]
    fn test_no_headings() {
        assert!(split_sections("just some text").is_empty());
        assert!(split_sections("").is_empty());
    }

    #[test]
    fn test_provider_reads_file() {
        let path = std::env::temp_dir().join(format!("sds-provider-{}.txt", std::process::id()));
        std::fs::write(&path, SHEET).unwrap();

        let document = PlainTextProvider.extract(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(document.text, SHEET);
        assert_eq!(document.section(3).map(|s| s.contains("Acetone")), Some(true));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = PlainTextProvider.extract(Path::new("/nonexistent/sds.txt"));
        assert!(matches!(result, Err(ExtractorError::Io(_))));
    }
}

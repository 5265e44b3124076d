//! Manufacturer profiles
//!
//! A profile adds field rules for one manufacturer's sheet layout. Profiles
//! are plain descriptors loaded from versioned TOML:
//!
//! ```toml
//! version = 1
//!
//! [[profiles]]
//! name = "acme"
//! identifiers = ["ACME Chemicals", "acme-chem.com"]
//!
//! [[profiles.patterns.product_name]]
//! regex = '(?m)^Article:\s*(.+)$'
//! quality = 0.95
//! labelled = true
//! ```

use crate::patterns::{generic_rules, FieldRule};
use crate::ExtractorError;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Supported profile file version
pub const PROFILE_FORMAT_VERSION: u32 = 1;

/// Name of the fallback profile
pub const GENERIC_PROFILE: &str = "generic";

/// Characters of the document header searched for identifiers
pub const HEADER_CHARS: usize = 1500;

#[derive(Debug, Deserialize)]
struct ProfileFile {
    version: u32,
    #[serde(default)]
    profiles: Vec<ProfileSpec>,
}

#[derive(Debug, Deserialize)]
struct ProfileSpec {
    name: String,
    #[serde(default)]
    identifiers: Vec<String>,
    #[serde(default)]
    patterns: BTreeMap<String, Vec<PatternSpec>>,
}

#[derive(Debug, Deserialize)]
struct PatternSpec {
    regex: String,
    #[serde(default = "default_quality")]
    quality: f64,
    #[serde(default)]
    labelled: bool,
    #[serde(default)]
    collect_all: bool,
}

fn default_quality() -> f64 {
    1.0
}

/// Rule overrides for one manufacturer
#[derive(Debug, Clone)]
pub struct ManufacturerProfile {
    name: String,
    identifiers: Vec<String>,
    overrides: BTreeMap<String, Result<Vec<FieldRule>, String>>,
}

impl ManufacturerProfile {
    /// Profile with no overrides
    pub fn generic() -> Self {
        Self {
            name: GENERIC_PROFILE.to_string(),
            identifiers: Vec::new(),
            overrides: BTreeMap::new(),
        }
    }

    /// Profile name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is the fallback profile
    pub fn is_generic(&self) -> bool {
        self.name == GENERIC_PROFILE
    }

    /// Whether any identifier occurs in the (lower-cased) header
    fn matches(&self, header: &str) -> bool {
        self.identifiers.iter().any(|id| header.contains(id.as_str()))
    }

    fn from_spec(spec: ProfileSpec) -> Self {
        let overrides = spec
            .patterns
            .into_iter()
            .map(|(field, patterns)| {
                let compiled = patterns
                    .iter()
                    .map(|p| {
                        FieldRule::new(&p.regex, p.quality, p.labelled)
                            .map(|rule| if p.collect_all { rule.collecting() } else { rule })
                            .map_err(|e| format!("invalid pattern for {} in profile {}: {}", field, spec.name, e))
                    })
                    .collect::<Result<Vec<_>, _>>();
                (field, compiled)
            })
            .collect();

        Self {
            name: spec.name,
            identifiers: spec
                .identifiers
                .iter()
                .map(|i| i.trim().to_lowercase())
                .filter(|i| !i.is_empty())
                .collect(),
            overrides,
        }
    }
}

/// Immutable, ordered set of manufacturer profiles
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: Vec<ManufacturerProfile>,
    generic: ManufacturerProfile,
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self {
            profiles: Vec::new(),
            generic: ManufacturerProfile::generic(),
        }
    }
}

impl ProfileRegistry {
    /// Load profiles from TOML
    ///
    /// Invalid override regexes do not fail the load; they surface as a
    /// per-field error from [`ProfileRegistry::patterns_for`].
    pub fn from_toml(s: &str) -> Result<Self, ExtractorError> {
        let file: ProfileFile = toml::from_str(s)?;
        if file.version != PROFILE_FORMAT_VERSION {
            return Err(ExtractorError::Profile(format!(
                "unsupported profile format version {} (expected {})",
                file.version, PROFILE_FORMAT_VERSION
            )));
        }

        let mut profiles = Vec::with_capacity(file.profiles.len());
        for spec in file.profiles {
            if spec.name.trim().is_empty() || spec.name == GENERIC_PROFILE {
                return Err(ExtractorError::Profile(format!("invalid profile name '{}'", spec.name)));
            }
            if profiles.iter().any(|p: &ManufacturerProfile| p.name == spec.name) {
                return Err(ExtractorError::Profile(format!("duplicate profile '{}'", spec.name)));
            }
            profiles.push(ManufacturerProfile::from_spec(spec));
        }

        Ok(Self {
            profiles,
            generic: ManufacturerProfile::generic(),
        })
    }

    /// Number of manufacturer profiles, excluding the generic one
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether only the generic profile is available
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Profile for a document: the first whose identifier appears in the
    /// header, else the generic profile
    pub fn identify(&self, text: &str) -> &ManufacturerProfile {
        let header: String = text.chars().take(HEADER_CHARS).collect::<String>().to_lowercase();
        self.profiles
            .iter()
            .find(|p| p.matches(&header))
            .unwrap_or(&self.generic)
    }

    /// Rules for a field: profile overrides first, then the generic rules
    pub fn patterns_for<'a>(
        &self,
        profile: &'a ManufacturerProfile,
        field: &str,
    ) -> Result<Vec<&'a FieldRule>, String> {
        let mut rules: Vec<&'a FieldRule> = match profile.overrides.get(field) {
            Some(Ok(overrides)) => overrides.iter().collect(),
            Some(Err(e)) => return Err(e.clone()),
            None => Vec::new(),
        };
        rules.extend(generic_rules(field));
        Ok(rules)
    }
}

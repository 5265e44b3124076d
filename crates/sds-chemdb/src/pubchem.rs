//! PubChem PUG-REST client
//!
//! Blocking client; wrap it in [`crate::GuardedChemicalDb`] to get rate
//! limiting, caching and timeouts.

use crate::{ChemDbConfig, ChemDbError};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use sds_domain::traits::{ChemicalDatabase, ChemicalRecord};
use sds_domain::CasNumber;
use serde_json::Value;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::debug;

static GHS_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:EU)?H[2-4]\d{2}[a-zA-Z]{0,2}\b").unwrap());

/// Synonyms kept per record
const MAX_SYNONYMS: usize = 50;

/// PubChem client over PUG-REST
pub struct PubChemClient {
    client: Client,
    base_url: String,
}

impl PubChemClient {
    /// Create a client with the given configuration
    pub fn new(config: &ChemDbConfig) -> Result<Self, ChemDbError> {
        config.validate().map_err(ChemDbError::Config)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(concat!("sds-chemdb/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ChemDbError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ChemDbError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| ChemDbError::Config(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ChemDbError::Config(format!("'{}' cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET a JSON document; `None` when PubChem reports not found
    fn get_json(&self, url: Url) -> Result<Option<Value>, ChemDbError> {
        debug!(url = %url, "Querying PubChem");

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ChemDbError::Http(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ChemDbError::Http(format!("HTTP {}: {}", status, body)));
        }

        let text = response.text().map_err(|e| ChemDbError::Http(e.to_string()))?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    /// Look up a compound by any PubChem name (CAS numbers are names too)
    fn lookup(&self, name: &str) -> Result<Option<ChemicalRecord>, ChemDbError> {
        let url = self.url(&["pug", "compound", "name", name, "property", "IUPACName,MolecularFormula", "JSON"])?;
        let Some(properties) = self.get_json(url)? else {
            return Ok(None);
        };
        let Some((cid, iupac, formula)) = parse_properties(&properties) else {
            return Ok(None);
        };

        let url = self.url(&["pug", "compound", "cid", &cid.to_string(), "synonyms", "JSON"])?;
        let synonyms = match self.get_json(url)? {
            Some(value) => parse_synonyms(&value),
            None => Vec::new(),
        };

        Ok(Some(build_record(cid, iupac.unwrap_or_else(|| name.to_string()), formula, synonyms)))
    }
}

/// (CID, IUPAC name, molecular formula) of the first property row
pub(crate) fn parse_properties(value: &Value) -> Option<(u64, Option<String>, Option<String>)> {
    let row = value.get("PropertyTable")?.get("Properties")?.get(0)?;
    let cid = row.get("CID")?.as_u64()?;
    let iupac = row.get("IUPACName").and_then(Value::as_str).map(str::to_string);
    let formula = row.get("MolecularFormula").and_then(Value::as_str).map(str::to_string);
    Some((cid, iupac, formula))
}

/// Synonym list of the first information row
pub(crate) fn parse_synonyms(value: &Value) -> Vec<String> {
    value
        .get("InformationList")
        .and_then(|v| v.get("Information"))
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("Synonym"))
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

/// Unique hazard statement codes in a GHS classification document
pub(crate) fn extract_hazard_codes(body: &str) -> Vec<String> {
    GHS_CODE
        .find_iter(body)
        .map(|m| m.as_str().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn build_record(cid: u64, name: String, formula: Option<String>, synonyms: Vec<String>) -> ChemicalRecord {
    let cas_numbers: Vec<String> = synonyms
        .iter()
        .filter_map(|s| CasNumber::parse(s).ok())
        .map(|cas| cas.to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    ChemicalRecord {
        cid: Some(cid),
        name,
        synonyms: synonyms
            .iter()
            .take(MAX_SYNONYMS)
            .map(|s| s.to_lowercase())
            .collect(),
        cas_numbers,
        molecular_formula: formula,
    }
}

impl ChemicalDatabase for PubChemClient {
    type Error = ChemDbError;

    fn by_name(&self, name: &str) -> Result<Option<ChemicalRecord>, Self::Error> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        self.lookup(name)
    }

    fn by_registry_number(&self, cas: &CasNumber) -> Result<Option<ChemicalRecord>, Self::Error> {
        self.lookup(cas.as_str())
    }

    fn hazard_codes(&self, record: &ChemicalRecord) -> Result<Vec<String>, Self::Error> {
        let Some(cid) = record.cid else {
            return Ok(Vec::new());
        };

        let mut url = self.url(&["pug_view", "data", "compound", &cid.to_string(), "JSON"])?;
        url.query_pairs_mut().append_pair("heading", "GHS Classification");

        match self.get_json(url)? {
            Some(value) => Ok(extract_hazard_codes(&value.to_string())),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_properties() {
        let value = json!({
            "PropertyTable": {
                "Properties": [{"CID": 702, "MolecularFormula": "C2H6O", "IUPACName": "ethanol"}]
            }
        });
        let (cid, iupac, formula) = parse_properties(&value).unwrap();
        assert_eq!(cid, 702);
        assert_eq!(iupac.as_deref(), Some("ethanol"));
        assert_eq!(formula.as_deref(), Some("C2H6O"));

        assert!(parse_properties(&json!({"Fault": {}})).is_none());
    }

    #[test]
    fn test_parse_synonyms_and_build_record() {
        let value = json!({
            "InformationList": {
                "Information": [{"CID": 702, "Synonym": ["Ethanol", "Ethyl alcohol", "64-17-5", "64-17-6"]}]
            }
        });
        let synonyms = parse_synonyms(&value);
        assert_eq!(synonyms.len(), 4);

        let record = build_record(702, "ethanol".to_string(), None, synonyms);
        assert_eq!(record.cas_numbers, vec!["64-17-5".to_string()]);
        assert!(record.matches_name("Ethyl Alcohol"));
    }

    #[test]
    fn test_extract_hazard_codes() {
        let body = r#"{"String": "H225 (100%): Highly Flammable liquid", "Other": "H319 (98%); H225; H361d"}"#;
        assert_eq!(extract_hazard_codes(body), vec!["H225", "H319", "H361d"]);
    }

    #[test]
    fn test_url_building_encodes_names() {
        let client = PubChemClient::new(&ChemDbConfig::default()).unwrap();
        let url = client.url(&["pug", "compound", "name", "sulfuric acid", "JSON"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://pubchem.ncbi.nlm.nih.gov/rest/pug/compound/name/sulfuric%20acid/JSON"
        );
    }

    #[test]
    fn test_hazard_codes_without_cid() {
        let client = PubChemClient::new(&ChemDbConfig::default()).unwrap();
        let record = ChemicalRecord::default();
        assert!(client.hazard_codes(&record).unwrap().is_empty());
    }

    #[test]
    #[ignore] // Requires network access
    fn test_pubchem_integration() {
        let client = PubChemClient::new(&ChemDbConfig::default()).unwrap();
        let record = client.by_registry_number(&CasNumber::parse("64-17-5").unwrap()).unwrap().unwrap();
        assert!(record.has_cas("64-17-5"));
    }
}

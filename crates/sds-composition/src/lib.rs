//! SDS Composition
//!
//! Parses the ingredient table of a safety data sheet and derives the
//! hazard codes the mixture should declare.
//!
//! # Examples
//!
//! ```
//! use sds_composition::{HazardRuleEngine, IngredientParser};
//! use std::collections::BTreeMap;
//!
//! let parser = IngredientParser::default();
//! let ingredients = parser.extract("Sulfuric acid 7664-93-9 10-15%", &BTreeMap::new());
//!
//! let report = HazardRuleEngine::default().check(&ingredients, "H315");
//! assert!(report.is_inconsistent());
//! ```

#![warn(missing_docs)]

mod cas;
mod concentration;
mod error;
mod hazard;
mod parser;

pub use cas::{find_cas_numbers, CasMatch};
pub use concentration::{find_concentration, Concentration, ConcentrationKind};
pub use error::CompositionError;
pub use hazard::{parse_declared_codes, HazardRule, HazardRuleEngine, HazardRuleTable};
pub use parser::{normalize_dashes, IngredientParser, ParserConfig, COMPOSITION_SECTION};

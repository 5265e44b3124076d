//! SDS Gatekeeper
//!
//! Validates extracted field values before they are trusted.
//!
//! The Gatekeeper provides:
//! - Confidence-band status (valid / warning / invalid)
//! - Field-specific structural checks (CAS checksum, UN numbers, hazard codes)
//! - Canonical value normalization
//!
//! # Examples
//!
//! ```
//! use sds_gatekeeper::{FieldValidator, ValidationConfig};
//! use sds_domain::ValidationStatus;
//!
//! let validator = FieldValidator::new(ValidationConfig::default());
//!
//! let verdict = validator.validate("un_number", "UN 1170", 0.9);
//! assert_eq!(verdict.status, ValidationStatus::Valid);
//! assert_eq!(verdict.normalized.as_deref(), Some("UN1170"));
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod structure;
mod validator;

pub use config::ValidationConfig;
pub use error::GatekeeperError;
pub use structure::{check, normalize, StructuralCheck};
pub use validator::{FieldValidator, FieldVerdict, NOT_FOUND};

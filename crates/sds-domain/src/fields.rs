//! Static field schema for safety data sheets
//!
//! Field names, their roles (identifier, critical, required) and the keyword
//! sets used as context evidence. Everything here is immutable data.

/// Product or trade name (section 1)
pub const PRODUCT_NAME: &str = "product_name";
/// Supplier / manufacturer name (section 1)
pub const MANUFACTURER: &str = "manufacturer";
/// CAS registry number of the main substance (section 1 or 3)
pub const CAS_NUMBER: &str = "cas_number";
/// UN transport number (section 14)
pub const UN_NUMBER: &str = "un_number";
/// Transport hazard class (section 14)
pub const TRANSPORT_CLASS: &str = "transport_class";
/// Packing group I/II/III (section 14)
pub const PACKING_GROUP: &str = "packing_group";
/// Declared hazard statement codes, comma separated (section 2)
pub const H_STATEMENTS: &str = "h_statements";
/// GHS signal word (section 2)
pub const SIGNAL_WORD: &str = "signal_word";
/// Flash point in degrees Celsius (section 9)
pub const FLASH_POINT: &str = "flash_point";
/// Emergency telephone number (section 1)
pub const EMERGENCY_PHONE: &str = "emergency_phone";
/// Revision date of the sheet
pub const REVISION_DATE: &str = "revision_date";

/// Reserved pseudo-field carrying the hazard consistency report
pub const HAZARD_CONSISTENCY: &str = "_hazard_consistency";

/// Every extractable field, in pattern-pass order
pub const ALL_FIELDS: &[&str] = &[
    PRODUCT_NAME,
    MANUFACTURER,
    CAS_NUMBER,
    UN_NUMBER,
    TRANSPORT_CLASS,
    PACKING_GROUP,
    H_STATEMENTS,
    SIGNAL_WORD,
    FLASH_POINT,
    EMERGENCY_PHONE,
    REVISION_DATE,
];

/// Fields a complete record must carry
pub const DEFAULT_REQUIRED_FIELDS: &[&str] = &[
    PRODUCT_NAME,
    MANUFACTURER,
    CAS_NUMBER,
    H_STATEMENTS,
    SIGNAL_WORD,
];

/// Fields that must individually pass for an "excellent" document
pub const CRITICAL_FIELDS: &[&str] = &[PRODUCT_NAME, CAS_NUMBER];

/// Fields checked against the external chemical database
pub const IDENTIFIER_FIELDS: &[&str] = &[CAS_NUMBER, UN_NUMBER, PRODUCT_NAME];

/// Whether the field is an identifier
pub fn is_identifier(field: &str) -> bool {
    IDENTIFIER_FIELDS.contains(&field)
}

/// Whether the field is critical for the document tier
pub fn is_critical(field: &str) -> bool {
    CRITICAL_FIELDS.contains(&field)
}

/// Whether the name is a reserved pseudo-field (not a real extraction)
pub fn is_pseudo_field(field: &str) -> bool {
    field.starts_with('_')
}

/// Whether the field belongs to the schema
pub fn is_known(field: &str) -> bool {
    ALL_FIELDS.contains(&field)
}

/// SDS section where a field is normally found
pub fn home_section(field: &str) -> Option<u32> {
    match field {
        PRODUCT_NAME | MANUFACTURER | EMERGENCY_PHONE => Some(1),
        H_STATEMENTS | SIGNAL_WORD => Some(2),
        CAS_NUMBER => Some(3),
        FLASH_POINT => Some(9),
        UN_NUMBER | TRANSPORT_CLASS | PACKING_GROUP => Some(14),
        _ => None,
    }
}

/// Context keywords that corroborate a value for the field
///
/// Returns `None` for fields outside the schema.
pub fn context_keywords(field: &str) -> Option<&'static [&'static str]> {
    let keywords: &'static [&'static str] = match field {
        PRODUCT_NAME => &["product name", "trade name", "product identifier", "identification"],
        MANUFACTURER => &["manufacturer", "supplier", "company", "distributor"],
        CAS_NUMBER => &["cas", "registry", "cas-no", "cas no"],
        UN_NUMBER => &["un number", "un no", "un-no", "transport", "un"],
        TRANSPORT_CLASS => &["class", "transport hazard", "adr", "imdg", "iata"],
        PACKING_GROUP => &["packing group", "packaging group", "pg"],
        H_STATEMENTS => &["hazard statement", "h-statement", "h statements", "classification"],
        SIGNAL_WORD => &["signal word", "label elements", "ghs"],
        FLASH_POINT => &["flash point", "flashpoint", "closed cup", "open cup"],
        EMERGENCY_PHONE => &["emergency", "telephone", "phone", "24h", "poison"],
        REVISION_DATE => &["revision", "revised", "date of issue", "version"],
        _ => return None,
    };
    Some(keywords)
}

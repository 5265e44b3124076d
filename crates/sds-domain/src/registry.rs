//! CAS registry numbers
//!
//! A `CasNumber` can only be built through [`CasNumber::parse`], so any value
//! of this type has a verified check digit.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A checksum-validated CAS registry number (`NNNNNNN-NN-N`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CasNumber(String);

impl CasNumber {
    /// Parse and checksum-validate a CAS number
    ///
    /// Surrounding whitespace is ignored. The first block must have 2-7
    /// digits, the second exactly 2 and the check digit exactly 1.
    ///
    /// # Examples
    ///
    /// ```
    /// use sds_domain::CasNumber;
    ///
    /// assert!(CasNumber::parse("64-17-5").is_ok());
    /// assert!(CasNumber::parse("64-17-6").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        let parts: Vec<&str> = trimmed.split('-').collect();
        if parts.len() != 3 {
            return Err(format!("'{}' is not in NNNNNNN-NN-N form", trimmed));
        }

        let (first, second, check) = (parts[0], parts[1], parts[2]);
        let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

        if !all_digits(first) || !(2..=7).contains(&first.len()) {
            return Err(format!("'{}' has an invalid first block", trimmed));
        }
        if !all_digits(second) || second.len() != 2 {
            return Err(format!("'{}' has an invalid second block", trimmed));
        }
        if !all_digits(check) || check.len() != 1 {
            return Err(format!("'{}' has an invalid check digit", trimmed));
        }

        if !cas_checksum_valid(trimmed) {
            return Err(format!("'{}' fails the CAS checksum", trimmed));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// The canonical string form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CasNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CasNumber {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CasNumber> for String {
    fn from(value: CasNumber) -> Self {
        value.0
    }
}

impl std::str::FromStr for CasNumber {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Verify the CAS check digit of a hyphenated or bare digit string
///
/// The check digit is the last digit. Every other digit is weighted by its
/// position counted from the right (1, 2, 3, ...), and the weighted sum
/// modulo 10 must equal the check digit. Non-digit characters are ignored.
pub fn cas_checksum_valid(raw: &str) -> bool {
    let digits: Vec<u32> = raw.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < 5 {
        return false;
    }

    let (body, check) = digits.split_at(digits.len() - 1);
    let sum: u32 = body
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| (i as u32 + 1) * d)
        .sum();

    sum % 10 == check[0]
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn with_check_digit(first: u32, second: u32) -> (String, u32) {
        let body = format!("{}{:02}", first, second);
        let sum: u32 = body
            .chars()
            .rev()
            .enumerate()
            .map(|(i, c)| (i as u32 + 1) * c.to_digit(10).unwrap_or(0))
            .sum();
        (format!("{}-{:02}", first, second), sum % 10)
    }

    proptest! {
        /// Property: a correct check digit is accepted, any other digit rejected
        #[test]
        fn test_check_digit_roundtrip(first in 10u32..9_999_999, second in 0u32..100, delta in 1u32..10) {
            let (prefix, check) = with_check_digit(first, second);
            let good = format!("{}-{}", prefix, check);
            let bad = format!("{}-{}", prefix, (check + delta) % 10);

            prop_assert!(CasNumber::parse(&good).is_ok());
            prop_assert!(CasNumber::parse(&bad).is_err());
        }
    }
}

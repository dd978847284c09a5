// models/src/identifiers.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::{ValidationError, ValidationResult};

/// Numeric hospital identifier. Small by construction: it is embedded in
/// registration numbers.
pub type HospitalId = u32;

/// Numeric vaccine catalog identifier.
pub type VaccineId = u32;

const PREFIX: &str = "NC";
const YEAR_DIGITS: usize = 4;
const SEQUENCE_DIGITS: usize = 4;

/// Highest sequence a registration number can carry in a single hospital-year.
pub const MAX_REGISTRATION_SEQUENCE: u32 = 9999;

/// A child's registration number: `NC` + 4-digit year + hospital id padded to
/// two digits + 4-digit sequence, e.g. `NC2024010001`.
///
/// The hospital segment keeps its natural width once the id reaches 100, so
/// the year is always the first four digits and the sequence the last four.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegistrationNumber {
    year: i32,
    hospital_id: HospitalId,
    sequence: u32,
}

impl RegistrationNumber {
    /// Creates a registration number.
    ///
    /// # Errors
    /// Returns a `ValidationError` if the year is not a 4-digit year or the
    /// sequence is outside `1..=9999`.
    pub fn new(year: i32, hospital_id: HospitalId, sequence: u32) -> ValidationResult<Self> {
        if !(1000..=9999).contains(&year) {
            return Err(ValidationError::InvalidValue {
                field: "year",
                reason: format!("{year} is not a 4-digit year"),
            });
        }
        if sequence == 0 || sequence > MAX_REGISTRATION_SEQUENCE {
            return Err(ValidationError::InvalidValue {
                field: "sequence",
                reason: format!("{sequence} is outside 1..={MAX_REGISTRATION_SEQUENCE}"),
            });
        }
        Ok(Self { year, hospital_id, sequence })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn hospital_id(&self) -> HospitalId {
        self.hospital_id
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }
}

impl fmt::Display for RegistrationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}{:04}{:02}{:04}", self.year, self.hospital_id, self.sequence)
    }
}

impl FromStr for RegistrationNumber {
    type Err = ValidationError;

    fn from_str(s: &str) -> ValidationResult<Self> {
        let malformed = || ValidationError::InvalidRegistrationNumber(s.to_string());
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix(PREFIX)
            .or_else(|| trimmed.strip_prefix("nc"))
            .ok_or_else(malformed)?;

        // year + at least two hospital digits + sequence
        if digits.len() < YEAR_DIGITS + 2 + SEQUENCE_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }

        let (year, rest) = digits.split_at(YEAR_DIGITS);
        let (hospital, sequence) = rest.split_at(rest.len() - SEQUENCE_DIGITS);

        let year: i32 = year.parse().map_err(|_| malformed())?;
        let hospital_id: HospitalId = hospital.parse().map_err(|_| malformed())?;
        let sequence: u32 = sequence.parse().map_err(|_| malformed())?;

        let number = Self::new(year, hospital_id, sequence).map_err(|_| malformed())?;
        // Reject non-canonical spellings such as a zero-padded 3-digit hospital segment.
        if number.to_string() != trimmed.to_ascii_uppercase() {
            return Err(malformed());
        }
        Ok(number)
    }
}

impl TryFrom<String> for RegistrationNumber {
    type Error = ValidationError;

    fn try_from(value: String) -> ValidationResult<Self> {
        value.parse()
    }
}

impl From<RegistrationNumber> for String {
    fn from(value: RegistrationNumber) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::RegistrationNumber;
    use crate::errors::ValidationError;
    use core::str::FromStr;

    #[test]
    fn should_format_first_registration_of_the_year() {
        let number = RegistrationNumber::new(2025, 3, 1).unwrap();
        assert_eq!(number.to_string(), "NC2025030001");
    }

    #[test]
    fn should_keep_wide_hospital_ids_unambiguous() {
        let number = RegistrationNumber::new(2024, 123, 45).unwrap();
        assert_eq!(number.to_string(), "NC20241230045");
        assert_eq!(RegistrationNumber::from_str("NC20241230045").unwrap(), number);
    }

    #[test]
    fn should_parse_registration_number() {
        let number = RegistrationNumber::from_str("NC2024010001").unwrap();
        assert_eq!(number.year(), 2024);
        assert_eq!(number.hospital_id(), 1);
        assert_eq!(number.sequence(), 1);
    }

    #[test]
    fn should_accept_lowercase_prefix_and_whitespace() {
        let number = RegistrationNumber::from_str("  nc2024010007 ").unwrap();
        assert_eq!(number.to_string(), "NC2024010007");
    }

    #[test]
    fn should_reject_malformed_numbers() {
        for bad in ["", "NC", "XX2024010001", "NC20240100", "NC2024ab0001", "NC2024010000", "NC20240010001"] {
            assert_eq!(
                RegistrationNumber::from_str(bad).unwrap_err(),
                ValidationError::InvalidRegistrationNumber(bad.to_string()),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn should_reject_sequence_overflow() {
        assert!(RegistrationNumber::new(2025, 1, 10_000).is_err());
        assert!(RegistrationNumber::new(2025, 1, 0).is_err());
    }

    #[test]
    fn should_serialize_as_string() {
        let number = RegistrationNumber::new(2025, 3, 12).unwrap();
        let json = serde_json::to_string(&number).unwrap();
        assert_eq!(json, "\"NC2025030012\"");
        let back: RegistrationNumber = serde_json::from_str(&json).unwrap();
        assert_eq!(back, number);
    }
}

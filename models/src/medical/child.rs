// models/src/medical/child.rs
use std::{fmt, str::FromStr};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{ValidationError, ValidationResult};
use crate::identifiers::{HospitalId, RegistrationNumber};
use crate::validation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => f.write_str("male"),
            Gender::Female => f.write_str("female"),
        }
    }
}

impl FromStr for Gender {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" | "boy" => Ok(Gender::Male),
            "female" | "f" | "girl" => Ok(Gender::Female),
            other => Err(ValidationError::UnknownGender(other.to_string())),
        }
    }
}

/// Parent or guardian contact details; the phone receives SMS notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardianContact {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl GuardianContact {
    pub fn validated(&self) -> ValidationResult<Self> {
        Ok(Self {
            name: validation::require("guardian_name", &self.name)?,
            phone: validation::normalize_phone(&self.phone)?,
            email: validation::validate_optional_email(self.email.as_deref())?,
            address: validation::optional_text(self.address.as_deref()),
        })
    }
}

/// Registration form for a new child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewChild {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub guardian: GuardianContact,
    pub hospital_id: HospitalId,
}

impl NewChild {
    /// Normalises the form; a birth date after `today` is rejected.
    pub fn validated(&self, today: NaiveDate) -> ValidationResult<Self> {
        if self.date_of_birth > today {
            return Err(ValidationError::FutureBirthDate(self.date_of_birth));
        }
        Ok(Self {
            first_name: validation::require("first_name", &self.first_name)?,
            last_name: validation::require("last_name", &self.last_name)?,
            date_of_birth: self.date_of_birth,
            gender: self.gender,
            guardian: self.guardian.validated()?,
            hospital_id: self.hospital_id,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub id: Uuid,
    pub registration_number: RegistrationNumber,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub guardian: GuardianContact,
    pub hospital_id: HospitalId,
    pub registered_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Child {
    pub fn from_new(
        id: Uuid,
        registration_number: RegistrationNumber,
        new: NewChild,
        registered_by: Uuid,
        created_at: DateTime<Utc>,
    ) -> Self {
        Child {
            id,
            registration_number,
            first_name: new.first_name,
            last_name: new.last_name,
            date_of_birth: new.date_of_birth,
            gender: new.gender,
            guardian: new.guardian,
            hospital_id: new.hospital_id,
            registered_by,
            created_at,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Case- and whitespace-insensitive comparison against the full name.
    pub fn matches_full_name(&self, candidate: &str) -> bool {
        normalize_name(candidate) == normalize_name(&self.full_name())
    }

    /// Whole months of age on `on`; zero before birth.
    pub fn age_in_months(&self, on: NaiveDate) -> u32 {
        age_in_months(self.date_of_birth, on)
    }
}

/// Whole calendar months between `birth` and `on`.
pub fn age_in_months(birth: NaiveDate, on: NaiveDate) -> u32 {
    if on <= birth {
        return 0;
    }
    let mut months = (on.year() - birth.year()) * 12 + on.month() as i32 - birth.month() as i32;
    if on.day() < birth.day() {
        months -= 1;
    }
    months.max(0) as u32
}

fn normalize_name(value: &str) -> String {
    value
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn form() -> NewChild {
        NewChild {
            first_name: " Amani ".into(),
            last_name: "Otieno".into(),
            date_of_birth: date(2025, 1, 1),
            gender: Gender::Female,
            guardian: GuardianContact {
                name: "Grace Otieno".into(),
                phone: "0712 345 678".into(),
                email: Some("".into()),
                address: None,
            },
            hospital_id: 3,
        }
    }

    #[test]
    fn should_normalize_registration_form() {
        let valid = form().validated(date(2025, 1, 10)).unwrap();
        assert_eq!(valid.first_name, "Amani");
        assert_eq!(valid.guardian.phone, "0712345678");
        assert_eq!(valid.guardian.email, None);
    }

    #[test]
    fn should_reject_future_birth_date() {
        assert_eq!(
            form().validated(date(2024, 12, 31)),
            Err(ValidationError::FutureBirthDate(date(2025, 1, 1)))
        );
    }

    #[test]
    fn should_reject_missing_names() {
        let mut missing = form();
        missing.last_name = "  ".into();
        assert_eq!(missing.validated(date(2025, 2, 1)), Err(ValidationError::MissingField("last_name")));
    }

    #[test]
    fn should_count_whole_months() {
        assert_eq!(age_in_months(date(2025, 1, 31), date(2025, 2, 28)), 0);
        assert_eq!(age_in_months(date(2025, 1, 15), date(2025, 4, 15)), 3);
        assert_eq!(age_in_months(date(2024, 11, 20), date(2025, 1, 19)), 1);
        assert_eq!(age_in_months(date(2025, 1, 1), date(2024, 1, 1)), 0);
    }

    #[test]
    fn should_match_full_name_loosely() {
        let valid = form().validated(date(2025, 1, 10)).unwrap();
        let child = Child::from_new(
            Uuid::new_v4(),
            RegistrationNumber::new(2025, 3, 1).unwrap(),
            valid,
            Uuid::new_v4(),
            Utc::now(),
        );
        assert!(child.matches_full_name("  amani   OTIENO "));
        assert!(!child.matches_full_name("Amani"));
    }

    #[test]
    fn should_parse_gender_aliases() {
        assert_eq!("M".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!("girl".parse::<Gender>().unwrap(), Gender::Female);
        assert!("x".parse::<Gender>().is_err());
    }
}

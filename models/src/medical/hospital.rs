// models/src/medical/hospital.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationResult;
use crate::identifiers::HospitalId;
use crate::validation;

/// Shown wherever a hospital lookup misses.
pub const UNKNOWN_HOSPITAL_NAME: &str = "Unknown Hospital";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHospital {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    pub id: HospitalId,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewHospital {
    /// Returns a normalised copy, or the first validation failure.
    pub fn validated(&self) -> ValidationResult<Self> {
        Ok(Self {
            name: validation::require("name", &self.name)?,
            address: validation::optional_text(self.address.as_deref()),
            phone: match validation::optional_text(self.phone.as_deref()) {
                Some(phone) => Some(validation::normalize_phone(&phone)?),
                None => None,
            },
            email: validation::validate_optional_email(self.email.as_deref())?,
        })
    }
}

impl Hospital {
    pub fn from_new(id: HospitalId, new: NewHospital, created_at: DateTime<Utc>) -> Self {
        Hospital {
            id,
            name: new.name,
            address: new.address,
            phone: new.phone,
            email: new.email,
            created_at,
        }
    }

    /// Display name for an optional lookup result.
    pub fn display_name(hospital: Option<&Hospital>) -> &str {
        hospital.map_or(UNKNOWN_HOSPITAL_NAME, |h| h.name.as_str())
    }
}

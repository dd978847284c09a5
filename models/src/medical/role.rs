// models/src/medical/role.rs
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Staff roles, ordered by rank. `Ord` follows the rank so `role >= Role::Doctor`
/// reads as "at least a doctor".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Nurse,
    Doctor,
    #[serde(alias = "admin")]
    HospitalAdmin,
    SuperAdmin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Nurse, Role::Doctor, Role::HospitalAdmin, Role::SuperAdmin];

    pub fn rank(self) -> u8 {
        match self {
            Role::Nurse => 1,
            Role::Doctor => 2,
            Role::HospitalAdmin => 3,
            Role::SuperAdmin => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Nurse => "nurse",
            Role::Doctor => "doctor",
            Role::HospitalAdmin => "hospital_admin",
            Role::SuperAdmin => "super_admin",
        }
    }

    /// Every role except the super administrator works inside one hospital.
    pub fn requires_hospital(self) -> bool {
        self != Role::SuperAdmin
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nurse" => Ok(Role::Nurse),
            "doctor" => Ok(Role::Doctor),
            "hospital_admin" | "admin" => Ok(Role::HospitalAdmin),
            "super_admin" => Ok(Role::SuperAdmin),
            other => Err(ValidationError::UnknownRole(other.to_string())),
        }
    }
}

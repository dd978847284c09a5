// models/src/medical/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{ValidationError, ValidationResult};
use crate::identifiers::HospitalId;
use crate::medical::role::Role;
use crate::validation;

pub const MIN_PASSWORD_LENGTH: usize = 8;

// --- DTO for New User Registration ---
// Holds the plaintext password only until it is hashed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub first: String,
    pub last: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub role: Role,
    pub hospital_id: Option<HospitalId>,
}

// --- Stored User Struct ---
// Carries the password hash, never the plaintext password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub first: String,
    pub last: String,
    pub username: String,
    pub email: String,
    // Never hand this struct to clients; use `profile()`.
    pub password_hash: String,
    pub phone: Option<String>,
    pub role: Role,
    pub hospital_id: Option<HospitalId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Staff profile as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub first: String,
    pub last: String,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub hospital_id: Option<HospitalId>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Login {
    pub username: String,
    pub password: String,
}

impl NewUser {
    pub fn validated(&self) -> ValidationResult<Self> {
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ValidationError::InvalidValue {
                field: "password",
                reason: format!("must be at least {MIN_PASSWORD_LENGTH} characters"),
            });
        }
        let hospital_id = match (self.role.requires_hospital(), self.hospital_id) {
            (true, None) => return Err(ValidationError::HospitalRequired(self.role.to_string())),
            (true, Some(id)) => Some(id),
            (false, _) => None,
        };
        Ok(Self {
            first: validation::require("first", &self.first)?,
            last: validation::require("last", &self.last)?,
            username: validation::validate_username(&self.username)?,
            email: validation::validate_email(&self.email)?,
            password: self.password.clone(),
            phone: match validation::optional_text(self.phone.as_deref()) {
                Some(phone) => Some(validation::normalize_phone(&phone)?),
                None => None,
            },
            role: self.role,
            hospital_id,
        })
    }
}

impl User {
    /// Creates a stored user from a validated `NewUser` and an already computed hash.
    pub fn from_new_user(new_user: NewUser, password_hash: String, now: DateTime<Utc>) -> Self {
        User {
            id: Uuid::new_v4(),
            first: new_user.first,
            last: new_user.last,
            username: new_user.username,
            email: new_user.email,
            password_hash,
            phone: new_user.phone,
            role: new_user.role,
            hospital_id: new_user.hospital_id,
            created_at: now,
            updated_at: now,
            last_login: None,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first, self.last)
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            first: self.first.clone(),
            last: self.last.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            role: self.role,
            hospital_id: self.hospital_id,
            created_at: self.created_at,
            last_login: self.last_login,
        }
    }
}

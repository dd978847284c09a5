// models/src/validation.rs
//! Field-level checks shared by the record constructors.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::{ValidationError, ValidationResult};

lazy_static! {
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9]{10,15}$").unwrap();
    static ref EMAIL_RE: Regex = Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").unwrap();
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.\-]{3,50}$").unwrap();
    static ref BLOOD_PRESSURE_RE: Regex = Regex::new(r"^[0-9]{2,3}/[0-9]{2,3}$").unwrap();
}

/// Returns the trimmed value or `MissingField` when nothing is left.
pub fn require(field: &'static str, value: &str) -> ValidationResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

/// Normalises a phone number by dropping spaces, dashes and parentheses,
/// then checks it is 10 to 15 digits with an optional leading `+`.
pub fn normalize_phone(value: &str) -> ValidationResult<String> {
    let compact: String = value
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    if compact.is_empty() {
        return Err(ValidationError::MissingField("phone"));
    }
    if !PHONE_RE.is_match(&compact) {
        return Err(ValidationError::InvalidPhone(value.to_string()));
    }
    Ok(compact)
}

pub fn validate_email(value: &str) -> ValidationResult<String> {
    let trimmed = value.trim();
    if !EMAIL_RE.is_match(trimmed) {
        return Err(ValidationError::InvalidEmail(value.to_string()));
    }
    Ok(trimmed.to_lowercase())
}

/// Empty optional e-mails are treated as absent.
pub fn validate_optional_email(value: Option<&str>) -> ValidationResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(email) => validate_email(email).map(Some),
    }
}

pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn validate_username(value: &str) -> ValidationResult<String> {
    let trimmed = require("username", value)?;
    if !USERNAME_RE.is_match(&trimmed) {
        return Err(ValidationError::InvalidValue {
            field: "username",
            reason: "use 3-50 letters, digits, '.', '_' or '-'".to_string(),
        });
    }
    Ok(trimmed)
}

pub fn validate_blood_pressure(value: &str) -> ValidationResult<String> {
    let trimmed = value.trim();
    if !BLOOD_PRESSURE_RE.is_match(trimmed) {
        return Err(ValidationError::InvalidValue {
            field: "blood_pressure",
            reason: format!("'{trimmed}' is not in systolic/diastolic form"),
        });
    }
    Ok(trimmed.to_string())
}

/// A clinical date must not be in the future nor precede the child's birth.
pub fn validate_event_date(
    field: &'static str,
    date: NaiveDate,
    birth: NaiveDate,
    today: NaiveDate,
) -> ValidationResult<()> {
    if date > today {
        return Err(ValidationError::FutureDate { field, date });
    }
    if date < birth {
        return Err(ValidationError::BeforeBirth { field, date, birth });
    }
    Ok(())
}

/// Accepts only finite, strictly positive measurements.
pub fn validate_measurement(field: &'static str, value: f64) -> ValidationResult<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::InvalidMeasurement(field));
    }
    Ok(value)
}

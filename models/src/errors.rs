// models/src/errors.rs

use chrono::NaiveDate;
pub use thiserror::Error;
use uuid::Uuid;

/// A validation error raised while constructing or checking a domain record.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A required field was empty or absent.
    #[error("required field '{0}' is missing")]
    MissingField(&'static str),
    /// A field was present but its value is unacceptable.
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
    /// A phone number does not look like a dialable number.
    #[error("invalid phone number: {0}")]
    InvalidPhone(String),
    /// An e-mail address is malformed.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    /// A birth date lies after the current date.
    #[error("date of birth {0} is in the future")]
    FutureBirthDate(NaiveDate),
    /// A clinical event date lies after the current date.
    #[error("{field} {date} is in the future")]
    FutureDate { field: &'static str, date: NaiveDate },
    /// A clinical event date precedes the child's birth.
    #[error("{field} {date} precedes date of birth {birth}")]
    BeforeBirth { field: &'static str, date: NaiveDate, birth: NaiveDate },
    /// Vaccine dose numbers start at 1.
    #[error("dose number must be at least 1")]
    InvalidDoseNumber,
    /// A registration number does not follow the `NC<year><hospital><sequence>` layout.
    #[error("registration number '{0}' is malformed")]
    InvalidRegistrationNumber(String),
    /// A role name is not part of the role hierarchy.
    #[error("unknown role '{0}'")]
    UnknownRole(String),
    /// A gender value is not recognised.
    #[error("unknown gender '{0}'")]
    UnknownGender(String),
    /// A staff account other than a super administrator must belong to a hospital.
    #[error("role {0} requires a hospital assignment")]
    HospitalRequired(String),
    /// A measurement was zero, negative or not a finite number.
    #[error("measurement '{0}' must be a positive finite number")]
    InvalidMeasurement(&'static str),
}

/// Raised when a schedule entry is asked to make a transition it cannot make.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScheduleTransitionError {
    #[error("schedule entry {0} has already been completed")]
    AlreadyCompleted(Uuid),
}

/// A type alias for a `Result` that returns a `ValidationError` on failure.
pub type ValidationResult<T> = Result<T, ValidationError>;

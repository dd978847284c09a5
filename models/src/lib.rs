// models/src/lib.rs
//! Typed domain records shared by every NeoCare crate.

pub mod errors;
pub mod identifiers;
pub mod medical;
pub mod validation;

pub use errors::{ScheduleTransitionError, ValidationError, ValidationResult};
pub use identifiers::{HospitalId, RegistrationNumber, VaccineId, MAX_REGISTRATION_SEQUENCE};
pub use medical::*;

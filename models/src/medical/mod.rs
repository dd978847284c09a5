// models/src/medical/mod.rs
pub mod child;
pub mod hospital;
pub mod medical_record;
pub mod role;
pub mod schedule;
pub mod user;
pub mod vaccine;

pub use child::{age_in_months, Child, Gender, GuardianContact, NewChild};
pub use hospital::{Hospital, NewHospital, UNKNOWN_HOSPITAL_NAME};
pub use medical_record::{MedicalRecord, NewMedicalRecord};
pub use role::Role;
pub use schedule::{ScheduleClassification, ScheduleEntry, ScheduleStatus, VaccinationCompletion};
pub use user::{Login, NewUser, User, UserProfile};
pub use vaccine::{NewVaccine, Vaccine, VaccineUpdate};

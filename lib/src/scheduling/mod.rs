// lib/src/scheduling/mod.rs
//! Vaccination schedules: generation at registration, status classification,
//! recording of administered doses and guardian reminders.

pub mod builder;
pub mod recorder;
pub mod reminders;
pub mod status;

pub use builder::{active_catalog, build_schedule};
pub use recorder::{RecordVaccination, VaccinationOutcome, VaccinationRecorder};
pub use reminders::{Reminder, ReminderPlanner, ReminderRun};
pub use status::{
    classify, classify_schedule, counts_by_child, counts_by_hospital, counts_by_vaccine, percentage, ChildProgress,
    ClassifiedEntry, StatusCounts,
};

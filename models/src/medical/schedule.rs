// models/src/medical/schedule.rs
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ScheduleTransitionError;
use crate::identifiers::VaccineId;

/// Stored status of a schedule entry. Overdue, due and upcoming are derived
/// against the current date and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Pending,
    Completed,
}

/// Query-time classification of a schedule entry relative to "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleClassification {
    Completed,
    Overdue,
    DueToday,
    Upcoming,
}

impl fmt::Display for ScheduleClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScheduleClassification::Completed => "completed",
            ScheduleClassification::Overdue => "overdue",
            ScheduleClassification::DueToday => "due_today",
            ScheduleClassification::Upcoming => "upcoming",
        })
    }
}

/// One scheduled dose of one vaccine for one child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: Uuid,
    pub child_id: Uuid,
    pub vaccine_id: VaccineId,
    pub scheduled_date: NaiveDate,
    pub status: ScheduleStatus,
    pub administered_date: Option<NaiveDate>,
    pub administered_by: Option<Uuid>,
    pub notes: Option<String>,
}

/// Details stamped onto an entry when the dose is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaccinationCompletion {
    pub administered_date: NaiveDate,
    pub administered_by: Uuid,
    pub notes: Option<String>,
}

impl ScheduleEntry {
    pub fn pending(child_id: Uuid, vaccine_id: VaccineId, scheduled_date: NaiveDate) -> Self {
        ScheduleEntry {
            id: Uuid::new_v4(),
            child_id,
            vaccine_id,
            scheduled_date,
            status: ScheduleStatus::Pending,
            administered_date: None,
            administered_by: None,
            notes: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ScheduleStatus::Pending
    }

    /// Performs the single pending → completed transition.
    pub fn complete(&mut self, completion: &VaccinationCompletion) -> Result<(), ScheduleTransitionError> {
        if !self.is_pending() {
            return Err(ScheduleTransitionError::AlreadyCompleted(self.id));
        }
        self.status = ScheduleStatus::Completed;
        self.administered_date = Some(completion.administered_date);
        self.administered_by = Some(completion.administered_by);
        self.notes = completion.notes.clone();
        Ok(())
    }
}

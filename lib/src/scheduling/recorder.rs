// lib/src/scheduling/recorder.rs
use std::sync::Arc;

use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::validation::{optional_text, validate_event_date};
use models::{Child, ScheduleEntry, VaccinationCompletion};
use notifications_service::{NotificationDispatcher, SmsMessage};

use crate::clock::Clock;
use crate::errors::{NeoCareError, Result};
use crate::storage_engine::StorageEngine;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordVaccination {
    pub entry_id: Uuid,
    pub administered_date: NaiveDate,
    pub administered_by: Uuid,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VaccinationOutcome {
    pub entry: ScheduleEntry,
    /// Whether the confirmation SMS made it onto the queue.
    pub notification_queued: bool,
}

/// Performs the pending → completed transition and queues the guardian's
/// confirmation once the write has committed.
#[derive(Clone)]
pub struct VaccinationRecorder {
    storage: Arc<dyn StorageEngine>,
    clock: Arc<dyn Clock>,
    notifier: Option<NotificationDispatcher>,
}

impl VaccinationRecorder {
    pub fn new(storage: Arc<dyn StorageEngine>, clock: Arc<dyn Clock>, notifier: Option<NotificationDispatcher>) -> Self {
        VaccinationRecorder { storage, clock, notifier }
    }

    /// `authorize` sees the owning child before anything is written.
    pub async fn record<F>(&self, request: &RecordVaccination, authorize: F) -> Result<VaccinationOutcome>
    where
        F: FnOnce(&Child) -> Result<()> + Send,
    {
        let entry = self
            .storage
            .get_schedule_entry(&request.entry_id)
            .await?
            .ok_or_else(|| NeoCareError::NotFound(format!("schedule entry {}", request.entry_id)))?;
        let child = self
            .storage
            .get_child(&entry.child_id)
            .await?
            .ok_or_else(|| NeoCareError::NotFound(format!("child {}", entry.child_id)))?;
        authorize(&child)?;

        if !entry.is_pending() {
            warn!("Rejected second recording of schedule entry {}", entry.id);
            return Err(NeoCareError::InvalidState(format!(
                "schedule entry {} has already been completed",
                entry.id
            )));
        }
        validate_event_date("administered_date", request.administered_date, child.date_of_birth, self.clock.today())?;

        let completion = VaccinationCompletion {
            administered_date: request.administered_date,
            administered_by: request.administered_by,
            notes: optional_text(request.notes.as_deref()),
        };
        let completed = self.storage.complete_schedule_entry(&entry.id, &completion).await?;
        info!(
            "Recorded vaccine {} for child {} on {} by {}",
            completed.vaccine_id, child.registration_number, request.administered_date, request.administered_by
        );

        let notification_queued = self.notify(&child, &completed).await;
        Ok(VaccinationOutcome { entry: completed, notification_queued })
    }

    async fn notify(&self, child: &Child, entry: &ScheduleEntry) -> bool {
        let Some(notifier) = &self.notifier else {
            return false;
        };
        let administered_on = entry.administered_date.unwrap_or(entry.scheduled_date);
        match self.storage.get_vaccine(entry.vaccine_id).await {
            Ok(Some(vaccine)) => notifier.enqueue(SmsMessage::vaccination_administered(child, &vaccine, administered_on)),
            Ok(None) => {
                warn!("Vaccine {} vanished before confirmation SMS for entry {}", entry.vaccine_id, entry.id);
                false
            }
            Err(e) => {
                warn!("Could not prepare confirmation SMS for entry {}: {}", entry.id, e);
                false
            }
        }
    }
}

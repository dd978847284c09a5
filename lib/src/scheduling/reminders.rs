// lib/src/scheduling/reminders.rs
use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use log::info;
use serde::Serialize;
use uuid::Uuid;

use models::{Child, Hospital, HospitalId, ScheduleClassification, ScheduleEntry, Vaccine, VaccineId};
use notifications_service::{NotificationDispatcher, SmsMessage};

use crate::errors::Result;
use crate::scheduling::status::classify;
use crate::storage_engine::StorageEngine;

#[derive(Debug, Clone, Serialize)]
pub struct Reminder {
    pub child_id: Uuid,
    pub entry_id: Uuid,
    pub scheduled_date: NaiveDate,
    pub classification: ScheduleClassification,
    pub message: SmsMessage,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReminderRun {
    pub planned: usize,
    pub queued: usize,
    pub dropped: usize,
}

/// Picks pending entries worth a reminder: overdue ones, and those falling
/// between today and `today + lookahead_days`. Deactivated vaccines are skipped.
#[derive(Debug, Clone, Copy)]
pub struct ReminderPlanner {
    lookahead_days: u32,
}

impl ReminderPlanner {
    pub fn new(lookahead_days: u32) -> Self {
        ReminderPlanner { lookahead_days }
    }

    pub fn plan(
        &self,
        children: &[Child],
        entries: &[ScheduleEntry],
        vaccines: &[Vaccine],
        hospitals: &[Hospital],
        today: NaiveDate,
    ) -> Vec<Reminder> {
        let horizon = today.checked_add_days(Days::new(u64::from(self.lookahead_days))).unwrap_or(today);
        let children: HashMap<Uuid, &Child> = children.iter().map(|c| (c.id, c)).collect();
        let vaccines: HashMap<VaccineId, &Vaccine> = vaccines.iter().map(|v| (v.id, v)).collect();
        let hospitals: HashMap<HospitalId, &Hospital> = hospitals.iter().map(|h| (h.id, h)).collect();

        let mut reminders: Vec<Reminder> = entries
            .iter()
            .filter_map(|entry| {
                let classification = classify(entry, today);
                let due_soon = matches!(
                    classification,
                    ScheduleClassification::DueToday | ScheduleClassification::Upcoming
                ) && entry.scheduled_date <= horizon;
                if classification != ScheduleClassification::Overdue && !due_soon {
                    return None;
                }
                let child = children.get(&entry.child_id)?;
                let vaccine = vaccines.get(&entry.vaccine_id).filter(|v| v.active)?;
                let hospital_name = Hospital::display_name(hospitals.get(&child.hospital_id).copied());
                let message = if classification == ScheduleClassification::Overdue {
                    SmsMessage::overdue_reminder(child, vaccine, entry.scheduled_date, hospital_name)
                } else {
                    SmsMessage::due_reminder(child, vaccine, entry.scheduled_date, hospital_name)
                };
                Some(Reminder {
                    child_id: child.id,
                    entry_id: entry.id,
                    scheduled_date: entry.scheduled_date,
                    classification,
                    message,
                })
            })
            .collect();
        reminders.sort_by_key(|r| (r.scheduled_date, r.child_id));
        reminders
    }

    /// Plans reminders for one hospital (or all) and queues them.
    pub async fn run(
        &self,
        storage: &dyn StorageEngine,
        dispatcher: &NotificationDispatcher,
        hospital_id: Option<HospitalId>,
        today: NaiveDate,
    ) -> Result<ReminderRun> {
        let children = storage.list_children(hospital_id).await?;
        let mut entries = Vec::new();
        for child in &children {
            entries.extend(storage.list_schedule_for_child(&child.id).await?);
        }
        let vaccines = storage.list_vaccines().await?;
        let hospitals = storage.list_hospitals().await?;

        let reminders = self.plan(&children, &entries, &vaccines, &hospitals, today);
        let mut run = ReminderRun { planned: reminders.len(), ..Default::default() };
        for reminder in reminders {
            if dispatcher.enqueue(reminder.message) {
                run.queued += 1;
            } else {
                run.dropped += 1;
            }
        }
        info!(
            "Reminder run for {:?}: {} planned, {} queued, {} dropped",
            hospital_id, run.planned, run.queued, run.dropped
        );
        Ok(run)
    }
}

// lib/src/registration.rs
//! Child registration: number allocation and the registration flow that
//! stores a child together with its vaccination schedule.

use std::sync::Arc;

use log::{info, warn};
use serde::Serialize;
use uuid::Uuid;

use models::{Child, Hospital, HospitalId, NewChild, RegistrationNumber, MAX_REGISTRATION_SEQUENCE};
use notifications_service::{NotificationDispatcher, SmsMessage};

use crate::clock::Clock;
use crate::errors::{NeoCareError, Result};
use crate::scheduling::build_schedule;
use crate::storage_engine::{ChildRegistration, StorageEngine};

/// Yields candidate numbers after `last_sequence` for one (hospital, year).
/// Storage skips candidates already taken in the registration index and
/// persists the sequence of the one it keeps.
#[derive(Debug, Clone)]
pub struct RegistrationNumberGenerator {
    year: i32,
    hospital_id: HospitalId,
    next_sequence: u64,
    exhausted: bool,
}

impl RegistrationNumberGenerator {
    pub fn after(year: i32, hospital_id: HospitalId, last_sequence: u64) -> Self {
        RegistrationNumberGenerator {
            year,
            hospital_id,
            next_sequence: last_sequence.saturating_add(1),
            exhausted: false,
        }
    }

    /// Counter key for the (hospital, year) pair.
    pub fn counter_key(hospital_id: HospitalId, year: i32) -> String {
        format!("reg:{}:{}", hospital_id, year)
    }
}

impl Iterator for RegistrationNumberGenerator {
    type Item = Result<RegistrationNumber>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        if self.next_sequence > u64::from(MAX_REGISTRATION_SEQUENCE) {
            self.exhausted = true;
            return Some(Err(NeoCareError::InvalidState(format!(
                "registration sequence for hospital {} in {} is exhausted (max {})",
                self.hospital_id, self.year, MAX_REGISTRATION_SEQUENCE
            ))));
        }
        let sequence = self.next_sequence as u32;
        self.next_sequence += 1;
        match RegistrationNumber::new(self.year, self.hospital_id, sequence) {
            Ok(number) => Some(Ok(number)),
            Err(e) => {
                self.exhausted = true;
                Some(Err(e.into()))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisteredChild {
    pub child: Child,
    pub schedule_entries: usize,
    pub notification_queued: bool,
}

#[derive(Clone)]
pub struct ChildRegistrar {
    storage: Arc<dyn StorageEngine>,
    clock: Arc<dyn Clock>,
    notifier: Option<NotificationDispatcher>,
}

impl ChildRegistrar {
    pub fn new(storage: Arc<dyn StorageEngine>, clock: Arc<dyn Clock>, notifier: Option<NotificationDispatcher>) -> Self {
        ChildRegistrar { storage, clock, notifier }
    }

    /// Validates the form, builds the schedule from the active catalog and
    /// stores both in one transaction. The welcome SMS is queued afterwards.
    pub async fn register(&self, form: &NewChild, registered_by: Uuid) -> Result<RegisteredChild> {
        let details = form.validated(self.clock.today())?;
        let hospital = self
            .storage
            .get_hospital(details.hospital_id)
            .await?
            .ok_or_else(|| NeoCareError::NotFound(format!("hospital {}", details.hospital_id)))?;
        let vaccines = self.storage.list_vaccines().await?;

        let child_id = Uuid::new_v4();
        let schedule = build_schedule(child_id, details.date_of_birth, &vaccines)?;
        let schedule_entries = schedule.len();
        let child = self
            .storage
            .register_child(ChildRegistration {
                child_id,
                details,
                registered_by,
                registered_at: self.clock.now(),
                year: self.clock.current_year(),
                schedule,
            })
            .await?;
        info!("Child {} registered at {} by {}", child.registration_number, hospital.name, registered_by);

        let notification_queued = match &self.notifier {
            Some(notifier) => notifier.enqueue(SmsMessage::welcome(&child, Hospital::display_name(Some(&hospital)))),
            None => {
                warn!("SMS disabled, no welcome message for {}", child.registration_number);
                false
            }
        };
        Ok(RegisteredChild { child, schedule_entries, notification_queued })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage_engine::{ChildStorage, ScheduleStorage};
    use crate::test_support::{date, new_child, seed_bcg_opv, seed_hospitals, storage};
    use models::ValidationError;

    #[test]
    fn should_start_after_stored_counter() {
        let mut generator = RegistrationNumberGenerator::after(2025, 3, 0);
        assert_eq!(generator.next().unwrap().unwrap().to_string(), "NC2025030001");
        assert_eq!(generator.next().unwrap().unwrap().to_string(), "NC2025030002");
    }

    #[test]
    fn should_print_wide_hospital_ids_naturally() {
        let mut generator = RegistrationNumberGenerator::after(2025, 123, 41);
        assert_eq!(generator.next().unwrap().unwrap().to_string(), "NC20251230042");
    }

    #[test]
    fn should_reject_sequence_beyond_9999() {
        let mut generator = RegistrationNumberGenerator::after(2025, 3, 9998);
        assert_eq!(generator.next().unwrap().unwrap().sequence(), 9999);
        assert!(matches!(generator.next(), Some(Err(NeoCareError::InvalidState(_)))));
        assert!(generator.next().is_none());
    }

    #[tokio::test]
    async fn should_register_child_with_full_schedule() {
        let storage = storage();
        seed_hospitals(&storage, 3).await;
        seed_bcg_opv(&storage).await;
        let registrar = ChildRegistrar::new(Arc::new(storage.clone()), Arc::new(FixedClock::new(date(2025, 3, 1))), None);

        let registered = registrar.register(&new_child(3), Uuid::new_v4()).await.unwrap();
        assert_eq!(registered.child.registration_number.to_string(), "NC2025030001");
        assert_eq!(registered.schedule_entries, 2);

        let schedule = storage.list_schedule_for_child(&registered.child.id).await.unwrap();
        let dates: Vec<_> = schedule.iter().map(|e| e.scheduled_date).collect();
        assert_eq!(dates, vec![date(2025, 1, 1), date(2025, 2, 12)]);
    }

    #[tokio::test]
    async fn should_register_child_without_schedule_when_catalog_empty() {
        let storage = storage();
        seed_hospitals(&storage, 1).await;
        let registrar = ChildRegistrar::new(Arc::new(storage.clone()), Arc::new(FixedClock::new(date(2025, 3, 1))), None);
        let registered = registrar.register(&new_child(1), Uuid::new_v4()).await.unwrap();
        assert_eq!(registered.schedule_entries, 0);
    }

    #[tokio::test]
    async fn should_reject_future_birth_date_without_writing() {
        let storage = storage();
        seed_hospitals(&storage, 1).await;
        let registrar = ChildRegistrar::new(Arc::new(storage.clone()), Arc::new(FixedClock::new(date(2024, 12, 1))), None);
        let err = registrar.register(&new_child(1), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, NeoCareError::Validation(ValidationError::FutureBirthDate(_))));
        assert!(storage.list_children(None).await.unwrap().is_empty());
    }
}

// rest_api/src/state.rs
use std::sync::Arc;

use neocare_lib::scheduling::{ReminderPlanner, VaccinationRecorder};
use neocare_lib::{ChildRegistrar, Clock, StorageEngine};
use notifications_service::NotificationDispatcher;
use security::{AccessPolicy, JwtKeys};

/// Shared state for the Axum application.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn StorageEngine>,
    pub clock: Arc<dyn Clock>,
    pub policy: Arc<AccessPolicy>,
    pub keys: Arc<JwtKeys>,
    pub dispatcher: NotificationDispatcher,
    pub registrar: ChildRegistrar,
    pub recorder: VaccinationRecorder,
    pub reminders: ReminderPlanner,
}

impl AppState {
    pub fn new(
        storage: Arc<dyn StorageEngine>,
        clock: Arc<dyn Clock>,
        policy: AccessPolicy,
        keys: JwtKeys,
        dispatcher: NotificationDispatcher,
        reminder_lookahead_days: u32,
    ) -> Self {
        AppState {
            registrar: ChildRegistrar::new(storage.clone(), clock.clone(), Some(dispatcher.clone())),
            recorder: VaccinationRecorder::new(storage.clone(), clock.clone(), Some(dispatcher.clone())),
            reminders: ReminderPlanner::new(reminder_lookahead_days),
            storage,
            clock,
            policy: Arc::new(policy),
            keys: Arc::new(keys),
            dispatcher,
        }
    }
}

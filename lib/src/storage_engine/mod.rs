// lib/src/storage_engine/mod.rs

pub mod sled_storage;
pub mod storage_engine;
pub mod storage_utils;

use std::sync::Arc;

pub use sled_storage::SledStorage;
pub use storage_engine::{
    ChildRegistration, ChildStorage, HospitalStorage, MedicalRecordStorage, ScheduleStorage, StorageEngine,
    UserStorageEngine, VaccineStorage,
};

use crate::config::StorageConfig;
use crate::errors::Result;

/// Opens the configured storage behind the `StorageEngine` seam.
pub fn open_storage(config: &StorageConfig) -> Result<Arc<dyn StorageEngine>> {
    Ok(Arc::new(SledStorage::open(config)?))
}

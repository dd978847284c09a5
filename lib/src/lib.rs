// lib/src/lib.rs
//! NeoCare core: storage engine, registration, vaccination schedules, growth
//! estimates and reports. HTTP and authentication live in other crates.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod errors;
pub mod growth;
pub mod registration;
pub mod reports;
pub mod scheduling;
pub mod storage_engine;

#[cfg(test)]
pub(crate) mod test_support;

pub use clock::{Clock, FixedClock, SystemClock};
pub use crate::config::AppConfig;
pub use errors::{NeoCareError, Result};
pub use registration::{ChildRegistrar, RegisteredChild, RegistrationNumberGenerator};
pub use storage_engine::{open_storage, SledStorage, StorageEngine};

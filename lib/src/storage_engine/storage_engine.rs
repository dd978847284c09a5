// lib/src/storage_engine/storage_engine.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use models::{
    Child, Hospital, HospitalId, MedicalRecord, NewChild, NewHospital, NewVaccine, RegistrationNumber,
    ScheduleEntry, User, VaccinationCompletion, Vaccine, VaccineId, VaccineUpdate,
};

use crate::errors::Result;

/// Everything needed to register one child in a single transaction.
#[derive(Debug, Clone)]
pub struct ChildRegistration {
    pub child_id: Uuid,
    /// Already validated.
    pub details: NewChild,
    pub registered_by: Uuid,
    pub registered_at: DateTime<Utc>,
    /// Year used for the registration number.
    pub year: i32,
    /// Pending entries for `child_id`, built from the active catalog.
    pub schedule: Vec<ScheduleEntry>,
}

#[async_trait]
pub trait HospitalStorage: Send + Sync + 'static {
    /// Assigns the next hospital id and stores the hospital.
    async fn create_hospital(&self, hospital: NewHospital, created_at: DateTime<Utc>) -> Result<Hospital>;
    async fn get_hospital(&self, id: HospitalId) -> Result<Option<Hospital>>;
    async fn list_hospitals(&self) -> Result<Vec<Hospital>>;
    /// Fails with `StillReferenced` while children or staff belong to it.
    async fn delete_hospital(&self, id: HospitalId) -> Result<()>;
}

#[async_trait]
pub trait UserStorageEngine: Send + Sync + 'static {
    /// Adds a new user. Usernames are unique regardless of case.
    async fn add_user(&self, user: &User) -> Result<()>;
    /// Updates an existing user. The username cannot change.
    async fn update_user(&self, user: &User) -> Result<()>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>>;
    /// All users, or the staff of one hospital.
    async fn list_users(&self, hospital_id: Option<HospitalId>) -> Result<Vec<User>>;
}

#[async_trait]
pub trait VaccineStorage: Send + Sync + 'static {
    async fn create_vaccine(&self, vaccine: NewVaccine, created_at: DateTime<Utc>) -> Result<Vaccine>;
    async fn get_vaccine(&self, id: VaccineId) -> Result<Option<Vaccine>>;
    /// Catalog order: (age_weeks, dose_number, id).
    async fn list_vaccines(&self) -> Result<Vec<Vaccine>>;
    /// Only the active flag may change once schedule entries reference the vaccine.
    async fn update_vaccine(&self, id: VaccineId, update: &VaccineUpdate) -> Result<Vaccine>;
    async fn delete_vaccine(&self, id: VaccineId) -> Result<()>;
}

#[async_trait]
pub trait ChildStorage: Send + Sync + 'static {
    /// Allocates the registration number and stores the child with its
    /// schedule atomically.
    async fn register_child(&self, registration: ChildRegistration) -> Result<Child>;
    async fn get_child(&self, id: &Uuid) -> Result<Option<Child>>;
    async fn get_child_by_registration(&self, number: &RegistrationNumber) -> Result<Option<Child>>;
    async fn list_children(&self, hospital_id: Option<HospitalId>) -> Result<Vec<Child>>;
}

#[async_trait]
pub trait ScheduleStorage: Send + Sync + 'static {
    async fn get_schedule_entry(&self, id: &Uuid) -> Result<Option<ScheduleEntry>>;
    /// Entries of one child ordered by scheduled date.
    async fn list_schedule_for_child(&self, child_id: &Uuid) -> Result<Vec<ScheduleEntry>>;
    async fn list_schedule_entries(&self) -> Result<Vec<ScheduleEntry>>;
    /// Moves a pending entry to completed. Fails with `InvalidState` and
    /// leaves the entry untouched when it is no longer pending.
    async fn complete_schedule_entry(&self, id: &Uuid, completion: &VaccinationCompletion) -> Result<ScheduleEntry>;
}

#[async_trait]
pub trait MedicalRecordStorage: Send + Sync + 'static {
    async fn add_medical_record(&self, record: &MedicalRecord) -> Result<()>;
    /// Records of one child ordered by visit date.
    async fn list_medical_records(&self, child_id: &Uuid) -> Result<Vec<MedicalRecord>>;
}

#[async_trait]
pub trait StorageEngine:
    HospitalStorage + UserStorageEngine + VaccineStorage + ChildStorage + ScheduleStorage + MedicalRecordStorage
{
    async fn flush(&self) -> Result<()>;
}

// lib/src/storage_engine/sled_storage.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use sled::{Db, Transactional, Tree};
use uuid::Uuid;

use models::{
    Child, Hospital, HospitalId, MedicalRecord, NewHospital, NewVaccine, RegistrationNumber, ScheduleEntry, User,
    VaccinationCompletion, Vaccine, VaccineId, VaccineUpdate,
};

use crate::config::StorageConfig;
use crate::errors::{NeoCareError, Result};
use crate::registration::RegistrationNumberGenerator;
use crate::storage_engine::storage_engine::{
    ChildRegistration, ChildStorage, HospitalStorage, MedicalRecordStorage, ScheduleStorage, StorageEngine,
    UserStorageEngine, VaccineStorage,
};
use crate::storage_engine::storage_utils::*;

/// Sled-backed implementation of every storage trait. One tree per record
/// type plus index and counter trees; multi-tree transactions keep them in step.
#[derive(Clone)]
pub struct SledStorage {
    db: Db,
    hospitals: Tree,
    users: Tree,
    usernames: Tree,
    vaccines: Tree,
    children: Tree,
    registrations: Tree,
    schedules: Tree,
    schedule_locator: Tree,
    medical_records: Tree,
    counters: Tree,
}

impl SledStorage {
    pub fn open(config: &StorageConfig) -> Result<Self> {
        let sled_config = sled::Config::new()
            .cache_capacity(config.cache_capacity)
            .use_compression(config.use_compression);
        let sled_config = if config.temporary {
            sled_config.temporary(true)
        } else {
            std::fs::create_dir_all(&config.data_directory)?;
            sled_config.path(&config.data_directory)
        };
        let db = sled_config.open()?;
        info!(
            "Opened sled database at {} (temporary: {})",
            config.data_directory.display(),
            config.temporary
        );
        Self::from_db(db)
    }

    /// In-memory database removed on drop.
    pub fn temporary() -> Result<Self> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: Db) -> Result<Self> {
        Ok(Self {
            hospitals: db.open_tree("hospitals")?,
            users: db.open_tree("users")?,
            usernames: db.open_tree("usernames")?,
            vaccines: db.open_tree("vaccines")?,
            children: db.open_tree("children")?,
            registrations: db.open_tree("registrations")?,
            schedules: db.open_tree("schedules")?,
            schedule_locator: db.open_tree("schedule_locator")?,
            medical_records: db.open_tree("medical_records")?,
            counters: db.open_tree("counters")?,
            db,
        })
    }

    fn decode_all<T: serde::de::DeserializeOwned>(iter: sled::Iter) -> Result<Vec<T>> {
        let mut values = Vec::new();
        for item in iter {
            let (_key, value) = item?;
            values.push(deserialize(&value)?);
        }
        Ok(values)
    }
}

#[async_trait]
impl HospitalStorage for SledStorage {
    async fn create_hospital(&self, hospital: NewHospital, created_at: DateTime<Utc>) -> Result<Hospital> {
        let created = (&self.hospitals, &self.counters).transaction(|(hospitals, counters)| -> TxResult<Hospital> {
            let id = tx_adjust_counter(counters, SEQ_HOSPITAL, 1)?;
            let id = u32::try_from(id)
                .map_err(|_| abort(NeoCareError::InvalidState("hospital id space exhausted".to_string())))?;
            let record = Hospital::from_new(id, hospital.clone(), created_at);
            hospitals.insert(u32_key(id), tx_encode(&record)?)?;
            Ok(record)
        })?;
        info!("Created hospital {} ({})", created.id, created.name);
        Ok(created)
    }

    async fn get_hospital(&self, id: HospitalId) -> Result<Option<Hospital>> {
        self.hospitals.get(u32_key(id))?.map(|v| deserialize(&v)).transpose()
    }

    async fn list_hospitals(&self) -> Result<Vec<Hospital>> {
        Self::decode_all(self.hospitals.iter())
    }

    async fn delete_hospital(&self, id: HospitalId) -> Result<()> {
        (&self.hospitals, &self.counters).transaction(|(hospitals, counters)| -> TxResult<()> {
            if hospitals.get(u32_key(id))?.is_none() {
                return Err(abort(NeoCareError::NotFound(format!("hospital {}", id))));
            }
            let children = tx_counter(counters, &hospital_children_key(id))?;
            let staff = tx_counter(counters, &hospital_users_key(id))?;
            if children > 0 || staff > 0 {
                return Err(abort(NeoCareError::StillReferenced(format!(
                    "hospital {} still has {} registered children and {} staff members",
                    id, children, staff
                ))));
            }
            hospitals.remove(u32_key(id))?;
            Ok(())
        })?;
        info!("Deleted hospital {}", id);
        Ok(())
    }
}

#[async_trait]
impl UserStorageEngine for SledStorage {
    async fn add_user(&self, user: &User) -> Result<()> {
        let name_key = user.username.to_lowercase();
        (&self.users, &self.usernames, &self.hospitals, &self.counters).transaction(
            |(users, usernames, hospitals, counters)| -> TxResult<()> {
                if usernames.get(name_key.as_bytes())?.is_some() {
                    return Err(abort(NeoCareError::AlreadyExists(format!("username '{}'", user.username))));
                }
                if users.get(user.id.as_bytes())?.is_some() {
                    return Err(abort(NeoCareError::AlreadyExists(format!("user {}", user.id))));
                }
                if let Some(hospital_id) = user.hospital_id {
                    if hospitals.get(u32_key(hospital_id))?.is_none() {
                        return Err(abort(NeoCareError::NotFound(format!("hospital {}", hospital_id))));
                    }
                    tx_adjust_counter(counters, &hospital_users_key(hospital_id), 1)?;
                }
                usernames.insert(name_key.as_bytes(), user.id.as_bytes().to_vec())?;
                users.insert(user.id.as_bytes().to_vec(), tx_encode(user)?)?;
                Ok(())
            },
        )?;
        debug!("Stored user {} ({})", user.username, user.role);
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        (&self.users, &self.hospitals, &self.counters).transaction(|(users, hospitals, counters)| -> TxResult<()> {
            let existing = users
                .get(user.id.as_bytes())?
                .ok_or_else(|| abort(NeoCareError::NotFound(format!("user {}", user.id))))?;
            let existing: User = tx_decode(&existing)?;
            if !existing.username.eq_ignore_ascii_case(&user.username) {
                return Err(abort(NeoCareError::InvalidState("usernames cannot be changed".to_string())));
            }
            if existing.hospital_id != user.hospital_id {
                if let Some(new_hospital) = user.hospital_id {
                    if hospitals.get(u32_key(new_hospital))?.is_none() {
                        return Err(abort(NeoCareError::NotFound(format!("hospital {}", new_hospital))));
                    }
                    tx_adjust_counter(counters, &hospital_users_key(new_hospital), 1)?;
                }
                if let Some(old_hospital) = existing.hospital_id {
                    tx_adjust_counter(counters, &hospital_users_key(old_hospital), -1)?;
                }
            }
            users.insert(user.id.as_bytes().to_vec(), tx_encode(user)?)?;
            Ok(())
        })?;
        Ok(())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        match self.usernames.get(username.trim().to_lowercase().as_bytes())? {
            Some(id) => self.get_user_by_id(&uuid_from_ivec(&id)?).await,
            None => Ok(None),
        }
    }

    async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        self.users.get(id.as_bytes())?.map(|v| deserialize(&v)).transpose()
    }

    async fn list_users(&self, hospital_id: Option<HospitalId>) -> Result<Vec<User>> {
        let mut users: Vec<User> = Self::decode_all(self.users.iter())?;
        if let Some(hospital_id) = hospital_id {
            users.retain(|u| u.hospital_id == Some(hospital_id));
        }
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }
}

#[async_trait]
impl VaccineStorage for SledStorage {
    async fn create_vaccine(&self, vaccine: NewVaccine, created_at: DateTime<Utc>) -> Result<Vaccine> {
        let created = (&self.vaccines, &self.counters).transaction(|(vaccines, counters)| -> TxResult<Vaccine> {
            let id = tx_adjust_counter(counters, SEQ_VACCINE, 1)?;
            let id = u32::try_from(id)
                .map_err(|_| abort(NeoCareError::InvalidState("vaccine id space exhausted".to_string())))?;
            let record = Vaccine::from_new(id, vaccine.clone(), created_at);
            vaccines.insert(u32_key(id), tx_encode(&record)?)?;
            Ok(record)
        })?;
        info!("Added vaccine {} ({})", created.id, created.label());
        Ok(created)
    }

    async fn get_vaccine(&self, id: VaccineId) -> Result<Option<Vaccine>> {
        self.vaccines.get(u32_key(id))?.map(|v| deserialize(&v)).transpose()
    }

    async fn list_vaccines(&self) -> Result<Vec<Vaccine>> {
        let mut vaccines: Vec<Vaccine> = Self::decode_all(self.vaccines.iter())?;
        vaccines.sort_by_key(|v| (v.age_weeks, v.dose_number, v.id));
        Ok(vaccines)
    }

    async fn update_vaccine(&self, id: VaccineId, update: &VaccineUpdate) -> Result<Vaccine> {
        let updated = (&self.vaccines, &self.counters).transaction(|(vaccines, counters)| -> TxResult<Vaccine> {
            let current = vaccines
                .get(u32_key(id))?
                .ok_or_else(|| abort(NeoCareError::NotFound(format!("vaccine {}", id))))?;
            let current: Vaccine = tx_decode(&current)?;
            let references = tx_counter(counters, &vaccine_schedules_key(id))?;
            if references > 0 && !update.is_active_flag_only() {
                return Err(abort(NeoCareError::StillReferenced(format!(
                    "vaccine {} is used by {} schedule entries; only its active flag can change",
                    id, references
                ))));
            }
            let next = current.apply(update).map_err(abort)?;
            vaccines.insert(u32_key(id), tx_encode(&next)?)?;
            Ok(next)
        })?;
        info!("Updated vaccine {} ({}, active: {})", updated.id, updated.label(), updated.active);
        Ok(updated)
    }

    async fn delete_vaccine(&self, id: VaccineId) -> Result<()> {
        (&self.vaccines, &self.counters).transaction(|(vaccines, counters)| -> TxResult<()> {
            if vaccines.get(u32_key(id))?.is_none() {
                return Err(abort(NeoCareError::NotFound(format!("vaccine {}", id))));
            }
            let references = tx_counter(counters, &vaccine_schedules_key(id))?;
            if references > 0 {
                return Err(abort(NeoCareError::StillReferenced(format!(
                    "vaccine {} is used by {} schedule entries; deactivate it instead",
                    id, references
                ))));
            }
            vaccines.remove(u32_key(id))?;
            Ok(())
        })?;
        info!("Deleted vaccine {}", id);
        Ok(())
    }
}

#[async_trait]
impl ChildStorage for SledStorage {
    async fn register_child(&self, registration: ChildRegistration) -> Result<Child> {
        let hospital_id = registration.details.hospital_id;
        let trees = (
            &self.hospitals,
            &self.vaccines,
            &self.children,
            &self.registrations,
            &self.schedules,
            &self.schedule_locator,
            &self.counters,
        );
        let child = trees.transaction(
            |(hospitals, vaccines, children, registrations, schedules, locator, counters)| -> TxResult<Child> {
                if hospitals.get(u32_key(hospital_id))?.is_none() {
                    return Err(abort(NeoCareError::NotFound(format!("hospital {}", hospital_id))));
                }
                if children.get(registration.child_id.as_bytes())?.is_some() {
                    return Err(abort(NeoCareError::AlreadyExists(format!("child {}", registration.child_id))));
                }

                let counter_key = RegistrationNumberGenerator::counter_key(hospital_id, registration.year);
                let last = tx_counter(counters, &counter_key)?;
                let mut allocated: Option<RegistrationNumber> = None;
                for candidate in RegistrationNumberGenerator::after(registration.year, hospital_id, last) {
                    let candidate = candidate.map_err(abort)?;
                    if registrations.get(candidate.to_string().as_bytes())?.is_some() {
                        warn!("Registration number {} already in use, advancing counter", candidate);
                        continue;
                    }
                    allocated = Some(candidate);
                    break;
                }
                let number = allocated.ok_or_else(|| {
                    abort(NeoCareError::InvalidState(format!(
                        "no registration number left for hospital {} in {}",
                        hospital_id, registration.year
                    )))
                })?;
                tx_set_counter(counters, &counter_key, u64::from(number.sequence()))?;

                let child = Child::from_new(
                    registration.child_id,
                    number,
                    registration.details.clone(),
                    registration.registered_by,
                    registration.registered_at,
                );
                registrations.insert(number.to_string().as_bytes(), child.id.as_bytes().to_vec())?;
                children.insert(child.id.as_bytes().to_vec(), tx_encode(&child)?)?;
                tx_adjust_counter(counters, &hospital_children_key(hospital_id), 1)?;

                for entry in &registration.schedule {
                    if entry.child_id != child.id {
                        return Err(abort(NeoCareError::InternalError(format!(
                            "schedule entry {} belongs to another child",
                            entry.id
                        ))));
                    }
                    let stored = vaccines.get(u32_key(entry.vaccine_id))?.ok_or_else(|| {
                        abort(NeoCareError::Conflict(format!(
                            "vaccine {} was removed while registering",
                            entry.vaccine_id
                        )))
                    })?;
                    let vaccine: Vaccine = tx_decode(&stored)?;
                    if !vaccine.active {
                        return Err(abort(NeoCareError::Conflict(format!(
                            "vaccine {} was deactivated while registering",
                            entry.vaccine_id
                        ))));
                    }
                    schedules.insert(composite_key(&child.id, &entry.id), tx_encode(entry)?)?;
                    locator.insert(entry.id.as_bytes().to_vec(), child.id.as_bytes().to_vec())?;
                    tx_adjust_counter(counters, &vaccine_schedules_key(entry.vaccine_id), 1)?;
                }
                Ok(child)
            },
        )?;
        info!(
            "Registered child {} as {} with {} schedule entries",
            child.id,
            child.registration_number,
            registration.schedule.len()
        );
        Ok(child)
    }

    async fn get_child(&self, id: &Uuid) -> Result<Option<Child>> {
        self.children.get(id.as_bytes())?.map(|v| deserialize(&v)).transpose()
    }

    async fn get_child_by_registration(&self, number: &RegistrationNumber) -> Result<Option<Child>> {
        match self.registrations.get(number.to_string().as_bytes())? {
            Some(id) => self.get_child(&uuid_from_ivec(&id)?).await,
            None => Ok(None),
        }
    }

    async fn list_children(&self, hospital_id: Option<HospitalId>) -> Result<Vec<Child>> {
        let mut children: Vec<Child> = Self::decode_all(self.children.iter())?;
        if let Some(hospital_id) = hospital_id {
            children.retain(|c| c.hospital_id == hospital_id);
        }
        children.sort_by(|a, b| a.registration_number.cmp(&b.registration_number));
        Ok(children)
    }
}

#[async_trait]
impl ScheduleStorage for SledStorage {
    async fn get_schedule_entry(&self, id: &Uuid) -> Result<Option<ScheduleEntry>> {
        let Some(child_id) = self.schedule_locator.get(id.as_bytes())? else {
            return Ok(None);
        };
        let key = composite_key(&uuid_from_ivec(&child_id)?, id);
        self.schedules.get(key)?.map(|v| deserialize(&v)).transpose()
    }

    async fn list_schedule_for_child(&self, child_id: &Uuid) -> Result<Vec<ScheduleEntry>> {
        let mut entries: Vec<ScheduleEntry> = Self::decode_all(self.schedules.scan_prefix(child_id.as_bytes()))?;
        entries.sort_by_key(|e| (e.scheduled_date, e.vaccine_id));
        Ok(entries)
    }

    async fn list_schedule_entries(&self) -> Result<Vec<ScheduleEntry>> {
        Self::decode_all(self.schedules.iter())
    }

    async fn complete_schedule_entry(&self, id: &Uuid, completion: &VaccinationCompletion) -> Result<ScheduleEntry> {
        let entry = (&self.schedules, &self.schedule_locator).transaction(
            |(schedules, locator)| -> TxResult<ScheduleEntry> {
                let child_id = locator
                    .get(id.as_bytes())?
                    .ok_or_else(|| abort(NeoCareError::NotFound(format!("schedule entry {}", id))))?;
                let child_id = uuid_from_ivec(&child_id).map_err(abort)?;
                let key = composite_key(&child_id, id);
                let current = schedules
                    .get(&key)?
                    .ok_or_else(|| abort(NeoCareError::NotFound(format!("schedule entry {}", id))))?;
                let mut entry: ScheduleEntry = tx_decode(&current)?;
                entry.complete(completion).map_err(abort)?;
                schedules.insert(key, tx_encode(&entry)?)?;
                Ok(entry)
            },
        )?;
        Ok(entry)
    }
}

#[async_trait]
impl MedicalRecordStorage for SledStorage {
    async fn add_medical_record(&self, record: &MedicalRecord) -> Result<()> {
        (&self.children, &self.medical_records).transaction(|(children, records)| -> TxResult<()> {
            if children.get(record.child_id.as_bytes())?.is_none() {
                return Err(abort(NeoCareError::NotFound(format!("child {}", record.child_id))));
            }
            records.insert(composite_key(&record.child_id, &record.id), tx_encode(record)?)?;
            Ok(())
        })?;
        debug!("Stored medical record {} for child {}", record.id, record.child_id);
        Ok(())
    }

    async fn list_medical_records(&self, child_id: &Uuid) -> Result<Vec<MedicalRecord>> {
        let mut records: Vec<MedicalRecord> =
            Self::decode_all(self.medical_records.scan_prefix(child_id.as_bytes()))?;
        records.sort_by_key(|r| (r.visit_date, r.created_at));
        Ok(records)
    }
}

#[async_trait]
impl StorageEngine for SledStorage {
    async fn flush(&self) -> Result<()> {
        self.db.flush_async().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{date, new_child, seed_hospitals, storage};
    use models::{NewVaccine, ScheduleStatus};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn registration(storage_child: Uuid, hospital_id: HospitalId, schedule: Vec<ScheduleEntry>) -> ChildRegistration {
        ChildRegistration {
            child_id: storage_child,
            details: new_child(hospital_id),
            registered_by: Uuid::new_v4(),
            registered_at: Utc::now(),
            year: 2025,
            schedule,
        }
    }

    async fn add_vaccine(storage: &SledStorage, name: &str, age_weeks: u32) -> Vaccine {
        let new = NewVaccine { name: name.into(), description: None, age_weeks, dose_number: 1 };
        storage.create_vaccine(new, Utc::now()).await.unwrap()
    }

    #[tokio::test]
    async fn should_assign_sequential_hospital_ids() {
        let storage = storage();
        let ids = seed_hospitals(&storage, 3).await;
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(storage.list_hospitals().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn should_format_first_registration_of_hospital_3() {
        let storage = storage();
        seed_hospitals(&storage, 3).await;
        let child = storage.register_child(registration(Uuid::new_v4(), 3, vec![])).await.unwrap();
        assert_eq!(child.registration_number.to_string(), "NC2025030001");
        let found = storage.get_child_by_registration(&child.registration_number).await.unwrap();
        assert_eq!(found.map(|c| c.id), Some(child.id));
    }

    #[tokio::test]
    async fn should_advance_counter_past_numbers_already_indexed() {
        let storage = storage();
        seed_hospitals(&storage, 1).await;
        storage
            .registrations
            .insert("NC2025010001".as_bytes(), Uuid::new_v4().as_bytes().to_vec())
            .unwrap();
        let child = storage.register_child(registration(Uuid::new_v4(), 1, vec![])).await.unwrap();
        assert_eq!(child.registration_number.sequence(), 2);
    }

    #[tokio::test]
    async fn should_reject_registration_for_unknown_hospital() {
        let storage = storage();
        let err = storage.register_child(registration(Uuid::new_v4(), 9, vec![])).await.unwrap_err();
        assert!(matches!(err, NeoCareError::NotFound(_)));
        assert!(storage.list_children(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_store_schedule_with_child() {
        let storage = storage();
        seed_hospitals(&storage, 1).await;
        let bcg = add_vaccine(&storage, "BCG", 0).await;
        let child_id = Uuid::new_v4();
        let entry = ScheduleEntry::pending(child_id, bcg.id, date(2025, 1, 1));
        storage.register_child(registration(child_id, 1, vec![entry.clone()])).await.unwrap();

        let stored = storage.list_schedule_for_child(&child_id).await.unwrap();
        assert_eq!(stored, vec![entry.clone()]);
        assert_eq!(storage.get_schedule_entry(&entry.id).await.unwrap(), Some(entry));
    }

    #[tokio::test]
    async fn should_complete_entry_only_once() {
        let storage = storage();
        seed_hospitals(&storage, 1).await;
        let bcg = add_vaccine(&storage, "BCG", 0).await;
        let child_id = Uuid::new_v4();
        let entry = ScheduleEntry::pending(child_id, bcg.id, date(2025, 1, 1));
        storage.register_child(registration(child_id, 1, vec![entry.clone()])).await.unwrap();

        let first = VaccinationCompletion { administered_date: date(2025, 1, 2), administered_by: Uuid::new_v4(), notes: None };
        let done = storage.complete_schedule_entry(&entry.id, &first).await.unwrap();
        assert_eq!(done.status, ScheduleStatus::Completed);

        let second = VaccinationCompletion { administered_date: date(2025, 1, 5), administered_by: Uuid::new_v4(), notes: Some("again".into()) };
        let err = storage.complete_schedule_entry(&entry.id, &second).await.unwrap_err();
        assert!(matches!(err, NeoCareError::InvalidState(_)));
        let stored = storage.get_schedule_entry(&entry.id).await.unwrap().unwrap();
        assert_eq!(stored, done);
    }

    #[tokio::test]
    async fn should_block_deleting_referenced_vaccine_and_hospital() {
        let storage = storage();
        seed_hospitals(&storage, 1).await;
        let bcg = add_vaccine(&storage, "BCG", 0).await;
        let unused = add_vaccine(&storage, "Unused", 4).await;
        let child_id = Uuid::new_v4();
        let entry = ScheduleEntry::pending(child_id, bcg.id, date(2025, 1, 1));
        storage.register_child(registration(child_id, 1, vec![entry])).await.unwrap();

        assert!(matches!(storage.delete_vaccine(bcg.id).await, Err(NeoCareError::StillReferenced(_))));
        assert!(matches!(storage.delete_hospital(1).await, Err(NeoCareError::StillReferenced(_))));
        storage.delete_vaccine(unused.id).await.unwrap();
        assert!(storage.get_vaccine(unused.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_allow_only_active_flag_on_referenced_vaccine() {
        let storage = storage();
        seed_hospitals(&storage, 1).await;
        let bcg = add_vaccine(&storage, "BCG", 0).await;
        let child_id = Uuid::new_v4();
        let entry = ScheduleEntry::pending(child_id, bcg.id, date(2025, 1, 1));
        storage.register_child(registration(child_id, 1, vec![entry])).await.unwrap();

        let rename = VaccineUpdate { name: Some("BCG-2".into()), ..Default::default() };
        assert!(matches!(storage.update_vaccine(bcg.id, &rename).await, Err(NeoCareError::StillReferenced(_))));
        let deactivate = VaccineUpdate { active: Some(false), ..Default::default() };
        assert!(!storage.update_vaccine(bcg.id, &deactivate).await.unwrap().active);
    }

    fn counter(storage: &SledStorage, key: &str) -> u64 {
        decode_counter(storage.counters.get(key).unwrap())
    }

    #[tokio::test]
    async fn should_reject_schedule_for_vaccine_deactivated_before_commit() {
        let storage = storage();
        seed_hospitals(&storage, 1).await;
        let bcg = add_vaccine(&storage, "BCG", 0).await;
        let opv = add_vaccine(&storage, "OPV 0", 0).await;
        let child_id = Uuid::new_v4();
        let schedule = vec![
            ScheduleEntry::pending(child_id, bcg.id, date(2025, 1, 1)),
            ScheduleEntry::pending(child_id, opv.id, date(2025, 1, 1)),
        ];
        let deactivate = VaccineUpdate { active: Some(false), ..Default::default() };
        storage.update_vaccine(bcg.id, &deactivate).await.unwrap();

        let err = storage.register_child(registration(child_id, 1, schedule)).await.unwrap_err();
        assert!(matches!(err, NeoCareError::Conflict(_)));
        assert!(storage.get_child(&child_id).await.unwrap().is_none());
        assert!(storage.list_schedule_for_child(&child_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_roll_back_registration_when_a_scheduled_vaccine_is_gone() {
        let storage = storage();
        seed_hospitals(&storage, 1).await;
        let bcg = add_vaccine(&storage, "BCG", 0).await;
        let opv = add_vaccine(&storage, "OPV 0", 0).await;
        let child_id = Uuid::new_v4();
        let schedule = vec![
            ScheduleEntry::pending(child_id, bcg.id, date(2025, 1, 1)),
            ScheduleEntry::pending(child_id, opv.id, date(2025, 1, 1)),
        ];
        storage.delete_vaccine(opv.id).await.unwrap();

        let err = storage.register_child(registration(child_id, 1, schedule)).await.unwrap_err();
        assert!(matches!(err, NeoCareError::Conflict(_)));
        assert!(storage.list_children(None).await.unwrap().is_empty());
        assert!(storage.list_schedule_entries().await.unwrap().is_empty());
        assert_eq!(counter(&storage, &vaccine_schedules_key(bcg.id)), 0);
        assert_eq!(counter(&storage, &hospital_children_key(1)), 0);
        assert_eq!(counter(&storage, &RegistrationNumberGenerator::counter_key(1, 2025)), 0);
        storage.delete_vaccine(bcg.id).await.unwrap();
    }

    #[tokio::test]
    async fn should_reject_duplicate_username_ignoring_case() {
        let storage = storage();
        seed_hospitals(&storage, 1).await;
        let first = crate::test_support::user("nurse.joy", models::Role::Nurse, Some(1));
        storage.add_user(&first).await.unwrap();
        let second = crate::test_support::user("Nurse.Joy", models::Role::Doctor, Some(1));
        assert!(matches!(storage.add_user(&second).await, Err(NeoCareError::AlreadyExists(_))));
        let found = storage.get_user_by_username("NURSE.JOY").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
        assert!(matches!(storage.delete_hospital(1).await, Err(NeoCareError::StillReferenced(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn should_issue_unique_registration_numbers_concurrently() {
        let storage = Arc::new(storage());
        seed_hospitals(&storage, 2).await;
        let mut tasks = Vec::new();
        for i in 0..40 {
            let storage = storage.clone();
            let hospital_id = if i % 2 == 0 { 1 } else { 2 };
            tasks.push(tokio::spawn(async move {
                storage.register_child(registration(Uuid::new_v4(), hospital_id, vec![])).await
            }));
        }
        let mut numbers = HashSet::new();
        for task in tasks {
            let child = task.await.unwrap().unwrap();
            assert!(numbers.insert(child.registration_number));
        }
        assert_eq!(numbers.len(), 40);
        for hospital_id in [1, 2] {
            let mut sequences: Vec<u32> = numbers
                .iter()
                .filter(|n| n.hospital_id() == hospital_id)
                .map(|n| n.sequence())
                .collect();
            sequences.sort_unstable();
            assert_eq!(sequences, (1..=20).collect::<Vec<u32>>());
        }
    }
}

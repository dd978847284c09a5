// lib/src/test_support.rs
//! Fixtures shared by the unit tests of this crate.

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use models::{Gender, GuardianContact, HospitalId, NewChild, NewHospital, NewVaccine, Role, User, Vaccine};

use crate::storage_engine::{HospitalStorage, SledStorage, VaccineStorage};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn storage() -> SledStorage {
    SledStorage::temporary().unwrap()
}

pub async fn seed_hospitals(storage: &SledStorage, count: u32) -> Vec<HospitalId> {
    let mut ids = Vec::new();
    for i in 1..=count {
        let hospital = NewHospital {
            name: format!("District Hospital {}", i),
            address: None,
            phone: None,
            email: None,
        };
        ids.push(storage.create_hospital(hospital, Utc::now()).await.unwrap().id);
    }
    ids
}

/// BCG at birth and OPV dose 1 at six weeks.
pub async fn seed_bcg_opv(storage: &SledStorage) -> (Vaccine, Vaccine) {
    let bcg = NewVaccine { name: "BCG".into(), description: None, age_weeks: 0, dose_number: 1 };
    let opv = NewVaccine { name: "OPV".into(), description: None, age_weeks: 6, dose_number: 1 };
    (
        storage.create_vaccine(bcg, Utc::now()).await.unwrap(),
        storage.create_vaccine(opv, Utc::now()).await.unwrap(),
    )
}

pub fn new_child(hospital_id: HospitalId) -> NewChild {
    NewChild {
        first_name: "Amina".into(),
        last_name: "Okafor".into(),
        date_of_birth: date(2025, 1, 1),
        gender: Gender::Female,
        guardian: GuardianContact {
            name: "Grace Okafor".into(),
            phone: "+2348012345678".into(),
            email: None,
            address: None,
        },
        hospital_id,
    }
}

pub fn user(username: &str, role: Role, hospital_id: Option<HospitalId>) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        first: "Test".into(),
        last: "User".into(),
        username: username.into(),
        email: format!("{}@example.org", username.to_lowercase()),
        password_hash: "not-a-real-hash".into(),
        phone: None,
        role,
        hospital_id,
        created_at: now,
        updated_at: now,
        last_login: None,
    }
}

// lib/src/catalog.rs
//! Default Expanded Programme on Immunization catalog, seeded on first start.

use chrono::{DateTime, Utc};
use log::info;

use models::NewVaccine;

use crate::errors::Result;
use crate::storage_engine::VaccineStorage;

/// (name, description, age in weeks, dose number)
const DEFAULT_CATALOG: &[(&str, &str, u32, u32)] = &[
    ("BCG", "Bacillus Calmette-Guerin (tuberculosis)", 0, 1),
    ("Hepatitis B", "Hepatitis B birth dose", 0, 1),
    ("OPV", "Oral polio vaccine", 6, 1),
    ("Pentavalent", "DTP-HepB-Hib", 6, 1),
    ("PCV", "Pneumococcal conjugate vaccine", 6, 1),
    ("Rotavirus", "Rotavirus vaccine", 6, 1),
    ("OPV", "Oral polio vaccine", 10, 2),
    ("Pentavalent", "DTP-HepB-Hib", 10, 2),
    ("PCV", "Pneumococcal conjugate vaccine", 10, 2),
    ("Rotavirus", "Rotavirus vaccine", 10, 2),
    ("OPV", "Oral polio vaccine", 14, 3),
    ("Pentavalent", "DTP-HepB-Hib", 14, 3),
    ("PCV", "Pneumococcal conjugate vaccine", 14, 3),
    ("IPV", "Inactivated polio vaccine", 14, 1),
    ("Measles-Rubella", "Measles and rubella", 39, 1),
    ("Measles-Rubella", "Measles and rubella", 78, 2),
];

pub fn default_catalog() -> Vec<NewVaccine> {
    DEFAULT_CATALOG
        .iter()
        .map(|(name, description, age_weeks, dose_number)| NewVaccine {
            name: (*name).to_string(),
            description: Some((*description).to_string()),
            age_weeks: *age_weeks,
            dose_number: *dose_number,
        })
        .collect()
}

/// Seeds the default catalog when no vaccine exists yet. Returns how many were added.
pub async fn seed_default_catalog<S: VaccineStorage + ?Sized>(storage: &S, now: DateTime<Utc>) -> Result<usize> {
    if !storage.list_vaccines().await?.is_empty() {
        return Ok(0);
    }
    let catalog = default_catalog();
    let count = catalog.len();
    for vaccine in catalog {
        storage.create_vaccine(vaccine.validated()?, now).await?;
    }
    info!("Seeded default vaccine catalog with {} vaccines", count);
    Ok(count)
}

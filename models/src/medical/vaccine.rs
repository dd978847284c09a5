// models/src/medical/vaccine.rs
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{ValidationError, ValidationResult};
use crate::identifiers::VaccineId;
use crate::validation;

/// Catalog entry as submitted by a hospital administrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVaccine {
    pub name: String,
    pub description: Option<String>,
    pub age_weeks: u32,
    pub dose_number: u32,
}

/// A vaccine in the catalog. Only `active` may change once schedule entries
/// reference it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vaccine {
    pub id: VaccineId,
    pub name: String,
    pub description: Option<String>,
    pub age_weeks: u32,
    pub dose_number: u32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Partial update of a catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VaccineUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub age_weeks: Option<u32>,
    pub dose_number: Option<u32>,
    pub active: Option<bool>,
}

impl NewVaccine {
    pub fn validated(&self) -> ValidationResult<Self> {
        if self.dose_number == 0 {
            return Err(ValidationError::InvalidDoseNumber);
        }
        Ok(Self {
            name: validation::require("name", &self.name)?,
            description: validation::optional_text(self.description.as_deref()),
            age_weeks: self.age_weeks,
            dose_number: self.dose_number,
        })
    }
}

impl VaccineUpdate {
    /// True when the update touches nothing but the active flag.
    pub fn is_active_flag_only(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.age_weeks.is_none()
            && self.dose_number.is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.is_active_flag_only() && self.active.is_none()
    }
}

impl Vaccine {
    pub fn from_new(id: VaccineId, new: NewVaccine, created_at: DateTime<Utc>) -> Self {
        Vaccine {
            id,
            name: new.name,
            description: new.description,
            age_weeks: new.age_weeks,
            dose_number: new.dose_number,
            active: true,
            created_at,
        }
    }

    /// `birth + age_weeks * 7` days, or `None` past the end of the calendar.
    pub fn scheduled_date_for(&self, date_of_birth: NaiveDate) -> Option<NaiveDate> {
        date_of_birth.checked_add_days(Days::new(u64::from(self.age_weeks) * 7))
    }

    /// Applies an update and re-validates the result.
    pub fn apply(&self, update: &VaccineUpdate) -> ValidationResult<Vaccine> {
        let mut next = self.clone();
        if let Some(name) = &update.name {
            next.name = validation::require("name", name)?;
        }
        if update.description.is_some() {
            next.description = validation::optional_text(update.description.as_deref());
        }
        if let Some(age_weeks) = update.age_weeks {
            next.age_weeks = age_weeks;
        }
        if let Some(dose_number) = update.dose_number {
            if dose_number == 0 {
                return Err(ValidationError::InvalidDoseNumber);
            }
            next.dose_number = dose_number;
        }
        if let Some(active) = update.active {
            next.active = active;
        }
        Ok(next)
    }

    pub fn label(&self) -> String {
        format!("{} (dose {})", self.name, self.dose_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vaccine(age_weeks: u32) -> Vaccine {
        Vaccine::from_new(
            1,
            NewVaccine { name: "OPV".into(), description: None, age_weeks, dose_number: 1 },
            Utc::now(),
        )
    }

    #[test]
    fn should_schedule_by_weeks_from_birth() {
        let birth = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(vaccine(0).scheduled_date_for(birth), Some(birth));
        assert_eq!(vaccine(6).scheduled_date_for(birth), NaiveDate::from_ymd_opt(2025, 2, 12));
    }

    #[test]
    fn should_reject_dose_zero() {
        let new = NewVaccine { name: "BCG".into(), description: None, age_weeks: 0, dose_number: 0 };
        assert_eq!(new.validated(), Err(ValidationError::InvalidDoseNumber));
    }

    #[test]
    fn should_detect_active_flag_only_updates() {
        let retire = VaccineUpdate { active: Some(false), ..Default::default() };
        assert!(retire.is_active_flag_only());
        let rename = VaccineUpdate { name: Some("bOPV".into()), ..Default::default() };
        assert!(!rename.is_active_flag_only());
        assert!(VaccineUpdate::default().is_empty());
    }

    #[test]
    fn should_apply_update() {
        let updated = vaccine(6)
            .apply(&VaccineUpdate { age_weeks: Some(10), active: Some(false), ..Default::default() })
            .unwrap();
        assert_eq!(updated.age_weeks, 10);
        assert!(!updated.active);
    }
}

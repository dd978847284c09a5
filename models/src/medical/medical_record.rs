// models/src/medical/medical_record.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{ValidationError, ValidationResult};
use crate::validation;

/// Visit measurements as entered by a doctor or nurse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMedicalRecord {
    pub visit_date: NaiveDate,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub temperature_c: Option<f64>,
    pub blood_pressure: Option<String>,
    pub notes: Option<String>,
}

/// Append-only visit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub id: Uuid,
    pub child_id: Uuid,
    pub visit_date: NaiveDate,
    pub age_months: u32,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub temperature_c: Option<f64>,
    pub blood_pressure: Option<String>,
    pub notes: Option<String>,
    pub recorded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl NewMedicalRecord {
    /// Checks the visit against the child's lifetime and the measurements
    /// against plausible ranges.
    pub fn validated(&self, date_of_birth: NaiveDate, today: NaiveDate) -> ValidationResult<Self> {
        validation::validate_event_date("visit_date", self.visit_date, date_of_birth, today)?;

        let weight_kg = self
            .weight_kg
            .map(|w| validation::validate_measurement("weight_kg", w))
            .transpose()?;
        let height_cm = self
            .height_cm
            .map(|h| validation::validate_measurement("height_cm", h))
            .transpose()?;
        let temperature_c = match self.temperature_c {
            Some(t) if !(30.0..=45.0).contains(&t) => {
                return Err(ValidationError::InvalidValue {
                    field: "temperature_c",
                    reason: format!("{t} is outside 30-45 °C"),
                })
            }
            other => other,
        };
        let blood_pressure = match validation::optional_text(self.blood_pressure.as_deref()) {
            Some(bp) => Some(validation::validate_blood_pressure(&bp)?),
            None => None,
        };

        Ok(Self {
            visit_date: self.visit_date,
            weight_kg,
            height_cm,
            temperature_c,
            blood_pressure,
            notes: validation::optional_text(self.notes.as_deref()),
        })
    }
}

impl MedicalRecord {
    pub fn from_new(
        child_id: Uuid,
        age_months: u32,
        new: NewMedicalRecord,
        recorded_by: Uuid,
        created_at: DateTime<Utc>,
    ) -> Self {
        MedicalRecord {
            id: Uuid::new_v4(),
            child_id,
            visit_date: new.visit_date,
            age_months,
            weight_kg: new.weight_kg,
            height_cm: new.height_cm,
            temperature_c: new.temperature_c,
            blood_pressure: new.blood_pressure,
            notes: new.notes,
            recorded_by,
            created_at,
        }
    }

    /// Body-mass index when both weight and height were measured.
    pub fn bmi(&self) -> Option<f64> {
        match (self.weight_kg, self.height_cm) {
            (Some(w), Some(h)) if h > 0.0 => {
                let metres = h / 100.0;
                Some(w / (metres * metres))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn visit() -> NewMedicalRecord {
        NewMedicalRecord {
            visit_date: date(2025, 4, 1),
            weight_kg: Some(5.8),
            height_cm: Some(61.4),
            temperature_c: Some(36.7),
            blood_pressure: Some(" 90/60 ".into()),
            notes: Some("".into()),
        }
    }

    #[test]
    fn should_accept_plausible_visit() {
        let valid = visit().validated(date(2025, 1, 1), date(2025, 4, 2)).unwrap();
        assert_eq!(valid.blood_pressure.as_deref(), Some("90/60"));
        assert_eq!(valid.notes, None);
    }

    #[test]
    fn should_reject_implausible_temperature() {
        let mut bad = visit();
        bad.temperature_c = Some(52.0);
        assert!(matches!(
            bad.validated(date(2025, 1, 1), date(2025, 4, 2)),
            Err(ValidationError::InvalidValue { field: "temperature_c", .. })
        ));
    }

    #[test]
    fn should_compute_bmi() {
        let valid = visit().validated(date(2025, 1, 1), date(2025, 4, 2)).unwrap();
        let record = MedicalRecord::from_new(Uuid::new_v4(), 3, valid, Uuid::new_v4(), Utc::now());
        let bmi = record.bmi().unwrap();
        assert!((bmi - 15.385).abs() < 0.01, "bmi was {bmi}");
    }
}

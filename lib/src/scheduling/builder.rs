// lib/src/scheduling/builder.rs
use chrono::NaiveDate;
use uuid::Uuid;

use models::{ScheduleEntry, ValidationError, Vaccine};

use crate::errors::Result;

/// Active vaccines in catalog order: (age_weeks, dose_number, id).
pub fn active_catalog(vaccines: &[Vaccine]) -> Vec<&Vaccine> {
    let mut active: Vec<&Vaccine> = vaccines.iter().filter(|v| v.active).collect();
    active.sort_by_key(|v| (v.age_weeks, v.dose_number, v.id));
    active
}

/// One pending entry per active vaccine, dated `birth + age_weeks * 7` days.
/// An empty or fully inactive catalog yields an empty schedule.
pub fn build_schedule(child_id: Uuid, date_of_birth: NaiveDate, vaccines: &[Vaccine]) -> Result<Vec<ScheduleEntry>> {
    active_catalog(vaccines)
        .into_iter()
        .map(|vaccine| -> Result<ScheduleEntry> {
            let scheduled = vaccine.scheduled_date_for(date_of_birth).ok_or_else(|| ValidationError::InvalidValue {
                field: "date_of_birth",
                reason: format!("{} cannot be scheduled from {}", vaccine.label(), date_of_birth),
            })?;
            Ok(ScheduleEntry::pending(child_id, vaccine.id, scheduled))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::date;
    use chrono::Utc;
    use models::{NewVaccine, ScheduleStatus};

    fn vaccine(id: u32, name: &str, age_weeks: u32, dose_number: u32, active: bool) -> Vaccine {
        let mut v = Vaccine::from_new(
            id,
            NewVaccine { name: name.into(), description: None, age_weeks, dose_number },
            Utc::now(),
        );
        v.active = active;
        v
    }

    #[test]
    fn should_schedule_bcg_at_birth_and_opv1_at_six_weeks() {
        let child = Uuid::new_v4();
        let catalog = vec![vaccine(2, "OPV", 6, 1, true), vaccine(1, "BCG", 0, 1, true)];
        let entries = build_schedule(child, date(2025, 1, 1), &catalog).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!((entries[0].vaccine_id, entries[0].scheduled_date), (1, date(2025, 1, 1)));
        assert_eq!((entries[1].vaccine_id, entries[1].scheduled_date), (2, date(2025, 2, 12)));
        assert!(entries.iter().all(|e| e.child_id == child && e.status == ScheduleStatus::Pending));
    }

    #[test]
    fn should_skip_inactive_vaccines() {
        let catalog = vec![vaccine(1, "BCG", 0, 1, true), vaccine(2, "Retired", 4, 1, false)];
        let entries = build_schedule(Uuid::new_v4(), date(2025, 1, 1), &catalog).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn should_return_empty_schedule_for_empty_catalog() {
        assert!(build_schedule(Uuid::new_v4(), date(2025, 1, 1), &[]).unwrap().is_empty());
    }

    #[test]
    fn should_order_by_age_then_dose_then_id() {
        let catalog = vec![
            vaccine(5, "PCV", 10, 2, true),
            vaccine(4, "OPV", 10, 2, true),
            vaccine(3, "OPV", 10, 1, true),
        ];
        let ids: Vec<u32> = active_catalog(&catalog).iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![3, 4, 5]);
    }
}

// lib/src/scheduling/status.rs
//! Classification of schedule entries against a given day, and the counts
//! built on top of it. Nothing here touches storage.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use models::{Child, HospitalId, ScheduleClassification, ScheduleEntry, ScheduleStatus, Vaccine, VaccineId};

/// Exactly one class per entry: a completed entry is never overdue, and
/// "due" means scheduled for `today` itself.
pub fn classify(entry: &ScheduleEntry, today: NaiveDate) -> ScheduleClassification {
    match entry.status {
        ScheduleStatus::Completed => ScheduleClassification::Completed,
        ScheduleStatus::Pending if entry.scheduled_date < today => ScheduleClassification::Overdue,
        ScheduleStatus::Pending if entry.scheduled_date == today => ScheduleClassification::DueToday,
        ScheduleStatus::Pending => ScheduleClassification::Upcoming,
    }
}

/// `part / whole * 100` rounded to two decimals; zero when `whole` is zero.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    ((part as f64 / whole as f64) * 10_000.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: u64,
    pub completed: u64,
    pub overdue: u64,
    pub due_today: u64,
    pub upcoming: u64,
}

impl StatusCounts {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a ScheduleEntry>, today: NaiveDate) -> Self {
        let mut counts = StatusCounts::default();
        for entry in entries {
            counts.add(classify(entry, today));
        }
        counts
    }

    pub fn add(&mut self, classification: ScheduleClassification) {
        self.total += 1;
        match classification {
            ScheduleClassification::Completed => self.completed += 1,
            ScheduleClassification::Overdue => self.overdue += 1,
            ScheduleClassification::DueToday => self.due_today += 1,
            ScheduleClassification::Upcoming => self.upcoming += 1,
        }
    }

    pub fn pending(&self) -> u64 {
        self.overdue + self.due_today + self.upcoming
    }

    /// Per-child progress: completed / total.
    pub fn completion_percentage(&self) -> f64 {
        percentage(self.completed, self.total)
    }

    /// Aggregate coverage: completed / (completed + pending).
    pub fn coverage_percentage(&self) -> f64 {
        percentage(self.completed, self.completed + self.pending())
    }
}

/// A child's schedule progress as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct ChildProgress {
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub completion_percentage: f64,
}

impl From<StatusCounts> for ChildProgress {
    fn from(counts: StatusCounts) -> Self {
        ChildProgress {
            completion_percentage: counts.completion_percentage(),
            counts,
        }
    }
}

/// Schedule entry joined with its vaccine and classified for display.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedEntry {
    #[serde(flatten)]
    pub entry: ScheduleEntry,
    pub vaccine_name: String,
    pub dose_number: u32,
    pub classification: ScheduleClassification,
}

pub fn classify_schedule(entries: &[ScheduleEntry], vaccines: &[Vaccine], today: NaiveDate) -> Vec<ClassifiedEntry> {
    let by_id: HashMap<VaccineId, &Vaccine> = vaccines.iter().map(|v| (v.id, v)).collect();
    entries
        .iter()
        .map(|entry| {
            let vaccine = by_id.get(&entry.vaccine_id);
            ClassifiedEntry {
                entry: entry.clone(),
                vaccine_name: vaccine.map(|v| v.name.clone()).unwrap_or_else(|| format!("Vaccine #{}", entry.vaccine_id)),
                dose_number: vaccine.map(|v| v.dose_number).unwrap_or_default(),
                classification: classify(entry, today),
            }
        })
        .collect()
}

pub fn counts_by_child(entries: &[ScheduleEntry], today: NaiveDate) -> HashMap<Uuid, StatusCounts> {
    let mut out: HashMap<Uuid, StatusCounts> = HashMap::new();
    for entry in entries {
        out.entry(entry.child_id).or_default().add(classify(entry, today));
    }
    out
}

/// Entries whose child is not in `children` are left out.
pub fn counts_by_hospital(
    entries: &[ScheduleEntry],
    children: &[Child],
    today: NaiveDate,
) -> BTreeMap<HospitalId, StatusCounts> {
    let owner: HashMap<Uuid, HospitalId> = children.iter().map(|c| (c.id, c.hospital_id)).collect();
    let mut out: BTreeMap<HospitalId, StatusCounts> = BTreeMap::new();
    for entry in entries {
        if let Some(hospital_id) = owner.get(&entry.child_id) {
            out.entry(*hospital_id).or_default().add(classify(entry, today));
        }
    }
    out
}

pub fn counts_by_vaccine(entries: &[ScheduleEntry], today: NaiveDate) -> BTreeMap<VaccineId, StatusCounts> {
    let mut out: BTreeMap<VaccineId, StatusCounts> = BTreeMap::new();
    for entry in entries {
        out.entry(entry.vaccine_id).or_default().add(classify(entry, today));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::date;
    use models::VaccinationCompletion;

    fn entry(scheduled: NaiveDate) -> ScheduleEntry {
        ScheduleEntry::pending(Uuid::new_v4(), 1, scheduled)
    }

    fn completed(scheduled: NaiveDate) -> ScheduleEntry {
        let mut e = entry(scheduled);
        e.complete(&VaccinationCompletion {
            administered_date: scheduled,
            administered_by: Uuid::new_v4(),
            notes: None,
        })
        .unwrap();
        e
    }

    #[test]
    fn should_mark_past_pending_entries_overdue() {
        let today = date(2025, 1, 10);
        assert_eq!(classify(&entry(date(2025, 1, 1)), today), ScheduleClassification::Overdue);
        assert_eq!(classify(&entry(date(2025, 1, 10)), today), ScheduleClassification::DueToday);
        assert_eq!(classify(&entry(date(2025, 2, 12)), today), ScheduleClassification::Upcoming);
    }

    #[test]
    fn should_never_classify_completed_entries_as_overdue() {
        let today = date(2025, 6, 1);
        assert_eq!(classify(&completed(date(2025, 1, 1)), today), ScheduleClassification::Completed);
    }

    #[test]
    fn should_partition_entries_into_four_classes() {
        let today = date(2025, 3, 1);
        let entries = vec![
            completed(date(2025, 1, 1)),
            entry(date(2025, 2, 1)),
            entry(date(2025, 3, 1)),
            entry(date(2025, 4, 1)),
            entry(date(2025, 5, 1)),
        ];
        let counts = StatusCounts::from_entries(&entries, today);
        assert_eq!(counts.completed + counts.overdue + counts.due_today + counts.upcoming, counts.total);
        assert_eq!(counts, StatusCounts { total: 5, completed: 1, overdue: 1, due_today: 1, upcoming: 2 });
        assert_eq!(counts.completion_percentage(), 20.0);
        assert_eq!(counts.coverage_percentage(), 20.0);
    }

    #[test]
    fn should_report_zero_percent_for_empty_schedule() {
        let counts = StatusCounts::from_entries(&[], date(2025, 1, 1));
        assert_eq!(counts.completion_percentage(), 0.0);
        assert_eq!(counts.coverage_percentage(), 0.0);
    }

    #[test]
    fn should_give_same_coverage_when_recomputed() {
        let today = date(2025, 3, 1);
        let entries = vec![completed(date(2025, 1, 1)), entry(date(2025, 2, 1)), entry(date(2025, 4, 1))];
        let first = counts_by_vaccine(&entries, today);
        let second = counts_by_vaccine(&entries, today);
        assert_eq!(first, second);
        assert_eq!(first[&1].coverage_percentage(), 33.33);
    }

    #[test]
    fn should_group_counts_per_child() {
        let today = date(2025, 3, 1);
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let mut done = completed(date(2025, 1, 1));
        done.child_id = first;
        let entries = vec![
            done,
            ScheduleEntry::pending(first, 2, date(2025, 2, 1)),
            ScheduleEntry::pending(second, 1, date(2025, 4, 1)),
        ];
        let counts = counts_by_child(&entries, today);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[&first].completion_percentage(), 50.0);
        assert_eq!(counts[&first].overdue, 1);
        assert_eq!(counts[&second].upcoming, 1);
        assert_eq!(counts[&second].completion_percentage(), 0.0);
    }
}

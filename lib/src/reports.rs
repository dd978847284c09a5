// lib/src/reports.rs
//! Read-only projections of the schedule aggregates for dashboards and
//! exports. Every report is computed from one [`ReportSnapshot`].

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Datelike, FixedOffset, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use models::{Child, Hospital, HospitalId, Role, ScheduleEntry, User, Vaccine};

use crate::clock::Clock;
use crate::errors::Result;
use crate::scheduling::status::{counts_by_hospital, counts_by_vaccine, StatusCounts};
use crate::storage_engine::StorageEngine;

pub struct ReportSnapshot {
    pub today: NaiveDate,
    /// Calendar used for registration timestamps; matches `today`.
    pub utc_offset: FixedOffset,
    pub hospitals: Vec<Hospital>,
    pub children: Vec<Child>,
    pub users: Vec<User>,
    pub vaccines: Vec<Vaccine>,
    pub entries: Vec<ScheduleEntry>,
}

impl ReportSnapshot {
    /// Loads everything the reports need, limited to one hospital when `scope` is set.
    pub async fn load(storage: &dyn StorageEngine, scope: Option<HospitalId>, clock: &dyn Clock) -> Result<Self> {
        let mut hospitals = storage.list_hospitals().await?;
        let children = storage.list_children(scope).await?;
        let entries = match scope {
            Some(hospital_id) => {
                hospitals.retain(|h| h.id == hospital_id);
                let mut entries = Vec::new();
                for child in &children {
                    entries.extend(storage.list_schedule_for_child(&child.id).await?);
                }
                entries
            }
            None => storage.list_schedule_entries().await?,
        };
        Ok(ReportSnapshot {
            today: clock.today(),
            utc_offset: clock.utc_offset(),
            hospitals,
            children,
            users: storage.list_users(scope).await?,
            vaccines: storage.list_vaccines().await?,
            entries,
        })
    }

    fn registered_on(&self, child: &Child) -> NaiveDate {
        child.created_at.with_timezone(&self.utc_offset).date_naive()
    }

    fn hospital_name(&self, id: HospitalId) -> String {
        Hospital::display_name(self.hospitals.iter().find(|h| h.id == id)).to_string()
    }

    pub fn dashboard(&self) -> Dashboard {
        let schedule = StatusCounts::from_entries(&self.entries, self.today);
        let this_month = (self.today.year(), self.today.month());
        Dashboard {
            hospitals: self.hospitals.len(),
            children: self.children.len(),
            staff: self.users.len(),
            active_vaccines: self.vaccines.iter().filter(|v| v.active).count(),
            registrations_this_month: self
                .children
                .iter()
                .map(|c| self.registered_on(c))
                .filter(|d| (d.year(), d.month()) == this_month)
                .count(),
            coverage_percentage: schedule.coverage_percentage(),
            schedule,
        }
    }

    /// One row per hospital, including hospitals with no children yet.
    pub fn hospital_coverage(&self) -> Vec<HospitalCoverageRow> {
        let counts = counts_by_hospital(&self.entries, &self.children, self.today);
        let mut children_per_hospital: HashMap<HospitalId, usize> = HashMap::new();
        for child in &self.children {
            *children_per_hospital.entry(child.hospital_id).or_default() += 1;
        }
        let ids: BTreeSet<HospitalId> = self
            .hospitals
            .iter()
            .map(|h| h.id)
            .chain(children_per_hospital.keys().copied())
            .collect();
        ids.into_iter()
            .map(|id| {
                let c = counts.get(&id).copied().unwrap_or_default();
                HospitalCoverageRow {
                    hospital_id: id,
                    hospital_name: self.hospital_name(id),
                    children: children_per_hospital.get(&id).copied().unwrap_or(0),
                    total: c.total,
                    completed: c.completed,
                    overdue: c.overdue,
                    due_today: c.due_today,
                    upcoming: c.upcoming,
                    coverage_percentage: c.coverage_percentage(),
                }
            })
            .collect()
    }

    /// One row per catalog vaccine, in catalog order.
    pub fn vaccine_coverage(&self) -> Vec<VaccineCoverageRow> {
        let counts = counts_by_vaccine(&self.entries, self.today);
        let mut vaccines: Vec<&Vaccine> = self.vaccines.iter().collect();
        vaccines.sort_by_key(|v| (v.age_weeks, v.dose_number, v.id));
        vaccines
            .into_iter()
            .map(|v| {
                let c = counts.get(&v.id).copied().unwrap_or_default();
                VaccineCoverageRow {
                    vaccine_id: v.id,
                    vaccine_name: v.name.clone(),
                    dose_number: v.dose_number,
                    age_weeks: v.age_weeks,
                    active: v.active,
                    total: c.total,
                    completed: c.completed,
                    pending: c.pending(),
                    coverage_percentage: c.coverage_percentage(),
                }
            })
            .collect()
    }

    /// Registrations per calendar month and hospital.
    pub fn registrations_by_month(&self) -> Vec<RegistrationRow> {
        let mut grouped: BTreeMap<(String, HospitalId), u64> = BTreeMap::new();
        for child in &self.children {
            let month = self.registered_on(child).format("%Y-%m").to_string();
            *grouped.entry((month, child.hospital_id)).or_default() += 1;
        }
        grouped
            .into_iter()
            .map(|((month, hospital_id), registrations)| RegistrationRow {
                hospital_name: self.hospital_name(hospital_id),
                month,
                hospital_id,
                registrations,
            })
            .collect()
    }

    pub fn staff_performance(&self) -> Vec<StaffPerformanceRow> {
        let mut registered: HashMap<Uuid, u64> = HashMap::new();
        for child in &self.children {
            *registered.entry(child.registered_by).or_default() += 1;
        }
        let mut administered: HashMap<Uuid, u64> = HashMap::new();
        for by in self.entries.iter().filter_map(|e| e.administered_by) {
            *administered.entry(by).or_default() += 1;
        }
        let mut rows: Vec<StaffPerformanceRow> = self
            .users
            .iter()
            .map(|u| StaffPerformanceRow {
                user_id: u.id,
                username: u.username.clone(),
                full_name: u.full_name(),
                role: u.role,
                hospital_name: u.hospital_id.map(|id| self.hospital_name(id)).unwrap_or_default(),
                children_registered: registered.get(&u.id).copied().unwrap_or(0),
                vaccinations_administered: administered.get(&u.id).copied().unwrap_or(0),
            })
            .collect();
        rows.sort_by(|a, b| {
            b.vaccinations_administered
                .cmp(&a.vaccinations_administered)
                .then_with(|| a.username.cmp(&b.username))
        });
        rows
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub hospitals: usize,
    pub children: usize,
    pub staff: usize,
    pub active_vaccines: usize,
    pub registrations_this_month: usize,
    pub schedule: StatusCounts,
    pub coverage_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HospitalCoverageRow {
    pub hospital_id: HospitalId,
    pub hospital_name: String,
    pub children: usize,
    pub total: u64,
    pub completed: u64,
    pub overdue: u64,
    pub due_today: u64,
    pub upcoming: u64,
    pub coverage_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VaccineCoverageRow {
    pub vaccine_id: u32,
    pub vaccine_name: String,
    pub dose_number: u32,
    pub age_weeks: u32,
    pub active: bool,
    pub total: u64,
    pub completed: u64,
    pub pending: u64,
    pub coverage_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrationRow {
    pub month: String,
    pub hospital_id: HospitalId,
    pub hospital_name: String,
    pub registrations: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaffPerformanceRow {
    pub user_id: Uuid,
    pub username: String,
    pub full_name: String,
    pub role: Role,
    pub hospital_name: String,
    pub children_registered: u64,
    pub vaccinations_administered: u64,
}

/// A report row that can be written as CSV.
pub trait CsvRecord {
    const HEADER: &'static [&'static str];
    fn fields(&self) -> Vec<String>;
}

impl CsvRecord for HospitalCoverageRow {
    const HEADER: &'static [&'static str] = &[
        "hospital_id", "hospital_name", "children", "total", "completed", "overdue", "due_today", "upcoming",
        "coverage_percentage",
    ];
    fn fields(&self) -> Vec<String> {
        vec![
            self.hospital_id.to_string(),
            self.hospital_name.clone(),
            self.children.to_string(),
            self.total.to_string(),
            self.completed.to_string(),
            self.overdue.to_string(),
            self.due_today.to_string(),
            self.upcoming.to_string(),
            format!("{:.2}", self.coverage_percentage),
        ]
    }
}

impl CsvRecord for VaccineCoverageRow {
    const HEADER: &'static [&'static str] = &[
        "vaccine_id", "vaccine_name", "dose_number", "age_weeks", "active", "total", "completed", "pending",
        "coverage_percentage",
    ];
    fn fields(&self) -> Vec<String> {
        vec![
            self.vaccine_id.to_string(),
            self.vaccine_name.clone(),
            self.dose_number.to_string(),
            self.age_weeks.to_string(),
            self.active.to_string(),
            self.total.to_string(),
            self.completed.to_string(),
            self.pending.to_string(),
            format!("{:.2}", self.coverage_percentage),
        ]
    }
}

impl CsvRecord for RegistrationRow {
    const HEADER: &'static [&'static str] = &["month", "hospital_id", "hospital_name", "registrations"];
    fn fields(&self) -> Vec<String> {
        vec![
            self.month.clone(),
            self.hospital_id.to_string(),
            self.hospital_name.clone(),
            self.registrations.to_string(),
        ]
    }
}

impl CsvRecord for StaffPerformanceRow {
    const HEADER: &'static [&'static str] = &[
        "user_id", "username", "full_name", "role", "hospital_name", "children_registered",
        "vaccinations_administered",
    ];
    fn fields(&self) -> Vec<String> {
        vec![
            self.user_id.to_string(),
            self.username.clone(),
            self.full_name.clone(),
            self.role.to_string(),
            self.hospital_name.clone(),
            self.children_registered.to_string(),
            self.vaccinations_administered.to_string(),
        ]
    }
}

fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Header line plus one line per row, `\n` terminated.
pub fn to_csv<T: CsvRecord>(rows: &[T]) -> String {
    let mut out = T::HEADER.join(",");
    out.push('\n');
    for row in rows {
        let line: Vec<String> = row.fields().iter().map(|f| escape_csv(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

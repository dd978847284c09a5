// notifications_service/src/notifications.rs
//! Fixed SMS templates sent to a child's guardian.

use chrono::NaiveDate;
use models::{Child, Vaccine};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Welcome,
    VaccinationAdministered,
    DueReminder,
    OverdueReminder,
}

/// An outbound text message addressed to a guardian's phone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmsMessage {
    pub to: String,
    pub body: String,
    pub kind: NotificationKind,
}

const DATE_FORMAT: &str = "%d %b %Y";

impl SmsMessage {
    /// Sent once, right after registration commits.
    pub fn welcome(child: &Child, hospital_name: &str) -> Self {
        SmsMessage {
            to: child.guardian.phone.clone(),
            body: format!(
                "Welcome to NeoCare! {} has been registered at {}. Registration number: {}. \
                 Keep it safe, you will need it with the date of birth to view vaccination records.",
                child.full_name(),
                hospital_name,
                child.registration_number,
            ),
            kind: NotificationKind::Welcome,
        }
    }

    pub fn vaccination_administered(child: &Child, vaccine: &Vaccine, administered_on: NaiveDate) -> Self {
        SmsMessage {
            to: child.guardian.phone.clone(),
            body: format!(
                "NeoCare: {} received {} on {}. Thank you for keeping vaccinations up to date.",
                child.full_name(),
                vaccine.label(),
                administered_on.format(DATE_FORMAT),
            ),
            kind: NotificationKind::VaccinationAdministered,
        }
    }

    pub fn due_reminder(child: &Child, vaccine: &Vaccine, scheduled: NaiveDate, hospital_name: &str) -> Self {
        SmsMessage {
            to: child.guardian.phone.clone(),
            body: format!(
                "NeoCare reminder: {} is due for {} on {}. Please visit {}.",
                child.full_name(),
                vaccine.label(),
                scheduled.format(DATE_FORMAT),
                hospital_name,
            ),
            kind: NotificationKind::DueReminder,
        }
    }

    pub fn overdue_reminder(child: &Child, vaccine: &Vaccine, scheduled: NaiveDate, hospital_name: &str) -> Self {
        SmsMessage {
            to: child.guardian.phone.clone(),
            body: format!(
                "NeoCare reminder: {}'s {} was due on {} and is now overdue. Please visit {} as soon as possible.",
                child.full_name(),
                vaccine.label(),
                scheduled.format(DATE_FORMAT),
                hospital_name,
            ),
            kind: NotificationKind::OverdueReminder,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use models::{Gender, GuardianContact, NewChild, NewVaccine, RegistrationNumber};
    use uuid::Uuid;

    pub(crate) fn child() -> Child {
        Child::from_new(
            Uuid::new_v4(),
            RegistrationNumber::new(2025, 3, 1).unwrap(),
            NewChild {
                first_name: "Amani".into(),
                last_name: "Otieno".into(),
                date_of_birth: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                gender: Gender::Female,
                guardian: GuardianContact {
                    name: "Grace Otieno".into(),
                    phone: "0712345678".into(),
                    email: None,
                    address: None,
                },
                hospital_id: 3,
            },
            Uuid::new_v4(),
            Utc::now(),
        )
    }

    pub(crate) fn vaccine() -> Vaccine {
        Vaccine::from_new(
            2,
            NewVaccine { name: "OPV".into(), description: None, age_weeks: 6, dose_number: 1 },
            Utc::now(),
        )
    }

    #[test]
    fn should_address_guardian_phone() {
        let message = SmsMessage::welcome(&child(), "Mbagathi Hospital");
        assert_eq!(message.to, "0712345678");
        assert_eq!(message.kind, NotificationKind::Welcome);
        assert!(message.body.contains("NC2025030001"));
        assert!(message.body.contains("Mbagathi Hospital"));
    }

    #[test]
    fn should_name_child_and_vaccine_in_confirmation() {
        let on = NaiveDate::from_ymd_opt(2025, 2, 12).unwrap();
        let message = SmsMessage::vaccination_administered(&child(), &vaccine(), on);
        assert!(message.body.contains("Amani Otieno"));
        assert!(message.body.contains("OPV (dose 1)"));
        assert!(message.body.contains("12 Feb 2025"));
    }
}

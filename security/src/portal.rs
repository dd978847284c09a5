// security/src/portal.rs
//! Parent portal sign-in. A guardian proves knowledge of the registration
//! number, the child's full name and the date of birth; any mismatch gives the
//! same `InvalidCredentials` answer.

use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use models::{Child, RegistrationNumber};
use neocare_lib::storage_engine::ChildStorage;

use crate::auth::JwtKeys;
use crate::errors::{AuthError, AuthResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalLogin {
    pub registration_number: String,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortalSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub child: Child,
}

pub async fn portal_login<S>(storage: &S, keys: &JwtKeys, login: &PortalLogin, now: DateTime<Utc>) -> AuthResult<PortalSession>
where
    S: ChildStorage + ?Sized,
{
    let number: RegistrationNumber = login.registration_number.trim().parse().map_err(|_| {
        debug!("Portal login with malformed registration number");
        AuthError::InvalidCredentials
    })?;
    let child = storage
        .get_child_by_registration(&number)
        .await?
        .filter(|child| child.date_of_birth == login.date_of_birth && child.matches_full_name(&login.full_name))
        .ok_or(AuthError::InvalidCredentials)?;

    let issued = keys.issue_portal_token(child.id, now)?;
    info!("Portal session opened for {}", child.registration_number);
    Ok(PortalSession { token: issued.token, expires_at: issued.expires_at, child })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use models::{Gender, GuardianContact, NewChild, NewHospital};
    use neocare_lib::storage_engine::{ChildRegistration, HospitalStorage, SledStorage};
    use uuid::Uuid;

    use crate::context::RequestContext;

    fn keys() -> JwtKeys {
        JwtKeys::new(b"0123456789abcdef0123456789abcdef", Duration::hours(1), Duration::minutes(15))
    }

    async fn registered_child() -> (SledStorage, Child) {
        let storage = SledStorage::temporary().unwrap();
        let hospital = NewHospital { name: "Mbale Referral".into(), address: None, phone: None, email: None };
        let hospital_id = storage.create_hospital(hospital, Utc::now()).await.unwrap().id;
        let details = NewChild {
            first_name: "Amina".into(),
            last_name: "Okafor".into(),
            date_of_birth: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            gender: Gender::Female,
            guardian: GuardianContact {
                name: "Ngozi Okafor".into(),
                phone: "+2348012345678".into(),
                email: None,
                address: None,
            },
            hospital_id,
        };
        let registration = ChildRegistration {
            child_id: Uuid::new_v4(),
            details,
            registered_by: Uuid::new_v4(),
            registered_at: Utc::now(),
            year: 2025,
            schedule: Vec::new(),
        };
        let child = storage.register_child(registration).await.unwrap();
        (storage, child)
    }

    fn credentials(child: &Child) -> PortalLogin {
        PortalLogin {
            registration_number: child.registration_number.to_string(),
            full_name: "  amina   OKAFOR ".into(),
            date_of_birth: child.date_of_birth,
        }
    }

    #[tokio::test]
    async fn should_open_read_only_session_for_matching_child() {
        let (storage, child) = registered_child().await;
        let session = portal_login(&storage, &keys(), &credentials(&child), Utc::now()).await.unwrap();
        assert_eq!(session.child.id, child.id);

        let ctx = keys().context_from_token(&session.token).unwrap();
        assert_eq!(ctx, RequestContext::parent(child.id));
        assert!(matches!(ctx.require_staff(), Err(AuthError::Forbidden(_))));
        assert!(ctx.ensure_child_access(&child).is_ok());
    }

    #[tokio::test]
    async fn should_reject_any_mismatch_uniformly() {
        let (storage, child) = registered_child().await;

        let mut wrong_dob = credentials(&child);
        wrong_dob.date_of_birth = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let mut wrong_name = credentials(&child);
        wrong_name.full_name = "Amina Obi".into();
        let mut unknown = credentials(&child);
        unknown.registration_number = "NC2025019999".into();
        let mut malformed = credentials(&child);
        malformed.registration_number = "hello".into();

        for attempt in [wrong_dob, wrong_name, unknown, malformed] {
            let result = portal_login(&storage, &keys(), &attempt, Utc::now()).await;
            assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        }
    }
}

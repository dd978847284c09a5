// rest_api/src/services.rs
//! Request orchestration: every function takes the caller's context
//! explicitly, checks it against the access policy and hospital scope, then
//! calls into the core library.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use models::{
    Child, Gender, Hospital, HospitalId, Login, MedicalRecord, NewChild, NewHospital, NewMedicalRecord, NewUser,
    NewVaccine, UserProfile, Vaccine, VaccineId, VaccineUpdate,
};
use neocare_lib::growth::{self, GrowthPoint, MeasurementKind, PercentileEstimate};
use neocare_lib::reports::ReportSnapshot;
use neocare_lib::scheduling::{
    classify_schedule, counts_by_child, ChildProgress, ClassifiedEntry, RecordVaccination, ReminderRun, StatusCounts,
    VaccinationOutcome,
};
use neocare_lib::{NeoCareError, RegisteredChild};
use security::{LoginResponse, Permission, PortalLogin, PortalSession, Principal, RequestContext};

use crate::errors::{ApiResult, RestApiError};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct ChildSummary {
    #[serde(flatten)]
    pub child: Child,
    pub progress: ChildProgress,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChildDetail {
    pub child: Child,
    pub hospital_name: String,
    pub age_months: u32,
    pub schedule: Vec<ClassifiedEntry>,
    pub progress: ChildProgress,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordVaccinationRequest {
    pub administered_date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PercentileQuery {
    pub kind: MeasurementKind,
    pub value: f64,
    pub age_months: u32,
    pub gender: Gender,
}

/// Resolves the hospital a listing or report covers. Scoped staff may only
/// name their own hospital.
fn resolve_scope(ctx: &RequestContext, requested: Option<HospitalId>) -> ApiResult<Option<HospitalId>> {
    match (ctx.hospital_scope()?, requested) {
        (None, requested) => Ok(requested),
        (Some(own), None) => Ok(Some(own)),
        (Some(own), Some(requested)) => {
            ctx.ensure_hospital(requested)?;
            Ok(Some(own))
        }
    }
}

/// Loads a child the caller may read: staff with the view permission inside
/// their scope, or the guardian holding that child's portal session.
async fn readable_child(state: &AppState, ctx: &RequestContext, child_id: Uuid) -> ApiResult<Child> {
    if matches!(ctx.principal, Principal::Staff { .. }) {
        ctx.authorize(&state.policy, Permission::ViewChildren)?;
    }
    let child = state
        .storage
        .get_child(&child_id)
        .await?
        .ok_or_else(|| NeoCareError::NotFound(format!("child {}", child_id)))?;
    ctx.ensure_child_access(&child)?;
    Ok(child)
}

pub async fn login(state: &AppState, credentials: &Login) -> ApiResult<LoginResponse> {
    Ok(security::login(&*state.storage, &state.keys, credentials, state.clock.now()).await?)
}

pub async fn portal_login(state: &AppState, credentials: &PortalLogin) -> ApiResult<PortalSession> {
    Ok(security::portal_login(&*state.storage, &state.keys, credentials, state.clock.now()).await?)
}

pub async fn portal_child(state: &AppState, ctx: &RequestContext) -> ApiResult<ChildDetail> {
    match ctx.principal {
        Principal::Parent { child_id } => child_detail(state, ctx, child_id).await,
        Principal::Staff { .. } => Err(security::AuthError::Forbidden("portal session required".to_string()).into()),
    }
}

pub async fn create_hospital(state: &AppState, ctx: &RequestContext, form: &NewHospital) -> ApiResult<Hospital> {
    ctx.authorize(&state.policy, Permission::ManageHospitals)?;
    let hospital = state.storage.create_hospital(form.validated()?, state.clock.now()).await?;
    info!("Hospital {} '{}' created", hospital.id, hospital.name);
    Ok(hospital)
}

pub async fn list_hospitals(state: &AppState, ctx: &RequestContext) -> ApiResult<Vec<Hospital>> {
    ctx.require_staff()?;
    let mut hospitals = state.storage.list_hospitals().await?;
    if let Some(own) = ctx.hospital_scope()? {
        hospitals.retain(|h| h.id == own);
    }
    Ok(hospitals)
}

pub async fn delete_hospital(state: &AppState, ctx: &RequestContext, id: HospitalId) -> ApiResult<()> {
    ctx.authorize(&state.policy, Permission::ManageHospitals)?;
    state.storage.delete_hospital(id).await?;
    info!("Hospital {} deleted", id);
    Ok(())
}

pub async fn create_user(state: &AppState, ctx: &RequestContext, form: &NewUser) -> ApiResult<UserProfile> {
    ctx.authorize(&state.policy, Permission::ManageStaff)?;
    ctx.ensure_can_assign(form.role, form.hospital_id)?;
    let user = security::create_user(&*state.storage, form, state.clock.now()).await?;
    Ok(user.profile())
}

pub async fn list_users(state: &AppState, ctx: &RequestContext, hospital_id: Option<HospitalId>) -> ApiResult<Vec<UserProfile>> {
    ctx.authorize(&state.policy, Permission::ManageStaff)?;
    let scope = resolve_scope(ctx, hospital_id)?;
    let users = state.storage.list_users(scope).await?;
    Ok(users.iter().map(|u| u.profile()).collect())
}

pub async fn create_vaccine(state: &AppState, ctx: &RequestContext, form: &NewVaccine) -> ApiResult<Vaccine> {
    ctx.authorize(&state.policy, Permission::ManageVaccines)?;
    let vaccine = state.storage.create_vaccine(form.validated()?, state.clock.now()).await?;
    info!("Vaccine {} added to the catalog", vaccine.label());
    Ok(vaccine)
}

pub async fn list_vaccines(state: &AppState, ctx: &RequestContext) -> ApiResult<Vec<Vaccine>> {
    ctx.require_staff()?;
    Ok(state.storage.list_vaccines().await?)
}

pub async fn update_vaccine(
    state: &AppState,
    ctx: &RequestContext,
    id: VaccineId,
    update: &VaccineUpdate,
) -> ApiResult<Vaccine> {
    ctx.authorize(&state.policy, Permission::ManageVaccines)?;
    if update.is_empty() {
        return Err(RestApiError::InvalidInput("update changes nothing".to_string()));
    }
    Ok(state.storage.update_vaccine(id, update).await?)
}

pub async fn delete_vaccine(state: &AppState, ctx: &RequestContext, id: VaccineId) -> ApiResult<()> {
    ctx.authorize(&state.policy, Permission::ManageVaccines)?;
    state.storage.delete_vaccine(id).await?;
    info!("Vaccine {} deleted", id);
    Ok(())
}

pub async fn register_child(state: &AppState, ctx: &RequestContext, form: &NewChild) -> ApiResult<RegisteredChild> {
    let (user_id, _) = ctx.authorize(&state.policy, Permission::RegisterChild)?;
    ctx.ensure_hospital(form.hospital_id)?;
    Ok(state.registrar.register(form, user_id).await?)
}

pub async fn list_children(
    state: &AppState,
    ctx: &RequestContext,
    hospital_id: Option<HospitalId>,
) -> ApiResult<Vec<ChildSummary>> {
    ctx.authorize(&state.policy, Permission::ViewChildren)?;
    let scope = resolve_scope(ctx, hospital_id)?;
    let today = state.clock.today();
    let children = state.storage.list_children(scope).await?;
    let mut counts = counts_by_child(&state.storage.list_schedule_entries().await?, today);
    Ok(children
        .into_iter()
        .map(|child| {
            let progress = counts.remove(&child.id).unwrap_or_default().into();
            ChildSummary { child, progress }
        })
        .collect())
}

pub async fn child_schedule(state: &AppState, ctx: &RequestContext, child_id: Uuid) -> ApiResult<Vec<ClassifiedEntry>> {
    let child = readable_child(state, ctx, child_id).await?;
    let entries = state.storage.list_schedule_for_child(&child.id).await?;
    let vaccines = state.storage.list_vaccines().await?;
    Ok(classify_schedule(&entries, &vaccines, state.clock.today()))
}

pub async fn child_detail(state: &AppState, ctx: &RequestContext, child_id: Uuid) -> ApiResult<ChildDetail> {
    let child = readable_child(state, ctx, child_id).await?;
    let today = state.clock.today();
    let entries = state.storage.list_schedule_for_child(&child.id).await?;
    let vaccines = state.storage.list_vaccines().await?;
    let hospital = state.storage.get_hospital(child.hospital_id).await?;
    Ok(ChildDetail {
        hospital_name: Hospital::display_name(hospital.as_ref()).to_string(),
        age_months: child.age_in_months(today),
        schedule: classify_schedule(&entries, &vaccines, today),
        progress: StatusCounts::from_entries(&entries, today).into(),
        child,
    })
}

pub async fn record_vaccination(
    state: &AppState,
    ctx: &RequestContext,
    entry_id: Uuid,
    request: &RecordVaccinationRequest,
) -> ApiResult<VaccinationOutcome> {
    let (user_id, _) = ctx.authorize(&state.policy, Permission::RecordVaccination)?;
    let command = RecordVaccination {
        entry_id,
        administered_date: request.administered_date,
        administered_by: user_id,
        notes: request.notes.clone(),
    };
    let outcome = state
        .recorder
        .record(&command, |child| {
            ctx.ensure_child_access(child)
                .map_err(|e| NeoCareError::PermissionDenied(e.to_string()))
        })
        .await?;
    Ok(outcome)
}

pub async fn add_medical_record(
    state: &AppState,
    ctx: &RequestContext,
    child_id: Uuid,
    form: &NewMedicalRecord,
) -> ApiResult<MedicalRecord> {
    let (user_id, _) = ctx.authorize(&state.policy, Permission::AddMedicalRecord)?;
    let child = state
        .storage
        .get_child(&child_id)
        .await?
        .ok_or_else(|| NeoCareError::NotFound(format!("child {}", child_id)))?;
    ctx.ensure_child_access(&child)?;

    let valid = form.validated(child.date_of_birth, state.clock.today())?;
    let age_months = child.age_in_months(valid.visit_date);
    let record = MedicalRecord::from_new(child.id, age_months, valid, user_id, state.clock.now());
    state.storage.add_medical_record(&record).await?;
    info!("Medical record {} added for {}", record.id, child.registration_number);
    Ok(record)
}

pub async fn list_medical_records(state: &AppState, ctx: &RequestContext, child_id: Uuid) -> ApiResult<Vec<MedicalRecord>> {
    let child = readable_child(state, ctx, child_id).await?;
    Ok(state.storage.list_medical_records(&child.id).await?)
}

pub async fn growth_chart(state: &AppState, ctx: &RequestContext, child_id: Uuid) -> ApiResult<Vec<GrowthPoint>> {
    let child = readable_child(state, ctx, child_id).await?;
    let records = state.storage.list_medical_records(&child.id).await?;
    Ok(growth::growth_chart(&records, child.gender))
}

pub fn estimate_percentile(ctx: &RequestContext, query: &PercentileQuery) -> ApiResult<PercentileEstimate> {
    ctx.require_staff()?;
    Ok(growth::estimate_percentile(query.kind, query.value, query.age_months, query.gender)?)
}

pub async fn report_snapshot(
    state: &AppState,
    ctx: &RequestContext,
    hospital_id: Option<HospitalId>,
) -> ApiResult<ReportSnapshot> {
    ctx.authorize(&state.policy, Permission::ViewReports)?;
    let scope = resolve_scope(ctx, hospital_id)?;
    Ok(ReportSnapshot::load(&*state.storage, scope, &*state.clock).await?)
}

pub async fn send_reminders(
    state: &AppState,
    ctx: &RequestContext,
    hospital_id: Option<HospitalId>,
) -> ApiResult<ReminderRun> {
    ctx.authorize(&state.policy, Permission::SendReminders)?;
    let scope = resolve_scope(ctx, hospital_id)?;
    Ok(state.reminders.run(&*state.storage, &state.dispatcher, scope, state.clock.today()).await?)
}

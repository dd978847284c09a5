// rest_api/src/handlers.rs
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use models::{
    Hospital, HospitalId, Login, MedicalRecord, NewChild, NewHospital, NewMedicalRecord, NewUser, NewVaccine,
    UserProfile, Vaccine, VaccineId, VaccineUpdate,
};
use neocare_lib::growth::{GrowthPoint, PercentileEstimate};
use neocare_lib::reports::{to_csv, CsvRecord, Dashboard};
use neocare_lib::scheduling::{ClassifiedEntry, ReminderRun, VaccinationOutcome};
use neocare_lib::RegisteredChild;
use security::{LoginResponse, PortalLogin, PortalSession};

use crate::errors::ApiResult;
use crate::extract::{Authenticated, JsonBody};
use crate::services::{self, ChildDetail, ChildSummary, PercentileQuery, RecordVaccinationRequest};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct HospitalFilter {
    pub hospital_id: Option<HospitalId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub hospital_id: Option<HospitalId>,
    #[serde(default)]
    pub format: ReportFormat,
}

fn render_rows<T: Serialize + CsvRecord>(rows: Vec<T>, format: ReportFormat, name: &str) -> Response {
    match format {
        ReportFormat::Json => Json(rows).into_response(),
        ReportFormat::Csv => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}.csv\"", name)),
            ],
            to_csv(&rows),
        )
            .into_response(),
    }
}

// Handler for the /api/v1/health endpoint
pub async fn health_check_handler() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok", "message": "NeoCare API is healthy" })))
}

pub async fn login_handler(State(state): State<AppState>, JsonBody(payload): JsonBody<Login>) -> ApiResult<Json<LoginResponse>> {
    debug!("Login attempt for '{}'", payload.username);
    Ok(Json(services::login(&state, &payload).await?))
}

pub async fn portal_login_handler(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<PortalLogin>,
) -> ApiResult<Json<PortalSession>> {
    Ok(Json(services::portal_login(&state, &payload).await?))
}

pub async fn portal_child_handler(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
) -> ApiResult<Json<ChildDetail>> {
    Ok(Json(services::portal_child(&state, &ctx).await?))
}

pub async fn create_hospital_handler(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    JsonBody(payload): JsonBody<NewHospital>,
) -> ApiResult<(StatusCode, Json<Hospital>)> {
    let hospital = services::create_hospital(&state, &ctx, &payload).await?;
    Ok((StatusCode::CREATED, Json(hospital)))
}

pub async fn list_hospitals_handler(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
) -> ApiResult<Json<Vec<Hospital>>> {
    Ok(Json(services::list_hospitals(&state, &ctx).await?))
}

pub async fn delete_hospital_handler(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    Path(id): Path<HospitalId>,
) -> ApiResult<StatusCode> {
    services::delete_hospital(&state, &ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_user_handler(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    JsonBody(payload): JsonBody<NewUser>,
) -> ApiResult<(StatusCode, Json<UserProfile>)> {
    let profile = services::create_user(&state, &ctx, &payload).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn list_users_handler(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    Query(filter): Query<HospitalFilter>,
) -> ApiResult<Json<Vec<UserProfile>>> {
    Ok(Json(services::list_users(&state, &ctx, filter.hospital_id).await?))
}

pub async fn create_vaccine_handler(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    JsonBody(payload): JsonBody<NewVaccine>,
) -> ApiResult<(StatusCode, Json<Vaccine>)> {
    let vaccine = services::create_vaccine(&state, &ctx, &payload).await?;
    Ok((StatusCode::CREATED, Json(vaccine)))
}

pub async fn list_vaccines_handler(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
) -> ApiResult<Json<Vec<Vaccine>>> {
    Ok(Json(services::list_vaccines(&state, &ctx).await?))
}

pub async fn update_vaccine_handler(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    Path(id): Path<VaccineId>,
    JsonBody(payload): JsonBody<VaccineUpdate>,
) -> ApiResult<Json<Vaccine>> {
    Ok(Json(services::update_vaccine(&state, &ctx, id, &payload).await?))
}

pub async fn delete_vaccine_handler(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    Path(id): Path<VaccineId>,
) -> ApiResult<StatusCode> {
    services::delete_vaccine(&state, &ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn register_child_handler(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    JsonBody(payload): JsonBody<NewChild>,
) -> ApiResult<(StatusCode, Json<RegisteredChild>)> {
    let registered = services::register_child(&state, &ctx, &payload).await?;
    Ok((StatusCode::CREATED, Json(registered)))
}

pub async fn list_children_handler(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    Query(filter): Query<HospitalFilter>,
) -> ApiResult<Json<Vec<ChildSummary>>> {
    Ok(Json(services::list_children(&state, &ctx, filter.hospital_id).await?))
}

pub async fn child_detail_handler(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ChildDetail>> {
    Ok(Json(services::child_detail(&state, &ctx, id).await?))
}

pub async fn child_schedule_handler(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<ClassifiedEntry>>> {
    Ok(Json(services::child_schedule(&state, &ctx, id).await?))
}

pub async fn record_vaccination_handler(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    Path(entry_id): Path<Uuid>,
    JsonBody(payload): JsonBody<RecordVaccinationRequest>,
) -> ApiResult<Json<VaccinationOutcome>> {
    Ok(Json(services::record_vaccination(&state, &ctx, entry_id, &payload).await?))
}

pub async fn add_medical_record_handler(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    Path(child_id): Path<Uuid>,
    JsonBody(payload): JsonBody<NewMedicalRecord>,
) -> ApiResult<(StatusCode, Json<MedicalRecord>)> {
    let record = services::add_medical_record(&state, &ctx, child_id, &payload).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_medical_records_handler(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    Path(child_id): Path<Uuid>,
) -> ApiResult<Json<Vec<MedicalRecord>>> {
    Ok(Json(services::list_medical_records(&state, &ctx, child_id).await?))
}

pub async fn growth_chart_handler(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    Path(child_id): Path<Uuid>,
) -> ApiResult<Json<Vec<GrowthPoint>>> {
    Ok(Json(services::growth_chart(&state, &ctx, child_id).await?))
}

pub async fn percentile_handler(
    Authenticated(ctx): Authenticated,
    Query(query): Query<PercentileQuery>,
) -> ApiResult<Json<PercentileEstimate>> {
    Ok(Json(services::estimate_percentile(&ctx, &query)?))
}

pub async fn dashboard_handler(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    Query(filter): Query<HospitalFilter>,
) -> ApiResult<Json<Dashboard>> {
    let snapshot = services::report_snapshot(&state, &ctx, filter.hospital_id).await?;
    Ok(Json(snapshot.dashboard()))
}

pub async fn hospital_coverage_handler(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Response> {
    let snapshot = services::report_snapshot(&state, &ctx, query.hospital_id).await?;
    Ok(render_rows(snapshot.hospital_coverage(), query.format, "hospital_coverage"))
}

pub async fn vaccine_coverage_handler(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Response> {
    let snapshot = services::report_snapshot(&state, &ctx, query.hospital_id).await?;
    Ok(render_rows(snapshot.vaccine_coverage(), query.format, "vaccine_coverage"))
}

pub async fn registrations_handler(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Response> {
    let snapshot = services::report_snapshot(&state, &ctx, query.hospital_id).await?;
    Ok(render_rows(snapshot.registrations_by_month(), query.format, "registrations"))
}

pub async fn staff_performance_handler(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Response> {
    let snapshot = services::report_snapshot(&state, &ctx, query.hospital_id).await?;
    Ok(render_rows(snapshot.staff_performance(), query.format, "staff_performance"))
}

pub async fn send_reminders_handler(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    Query(filter): Query<HospitalFilter>,
) -> ApiResult<Json<ReminderRun>> {
    Ok(Json(services::send_reminders(&state, &ctx, filter.hospital_id).await?))
}

//! REST API - patients, appointments and reports
//!
//! Handlers read with a detached [`FetchScope`]: when a client disconnects,
//! axum drops the handler future and the pending read with it, so there is
//! no caller left to hand an empty result to. Reads still carry the load
//! deadline and time out as 504.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use opticare_core::models::{
    Appointment, AppointmentPatch, AppointmentStats, AppointmentType, NewAppointment,
    NewPatient, Patient, PatientPatch, PatientSnapshot, DEFAULT_DURATION_MINUTES,
};
use opticare_core::{FetchScope, PatientReport, RepoError};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping))
        .route("/patients", get(list_patients).post(create_patient))
        .route(
            "/patients/:id",
            get(get_patient).patch(update_patient).delete(delete_patient),
        )
        .route("/patients/:id/appointments", get(patient_appointments))
        .route(
            "/appointments",
            get(list_appointments).post(create_appointment),
        )
        .route("/appointments/stats", get(appointment_stats))
        .route(
            "/appointments/:id",
            get(get_appointment)
                .patch(update_appointment)
                .delete(delete_appointment),
        )
        .route("/reports/summary", get(report_summary))
        .route("/reports/export", get(report_export))
}

async fn ping(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "message": state.ping_message }))
}

// ---------------------------------------------------------------------------
// Patients
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PatientQuery {
    q: Option<String>,
}

async fn create_patient(
    State(state): State<AppState>,
    payload: Result<Json<NewPatient>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(data) = payload?;
    let id = state.core.patients().add_patient(data).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn list_patients(
    State(state): State<AppState>,
    query: Result<Query<PatientQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Patient>>> {
    let Query(query) = query?;
    let scope = FetchScope::detached();
    let patients = match query.q.as_deref().map(str::trim) {
        Some(term) if !term.is_empty() => {
            state.core.patients().search_patients(&scope, term).await?
        }
        _ => state.core.patients().get_all_patients(&scope).await?,
    };
    Ok(Json(patients))
}

async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Patient>> {
    let scope = FetchScope::detached();
    state
        .core
        .patients()
        .get_patient_by_id(&scope, &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Patient not found".into()))
}

async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<PatientPatch>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(patch) = payload?;
    state.core.patients().update_patient(&id, patch).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.core.patients().delete_patient(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn patient_appointments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Appointment>>> {
    let scope = FetchScope::detached();
    let appointments = state
        .core
        .appointments()
        .get_patient_appointments(&scope, &id)
        .await?;
    Ok(Json(appointments))
}

// ---------------------------------------------------------------------------
// Appointments
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct AppointmentQuery {
    date: Option<String>,
}

/// Booking request. The patient snapshot is filled in from the record.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct BookAppointment {
    patient_id: String,
    date: String,
    time: String,
    duration: u32,
    #[serde(rename = "type")]
    kind: AppointmentType,
    notes: String,
}

impl Default for BookAppointment {
    fn default() -> Self {
        Self {
            patient_id: String::new(),
            date: String::new(),
            time: String::new(),
            duration: DEFAULT_DURATION_MINUTES,
            kind: AppointmentType::default(),
            notes: String::new(),
        }
    }
}

async fn create_appointment(
    State(state): State<AppState>,
    payload: Result<Json<BookAppointment>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(booking) = payload?;

    let mut data = NewAppointment::new(
        booking.patient_id,
        PatientSnapshot::default(),
        booking.date,
        booking.time,
    );
    data.duration = booking.duration;
    data.kind = booking.kind;
    data.notes = booking.notes;

    let missing = data.missing_required();
    if !missing.is_empty() {
        return Err(RepoError::missing_fields(&missing).into());
    }

    let scope = FetchScope::detached();
    let patient = state
        .core
        .patients()
        .get_patient_by_id(&scope, &data.patient_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Patient not found".into()))?;
    data.snapshot = PatientSnapshot::of(&patient);

    let id = state.core.appointments().add_appointment(data).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn list_appointments(
    State(state): State<AppState>,
    query: Result<Query<AppointmentQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Appointment>>> {
    let Query(query) = query?;
    let scope = FetchScope::detached();
    let repo = state.core.appointments();
    let appointments = match query.date.as_deref() {
        Some(date) if !date.is_empty() => repo.get_appointments_by_date(&scope, date).await?,
        _ => repo.get_all_appointments(&scope).await?,
    };
    Ok(Json(appointments))
}

async fn appointment_stats(State(state): State<AppState>) -> ApiResult<Json<AppointmentStats>> {
    let scope = FetchScope::detached();
    let stats = state.core.appointments().get_appointment_stats(&scope).await?;
    Ok(Json(stats))
}

async fn get_appointment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Appointment>> {
    let scope = FetchScope::detached();
    state
        .core
        .appointments()
        .get_appointment_by_id(&scope, &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Appointment not found".into()))
}

async fn update_appointment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<AppointmentPatch>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(patch) = payload?;
    state.core.appointments().update_appointment(&id, patch).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_appointment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.core.appointments().delete_appointment(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

async fn build_report(state: &AppState) -> ApiResult<PatientReport> {
    let scope = FetchScope::detached();
    Ok(state.core.patient_report(&scope, Utc::now()).await?)
}

async fn report_summary(State(state): State<AppState>) -> ApiResult<Json<PatientReport>> {
    Ok(Json(build_report(&state).await?))
}

async fn report_export(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let report = build_report(&state).await?;
    let disposition = format!("attachment; filename=\"{}\"", report.file_name());
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.to_csv(),
    ))
}

//! Patient endpoints.
//!
//! - `GET /api/patients`: list
//! - `POST /api/patients`: create
//! - `GET|PUT|DELETE /api/patients/:id`
//! - `POST /api/patients/:id/statut`: append a treatment status transition

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::endpoints::{assign_created_at, assign_id};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::enums::TreatmentStatus;
use crate::models::{dates, Patient};

#[derive(Serialize, Deserialize)]
pub struct PatientsResponse {
    pub patients: Vec<Patient>,
}

/// `GET /api/patients`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<PatientsResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let patients = db::list_patients(&conn)?;
    Ok(Json(PatientsResponse { patients }))
}

/// `GET /api/patients/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    let conn = ctx.open_db()?;
    db::get_patient(&conn, &id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("patient {id} not found")))
}

/// `POST /api/patients`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(mut patient): Json<Patient>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    validate(&patient)?;
    patient.id = assign_id(&patient.id);
    patient.created_at = assign_created_at(patient.created_at.take());

    let conn = ctx.open_db()?;
    let stored = db::insert_patient(&conn, &patient)?;
    tracing::info!(patient_id = %stored.id, "Patient created");
    Ok((StatusCode::CREATED, Json(stored)))
}

/// `PUT /api/patients/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Json(mut patient): Json<Patient>,
) -> Result<Json<Patient>, ApiError> {
    validate(&patient)?;
    patient.id = id;

    let conn = ctx.open_db()?;
    Ok(Json(db::update_patient(&conn, &patient)?))
}

/// `DELETE /api/patients/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.open_db()?;
    db::delete_patient(&conn, &id)?;
    tracing::info!(patient_id = %id, "Patient deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub statut: TreatmentStatus,
    /// Defaults to now.
    pub date: Option<String>,
}

/// `POST /api/patients/:id/statut`
pub async fn change_status(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Json(req): Json<StatusChangeRequest>,
) -> Result<Json<Patient>, ApiError> {
    let date = req
        .date
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| dates::format_instant(dates::now_local()));

    let conn = ctx.open_db()?;
    let patient = db::record_status_change(&conn, &id, req.statut, &date)?;
    tracing::info!(patient_id = %id, statut = %req.statut, "Patient status changed");
    Ok(Json(patient))
}

fn validate(patient: &Patient) -> Result<(), ApiError> {
    if patient.nom.trim().is_empty() && patient.prenom.trim().is_empty() {
        return Err(ApiError::BadRequest("Patient name is required".into()));
    }
    Ok(())
}

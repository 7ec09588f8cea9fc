//! Appointment endpoints.
//!
//! - `GET /api/rendez-vous`: list, optionally narrowed to a planning view
//! - `POST /api/rendez-vous`: create; 409 when the doctor's slot is taken
//! - `GET|PUT|DELETE /api/rendez-vous/:id`

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::endpoints::assign_id;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::{dates, RendezVous};
use crate::scheduling::{self, PlanningView};

#[derive(Serialize, Deserialize)]
pub struct RendezVousResponse {
    pub rendez_vous: Vec<RendezVous>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlanningQuery {
    pub view: Option<PlanningView>,
    /// Reference day, `YYYY-MM-DD`. Defaults to today.
    pub date: Option<String>,
    pub search: Option<String>,
}

/// `GET /api/rendez-vous`: all appointments, or a planning view when
/// `view` is given.
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<PlanningQuery>,
) -> Result<Json<RendezVousResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let all = db::list_rendez_vous(&conn)?;

    let rendez_vous = match query.view {
        None => match query.search.as_deref() {
            Some(search) if !search.trim().is_empty() => {
                let needle = search.trim().to_lowercase();
                all.into_iter()
                    .filter(|r| r.patient.to_lowercase().contains(&needle))
                    .collect()
            }
            _ => all,
        },
        Some(view) => {
            let reference = match query.date.as_deref() {
                None => dates::now_local().date(),
                Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| ApiError::BadRequest(format!("Invalid date: {raw}")))?,
            };
            scheduling::planning(&all, view, reference, query.search.as_deref())
        }
    };
    Ok(Json(RendezVousResponse { rendez_vous }))
}

/// `GET /api/rendez-vous/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<RendezVous>, ApiError> {
    let conn = ctx.open_db()?;
    fetch(&conn, &id).map(Json)
}

/// `POST /api/rendez-vous`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(mut rdv): Json<RendezVous>,
) -> Result<(StatusCode, Json<RendezVous>), ApiError> {
    validate(&rdv)?;
    rdv.id = assign_id(&rdv.id);

    let conn = ctx.open_db()?;
    db::schedule_rendez_vous(&conn, &rdv)?;
    tracing::info!(rendez_vous_id = %rdv.id, date = %rdv.date, heure = %rdv.heure, "Appointment scheduled");
    Ok((StatusCode::CREATED, Json(fetch(&conn, &rdv.id)?)))
}

/// `PUT /api/rendez-vous/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Json(mut rdv): Json<RendezVous>,
) -> Result<Json<RendezVous>, ApiError> {
    validate(&rdv)?;
    rdv.id = id;

    let conn = ctx.open_db()?;
    db::reschedule_rendez_vous(&conn, &rdv)?;
    Ok(Json(fetch(&conn, &rdv.id)?))
}

/// `DELETE /api/rendez-vous/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.open_db()?;
    db::delete_rendez_vous(&conn, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

fn validate(rdv: &RendezVous) -> Result<(), ApiError> {
    if dates::parse_instant(&rdv.date).is_none() {
        return Err(ApiError::BadRequest(format!("Invalid appointment date: {}", rdv.date)));
    }
    if rdv.heure.trim().is_empty() {
        return Err(ApiError::BadRequest("Appointment time is required".into()));
    }
    if rdv.medecin.trim().is_empty() && rdv.medecin_id.is_none() {
        return Err(ApiError::BadRequest("Appointment doctor is required".into()));
    }
    Ok(())
}

fn fetch(conn: &rusqlite::Connection, id: &str) -> Result<RendezVous, ApiError> {
    db::get_rendez_vous(conn, id)?
        .ok_or_else(|| ApiError::NotFound(format!("rendez_vous {id} not found")))
}

//! Consultation endpoints.
//!
//! - `GET|POST /api/consultations`
//! - `GET|PUT|DELETE /api/consultations/:id`

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::endpoints::assign_id;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::{dates, Consultation};

#[derive(Serialize, Deserialize)]
pub struct ConsultationsResponse {
    pub consultations: Vec<Consultation>,
}

/// `GET /api/consultations`
pub async fn list(
    State(ctx): State<ApiContext>,
) -> Result<Json<ConsultationsResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let consultations = db::list_consultations(&conn)?;
    Ok(Json(ConsultationsResponse { consultations }))
}

/// `GET /api/consultations/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Consultation>, ApiError> {
    let conn = ctx.open_db()?;
    fetch(&conn, &id).map(Json)
}

/// `POST /api/consultations`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(mut consultation): Json<Consultation>,
) -> Result<(StatusCode, Json<Consultation>), ApiError> {
    validate(&consultation)?;
    consultation.id = assign_id(&consultation.id);

    let conn = ctx.open_db()?;
    db::insert_consultation(&conn, &consultation)?;
    Ok((StatusCode::CREATED, Json(fetch(&conn, &consultation.id)?)))
}

/// `PUT /api/consultations/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Json(mut consultation): Json<Consultation>,
) -> Result<Json<Consultation>, ApiError> {
    validate(&consultation)?;
    consultation.id = id;

    let conn = ctx.open_db()?;
    db::update_consultation(&conn, &consultation)?;
    Ok(Json(fetch(&conn, &consultation.id)?))
}

/// `DELETE /api/consultations/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.open_db()?;
    db::delete_consultation(&conn, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

fn validate(consultation: &Consultation) -> Result<(), ApiError> {
    if dates::parse_instant(&consultation.date).is_none() {
        return Err(ApiError::BadRequest(format!(
            "Invalid consultation date: {}",
            consultation.date
        )));
    }
    Ok(())
}

fn fetch(conn: &rusqlite::Connection, id: &str) -> Result<Consultation, ApiError> {
    db::get_consultation(conn, id)?
        .ok_or_else(|| ApiError::NotFound(format!("consultation {id} not found")))
}

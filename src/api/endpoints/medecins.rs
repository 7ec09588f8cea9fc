//! Doctor endpoints.
//!
//! - `GET|POST /api/medecins`
//! - `GET|PUT|DELETE /api/medecins/:id`

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::endpoints::{assign_created_at, assign_id};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::Medecin;

#[derive(Serialize, Deserialize)]
pub struct MedecinsResponse {
    pub medecins: Vec<Medecin>,
}

/// `GET /api/medecins`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<MedecinsResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let medecins = db::list_medecins(&conn)?;
    Ok(Json(MedecinsResponse { medecins }))
}

/// `GET /api/medecins/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Medecin>, ApiError> {
    let conn = ctx.open_db()?;
    fetch(&conn, &id).map(Json)
}

/// `POST /api/medecins`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(mut medecin): Json<Medecin>,
) -> Result<(StatusCode, Json<Medecin>), ApiError> {
    if medecin.nom.trim().is_empty() {
        return Err(ApiError::BadRequest("Doctor name is required".into()));
    }
    medecin.id = assign_id(&medecin.id);
    medecin.created_at = assign_created_at(medecin.created_at.take());

    let conn = ctx.open_db()?;
    db::insert_medecin(&conn, &medecin)?;
    tracing::info!(medecin_id = %medecin.id, "Doctor created");
    Ok((StatusCode::CREATED, Json(fetch(&conn, &medecin.id)?)))
}

/// `PUT /api/medecins/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Json(mut medecin): Json<Medecin>,
) -> Result<Json<Medecin>, ApiError> {
    medecin.id = id;
    let conn = ctx.open_db()?;
    db::update_medecin(&conn, &medecin)?;
    Ok(Json(fetch(&conn, &medecin.id)?))
}

/// `DELETE /api/medecins/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.open_db()?;
    db::delete_medecin(&conn, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

fn fetch(conn: &rusqlite::Connection, id: &str) -> Result<Medecin, ApiError> {
    db::get_medecin(conn, id)?.ok_or_else(|| ApiError::NotFound(format!("medecin {id} not found")))
}

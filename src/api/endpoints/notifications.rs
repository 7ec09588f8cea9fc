//! `GET /api/notifications?variant=dashboard|center`: ranked notifications
//! computed from the current clinic state.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{reference_now, ApiContext, ClinicData};
use crate::models::Notification;
use crate::notifications::{self, Variant};

#[derive(Debug, Default, Deserialize)]
pub struct NotificationsQuery {
    #[serde(default)]
    pub variant: Variant,
    pub now: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
}

pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<NotificationsQuery>,
) -> Result<Json<NotificationsResponse>, ApiError> {
    let now = reference_now(query.now.as_deref())?;

    let conn = ctx.open_db()?;
    let data = ClinicData::load(&conn)?;
    let notifications = notifications::generate(&data.snapshot(), now, query.variant);
    Ok(Json(NotificationsResponse { notifications }))
}

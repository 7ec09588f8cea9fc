//! Dashboard aggregation endpoints.
//!
//! - `GET /api/stats/dashboard`: overview, breakdowns and weekly series
//! - `GET /api/dashboard/weekly?weeks=N`: weekly summaries only

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{reference_now, ApiContext, ClinicData};
use crate::dashboard::{self, DashboardStats, WeeklySummary, DEFAULT_WEEKS, MAX_WEEKS};

#[derive(Debug, Default, Deserialize)]
pub struct WeeksQuery {
    pub weeks: Option<usize>,
    pub now: Option<String>,
}

impl WeeksQuery {
    fn weeks(&self) -> Result<usize, ApiError> {
        match self.weeks {
            None => Ok(DEFAULT_WEEKS),
            Some(n) if n > MAX_WEEKS => Err(ApiError::BadRequest(format!(
                "weeks must be at most {MAX_WEEKS}"
            ))),
            Some(n) => Ok(n),
        }
    }
}

/// `GET /api/stats/dashboard`
pub async fn dashboard(
    State(ctx): State<ApiContext>,
    Query(query): Query<WeeksQuery>,
) -> Result<Json<DashboardStats>, ApiError> {
    let weeks = query.weeks()?;
    let now = reference_now(query.now.as_deref())?;

    let conn = ctx.open_db()?;
    let data = ClinicData::load(&conn)?;
    Ok(Json(dashboard::dashboard_stats(&data.snapshot(), now, weeks)))
}

#[derive(Serialize, Deserialize)]
pub struct WeeklyResponse {
    pub weeks: Vec<WeeklySummary>,
}

/// `GET /api/dashboard/weekly`
pub async fn weekly(
    State(ctx): State<ApiContext>,
    Query(query): Query<WeeksQuery>,
) -> Result<Json<WeeklyResponse>, ApiError> {
    let weeks = query.weeks()?;
    let now = reference_now(query.now.as_deref())?;

    let conn = ctx.open_db()?;
    let data = ClinicData::load(&conn)?;
    Ok(Json(WeeklyResponse {
        weeks: dashboard::weekly_summaries(&data.snapshot(), now, weeks),
    }))
}

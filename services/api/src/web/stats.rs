//! services/api/src/web/stats.rs
//!
//! Handlers for derived user statistics: the read path assembles the
//! display summary (lazily creating a zeroed record), the write path
//! records a session duration and/or a submitted command.

use axum::{extract::State, response::Json, Extension};
use chrono::{Local, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::web::state::AppState;
use staff_dashboard_core::domain::{Identity, UserStats};
use staff_dashboard_core::ports::PortError;
use staff_dashboard_core::stats::summarize;

/// How many recent activities ride along with the summary.
const RECENT_ACTIVITY_LIMIT: i64 = 5;

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatsRequest {
    #[serde(default)]
    pub session_duration: Option<i64>,
    #[serde(default)]
    pub command: Option<String>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /api/stats - The caller's display-ready statistics summary.
///
/// Reading may create the zeroed record as a side effect; that creation is
/// idempotent and race-safe, so the read stays repeatable.
#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "Derived statistics summary"),
        (status = 401, description = "Missing or invalid session cookie"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_stats_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>, ApiError> {
    let stats = match state.store.find_stats(&identity.id).await? {
        Some(stats) => stats,
        None => {
            state
                .store
                .create_stats(UserStats::zeroed(&identity.id, Utc::now()))
                .await?
        }
    };

    let recent = state
        .store
        .recent_activity(&identity.id, RECENT_ACTIVITY_LIMIT)
        .await?;

    // Weekly buckets follow the server's calendar days.
    let summary = summarize(&stats, &recent, Local::now());

    Ok(Json(json!({ "stats": summary })))
}

/// POST /api/stats - Record a session and/or a submitted command.
///
/// Unlike the read path this requires the record to exist already.
#[utoipa::path(
    post,
    path = "/api/stats",
    request_body = UpdateStatsRequest,
    responses(
        (status = 200, description = "Updated statistics record"),
        (status = 401, description = "Missing or invalid session cookie"),
        (status = 404, description = "No statistics record exists yet"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_stats_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<UpdateStatsRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut stats = state
        .store
        .find_stats(&identity.id)
        .await?
        .ok_or_else(|| PortError::NotFound("Stats not found".to_string()))?;

    stats.record(req.session_duration, req.command.as_deref(), Utc::now());

    let stats = state.store.save_stats(&stats).await?;

    Ok(Json(json!({ "stats": stats })))
}

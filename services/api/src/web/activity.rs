//! services/api/src/web/activity.rs
//!
//! Handlers for the append-only activity log.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::web::state::AppState;
use staff_dashboard_core::domain::{Activity, Identity};

const DEFAULT_LIST_LIMIT: i64 = 10;

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogActivityRequest {
    pub action: String,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

#[derive(Deserialize)]
pub struct ListActivityQuery {
    #[serde(default)]
    pub limit: Option<i64>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/activity - Append one log entry for the caller.
#[utoipa::path(
    post,
    path = "/api/activity",
    request_body = LogActivityRequest,
    responses(
        (status = 201, description = "Activity logged"),
        (status = 401, description = "Missing or invalid session cookie"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn log_activity_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<LogActivityRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let activity = state
        .store
        .insert_activity(Activity {
            id: None,
            user_id: identity.id,
            action: req.action,
            command: req.command,
            metadata: req.metadata,
            timestamp: Utc::now(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "activity": activity }))))
}

/// GET /api/activity - The caller's activities, newest first.
#[utoipa::path(
    get,
    path = "/api/activity",
    responses(
        (status = 200, description = "Activity list"),
        (status = 401, description = "Missing or invalid session cookie"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("limit" = Option<i64>, Query, description = "Maximum number of entries, default 10")
    )
)]
pub async fn list_activity_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ListActivityQuery>,
) -> Result<Json<Value>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    let activities = state.store.recent_activity(&identity.id, limit).await?;

    Ok(Json(json!({ "activities": activities })))
}

//! services/api/src/web/projects.rs
//!
//! Handlers for the per-user project: lazy creation from the default
//! template, merge-updates, sharing flags, and the unauthenticated
//! shared-link read.

use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::web::state::AppState;
use staff_dashboard_core::domain::{Identity, Project, ProjectPatch};
use staff_dashboard_core::ports::PortError;

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub shared_with: Option<Vec<String>>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /api/projects - The caller's project, created from the default
/// template on first access.
#[utoipa::path(
    get,
    path = "/api/projects",
    responses(
        (status = 200, description = "The caller's project"),
        (status = 401, description = "Missing or invalid session cookie"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_project_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>, ApiError> {
    let project = match state.store.find_project_by_user(&identity.id).await? {
        Some(project) => project,
        // The unique index on userId makes this race-safe: a concurrent
        // first access resolves to the already-created document.
        None => {
            state
                .store
                .create_project(Project::default_for(&identity, Utc::now()))
                .await?
        }
    };

    Ok(Json(json!({ "project": project })))
}

/// PUT /api/projects - Merge-update the caller's own project.
#[utoipa::path(
    put,
    path = "/api/projects",
    responses(
        (status = 200, description = "The updated project"),
        (status = 401, description = "Missing or invalid session cookie"),
        (status = 404, description = "No project exists yet"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_project_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(patch): Json<ProjectPatch>,
) -> Result<Json<Value>, ApiError> {
    let project = state
        .store
        .update_project(&identity.id, patch)
        .await?
        .ok_or_else(|| PortError::NotFound("Project not found".to_string()))?;

    Ok(Json(json!({ "project": project })))
}

/// POST /api/projects/share - Set visibility flags and get the share link.
#[utoipa::path(
    post,
    path = "/api/projects/share",
    request_body = ShareRequest,
    responses(
        (status = 200, description = "Updated project plus shareable link"),
        (status = 401, description = "Missing or invalid session cookie"),
        (status = 404, description = "No project exists yet"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn share_project_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ShareRequest>,
) -> Result<Json<Value>, ApiError> {
    let project = state
        .store
        .set_project_sharing(
            &identity.id,
            req.is_public.unwrap_or(false),
            req.shared_with.unwrap_or_default(),
        )
        .await?
        .ok_or_else(|| PortError::NotFound("Project not found".to_string()))?;

    let share_link = format!(
        "{}/shared/{}",
        state.config.base_url,
        project.id.as_deref().unwrap_or_default()
    );

    Ok(Json(json!({
        "project": project,
        "shareLink": share_link,
        "message": "Project sharing settings updated successfully",
    })))
}

/// GET /api/projects/shared/{id} - Read a shared project without a session.
///
/// Only the public flag gates this path; the stored `sharedWith` allow-list
/// is not consulted here.
#[utoipa::path(
    get,
    path = "/api/projects/shared/{id}",
    responses(
        (status = 200, description = "The shared project"),
        (status = 403, description = "The project is not public"),
        (status = 404, description = "No project with this id"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("id" = String, Path, description = "Project document id")
    )
)]
pub async fn shared_project_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let project = state
        .store
        .find_project_by_id(&id)
        .await?
        .ok_or_else(|| PortError::NotFound("Project not found".to_string()))?;

    if !project.is_public {
        return Err(PortError::Forbidden("This project is private".to_string()).into());
    }

    Ok(Json(json!({ "project": project })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{identity, state_with, InMemoryStore};
    use std::sync::Arc;

    #[tokio::test]
    async fn first_access_creates_and_second_returns_the_same_project() {
        let store = Arc::new(InMemoryStore::default());
        let state = state_with(store);
        let user = identity("42", "alice");

        let Json(first) = get_project_handler(State(state.clone()), Extension(user.clone()))
            .await
            .unwrap();
        let Json(second) = get_project_handler(State(state), Extension(user))
            .await
            .unwrap();

        let first_id = first["project"]["id"].as_str().unwrap();
        assert!(!first_id.is_empty());
        assert_eq!(first["project"]["id"], second["project"]["id"]);
        assert_eq!(first["project"]["title"], "Discord Bot Feature Development");
    }

    #[tokio::test]
    async fn update_before_creation_is_not_found() {
        let store = Arc::new(InMemoryStore::default());
        let state = state_with(store);

        let err = update_project_handler(
            State(state),
            Extension(identity("42", "alice")),
            Json(ProjectPatch {
                title: Some("Renamed".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            ApiError::Port(PortError::NotFound(message)) if message == "Project not found"
        ));
    }

    #[tokio::test]
    async fn update_merges_supplied_fields_only() {
        let store = Arc::new(InMemoryStore::default());
        let state = state_with(store);
        let user = identity("42", "alice");

        get_project_handler(State(state.clone()), Extension(user.clone()))
            .await
            .unwrap();

        let Json(body) = update_project_handler(
            State(state),
            Extension(user),
            Json(ProjectPatch {
                title: Some("Renamed".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(body["project"]["title"], "Renamed");
        // Untouched fields keep their template values.
        assert_eq!(body["project"]["status"], "In Progress");
    }

    #[tokio::test]
    async fn share_produces_a_deterministic_link() {
        let store = Arc::new(InMemoryStore::default());
        let state = state_with(store);
        let user = identity("42", "alice");

        let Json(created) = get_project_handler(State(state.clone()), Extension(user.clone()))
            .await
            .unwrap();
        let project_id = created["project"]["id"].as_str().unwrap().to_string();

        let Json(body) = share_project_handler(
            State(state),
            Extension(user),
            Json(ShareRequest {
                is_public: Some(true),
                shared_with: Some(vec!["7".to_string()]),
            }),
        )
        .await
        .unwrap();

        assert_eq!(body["project"]["isPublic"], true);
        assert_eq!(
            body["shareLink"],
            format!("http://localhost:3000/shared/{project_id}")
        );
    }

    #[tokio::test]
    async fn shared_read_is_forbidden_while_private() {
        let store = Arc::new(InMemoryStore::default());
        let state = state_with(store);
        let user = identity("42", "alice");

        let Json(created) = get_project_handler(State(state.clone()), Extension(user))
            .await
            .unwrap();
        let project_id = created["project"]["id"].as_str().unwrap().to_string();

        let err = shared_project_handler(State(state), Path(project_id))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ApiError::Port(PortError::Forbidden(message)) if message == "This project is private"
        ));
    }

    #[tokio::test]
    async fn shared_read_returns_public_projects_without_a_session() {
        let store = Arc::new(InMemoryStore::default());
        let state = state_with(store);
        let user = identity("42", "alice");

        get_project_handler(State(state.clone()), Extension(user.clone()))
            .await
            .unwrap();
        let Json(shared) = share_project_handler(
            State(state.clone()),
            Extension(user),
            Json(ShareRequest {
                is_public: Some(true),
                shared_with: None,
            }),
        )
        .await
        .unwrap();
        let project_id = shared["project"]["id"].as_str().unwrap().to_string();

        let Json(body) = shared_project_handler(State(state), Path(project_id))
            .await
            .unwrap();
        assert_eq!(body["project"]["userId"], "42");
    }

    #[tokio::test]
    async fn unknown_share_id_is_not_found() {
        let store = Arc::new(InMemoryStore::default());
        let state = state_with(store);

        let err = shared_project_handler(State(state), Path("not-an-id".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Port(PortError::NotFound(_))));
    }
}

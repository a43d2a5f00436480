//! services/api/src/web/research.rs
//!
//! Handler for research submissions: parses the multipart form (five text
//! sections, tags, target channel, up to five images) and hands the result
//! to the publisher port. Delivery has no persistence side effect here; the
//! client logs activity and stats through their own endpoints.

use axum::{
    extract::{Multipart, State},
    response::Json,
    Extension,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::web::state::AppState;
use staff_dashboard_core::domain::{
    Identity, ResearchImage, ResearchSections, ResearchSubmission,
};
use staff_dashboard_core::ports::PortError;

const IMAGE_FIELDS: [&str; 5] = [
    "commands_image",
    "module_image",
    "suggestions_image",
    "workflow_image",
    "ideas_image",
];

fn multipart_error(e: impl std::fmt::Display) -> ApiError {
    ApiError::Port(PortError::BadRequest(format!(
        "Failed to read multipart data: {e}"
    )))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/discord/send-research - Deliver a research submission.
#[utoipa::path(
    post,
    path = "/api/discord/send-research",
    request_body(content_type = "multipart/form-data", description = "Section texts, tags, channel id, and optional images."),
    responses(
        (status = 200, description = "Submission delivered"),
        (status = 400, description = "Missing channel id or unreadable form"),
        (status = 401, description = "Missing or invalid session cookie"),
        (status = 503, description = "Delivery credential not configured"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn send_research_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut sections = ResearchSections::default();
    let mut tags_raw = String::from("[]");
    let mut channel_id = String::new();
    let mut images = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "commands" => sections.commands = field.text().await.map_err(multipart_error)?,
            "module" => sections.module = field.text().await.map_err(multipart_error)?,
            "suggestions" => {
                sections.suggestions = field.text().await.map_err(multipart_error)?
            }
            "workflow" => sections.workflow = field.text().await.map_err(multipart_error)?,
            "ideas" => sections.ideas = field.text().await.map_err(multipart_error)?,
            "tags" => tags_raw = field.text().await.map_err(multipart_error)?,
            "channelId" => channel_id = field.text().await.map_err(multipart_error)?,
            name if IMAGE_FIELDS.contains(&name) => {
                let section = name.trim_end_matches("_image").to_string();
                let file_name = field.file_name().unwrap_or("attachment.png").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?.to_vec();
                images.push(ResearchImage {
                    section,
                    file_name,
                    content_type,
                    data,
                });
            }
            _ => {}
        }
    }

    let tags: Vec<String> = serde_json::from_str(&tags_raw)
        .map_err(|_| PortError::BadRequest("Invalid tags format".to_string()))?;

    submit_research(&state, identity, sections, tags, channel_id, images).await
}

/// The post-parse submission flow, split out so it can be exercised without
/// constructing a multipart request.
async fn submit_research(
    state: &AppState,
    author: Identity,
    sections: ResearchSections,
    tags: Vec<String>,
    channel_id: String,
    images: Vec<ResearchImage>,
) -> Result<Json<Value>, ApiError> {
    if channel_id.is_empty() {
        return Err(PortError::BadRequest("Channel ID is required".to_string()).into());
    }

    let submission = ResearchSubmission {
        author,
        sections,
        tags,
        channel_id,
        images,
    };

    state.publisher.publish(&submission).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Research data sent successfully",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{identity, state_with_publisher, InMemoryStore, RecordingPublisher};
    use std::sync::Arc;

    #[tokio::test]
    async fn missing_channel_id_is_rejected_before_delivery() {
        let publisher = Arc::new(RecordingPublisher::default());
        let state = state_with_publisher(Arc::new(InMemoryStore::default()), publisher.clone());

        let err = submit_research(
            &state,
            identity("42", "alice"),
            ResearchSections::default(),
            Vec::new(),
            String::new(),
            Vec::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            ApiError::Port(PortError::BadRequest(message)) if message == "Channel ID is required"
        ));
        assert!(publisher.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delivery_passes_the_full_submission_to_the_publisher() {
        let publisher = Arc::new(RecordingPublisher::default());
        let state = state_with_publisher(Arc::new(InMemoryStore::default()), publisher.clone());

        let sections = ResearchSections {
            commands: "afk findings".to_string(),
            ..Default::default()
        };
        let images = vec![ResearchImage {
            section: "commands".to_string(),
            file_name: "screenshot.png".to_string(),
            content_type: Some("image/png".to_string()),
            data: vec![0xff, 0xd8],
        }];

        let Json(body) = submit_research(
            &state,
            identity("42", "alice"),
            sections,
            vec!["Research".to_string()],
            "123456".to_string(),
            images,
        )
        .await
        .unwrap();

        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Research data sent successfully");

        let published = publisher.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].channel_id, "123456");
        assert_eq!(published[0].author.id, "42");
        assert_eq!(published[0].sections.commands, "afk findings");
        assert_eq!(published[0].images.len(), 1);
        assert_eq!(published[0].images[0].section, "commands");
    }
}

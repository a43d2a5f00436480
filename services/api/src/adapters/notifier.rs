//! services/api/src/adapters/notifier.rs
//!
//! This module contains the adapter that delivers research submissions into
//! a Discord channel. It implements the `ResearchPublisher` port: the text
//! sections become a markdown message, the metadata becomes an embed, and
//! any section screenshots ride along as multipart file attachments.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};
use tracing::error;

use staff_dashboard_core::domain::{ResearchSections, ResearchSubmission};
use staff_dashboard_core::ports::{PortError, PortResult, ResearchPublisher};

/// Accent color of the report embed (purple).
const EMBED_COLOR: u32 = 0xA855F7;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `ResearchPublisher` port using Discord's
/// channel message REST endpoint.
#[derive(Clone)]
pub struct DiscordNotifier {
    http: reqwest::Client,
    bot_token: Option<String>,
}

impl DiscordNotifier {
    /// Creates a new `DiscordNotifier`. A missing token is allowed here;
    /// publishing then fails with `Unavailable` instead of at startup.
    pub fn new(http: reqwest::Client, bot_token: Option<String>) -> Self {
        Self { http, bot_token }
    }
}

//=========================================================================================
// Payload Construction
//=========================================================================================

/// Assembles the markdown message body: a heading plus content block for
/// every non-empty section, in form order. All-empty submissions fall back
/// to a fixed placeholder.
fn build_message_content(sections: &ResearchSections) -> String {
    let mut content = String::new();
    for (heading, text) in sections.entries() {
        if !text.is_empty() {
            content.push_str(&format!("## {heading}\n{text}\n\n"));
        }
    }

    if content.is_empty() {
        "No content provided".to_string()
    } else {
        content
    }
}

/// Builds the report embed. Selected tags are joined into a single field,
/// each label rendered as inline code.
fn build_embed(username: &str, tags: &[String], timestamp: DateTime<Utc>) -> Value {
    let mut embed = json!({
        "title": "📊 Research & Development Report",
        "description": format!("Submitted by **{username}**"),
        "color": EMBED_COLOR,
        "timestamp": timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        "footer": {
            "text": "R.O.T.I Staff Dashboard",
        },
    });

    if !tags.is_empty() {
        let value = tags
            .iter()
            .map(|tag| format!("`{tag}`"))
            .collect::<Vec<_>>()
            .join(" • ");
        embed["fields"] = json!([{
            "name": "🏷️ Tags",
            "value": value,
            "inline": false,
        }]);
    }

    embed
}

/// Maps a failed delivery to the user-facing message for that status code;
/// anything unrecognized passes the remote error message through.
fn delivery_error_message(status: u16, body: &Value) -> String {
    match status {
        401 => "Invalid bot token. Please check your DISCORD_BOT_TOKEN configuration".to_string(),
        403 => "Bot lacks permissions. Ensure the bot has \"Send Messages\" and \"Embed Links\" \
                permissions in this channel"
            .to_string(),
        404 => "Channel not found. Please verify the channel ID is correct".to_string(),
        _ => match body.get("message").and_then(Value::as_str) {
            Some(message) => format!("Discord API Error: {message}"),
            None => "Failed to send message to Discord".to_string(),
        },
    }
}

//=========================================================================================
// `ResearchPublisher` Trait Implementation
//=========================================================================================

#[async_trait]
impl ResearchPublisher for DiscordNotifier {
    async fn publish(&self, submission: &ResearchSubmission) -> PortResult<()> {
        let token = self.bot_token.as_ref().ok_or_else(|| {
            PortError::Unavailable("Discord bot token is not configured".to_string())
        })?;

        let payload = json!({
            "content": build_message_content(&submission.sections),
            "embeds": [build_embed(
                &submission.author.username,
                &submission.tags,
                Utc::now(),
            )],
        });

        let mut form = Form::new().text("payload_json", payload.to_string());
        for (index, image) in submission.images.iter().take(5).enumerate() {
            let mut part = Part::bytes(image.data.clone())
                .file_name(format!("{}_{}", image.section, image.file_name));
            if let Some(content_type) = &image.content_type {
                part = part
                    .mime_str(content_type)
                    .map_err(|e| PortError::Unexpected(e.to_string()))?;
            }
            form = form.part(format!("files[{index}]"), part);
        }

        let response = self
            .http
            .post(format!(
                "https://discord.com/api/v10/channels/{}/messages",
                submission.channel_id
            ))
            .header("Authorization", format!("Bot {token}"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("delivery request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            error!("Discord API error ({status}): {body}");
            return Err(PortError::Upstream {
                status: status.as_u16(),
                message: delivery_error_message(status.as_u16(), &body),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn all_empty_sections_fall_back_to_placeholder() {
        let content = build_message_content(&ResearchSections::default());
        assert_eq!(content, "No content provided");
    }

    #[test]
    fn sections_render_in_form_order_and_skip_empties() {
        let sections = ResearchSections {
            commands: "afk testing notes".to_string(),
            ideas: "new highlight mode".to_string(),
            ..Default::default()
        };

        let content = build_message_content(&sections);

        assert_eq!(
            content,
            "## Commands\nafk testing notes\n\n## Ideas\nnew highlight mode\n\n"
        );
    }

    #[test]
    fn embed_carries_author_and_accent_color() {
        let timestamp = Utc.with_ymd_and_hms(2025, 11, 7, 12, 0, 0).unwrap();
        let embed = build_embed("alice", &[], timestamp);

        assert_eq!(embed["title"], "📊 Research & Development Report");
        assert_eq!(embed["description"], "Submitted by **alice**");
        assert_eq!(embed["color"], 0xA855F7);
        assert_eq!(embed["timestamp"], "2025-11-07T12:00:00.000Z");
        assert!(embed.get("fields").is_none());
    }

    #[test]
    fn selected_tags_join_as_inline_code() {
        let tags = vec!["Research".to_string(), "Bug".to_string()];
        let embed = build_embed("alice", &tags, Utc::now());

        assert_eq!(embed["fields"][0]["name"], "🏷️ Tags");
        assert_eq!(embed["fields"][0]["value"], "`Research` • `Bug`");
    }

    #[test]
    fn delivery_errors_map_per_status_code() {
        let body = json!({ "message": "rate limited" });

        assert!(delivery_error_message(401, &body).contains("Invalid bot token"));
        assert!(delivery_error_message(403, &body).contains("lacks permissions"));
        assert!(delivery_error_message(404, &body).contains("Channel not found"));
        assert_eq!(
            delivery_error_message(429, &body),
            "Discord API Error: rate limited"
        );
        assert_eq!(
            delivery_error_message(500, &Value::Null),
            "Failed to send message to Discord"
        );
    }
}

//! crates/staff_dashboard_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database driver; field names are
//! camelCase on the wire to match the documents the dashboard stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Fallback avatar shown for users without a Discord avatar hash.
pub const DEFAULT_AVATAR_URL: &str = "https://i.pravatar.cc/150?u=default";

/// The decoded Discord profile carried in the session cookie.
///
/// Reconstructed from the cookie on every request and never persisted on its
/// own. The schema is strict: unknown fields cause deserialization to fail,
/// which callers must treat as "not logged in".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Identity {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_name: Option<String>,
    #[serde(default)]
    pub discriminator: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Identity {
    /// The name shown in the UI: the display name when set, else the handle.
    pub fn display_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(&self.username)
    }

    /// CDN URL for the user's avatar, or the generic placeholder.
    pub fn avatar_url(&self) -> String {
        match &self.avatar {
            Some(hash) => format!(
                "https://cdn.discordapp.com/avatars/{}/{}.png",
                self.id, hash
            ),
            None => DEFAULT_AVATAR_URL.to_string(),
        }
    }
}

/// An access token handed back by the OAuth provider after a code exchange.
#[derive(Debug, Clone)]
pub struct ProviderToken {
    pub access_token: String,
    /// Token lifetime in seconds, as issued by the provider.
    pub expires_in: i64,
}

/// One append-only activity log entry. No update or delete path exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Assignee {
    pub name: String,
    pub avatar_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TagVariant {
    Default,
    Secondary,
    Destructive,
    Outline,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Tag {
    pub label: String,
    pub variant: TagVariant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Pdf,
    Figma,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Attachment {
    pub name: String,
    pub size: String,
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum SubTaskStatus {
    Completed,
    #[serde(rename = "In Progress")]
    InProgress,
    Pending,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubTask {
    pub task: String,
    pub category: String,
    pub status: SubTaskStatus,
    pub due_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Breadcrumb {
    pub label: String,
    pub href: String,
}

/// A staff member's single tracked project.
///
/// Exactly one exists per user; it is created lazily from the default
/// template on first read. `is_public`/`shared_with` govern read access for
/// unauthenticated shared-link viewers and never grant writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub title: String,
    pub status: String,
    pub assignees: Vec<Assignee>,
    pub date_range: DateRange,
    pub tags: Vec<Tag>,
    pub description: String,
    pub attachments: Vec<Attachment>,
    pub sub_tasks: Vec<SubTask>,
    pub breadcrumbs: Vec<Breadcrumb>,
    #[serde(default)]
    pub shared_with: Vec<String>,
    #[serde(default)]
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Builds the fixed default project seeded with the caller's profile.
    /// The date range runs from today to fourteen days out.
    pub fn default_for(identity: &Identity, now: DateTime<Utc>) -> Self {
        let fmt = "%b %-d, %Y";
        Self {
            id: None,
            user_id: identity.id.clone(),
            title: "Discord Bot Feature Development".to_string(),
            status: "In Progress".to_string(),
            assignees: vec![Assignee {
                name: identity.display_name().to_string(),
                avatar_url: identity.avatar_url(),
                user_id: Some(identity.id.clone()),
            }],
            date_range: DateRange {
                start: now.format(fmt).to_string(),
                end: (now + chrono::Duration::days(14)).format(fmt).to_string(),
            },
            tags: vec![
                Tag {
                    label: "Research".to_string(),
                    variant: TagVariant::Destructive,
                },
                Tag {
                    label: "Development".to_string(),
                    variant: TagVariant::Secondary,
                },
            ],
            description: "Working on implementing and documenting new Discord bot commands \
                          including AFK status, temporary voice channels, and message \
                          highlighting features. This involves research, testing, and \
                          comprehensive documentation."
                .to_string(),
            attachments: vec![
                Attachment {
                    name: "Command_Specifications.pdf".to_string(),
                    size: "2.3 Mb".to_string(),
                    kind: AttachmentKind::Pdf,
                    url: None,
                },
                Attachment {
                    name: "UI_Mockups.fig".to_string(),
                    size: "8.7 Mb".to_string(),
                    kind: AttachmentKind::Figma,
                    url: None,
                },
            ],
            sub_tasks: vec![
                SubTask {
                    task: "Research AFK command functionality".to_string(),
                    category: "Research".to_string(),
                    status: SubTaskStatus::Completed,
                    due_date: "Nov 5, 2025".to_string(),
                },
                SubTask {
                    task: "Document Tempvoice implementation".to_string(),
                    category: "Documentation".to_string(),
                    status: SubTaskStatus::InProgress,
                    due_date: "Nov 8, 2025".to_string(),
                },
                SubTask {
                    task: "Test Highlight command workflow".to_string(),
                    category: "Testing".to_string(),
                    status: SubTaskStatus::Pending,
                    due_date: "Nov 12, 2025".to_string(),
                },
            ],
            breadcrumbs: vec![
                Breadcrumb {
                    label: "Staff Tasks".to_string(),
                    href: "#".to_string(),
                },
                Breadcrumb {
                    label: "Current Assignment".to_string(),
                    href: "#".to_string(),
                },
            ],
            shared_with: Vec::new(),
            is_public: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A merge-patch for the caller's own project. Absent fields are left
/// untouched. There is deliberately no `user_id` here: the target document
/// is always resolved from the session, never from the request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub status: Option<String>,
    pub assignees: Option<Vec<Assignee>>,
    pub date_range: Option<DateRange>,
    pub tags: Option<Vec<Tag>>,
    pub description: Option<String>,
    pub attachments: Option<Vec<Attachment>>,
    pub sub_tasks: Option<Vec<SubTask>>,
    pub breadcrumbs: Option<Vec<Breadcrumb>>,
    pub is_public: Option<bool>,
    pub shared_with: Option<Vec<String>>,
}

/// One recorded dashboard session, in minutes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEntry {
    pub date: DateTime<Utc>,
    pub duration: i64,
}

/// Per-command submission counters. Only these three commands are tracked;
/// missing keys deserialize to zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandStats {
    #[serde(rename = "AFK", default)]
    pub afk: i64,
    #[serde(rename = "Tempvoice", default)]
    pub tempvoice: i64,
    #[serde(rename = "Highlight", default)]
    pub highlight: i64,
}

impl CommandStats {
    /// Increments the counter for a known command name. Unknown names are
    /// ignored and leave every counter unchanged.
    pub fn bump(&mut self, command: &str) {
        match command {
            "AFK" => self.afk += 1,
            "Tempvoice" => self.tempvoice += 1,
            "Highlight" => self.highlight += 1,
            _ => {}
        }
    }
}

/// Running usage counters for one user.
///
/// `sessions` is append-only and `total_time_spent` always equals the sum of
/// its durations; both are maintained by [`UserStats::record`], never
/// recomputed from scratch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub total_time_spent: i64,
    pub research_submissions: i64,
    pub active_days: i64,
    pub last_active: DateTime<Utc>,
    pub sessions: Vec<SessionEntry>,
    #[serde(default)]
    pub command_stats: CommandStats,
    pub updated_at: DateTime<Utc>,
}

impl UserStats {
    /// A fresh record with zeroed counters, created lazily on first read.
    pub fn zeroed(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            user_id: user_id.to_string(),
            total_time_spent: 0,
            research_submissions: 0,
            active_days: 0,
            last_active: now,
            sessions: Vec::new(),
            command_stats: CommandStats::default(),
            updated_at: now,
        }
    }

    /// Applies one update: an optional session duration (minutes) and an
    /// optional submitted command name.
    ///
    /// A supplied command always counts as a research submission; the
    /// per-command counter only moves when the name is one of the three
    /// known commands. `last_active` is refreshed unconditionally.
    pub fn record(&mut self, duration: Option<i64>, command: Option<&str>, now: DateTime<Utc>) {
        if let Some(minutes) = duration {
            self.total_time_spent += minutes;
            self.sessions.push(SessionEntry {
                date: now,
                duration: minutes,
            });
        }

        if let Some(name) = command {
            self.research_submissions += 1;
            self.command_stats.bump(name);
        }

        self.last_active = now;
        self.updated_at = now;
    }
}

/// The five free-text sections of a research submission form.
#[derive(Debug, Clone, Default)]
pub struct ResearchSections {
    pub commands: String,
    pub module: String,
    pub suggestions: String,
    pub workflow: String,
    pub ideas: String,
}

impl ResearchSections {
    /// Sections in delivery order, paired with their message headings.
    pub fn entries(&self) -> [(&'static str, &str); 5] {
        [
            ("Commands", self.commands.as_str()),
            ("Module", self.module.as_str()),
            ("Suggestions", self.suggestions.as_str()),
            ("Workflow", self.workflow.as_str()),
            ("Ideas", self.ideas.as_str()),
        ]
    }
}

/// One uploaded screenshot accompanying a section. At most one per section,
/// so at most five per submission.
#[derive(Debug, Clone)]
pub struct ResearchImage {
    /// Which form section the image belongs to, e.g. "commands".
    pub section: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// A complete research submission bound for the staff channel.
#[derive(Debug, Clone)]
pub struct ResearchSubmission {
    pub author: Identity,
    pub sections: ResearchSections,
    pub tags: Vec<String>,
    pub channel_id: String,
    pub images: Vec<ResearchImage>,
}

//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DocumentStore` port from the `core` crate. It handles all interactions
//! with MongoDB using the official driver.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use mongodb::bson::{doc, oid::ObjectId, to_bson, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};

use staff_dashboard_core::domain::{
    Activity, Assignee, Attachment, Breadcrumb, CommandStats, DateRange, Project, ProjectPatch,
    SessionEntry, SubTask, Tag, UserStats,
};
use staff_dashboard_core::ports::{DocumentStore, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DocumentStore` port.
#[derive(Clone)]
pub struct MongoStore {
    activities: Collection<ActivityRecord>,
    projects: Collection<ProjectRecord>,
    user_stats: Collection<UserStatsRecord>,
}

impl MongoStore {
    /// Creates a new `MongoStore` over the given database handle.
    pub fn new(db: &Database) -> Self {
        Self {
            activities: db.collection("activities"),
            projects: db.collection("projects"),
            user_stats: db.collection("user_stats"),
        }
    }

    /// Creates the indexes the adapter relies on at startup: the unique
    /// `userId` constraints that make lazy creation race-safe, and the
    /// compound index backing newest-first activity listings.
    pub async fn ensure_indexes(&self) -> Result<(), mongodb::error::Error> {
        let unique = IndexOptions::builder().unique(true).build();

        self.projects
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "userId": 1 })
                    .options(unique.clone())
                    .build(),
            )
            .await?;

        self.user_stats
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "userId": 1 })
                    .options(unique)
                    .build(),
            )
            .await?;

        self.activities
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "userId": 1, "timestamp": -1 })
                    .build(),
            )
            .await?;

        Ok(())
    }
}

/// True when an insert failed on a unique-index collision.
fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        &*err.kind,
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == 11_000
    )
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivityRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    user_id: String,
    action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<Bson>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    timestamp: DateTime<Utc>,
}

impl ActivityRecord {
    fn from_domain(activity: Activity) -> PortResult<Self> {
        let metadata = activity
            .metadata
            .map(|value| to_bson(&value))
            .transpose()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Self {
            id: None,
            user_id: activity.user_id,
            action: activity.action,
            command: activity.command,
            metadata,
            timestamp: activity.timestamp,
        })
    }

    fn to_domain(self) -> Activity {
        Activity {
            id: self.id.map(|oid| oid.to_hex()),
            user_id: self.user_id,
            action: self.action,
            command: self.command,
            metadata: self.metadata.map(Into::into),
            timestamp: self.timestamp,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    user_id: String,
    title: String,
    status: String,
    assignees: Vec<Assignee>,
    date_range: DateRange,
    tags: Vec<Tag>,
    description: String,
    attachments: Vec<Attachment>,
    sub_tasks: Vec<SubTask>,
    breadcrumbs: Vec<Breadcrumb>,
    #[serde(default)]
    shared_with: Vec<String>,
    #[serde(default)]
    is_public: bool,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    updated_at: DateTime<Utc>,
}

impl ProjectRecord {
    fn from_domain(project: Project) -> Self {
        Self {
            id: None,
            user_id: project.user_id,
            title: project.title,
            status: project.status,
            assignees: project.assignees,
            date_range: project.date_range,
            tags: project.tags,
            description: project.description,
            attachments: project.attachments,
            sub_tasks: project.sub_tasks,
            breadcrumbs: project.breadcrumbs,
            shared_with: project.shared_with,
            is_public: project.is_public,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }

    fn to_domain(self) -> Project {
        Project {
            id: self.id.map(|oid| oid.to_hex()),
            user_id: self.user_id,
            title: self.title,
            status: self.status,
            assignees: self.assignees,
            date_range: self.date_range,
            tags: self.tags,
            description: self.description,
            attachments: self.attachments,
            sub_tasks: self.sub_tasks,
            breadcrumbs: self.breadcrumbs,
            shared_with: self.shared_with,
            is_public: self.is_public,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct SessionRecord {
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    date: DateTime<Utc>,
    duration: i64,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserStatsRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    user_id: String,
    total_time_spent: i64,
    research_submissions: i64,
    active_days: i64,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    last_active: DateTime<Utc>,
    sessions: Vec<SessionRecord>,
    #[serde(default)]
    command_stats: CommandStats,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    updated_at: DateTime<Utc>,
}

impl UserStatsRecord {
    fn from_domain(stats: &UserStats) -> Self {
        Self {
            id: None,
            user_id: stats.user_id.clone(),
            total_time_spent: stats.total_time_spent,
            research_submissions: stats.research_submissions,
            active_days: stats.active_days,
            last_active: stats.last_active,
            sessions: stats
                .sessions
                .iter()
                .map(|s| SessionRecord {
                    date: s.date,
                    duration: s.duration,
                })
                .collect(),
            command_stats: stats.command_stats.clone(),
            updated_at: stats.updated_at,
        }
    }

    fn to_domain(self) -> UserStats {
        UserStats {
            id: self.id.map(|oid| oid.to_hex()),
            user_id: self.user_id,
            total_time_spent: self.total_time_spent,
            research_submissions: self.research_submissions,
            active_days: self.active_days,
            last_active: self.last_active,
            sessions: self
                .sessions
                .into_iter()
                .map(|s| SessionEntry {
                    date: s.date,
                    duration: s.duration,
                })
                .collect(),
            command_stats: self.command_stats,
            updated_at: self.updated_at,
        }
    }
}

/// Builds the `$set` document for a project merge-patch. Only supplied
/// fields are written; `updatedAt` is always refreshed.
fn patch_to_set(patch: ProjectPatch, now: DateTime<Utc>) -> PortResult<Document> {
    let mut set = doc! { "updatedAt": mongodb::bson::DateTime::from_chrono(now) };

    let mut insert = |key: &str, value: Option<Bson>| {
        if let Some(value) = value {
            set.insert(key, value);
        }
    };

    fn field<T: Serialize>(value: Option<T>) -> PortResult<Option<Bson>> {
        value
            .map(|v| to_bson(&v))
            .transpose()
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }

    insert("title", field(patch.title)?);
    insert("status", field(patch.status)?);
    insert("assignees", field(patch.assignees)?);
    insert("dateRange", field(patch.date_range)?);
    insert("tags", field(patch.tags)?);
    insert("description", field(patch.description)?);
    insert("attachments", field(patch.attachments)?);
    insert("subTasks", field(patch.sub_tasks)?);
    insert("breadcrumbs", field(patch.breadcrumbs)?);
    insert("isPublic", field(patch.is_public)?);
    insert("sharedWith", field(patch.shared_with)?);

    Ok(set)
}

//=========================================================================================
// `DocumentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert_activity(&self, activity: Activity) -> PortResult<Activity> {
        let mut record = ActivityRecord::from_domain(activity)?;
        let result = self
            .activities
            .insert_one(&record)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        record.id = result.inserted_id.as_object_id();
        Ok(record.to_domain())
    }

    async fn recent_activity(&self, user_id: &str, limit: i64) -> PortResult<Vec<Activity>> {
        let records: Vec<ActivityRecord> = self
            .activities
            .find(doc! { "userId": user_id })
            .sort(doc! { "timestamp": -1 })
            .limit(limit)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .try_collect()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn find_stats(&self, user_id: &str) -> PortResult<Option<UserStats>> {
        let record = self
            .user_stats
            .find_one(doc! { "userId": user_id })
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn create_stats(&self, stats: UserStats) -> PortResult<UserStats> {
        let mut record = UserStatsRecord::from_domain(&stats);
        match self.user_stats.insert_one(&record).await {
            Ok(result) => {
                record.id = result.inserted_id.as_object_id();
                Ok(record.to_domain())
            }
            // Another request created the record first; the unique index on
            // userId turned the race into a duplicate key, so re-fetch.
            Err(e) if is_duplicate_key(&e) => self
                .find_stats(&stats.user_id)
                .await?
                .ok_or_else(|| PortError::Unexpected("stats vanished after insert race".into())),
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }

    async fn save_stats(&self, stats: &UserStats) -> PortResult<UserStats> {
        let record = UserStatsRecord::from_domain(stats);
        let result = self
            .user_stats
            .replace_one(doc! { "userId": &stats.user_id }, &record)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if result.matched_count == 0 {
            return Err(PortError::NotFound("Stats not found".to_string()));
        }
        Ok(stats.clone())
    }

    async fn find_project_by_user(&self, user_id: &str) -> PortResult<Option<Project>> {
        let record = self
            .projects
            .find_one(doc! { "userId": user_id })
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn find_project_by_id(&self, project_id: &str) -> PortResult<Option<Project>> {
        // An id that is not a valid ObjectId cannot name a stored project.
        let Ok(oid) = ObjectId::parse_str(project_id) else {
            return Ok(None);
        };
        let record = self
            .projects
            .find_one(doc! { "_id": oid })
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn create_project(&self, project: Project) -> PortResult<Project> {
        let mut record = ProjectRecord::from_domain(project);
        match self.projects.insert_one(&record).await {
            Ok(result) => {
                record.id = result.inserted_id.as_object_id();
                Ok(record.to_domain())
            }
            Err(e) if is_duplicate_key(&e) => self
                .find_project_by_user(&record.user_id)
                .await?
                .ok_or_else(|| PortError::Unexpected("project vanished after insert race".into())),
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }

    async fn update_project(
        &self,
        user_id: &str,
        patch: ProjectPatch,
    ) -> PortResult<Option<Project>> {
        let set = patch_to_set(patch, Utc::now())?;
        let record = self
            .projects
            .find_one_and_update(doc! { "userId": user_id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn set_project_sharing(
        &self,
        user_id: &str,
        is_public: bool,
        shared_with: Vec<String>,
    ) -> PortResult<Option<Project>> {
        let record = self
            .projects
            .find_one_and_update(
                doc! { "userId": user_id },
                doc! { "$set": {
                    "isPublic": is_public,
                    "sharedWith": shared_with,
                    "updatedAt": mongodb::bson::DateTime::from_chrono(Utc::now()),
                } },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.map(|r| r.to_domain()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_to_set_writes_only_supplied_fields() {
        let patch = ProjectPatch {
            title: Some("New Title".to_string()),
            is_public: Some(true),
            ..Default::default()
        };
        let set = patch_to_set(patch, Utc::now()).unwrap();

        assert_eq!(set.get_str("title").unwrap(), "New Title");
        assert!(set.get_bool("isPublic").unwrap());
        assert!(set.contains_key("updatedAt"));
        assert!(!set.contains_key("status"));
        assert!(!set.contains_key("sharedWith"));
        // The caller's identity is the only routing key; a patch can never
        // re-target another user's document.
        assert!(!set.contains_key("userId"));
    }

    #[test]
    fn empty_patch_still_refreshes_updated_at() {
        let set = patch_to_set(ProjectPatch::default(), Utc::now()).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains_key("updatedAt"));
    }
}

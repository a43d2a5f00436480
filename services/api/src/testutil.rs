//! services/api/src/testutil.rs
//!
//! In-memory implementations of the service ports plus small fixtures, used
//! by the handler tests. Nothing here ships in a release build.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use crate::config::Config;
use crate::web::state::AppState;
use staff_dashboard_core::domain::{
    Activity, Identity, Project, ProjectPatch, ProviderToken, ResearchSubmission, UserStats,
};
use staff_dashboard_core::ports::{
    DocumentStore, IdentityProvider, PortError, PortResult, ResearchPublisher,
};

//=========================================================================================
// In-Memory Document Store
//=========================================================================================

/// A `DocumentStore` holding everything in process memory, with the same
/// create-if-absent semantics the Mongo adapter gets from its unique
/// indexes.
#[derive(Default)]
pub struct InMemoryStore {
    next_id: AtomicUsize,
    activities: Mutex<Vec<Activity>>,
    projects: Mutex<HashMap<String, Project>>,
    stats: Mutex<HashMap<String, UserStats>>,
}

impl InMemoryStore {
    fn next_hex_id(&self) -> String {
        format!("{:024x}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert_activity(&self, mut activity: Activity) -> PortResult<Activity> {
        activity.id = Some(self.next_hex_id());
        self.activities.lock().unwrap().push(activity.clone());
        Ok(activity)
    }

    async fn recent_activity(&self, user_id: &str, limit: i64) -> PortResult<Vec<Activity>> {
        let mut matching: Vec<Activity> = self
            .activities
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matching.truncate(limit.max(0) as usize);
        Ok(matching)
    }

    async fn find_stats(&self, user_id: &str) -> PortResult<Option<UserStats>> {
        Ok(self.stats.lock().unwrap().get(user_id).cloned())
    }

    async fn create_stats(&self, mut stats: UserStats) -> PortResult<UserStats> {
        let mut map = self.stats.lock().unwrap();
        if let Some(existing) = map.get(&stats.user_id) {
            return Ok(existing.clone());
        }
        stats.id = Some(self.next_hex_id());
        map.insert(stats.user_id.clone(), stats.clone());
        Ok(stats)
    }

    async fn save_stats(&self, stats: &UserStats) -> PortResult<UserStats> {
        let mut map = self.stats.lock().unwrap();
        if !map.contains_key(&stats.user_id) {
            return Err(PortError::NotFound("Stats not found".to_string()));
        }
        map.insert(stats.user_id.clone(), stats.clone());
        Ok(stats.clone())
    }

    async fn find_project_by_user(&self, user_id: &str) -> PortResult<Option<Project>> {
        Ok(self.projects.lock().unwrap().get(user_id).cloned())
    }

    async fn find_project_by_id(&self, project_id: &str) -> PortResult<Option<Project>> {
        Ok(self
            .projects
            .lock()
            .unwrap()
            .values()
            .find(|p| p.id.as_deref() == Some(project_id))
            .cloned())
    }

    async fn create_project(&self, mut project: Project) -> PortResult<Project> {
        let mut map = self.projects.lock().unwrap();
        if let Some(existing) = map.get(&project.user_id) {
            return Ok(existing.clone());
        }
        project.id = Some(self.next_hex_id());
        map.insert(project.user_id.clone(), project.clone());
        Ok(project)
    }

    async fn update_project(
        &self,
        user_id: &str,
        patch: ProjectPatch,
    ) -> PortResult<Option<Project>> {
        let mut map = self.projects.lock().unwrap();
        let Some(project) = map.get_mut(user_id) else {
            return Ok(None);
        };

        if let Some(v) = patch.title {
            project.title = v;
        }
        if let Some(v) = patch.status {
            project.status = v;
        }
        if let Some(v) = patch.assignees {
            project.assignees = v;
        }
        if let Some(v) = patch.date_range {
            project.date_range = v;
        }
        if let Some(v) = patch.tags {
            project.tags = v;
        }
        if let Some(v) = patch.description {
            project.description = v;
        }
        if let Some(v) = patch.attachments {
            project.attachments = v;
        }
        if let Some(v) = patch.sub_tasks {
            project.sub_tasks = v;
        }
        if let Some(v) = patch.breadcrumbs {
            project.breadcrumbs = v;
        }
        if let Some(v) = patch.is_public {
            project.is_public = v;
        }
        if let Some(v) = patch.shared_with {
            project.shared_with = v;
        }
        project.updated_at = Utc::now();

        Ok(Some(project.clone()))
    }

    async fn set_project_sharing(
        &self,
        user_id: &str,
        is_public: bool,
        shared_with: Vec<String>,
    ) -> PortResult<Option<Project>> {
        let mut map = self.projects.lock().unwrap();
        let Some(project) = map.get_mut(user_id) else {
            return Ok(None);
        };
        project.is_public = is_public;
        project.shared_with = shared_with;
        project.updated_at = Utc::now();
        Ok(Some(project.clone()))
    }
}

//=========================================================================================
// Stub Providers
//=========================================================================================

/// An `IdentityProvider` that answers with fixed values.
pub struct StaticOAuth;

#[async_trait]
impl IdentityProvider for StaticOAuth {
    fn authorize_url(&self) -> String {
        "https://discord.test/authorize".to_string()
    }

    async fn exchange_code(&self, _code: &str) -> PortResult<ProviderToken> {
        Ok(ProviderToken {
            access_token: "test-token".to_string(),
            expires_in: 3_600,
        })
    }

    async fn fetch_identity(&self, _access_token: &str) -> PortResult<Identity> {
        Ok(identity("42", "alice"))
    }
}

/// A `ResearchPublisher` that records what it was asked to deliver.
#[derive(Default)]
pub struct RecordingPublisher {
    pub published: Mutex<Vec<ResearchSubmission>>,
}

#[async_trait]
impl ResearchPublisher for RecordingPublisher {
    async fn publish(&self, submission: &ResearchSubmission) -> PortResult<()> {
        self.published.lock().unwrap().push(submission.clone());
        Ok(())
    }
}

//=========================================================================================
// Fixtures
//=========================================================================================

pub fn identity(id: &str, username: &str) -> Identity {
    Identity {
        id: id.to_string(),
        username: username.to_string(),
        global_name: None,
        discriminator: "0".to_string(),
        avatar: None,
        email: None,
    }
}

pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:3000".parse().unwrap(),
        mongodb_uri: "mongodb://localhost:27017".to_string(),
        mongodb_db: "staff_dashboard_test".to_string(),
        log_level: tracing::Level::INFO,
        discord_client_id: "1234".to_string(),
        discord_client_secret: "secret".to_string(),
        discord_redirect_uri: "http://localhost:3000/api/auth/callback".to_string(),
        discord_bot_token: Some("bot-token".to_string()),
        discord_guild_id: "1".to_string(),
        base_url: "http://localhost:3000".to_string(),
        cors_origin: "http://localhost:3000".to_string(),
        production: false,
        cookie_domain: None,
    }
}

/// An `AppState` wired to in-memory ports.
pub fn state_with(store: Arc<InMemoryStore>) -> AppState {
    state_with_publisher(store, Arc::new(RecordingPublisher::default()))
}

pub fn state_with_publisher(
    store: Arc<InMemoryStore>,
    publisher: Arc<RecordingPublisher>,
) -> AppState {
    AppState {
        store,
        oauth: Arc::new(StaticOAuth),
        publisher,
        config: Arc::new(test_config()),
    }
}

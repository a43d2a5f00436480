//! crates/staff_dashboard_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;

use crate::domain::{
    Activity, Identity, Project, ProjectPatch, ProviderToken, ResearchSubmission, UserStats,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network)
/// and carries the full taxonomy the HTTP layer needs to pick a status code.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Access denied: {0}")]
    Forbidden(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Service not configured: {0}")]
    Unavailable(String),
    /// A provider API answered with a non-success status. The status is
    /// propagated to the caller together with a user-facing message.
    #[error("Upstream service returned {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Typed access to the three dashboard collections. All records are
/// partitioned by the Discord user id; only projects are ever read across
/// that boundary, and only through the explicit sharing flags.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // --- Activity Log ---
    /// Appends one log entry and returns it with its assigned id.
    async fn insert_activity(&self, activity: Activity) -> PortResult<Activity>;

    /// The user's activities, newest first, capped at `limit`.
    async fn recent_activity(&self, user_id: &str, limit: i64) -> PortResult<Vec<Activity>>;

    // --- User Statistics ---
    async fn find_stats(&self, user_id: &str) -> PortResult<Option<UserStats>>;

    /// Create-if-absent. When a concurrent request won the insert race, the
    /// existing record is returned instead of an error.
    async fn create_stats(&self, stats: UserStats) -> PortResult<UserStats>;

    /// Whole-document save of an existing record. Not atomic with respect to
    /// the preceding read; concurrent writers can lose updates.
    async fn save_stats(&self, stats: &UserStats) -> PortResult<UserStats>;

    // --- Projects ---
    async fn find_project_by_user(&self, user_id: &str) -> PortResult<Option<Project>>;

    /// Lookup by document id, for shared-link viewers. An id that does not
    /// parse as a document id resolves to `None`, not an error.
    async fn find_project_by_id(&self, project_id: &str) -> PortResult<Option<Project>>;

    /// Create-if-absent under the store's uniqueness constraint on the user
    /// id; a duplicate-key race resolves to the already-stored project.
    async fn create_project(&self, project: Project) -> PortResult<Project>;

    /// Merge-patch of the user's own project; refreshes `updatedAt`.
    /// Returns `None` when the user has no project yet.
    async fn update_project(
        &self,
        user_id: &str,
        patch: ProjectPatch,
    ) -> PortResult<Option<Project>>;

    /// Replaces the sharing flags; refreshes `updatedAt`. Returns `None`
    /// when the user has no project yet.
    async fn set_project_sharing(
        &self,
        user_id: &str,
        is_public: bool,
        shared_with: Vec<String>,
    ) -> PortResult<Option<Project>>;
}

/// The OAuth identity provider, treated as an opaque external collaborator.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The provider's authorization page URL for the configured client.
    fn authorize_url(&self) -> String;

    /// Exchanges an authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> PortResult<ProviderToken>;

    /// Fetches the profile of the user the access token belongs to.
    async fn fetch_identity(&self, access_token: &str) -> PortResult<Identity>;
}

/// Delivery of a formatted research submission into the staff channel.
#[async_trait]
pub trait ResearchPublisher: Send + Sync {
    async fn publish(&self, submission: &ResearchSubmission) -> PortResult<()>;
}

pub mod activity;
pub mod auth;
pub mod projects;
pub mod research;
pub mod session;
pub mod state;
pub mod stats;

use utoipa::OpenApi;

// Re-export the auth middleware to make it easily accessible to the binary
// that builds the web server router.
pub use session::require_auth;

/// The master OpenAPI definition for the dashboard API.
#[derive(OpenApi)]
#[openapi(
    paths(
        activity::log_activity_handler,
        activity::list_activity_handler,
        stats::get_stats_handler,
        stats::update_stats_handler,
        projects::get_project_handler,
        projects::update_project_handler,
        projects::share_project_handler,
        projects::shared_project_handler,
        research::send_research_handler,
    ),
    components(schemas(
        activity::LogActivityRequest,
        stats::UpdateStatsRequest,
        projects::ShareRequest,
    )),
    tags(
        (name = "Staff Dashboard API", description = "API endpoints for the staff dashboard.")
    )
)]
pub struct ApiDoc;

//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DiscordNotifier, DiscordOAuth, MongoStore},
    config::Config,
    error::ApiError,
    web::{
        activity::{list_activity_handler, log_activity_handler},
        auth::{callback_handler, discord_login_handler, logout_handler},
        projects::{
            get_project_handler, share_project_handler, shared_project_handler,
            update_project_handler,
        },
        require_auth,
        research::send_research_handler,
        state::AppState,
        stats::{get_stats_handler, update_stats_handler},
        ApiDoc,
    },
};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use mongodb::Client;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Submissions can carry up to five images.
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to the Document Store & Ensure Indexes ---
    info!("Connecting to MongoDB...");
    let client = Client::with_uri_str(&config.mongodb_uri).await?;
    let store = Arc::new(MongoStore::new(&client.database(&config.mongodb_db)));
    info!("Ensuring database indexes...");
    store.ensure_indexes().await?;
    info!("Database indexes in place.");

    // --- 3. Initialize the Discord Adapters ---
    let http = reqwest::Client::new();
    let oauth = Arc::new(DiscordOAuth::new(
        http.clone(),
        config.discord_client_id.clone(),
        config.discord_client_secret.clone(),
        config.discord_redirect_uri.clone(),
    ));
    let publisher = Arc::new(DiscordNotifier::new(
        http,
        config.discord_bot_token.clone(),
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = AppState {
        store,
        oauth,
        publisher,
        config: config.clone(),
    };

    let cors_origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("invalid CORS origin: {e}")))?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api/auth/discord", get(discord_login_handler))
        .route("/api/auth/callback", get(callback_handler))
        .route("/api/auth/logout", get(logout_handler))
        .route("/api/projects/shared/{id}", get(shared_project_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route(
            "/api/activity",
            post(log_activity_handler).get(list_activity_handler),
        )
        .route(
            "/api/stats",
            get(get_stats_handler).post(update_stats_handler),
        )
        .route(
            "/api/projects",
            get(get_project_handler).put(update_project_handler),
        )
        .route("/api/projects/share", post(share_project_handler))
        .route("/api/discord/send-research", post(send_research_handler))
        .layer(axum_middleware::from_fn(require_auth));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for the Discord OAuth flow: login redirect,
//! callback code exchange, and logout.

use axum::{
    extract::{Query, State},
    http::header,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::error;

use crate::error::ApiError;
use crate::web::session::{clear_session_cookies, issue_session_cookies};
use crate::web::state::AppState;

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /api/auth/discord - Redirect the browser to Discord's authorize page.
pub async fn discord_login_handler(State(state): State<AppState>) -> Redirect {
    Redirect::temporary(&state.oauth.authorize_url())
}

/// GET /api/auth/callback - Complete the OAuth flow.
///
/// Exchanges the authorization code, fetches the user's profile, sets both
/// session cookies, and sends the browser to the dashboard. Denials and
/// failures redirect back to the landing page with an error marker instead
/// of rendering an error body.
pub async fn callback_handler(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let base = &state.config.base_url;

    if query.error.is_some() {
        return Redirect::temporary(&format!("{base}/?error=access_denied")).into_response();
    }
    let Some(code) = query.code else {
        return Redirect::temporary(&format!("{base}/?error=missing_code")).into_response();
    };

    match establish_session(&state, &code).await {
        Ok(cookies) => {
            let [user_cookie, token_cookie] = cookies;
            (
                AppendHeaders([
                    (header::SET_COOKIE, user_cookie),
                    (header::SET_COOKIE, token_cookie),
                ]),
                Redirect::temporary(&format!("{base}/dashboard")),
            )
                .into_response()
        }
        Err(e) => {
            error!("OAuth callback error: {e}");
            Redirect::temporary(&format!("{base}/?error=oauth_failed")).into_response()
        }
    }
}

/// Runs the code exchange and profile fetch, producing the session cookies.
async fn establish_session(state: &AppState, code: &str) -> Result<[String; 2], ApiError> {
    let token = state.oauth.exchange_code(code).await?;
    let identity = state.oauth.fetch_identity(&token.access_token).await?;

    issue_session_cookies(&state.config, &identity, &token)
        .map_err(|e| ApiError::Internal(format!("failed to serialize session cookie: {e}")))
}

/// GET /api/auth/logout - Clear both session cookies and return home.
pub async fn logout_handler(State(state): State<AppState>) -> impl IntoResponse {
    let [user_cookie, token_cookie] = clear_session_cookies(&state.config);
    (
        AppendHeaders([
            (header::SET_COOKIE, user_cookie),
            (header::SET_COOKIE, token_cookie),
        ]),
        Redirect::temporary(&state.config.base_url),
    )
}

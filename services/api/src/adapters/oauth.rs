//! services/api/src/adapters/oauth.rs
//!
//! This module contains the adapter for Discord's OAuth2 endpoints. It
//! implements the `IdentityProvider` port from the `core` crate: building
//! the authorize URL, exchanging a code for a token, and fetching the
//! profile the token belongs to.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use staff_dashboard_core::domain::{Identity, ProviderToken};
use staff_dashboard_core::ports::{IdentityProvider, PortError, PortResult};

const AUTHORIZE_URL: &str = "https://discord.com/api/oauth2/authorize";
const TOKEN_URL: &str = "https://discord.com/api/oauth2/token";
const ME_URL: &str = "https://discord.com/api/v10/users/@me";
const SCOPES: &str = "identify email guilds";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `IdentityProvider` port against Discord.
#[derive(Clone)]
pub struct DiscordOAuth {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl DiscordOAuth {
    /// Creates a new `DiscordOAuth` adapter for the configured application.
    pub fn new(
        http: reqwest::Client,
        client_id: String,
        client_secret: String,
        redirect_uri: String,
    ) -> Self {
        Self {
            http,
            client_id,
            client_secret,
            redirect_uri,
        }
    }
}

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// The subset of Discord's `/users/@me` payload the dashboard carries in the
/// session cookie. Discord sends many more fields; they are ignored here and
/// the strict `Identity` schema is built from this instead.
#[derive(Deserialize)]
struct DiscordUser {
    id: String,
    username: String,
    global_name: Option<String>,
    #[serde(default)]
    discriminator: String,
    avatar: Option<String>,
    email: Option<String>,
}

//=========================================================================================
// `IdentityProvider` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdentityProvider for DiscordOAuth {
    fn authorize_url(&self) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}",
            AUTHORIZE_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(SCOPES),
        )
    }

    async fn exchange_code(&self, code: &str) -> PortResult<ProviderToken> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let response = self
            .http
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("token exchange request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(PortError::Upstream {
                status: response.status().as_u16(),
                message: "Failed to exchange code for token".to_string(),
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("token response parse failed: {e}")))?;

        Ok(ProviderToken {
            access_token: token.access_token,
            expires_in: token.expires_in,
        })
    }

    async fn fetch_identity(&self, access_token: &str) -> PortResult<Identity> {
        let response = self
            .http
            .get(ME_URL)
            .header("Authorization", format!("Bearer {access_token}"))
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("/users/@me request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(PortError::Upstream {
                status: response.status().as_u16(),
                message: "Failed to fetch user information".to_string(),
            });
        }

        let user: DiscordUser = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("/users/@me parse failed: {e}")))?;

        debug!("fetched Discord profile for user {}", user.id);

        Ok(Identity {
            id: user.id,
            username: user.username,
            global_name: user.global_name,
            discriminator: user.discriminator,
            avatar: user.avatar,
            email: user.email,
        })
    }
}

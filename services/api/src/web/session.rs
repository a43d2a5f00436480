//! services/api/src/web/session.rs
//!
//! The session resolver: turns the identity cookie into an `Identity` and
//! issues/clears the session cookie pair. The cookie content is trusted for
//! its lifetime; there is no per-request re-validation against Discord.

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::Response,
};

use crate::config::Config;
use crate::error::ApiError;
use staff_dashboard_core::domain::{Identity, ProviderToken};
use staff_dashboard_core::ports::PortError;

/// Cookie carrying the JSON-serialized identity record.
pub const IDENTITY_COOKIE: &str = "discord_user";
/// Cookie carrying the raw provider access token. Stored, but not required
/// by any protected operation.
pub const TOKEN_COOKIE: &str = "discord_token";

const IDENTITY_COOKIE_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 7;

/// Extracts the identity from a `Cookie` header value.
///
/// Anything short of a well-formed, URL-encoded JSON payload matching the
/// strict `Identity` schema yields `None`: a missing cookie, bad encoding,
/// malformed JSON, and unknown fields are all just "not logged in".
pub fn identity_from_cookie_header(header: &str) -> Option<Identity> {
    let raw = header.split(';').find_map(|part| {
        part.trim()
            .strip_prefix(IDENTITY_COOKIE)
            .and_then(|rest| rest.strip_prefix('='))
    })?;
    let decoded = urlencoding::decode(raw).ok()?;
    serde_json::from_str(&decoded).ok()
}

fn cookie_attributes(config: &Config) -> String {
    let mut attrs = String::from("; HttpOnly; SameSite=Lax; Path=/");
    if config.production {
        attrs.push_str("; Secure");
        if let Some(domain) = &config.cookie_domain {
            attrs.push_str("; Domain=");
            attrs.push_str(domain);
        }
    }
    attrs
}

/// Builds the `Set-Cookie` values issued after a successful code exchange:
/// the identity cookie with a 7-day lifetime and the access-token cookie
/// with the provider-issued lifetime.
pub fn issue_session_cookies(
    config: &Config,
    identity: &Identity,
    token: &ProviderToken,
) -> Result<[String; 2], serde_json::Error> {
    let payload = serde_json::to_string(identity)?;
    let attrs = cookie_attributes(config);
    Ok([
        format!(
            "{IDENTITY_COOKIE}={}{attrs}; Max-Age={IDENTITY_COOKIE_MAX_AGE_SECS}",
            urlencoding::encode(&payload),
        ),
        format!(
            "{TOKEN_COOKIE}={}{attrs}; Max-Age={}",
            token.access_token, token.expires_in,
        ),
    ])
}

/// Builds the `Set-Cookie` values that clear both session cookies.
pub fn clear_session_cookies(config: &Config) -> [String; 2] {
    let attrs = cookie_attributes(config);
    [
        format!("{IDENTITY_COOKIE}={attrs}; Max-Age=0"),
        format!("{TOKEN_COOKIE}={attrs}; Max-Age=0"),
    ]
}

/// Middleware that resolves the session cookie and makes the `Identity`
/// available to handlers through request extensions.
///
/// If the cookie is missing or does not decode, the request is rejected with
/// 401 before reaching any handler.
pub async fn require_auth(mut req: Request, next: Next) -> Result<Response, ApiError> {
    let identity = req
        .headers()
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(identity_from_cookie_header)
        .ok_or(ApiError::Port(PortError::Unauthorized))?;

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(production: bool) -> Config {
        Config {
            bind_address: "127.0.0.1:3000".parse().unwrap(),
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            mongodb_db: "staff_dashboard_test".to_string(),
            log_level: tracing::Level::INFO,
            discord_client_id: "1234".to_string(),
            discord_client_secret: "secret".to_string(),
            discord_redirect_uri: "http://localhost:3000/api/auth/callback".to_string(),
            discord_bot_token: None,
            discord_guild_id: "1".to_string(),
            base_url: "http://localhost:3000".to_string(),
            cors_origin: "http://localhost:3000".to_string(),
            production,
            cookie_domain: Some("example.test".to_string()),
        }
    }

    #[test]
    fn resolves_identity_from_cookie_header() {
        let header = format!(
            "theme=dark; {IDENTITY_COOKIE}={}",
            urlencoding::encode(r#"{"id":"42","username":"alice"}"#),
        );
        let identity = identity_from_cookie_header(&header).unwrap();
        assert_eq!(identity.id, "42");
        assert_eq!(identity.username, "alice");
    }

    #[test]
    fn missing_or_malformed_cookie_is_unauthenticated() {
        assert!(identity_from_cookie_header("theme=dark").is_none());
        assert!(identity_from_cookie_header(&format!("{IDENTITY_COOKIE}=not-json")).is_none());
        // A shape the schema does not know is refused, not trusted.
        let unknown = format!(
            "{IDENTITY_COOKIE}={}",
            urlencoding::encode(r#"{"id":"42","username":"a","role":"admin"}"#),
        );
        assert!(identity_from_cookie_header(&unknown).is_none());
    }

    #[test]
    fn issued_cookies_carry_expected_attributes() {
        let identity: Identity =
            serde_json::from_str(r#"{"id":"42","username":"alice"}"#).unwrap();
        let token = ProviderToken {
            access_token: "tok".to_string(),
            expires_in: 604_800,
        };

        let [user_cookie, token_cookie] =
            issue_session_cookies(&config(false), &identity, &token).unwrap();

        assert!(user_cookie.starts_with(&format!("{IDENTITY_COOKIE}=")));
        assert!(user_cookie.contains("HttpOnly"));
        assert!(user_cookie.contains("SameSite=Lax"));
        assert!(user_cookie.contains("Max-Age=604800"));
        assert!(!user_cookie.contains("Secure"));
        assert!(token_cookie.starts_with(&format!("{TOKEN_COOKIE}=tok")));
    }

    #[test]
    fn production_cookies_are_secure_and_domain_scoped() {
        let identity: Identity =
            serde_json::from_str(r#"{"id":"42","username":"alice"}"#).unwrap();
        let token = ProviderToken {
            access_token: "tok".to_string(),
            expires_in: 60,
        };

        let [user_cookie, _] = issue_session_cookies(&config(true), &identity, &token).unwrap();
        assert!(user_cookie.contains("Secure"));
        assert!(user_cookie.contains("Domain=example.test"));
    }

    #[test]
    fn issued_cookie_round_trips_through_the_resolver() {
        let identity: Identity = serde_json::from_str(
            r#"{"id":"42","username":"alice","global_name":"Alice","discriminator":"0","avatar":"abc"}"#,
        )
        .unwrap();
        let token = ProviderToken {
            access_token: "tok".to_string(),
            expires_in: 60,
        };

        let [user_cookie, _] = issue_session_cookies(&config(false), &identity, &token).unwrap();
        let value = user_cookie.split(';').next().unwrap();

        let resolved = identity_from_cookie_header(value).unwrap();
        assert_eq!(resolved.id, "42");
        assert_eq!(resolved.global_name.as_deref(), Some("Alice"));
    }

    #[test]
    fn cleared_cookies_expire_immediately() {
        let [user_cookie, token_cookie] = clear_session_cookies(&config(false));
        assert!(user_cookie.contains("Max-Age=0"));
        assert!(token_cookie.contains("Max-Age=0"));
    }
}

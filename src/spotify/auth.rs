//! Spotify OAuth flows and API client construction.
//!
//! Login runs the PKCE browser flow through `librespot_oauth`; afterwards
//! the session lives as a refresh token inside the settings document and is
//! exchanged for a fresh access token on every startup.

use std::collections::HashSet;

use anyhow::Result;
use chrono::Utc;
use rspotify::{AuthCodeSpotify, Config, Token};

use crate::config::StoredToken;

const SPOTIFY_CLIENT_ID: &str = "492e1e45ea814fa3ac555fe1576aaf5b";
const SPOTIFY_REDIRECT_URI: &str = "http://127.0.0.1:8898/login";
pub const SCOPES: &str =
    "user-read-playback-state user-modify-playback-state user-read-currently-playing user-read-playback-position user-read-private";

const RESPONSE: &str = r#"
<!doctype html>
<html>
<head><title>Success</title></head>
<body><h1>Authentication Successful!</h1><script>window.close();</script></body>
</html>
"#;

const ACCESS_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Runs the browser-based OAuth flow and waits for the user to finish it.
pub async fn browser_login() -> Result<StoredToken> {
    tracing::info!("Starting browser-based OAuth flow");
    let client = librespot_oauth::OAuthClientBuilder::new(
        SPOTIFY_CLIENT_ID,
        SPOTIFY_REDIRECT_URI,
        SCOPES.split_whitespace().collect(),
    )
    .open_in_browser()
    .with_custom_message(RESPONSE)
    .build()?;

    let token = client.get_access_token_async().await?;
    tracing::info!("Browser authentication completed successfully");

    Ok(stored_token(token.access_token, token.refresh_token))
}

/// Exchanges a stored refresh token for a fresh access token.
pub async fn refresh_login(refresh_token: &str) -> Result<StoredToken> {
    let client = librespot_oauth::OAuthClientBuilder::new(
        SPOTIFY_CLIENT_ID,
        SPOTIFY_REDIRECT_URI,
        SCOPES.split_whitespace().collect(),
    )
    .build()?;

    let token = client.refresh_token_async(refresh_token).await?;
    tracing::debug!("Token refreshed successfully");

    Ok(stored_token(token.access_token, token.refresh_token))
}

/// Builds an authorized API client around `stored`. Token caching and
/// rspotify's own refresh machinery stay off; the provider manages the
/// session itself.
pub async fn build_client(stored: &StoredToken) -> Result<AuthCodeSpotify> {
    let spotify = AuthCodeSpotify::with_config(
        Default::default(),
        Default::default(),
        Config {
            token_cached: false,
            token_refreshing: false,
            ..Default::default()
        },
    );

    *spotify.token.lock().await.unwrap() = Some(rspotify_token(stored));
    tracing::debug!("rspotify client initialized");
    Ok(spotify)
}

fn stored_token(access_token: String, refresh_token: String) -> StoredToken {
    StoredToken {
        access_token,
        refresh_token,
        expires_at: Some(Utc::now() + chrono::Duration::seconds(ACCESS_TOKEN_LIFETIME_SECS)),
    }
}

fn rspotify_token(stored: &StoredToken) -> Token {
    Token {
        access_token: stored.access_token.clone(),
        expires_in: chrono::Duration::seconds(ACCESS_TOKEN_LIFETIME_SECS),
        expires_at: stored.expires_at,
        scopes: SCOPES
            .split_whitespace()
            .map(|s| s.to_string())
            .collect::<HashSet<String>>(),
        refresh_token: None,
    }
}

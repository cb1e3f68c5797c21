//! Interactive consent flow and token exchange.
//!
//! The consent leg binds a loopback listener on a fixed port, hands the user
//! an authorization URL to open in a browser, waits for the provider to
//! redirect back with an authorization code, and trades the code for tokens
//! at the registered token endpoint. The refresh leg posts a
//! `refresh_token` grant against the same endpoint.

use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use super::client_secret::ClientSecret;
use super::credentials::Credential;
use super::error::AuthError;

/// Fixed loopback port the registered redirect URI points at.
pub const REDIRECT_PORT: u16 = 8085;

/// How long to wait for the user to approve access in the browser.
const CONSENT_TIMEOUT_SECS: u64 = 300;

/// Read-only access to the media library.
pub const SCOPE: &str = "https://www.googleapis.com/auth/photoslibrary.readonly";

/// Token endpoint response for both the code-exchange and refresh grants.
/// A refresh response omits `refresh_token`; the caller keeps its old one.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

fn redirect_uri() -> String {
    format!("http://127.0.0.1:{}", REDIRECT_PORT)
}

/// Build the authorization URL the user opens in a browser.
fn authorize_url(secret: &ClientSecret, state: &str) -> Result<String, AuthError> {
    let url = url::Url::parse_with_params(
        &secret.auth_uri,
        &[
            ("response_type", "code"),
            ("client_id", secret.client_id.as_str()),
            ("redirect_uri", redirect_uri().as_str()),
            ("scope", SCOPE),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("state", state),
        ],
    )
    .map_err(|e| AuthError::ClientSecret(format!("invalid auth_uri: {}", e)))?;
    Ok(url.into())
}

/// Extract `code` and `state` from the redirect's HTTP request line,
/// e.g. `GET /?state=xyz&code=abc HTTP/1.1`.
fn parse_redirect(request_line: &str) -> Result<(String, String), AuthError> {
    let path = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| AuthError::ConsentDenied("malformed redirect request".to_string()))?;
    let url = url::Url::parse(&format!("http://localhost{}", path))
        .map_err(|e| AuthError::ConsentDenied(format!("unparseable redirect: {}", e)))?;

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => return Err(AuthError::ConsentDenied(value.into_owned())),
            _ => {}
        }
    }

    match (code, state) {
        (Some(code), Some(state)) => Ok((code, state)),
        _ => Err(AuthError::ConsentDenied(
            "redirect carried no authorization code".to_string(),
        )),
    }
}

/// Run the full interactive consent flow and return a fresh credential.
pub async fn run_consent_flow(
    client: &Client,
    secret: &ClientSecret,
) -> Result<Credential, AuthError> {
    let listener = TcpListener::bind(("127.0.0.1", REDIRECT_PORT)).await?;
    let state = uuid::Uuid::new_v4().to_string();
    let url = authorize_url(secret, &state)?;

    println!("Open this URL in your browser to grant access:");
    println!("  {}", url);

    let (code, returned_state) = tokio::time::timeout(
        Duration::from_secs(CONSENT_TIMEOUT_SECS),
        wait_for_redirect(&listener),
    )
    .await
    .map_err(|_| AuthError::ConsentTimeout)??;

    if returned_state != state {
        return Err(AuthError::StateMismatch);
    }

    tracing::debug!("Authorization code received, exchanging for tokens");
    exchange_code(client, secret, &code).await
}

/// Accept connections until one carries the consent redirect. Browsers also
/// ask for things like /favicon.ico; those get a 404 and the wait continues.
async fn wait_for_redirect(listener: &TcpListener) -> Result<(String, String), AuthError> {
    loop {
        let (mut stream, _) = listener.accept().await?;
        let mut buf = vec![0u8; 4096];
        let n = stream.read(&mut buf).await?;
        let request = String::from_utf8_lossy(&buf[..n]);
        let request_line = request.lines().next().unwrap_or("").to_string();

        if !request_line.contains("GET /?") {
            let _ = stream
                .write_all(b"HTTP/1.1 404 Not Found\r\nConnection: close\r\n\r\n")
                .await;
            continue;
        }

        let parsed = parse_redirect(&request_line);
        let body = match &parsed {
            Ok(_) => "Authorization received. You can close this window.",
            Err(_) => "Authorization failed. You can close this window.",
        };
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let _ = stream.write_all(response.as_bytes()).await;
        return parsed;
    }
}

/// Trade an authorization code for an access + refresh token pair.
async fn exchange_code(
    client: &Client,
    secret: &ClientSecret,
    code: &str,
) -> Result<Credential, AuthError> {
    request_token(
        client,
        secret,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", secret.client_id.as_str()),
            ("client_secret", secret.client_secret.as_str()),
            ("redirect_uri", redirect_uri().as_str()),
        ],
        None,
    )
    .await
}

/// Refresh an expired access token in place.
pub async fn refresh(
    client: &Client,
    secret: &ClientSecret,
    refresh_token: &str,
) -> Result<Credential, AuthError> {
    request_token(
        client,
        secret,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", secret.client_id.as_str()),
            ("client_secret", secret.client_secret.as_str()),
        ],
        Some(refresh_token.to_string()),
    )
    .await
}

async fn request_token(
    client: &Client,
    secret: &ClientSecret,
    params: &[(&str, &str)],
    carried_refresh_token: Option<String>,
) -> Result<Credential, AuthError> {
    tracing::debug!("POST {}", secret.token_uri);
    let response = client.post(&secret.token_uri).form(params).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::TokenEndpoint {
            status: status.as_u16(),
            body,
        });
    }

    let body = response.text().await?;
    let token: TokenResponse = serde_json::from_str(&body)?;

    Ok(Credential {
        access_token: token.access_token,
        refresh_token: token.refresh_token.or(carried_refresh_token),
        expiry: token
            .expires_in
            .map(|secs| Utc::now() + chrono::Duration::seconds(secs)),
        token_uri: secret.token_uri.clone(),
        scopes: vec![SCOPE.to_string()],
    })
}

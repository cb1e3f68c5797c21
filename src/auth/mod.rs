//! OAuth2 authentication against the photo provider's consent and token
//! endpoints.
//!
//! The credential lifecycle drives the flow: a persisted, unexpired
//! credential is used as-is; an expired one with a refresh token is
//! refreshed in place; anything else falls back to the interactive loopback
//! consent flow. The result is re-persisted after any refresh or creation.

pub mod client_secret;
pub mod credentials;
pub mod error;
pub mod flow;

use std::path::Path;

use anyhow::Result;
use reqwest::Client;

pub use self::client_secret::ClientSecret;
pub use self::credentials::{Credential, FileTokenStore, TokenStore};

/// Obtain a usable credential for `account`, consulting the store first.
///
/// Fails (and the program aborts) when the client secret is missing or
/// malformed, when the provider rejects a refresh, or when the interactive
/// flow is denied or times out.
pub async fn authenticate(
    client: &Client,
    account: &str,
    client_secret_path: &Path,
    store: &dyn TokenStore,
) -> Result<Credential> {
    let secret = ClientSecret::load(client_secret_path)?;

    if let Some(credential) = store.load(account)? {
        if !credential.is_expired() {
            tracing::debug!("Persisted credential for {} is still valid", account);
            return Ok(credential);
        }
        if let Some(refresh_token) = credential.refresh_token.as_deref() {
            tracing::info!("Access token expired, refreshing");
            let refreshed = flow::refresh(client, &secret, refresh_token).await?;
            store.save(account, &refreshed)?;
            tracing::debug!("Refreshed credential for {}", account);
            return Ok(refreshed);
        }
        tracing::info!("Credential expired and has no refresh token, re-authorizing");
    }

    let credential = flow::run_consent_flow(client, &secret).await?;
    store.save(account, &credential)?;
    tracing::info!("Authentication completed successfully");
    Ok(credential)
}

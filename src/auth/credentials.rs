//! Persisted OAuth token material and its storage.
//!
//! One credential file per account name, JSON on disk, restricted to the
//! owner. Storage sits behind the [`TokenStore`] trait so tests can swap in
//! an in-memory backend.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Leeway subtracted from the recorded expiry so a token about to lapse
/// mid-request is treated as already expired.
const EXPIRY_SKEW_SECS: i64 = 60;

/// OAuth token material scoped to one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    pub token_uri: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Credential {
    /// Whether the access token is past (or within a minute of) its expiry.
    /// A credential without a recorded expiry is assumed usable.
    pub fn is_expired(&self) -> bool {
        match self.expiry {
            Some(expiry) => Utc::now() + chrono::Duration::seconds(EXPIRY_SKEW_SECS) >= expiry,
            None => false,
        }
    }
}

/// Keyed credential storage: account name → credential blob.
pub trait TokenStore {
    fn load(&self, account: &str) -> Result<Option<Credential>>;
    fn save(&self, account: &str, credential: &Credential) -> Result<()>;
}

/// Sanitize an account name by keeping only word characters, so it is safe
/// to embed in a filename.
pub fn sanitize_account(account: &str) -> String {
    account
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

/// File-backed [`TokenStore`]: one JSON file per account under a fixed
/// directory.
pub struct FileTokenStore {
    directory: PathBuf,
}

impl FileTokenStore {
    pub fn new(directory: &Path) -> Self {
        Self {
            directory: directory.to_path_buf(),
        }
    }

    fn credential_path(&self, account: &str) -> PathBuf {
        self.directory
            .join(format!("{}.credentials.json", sanitize_account(account)))
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self, account: &str) -> Result<Option<Credential>> {
        let path = self.credential_path(account);
        if !path.exists() {
            tracing::debug!("No credential file at {}", path.display());
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read credential file {}", path.display()))?;
        match serde_json::from_str(&contents) {
            Ok(credential) => {
                tracing::debug!("Loaded credential from {}", path.display());
                Ok(Some(credential))
            }
            Err(e) => {
                tracing::warn!("Credential file {} is corrupt ({}), ignoring", path.display(), e);
                Ok(None)
            }
        }
    }

    fn save(&self, account: &str, credential: &Credential) -> Result<()> {
        std::fs::create_dir_all(&self.directory).with_context(|| {
            format!(
                "Failed to create token directory {}",
                self.directory.display()
            )
        })?;
        let path = self.credential_path(account);
        let json = serde_json::to_string_pretty(credential)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write credential file {}", path.display()))?;
        #[cfg(unix)]
        {
            // Token material: owner-only
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&path, perms)?;
        }
        tracing::debug!("Saved credential to {}", path.display());
        Ok(())
    }
}

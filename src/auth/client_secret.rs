use std::path::Path;

use serde::Deserialize;

use super::error::AuthError;

/// OAuth client registration exported by the provider's developer console.
///
/// The console wraps the fields in either an `"installed"` or a `"web"`
/// section depending on the application type; both carry the same fields
/// and are accepted interchangeably.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

#[derive(Deserialize)]
struct ClientSecretFile {
    #[serde(default)]
    installed: Option<ClientSecret>,
    #[serde(default)]
    web: Option<ClientSecret>,
}

impl ClientSecret {
    /// Load and parse a client secret file.
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AuthError::ClientSecret(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    fn from_json(contents: &str) -> Result<Self, AuthError> {
        let file: ClientSecretFile = serde_json::from_str(contents)
            .map_err(|e| AuthError::ClientSecret(format!("malformed JSON: {}", e)))?;
        file.installed.or(file.web).ok_or_else(|| {
            AuthError::ClientSecret("expected an \"installed\" or \"web\" section".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_installed_section() {
        let json = r#"{
            "installed": {
                "client_id": "id-123.apps.googleusercontent.com",
                "client_secret": "shhh",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token",
                "redirect_uris": ["http://localhost"]
            }
        }"#;
        let secret = ClientSecret::from_json(json).unwrap();
        assert_eq!(secret.client_id, "id-123.apps.googleusercontent.com");
        assert_eq!(secret.client_secret, "shhh");
        assert_eq!(secret.token_uri, "https://oauth2.googleapis.com/token");
    }

    #[test]
    fn test_parse_web_section() {
        let json = r#"{"web": {"client_id": "id", "client_secret": "s"}}"#;
        let secret = ClientSecret::from_json(json).unwrap();
        assert_eq!(secret.client_id, "id");
    }

    #[test]
    fn test_default_endpoints_filled_in() {
        let json = r#"{"installed": {"client_id": "id", "client_secret": "s"}}"#;
        let secret = ClientSecret::from_json(json).unwrap();
        assert_eq!(secret.auth_uri, "https://accounts.google.com/o/oauth2/auth");
        assert_eq!(secret.token_uri, "https://oauth2.googleapis.com/token");
    }

    #[test]
    fn test_missing_sections_rejected() {
        let err = ClientSecret::from_json(r#"{"other": {}}"#).unwrap_err();
        assert!(err.to_string().contains("installed"));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = ClientSecret::from_json("{not json").unwrap_err();
        assert!(matches!(err, AuthError::ClientSecret(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ClientSecret::load(Path::new("/nonexistent/secret.json")).unwrap_err();
        assert!(matches!(err, AuthError::ClientSecret(_)));
    }
}

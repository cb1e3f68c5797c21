use thiserror::Error;

/// Errors raised while obtaining or refreshing an access credential.
///
/// All of these are fatal: the program surfaces the diagnostic and exits
/// rather than proceeding without a credential.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid client secret: {0}")]
    ClientSecret(String),

    #[error("Consent denied: {0}")]
    ConsentDenied(String),

    #[error("Timed out waiting for the consent redirect")]
    ConsentTimeout,

    #[error("State mismatch in consent redirect")]
    StateMismatch,

    #[error("Token endpoint error (HTTP {status}): {body}")]
    TokenEndpoint { status: u16, body: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

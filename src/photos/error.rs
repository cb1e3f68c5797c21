use thiserror::Error;

/// Errors from the media listing API. Listing failures abort the run; there
/// is no retry policy.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API error (HTTP {status}): {body}")]
    Status { status: u16, body: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

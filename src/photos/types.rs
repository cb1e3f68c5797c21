//! Wire types for the `mediaItems.list` endpoint.
//!
//! Fields the pipeline depends on (`id`, `filename`, `baseUrl`, `mimeType`)
//! are required, so a malformed provider response fails the page parse with
//! a clear error instead of surfacing as a missing-key panic deep in the
//! download path. Metadata is optional end to end: items without a creation
//! time are valid on the wire and skipped later.

use serde::Deserialize;

/// One page of the listing response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItemsPage {
    #[serde(default)]
    pub media_items: Vec<MediaItem>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// A media item descriptor as reported by the provider. Read-only and never
/// persisted locally.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    pub filename: String,
    /// Base content URL; derived assets are selected by appending a
    /// provider-specific modifier (`=d`, `=dv`).
    pub base_url: String,
    pub mime_type: String,
    #[serde(default)]
    pub media_metadata: Option<MediaMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    #[serde(default)]
    pub creation_time: Option<String>,
}

impl MediaItem {
    /// The capture timestamp string, if the provider reported one.
    pub fn creation_time(&self) -> Option<&str> {
        self.media_metadata
            .as_ref()
            .and_then(|m| m.creation_time.as_deref())
    }
}

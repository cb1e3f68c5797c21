//! Media listing — pages through the provider's `mediaItems.list` endpoint,
//! yielding descriptor batches until the continuation token runs out.

pub mod error;
pub mod types;

pub use error::ApiError;
pub use types::{MediaItem, MediaItemsPage};

use async_trait::async_trait;
use reqwest::Client;

/// Descriptors requested per page. 100 is the provider's maximum.
pub const PAGE_SIZE: u32 = 100;

const MEDIA_ITEMS_ENDPOINT: &str = "https://photoslibrary.googleapis.com/v1/mediaItems";

/// Minimal async source of listing pages. The concrete implementation talks
/// HTTP; tests substitute an in-memory stub.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn list_page(
        &self,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<MediaItemsPage, ApiError>;
}

/// Bearer-authenticated HTTP source backed by the shared client.
pub struct RestSource {
    client: Client,
    access_token: String,
    endpoint: String,
}

impl RestSource {
    pub fn new(client: Client, access_token: String) -> Self {
        Self {
            client,
            access_token,
            endpoint: MEDIA_ITEMS_ENDPOINT.to_string(),
        }
    }
}

#[async_trait]
impl MediaSource for RestSource {
    async fn list_page(
        &self,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<MediaItemsPage, ApiError> {
        let mut request = self
            .client
            .get(&self.endpoint)
            .bearer_auth(&self.access_token)
            .query(&[("pageSize", page_size.to_string())]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        tracing::debug!("GET {} (pageToken: {})", self.endpoint, page_token.unwrap_or("-"));
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let page: MediaItemsPage = serde_json::from_str(&body)?;
        Ok(page)
    }
}

/// Lazily pages through the full library.
///
/// Finite and forward-only: each call produces one page's descriptors, and
/// the continuation token is echoed back verbatim on the next call, never
/// inspected. Restarting means constructing a new pager (which replays from
/// the first page).
pub struct MediaPager {
    source: Box<dyn MediaSource>,
    page_token: Option<String>,
    exhausted: bool,
}

impl MediaPager {
    pub fn new(source: Box<dyn MediaSource>) -> Self {
        Self {
            source,
            page_token: None,
            exhausted: false,
        }
    }

    /// Fetch the next batch of descriptors, or `None` once the endpoint
    /// stops returning a continuation token. The first listing failure
    /// propagates and aborts the run.
    pub async fn next_page(&mut self) -> Result<Option<Vec<MediaItem>>, ApiError> {
        if self.exhausted {
            return Ok(None);
        }
        let page = self
            .source
            .list_page(PAGE_SIZE, self.page_token.as_deref())
            .await?;
        self.page_token = page.next_page_token;
        if self.page_token.is_none() {
            self.exhausted = true;
        }
        Ok(Some(page.media_items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn item(id: &str) -> MediaItem {
        serde_json::from_str(&format!(
            r#"{{"id": "{id}", "filename": "{id}.jpg",
                "baseUrl": "https://lh3.example.com/{id}",
                "mimeType": "image/jpeg"}}"#
        ))
        .unwrap()
    }

    /// Stub source serving a fixed sequence of pages while recording the
    /// tokens it was asked for.
    struct StubSource {
        pages: Vec<(Vec<MediaItem>, Option<String>)>,
        calls: Arc<Mutex<Vec<Option<String>>>>,
    }

    impl StubSource {
        fn new(pages: Vec<(Vec<MediaItem>, Option<String>)>) -> Self {
            Self {
                pages,
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl MediaSource for StubSource {
        async fn list_page(
            &self,
            _page_size: u32,
            page_token: Option<&str>,
        ) -> Result<MediaItemsPage, ApiError> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(page_token.map(|t| t.to_string()));
            let index = calls.len() - 1;
            let (items, token) = &self.pages[index];
            Ok(MediaItemsPage {
                media_items: items.clone(),
                next_page_token: token.clone(),
            })
        }
    }

    #[tokio::test]
    async fn test_pages_concatenate_in_order() {
        let source = StubSource::new(vec![
            (vec![item("a"), item("b")], Some("t1".to_string())),
            (vec![item("c")], Some("t2".to_string())),
            (vec![item("d")], None),
        ]);
        let mut pager = MediaPager::new(Box::new(source));

        let mut seen = Vec::new();
        while let Some(items) = pager.next_page().await.unwrap() {
            seen.extend(items.into_iter().map(|i| i.id));
        }
        assert_eq!(seen, vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_token_passed_back_unmodified() {
        let source = StubSource::new(vec![
            (vec![], Some("CkgKQnR5cGU=".to_string())),
            (vec![], None),
        ]);
        let calls = Arc::clone(&source.calls);
        let mut pager = MediaPager::new(Box::new(source));
        while pager.next_page().await.unwrap().is_some() {}

        assert_eq!(
            *calls.lock().unwrap(),
            vec![None, Some("CkgKQnR5cGU=".to_string())]
        );
    }

    #[tokio::test]
    async fn test_single_page_library() {
        let source = StubSource::new(vec![(vec![item("only")], None)]);
        let mut pager = MediaPager::new(Box::new(source));
        let first = pager.next_page().await.unwrap().unwrap();
        assert_eq!(first.len(), 1);
        assert!(pager.next_page().await.unwrap().is_none());
        // Exhausted pagers stay exhausted.
        assert!(pager.next_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_library() {
        let source = StubSource::new(vec![(vec![], None)]);
        let mut pager = MediaPager::new(Box::new(source));
        assert_eq!(pager.next_page().await.unwrap().unwrap().len(), 0);
        assert!(pager.next_page().await.unwrap().is_none());
    }

    struct FailingSource;

    #[async_trait]
    impl MediaSource for FailingSource {
        async fn list_page(
            &self,
            _page_size: u32,
            _page_token: Option<&str>,
        ) -> Result<MediaItemsPage, ApiError> {
            Err(ApiError::Status {
                status: 403,
                body: "quota exceeded".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_listing_failure_propagates() {
        let mut pager = MediaPager::new(Box::new(FailingSource));
        let err = pager.next_page().await.unwrap_err();
        match err {
            ApiError::Status { status, .. } => assert_eq!(status, 403),
            other => panic!("unexpected error: {}", other),
        }
    }
}

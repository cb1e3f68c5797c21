use thiserror::Error;

/// Typed download errors. HTTP failures are per-item and non-fatal to the
/// run; disk failures abort it, since they mean the output tree itself is
/// broken.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP error {status} downloading {path}")]
    HttpStatus { status: u16, path: String },

    #[error("HTTP error downloading {path}: {source}")]
    Http {
        source: reqwest::Error,
        path: String,
    },

    #[error("Disk error: {0}")]
    Disk(#[from] std::io::Error),
}

impl DownloadError {
    /// Whether this failure stays contained to the current item.
    pub fn is_per_item(&self) -> bool {
        matches!(
            self,
            DownloadError::HttpStatus { .. } | DownloadError::Http { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_is_per_item() {
        let e = DownloadError::HttpStatus {
            status: 404,
            path: "x".into(),
        };
        assert!(e.is_per_item());
    }

    #[test]
    fn test_disk_is_fatal() {
        let e = DownloadError::Disk(std::io::Error::other("disk full"));
        assert!(!e.is_per_item());
    }
}

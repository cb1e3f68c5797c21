//! Single-attempt fetch-and-write.
//!
//! The destination's existence is the only de-duplication ledger: a path
//! that exists is never re-fetched, and a file only appears at its final
//! path after the whole body has been written. In-progress downloads land
//! next to the destination under a `.part` name and are renamed into place.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::error::DownloadError;

/// What a single download attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Downloaded,
    AlreadyExists,
}

fn part_path(download_path: &Path) -> PathBuf {
    let name = download_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("download");
    download_path.with_file_name(format!("{}.part", name))
}

/// Fetch `url` into `download_path`, one attempt, no retry.
pub async fn download_file(
    client: &Client,
    url: &str,
    download_path: &Path,
) -> Result<FetchOutcome, DownloadError> {
    if download_path.exists() {
        tracing::debug!("{} already exists, skipping", download_path.display());
        return Ok(FetchOutcome::AlreadyExists);
    }

    let path_str = download_path.display().to_string();
    let response = client.get(url).send().await.map_err(|e| DownloadError::Http {
        source: e,
        path: path_str.clone(),
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::HttpStatus {
            status: status.as_u16(),
            path: path_str,
        });
    }

    let part = part_path(download_path);
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&part)
        .await?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DownloadError::Http {
            source: e,
            path: path_str.clone(),
        })?;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    drop(file);

    fs::rename(&part, download_path).await?;

    Ok(FetchOutcome::Downloaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("gphotos_dl_tests").join(name);
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_part_path_appends_suffix() {
        assert_eq!(
            part_path(Path::new("/out/2020/01/01/a.jpg")),
            PathBuf::from("/out/2020/01/01/a.jpg.part")
        );
    }

    #[tokio::test]
    async fn test_existing_file_short_circuits() {
        let dir = test_dir("exists_skip");
        let dest = dir.join("photo.jpg");
        std::fs::write(&dest, b"original").unwrap();

        // The URL is unreachable on purpose: the existence check must win
        // before any request is issued.
        let client = Client::new();
        let outcome = download_file(&client, "http://127.0.0.1:1/photo", &dest)
            .await
            .unwrap();
        assert_eq!(outcome, FetchOutcome::AlreadyExists);
        assert_eq!(std::fs::read(&dest).unwrap(), b"original");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_per_item_error() {
        let dir = test_dir("unreachable");
        let dest = dir.join("photo.jpg");

        let client = Client::new();
        let err = download_file(&client, "http://127.0.0.1:1/photo", &dest)
            .await
            .unwrap_err();
        assert!(err.is_per_item());
        assert!(!dest.exists());
    }
}

//! Per-item routing and the sequential download pipeline.
//!
//! Each descriptor resolves to exactly one terminal outcome; there are no
//! retry transitions. The filesystem is the only ledger: existence of the
//! destination path is what marks an item done, which makes a full re-run
//! idempotent at the file level.

pub mod error;
pub mod file;
pub mod paths;

use std::fs::FileTimes;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, UNIX_EPOCH};

use anyhow::Result;
use chrono::{DateTime, FixedOffset};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;

use self::file::FetchOutcome;
use crate::photos::{MediaItem, MediaPager};

/// URL modifiers selecting which derived asset a content URL resolves to.
const IMAGE_MODIFIER: &str = "=d";
const VIDEO_MODIFIER: &str = "=dv";

/// Subset of application config consumed by the pipeline.
/// Decoupled from CLI parsing so the pipeline can be tested independently.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub output: PathBuf,
    pub dry_run: bool,
    pub no_progress_bar: bool,
}

/// Terminal state of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Downloaded,
    SkippedExists,
    SkippedNoDate,
    SkippedUnsupportedType,
    SkippedDryRun,
    FailedHttp,
}

/// Aggregate counts for the run's closing summary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub downloaded: u64,
    pub skipped_existing: u64,
    pub skipped_no_date: u64,
    pub skipped_unsupported: u64,
    pub dry_run: u64,
    pub failed: u64,
}

impl RunSummary {
    fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Downloaded => self.downloaded += 1,
            ItemOutcome::SkippedExists => self.skipped_existing += 1,
            ItemOutcome::SkippedNoDate => self.skipped_no_date += 1,
            ItemOutcome::SkippedUnsupportedType => self.skipped_unsupported += 1,
            ItemOutcome::SkippedDryRun => self.dry_run += 1,
            ItemOutcome::FailedHttp => self.failed += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.downloaded
            + self.skipped_existing
            + self.skipped_no_date
            + self.skipped_unsupported
            + self.dry_run
            + self.failed
    }
}

/// Media class derived from the reported MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MediaClass {
    Image,
    Video,
    Unsupported,
}

fn classify(mime_type: &str) -> MediaClass {
    if mime_type.contains("video") {
        MediaClass::Video
    } else if mime_type.contains("image") {
        MediaClass::Image
    } else {
        MediaClass::Unsupported
    }
}

fn parse_creation_time(item: &MediaItem) -> Option<DateTime<FixedOffset>> {
    item.creation_time()
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
}

fn create_progress_bar(hidden: bool) -> ProgressBar {
    if hidden || !std::io::stdout().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} {pos} items processed {msg}")
            .expect("valid template"),
    );
    pb
}

/// Entry point for the pipeline: page through the listing and handle every
/// item in order, one request in flight at a time.
///
/// Listing failures abort with an error; per-item failures are tallied and
/// the run completes normally.
pub async fn run(
    client: &Client,
    pager: &mut MediaPager,
    config: &DownloadConfig,
) -> Result<RunSummary> {
    let started = Instant::now();
    let pb = create_progress_bar(config.no_progress_bar || config.dry_run);
    let mut summary = RunSummary::default();

    while let Some(items) = pager.next_page().await? {
        tracing::debug!("Listing returned {} items", items.len());
        for item in &items {
            let outcome = process_item(client, item, config, &pb).await?;
            summary.record(outcome);
            pb.inc(1);
        }
    }

    pb.finish_and_clear();
    log_summary(&summary, config, started.elapsed());
    Ok(summary)
}

/// Route one descriptor to its terminal outcome.
async fn process_item(
    client: &Client,
    item: &MediaItem,
    config: &DownloadConfig,
    pb: &ProgressBar,
) -> Result<ItemOutcome> {
    let created = match parse_creation_time(item) {
        Some(ts) => ts,
        None => {
            pb.suspend(|| {
                tracing::info!("Skipping {}: no usable creation time", item.filename)
            });
            return Ok(ItemOutcome::SkippedNoDate);
        }
    };

    let class = classify(&item.mime_type);
    if class == MediaClass::Unsupported {
        pb.suspend(|| {
            tracing::info!(
                "Skipping {}: unsupported media type '{}'",
                item.filename,
                item.mime_type
            )
        });
        return Ok(ItemOutcome::SkippedUnsupportedType);
    }

    // Dry run decides before the probe, any fetch, or any directory creation.
    if config.dry_run {
        pb.suspend(|| tracing::info!("[DRY RUN] Would download {}: {:?}", item.filename, item));
        return Ok(ItemOutcome::SkippedDryRun);
    }

    let dir = paths::date_dir(&config.output, &created);
    tokio::fs::create_dir_all(&dir).await?;

    if class == MediaClass::Video {
        download_video(client, item, &dir, &created, pb).await
    } else {
        download_image(client, item, &dir, &created, pb).await
    }
}

async fn download_video(
    client: &Client,
    item: &MediaItem,
    dir: &Path,
    created: &DateTime<FixedOffset>,
    pb: &ProgressBar,
) -> Result<ItemOutcome> {
    let ext = paths::extension_for_mime(&item.mime_type);
    let dest = paths::destination(dir, &item.filename, ext);
    let url = format!("{}{}", item.base_url, VIDEO_MODIFIER);
    fetch_to(client, &url, &dest, created, pb).await
}

/// Images get a motion-video probe first: a 200 on the `=dv` rendition
/// marks a live photo, which produces both the still and the motion video
/// under the same basename.
async fn download_image(
    client: &Client,
    item: &MediaItem,
    dir: &Path,
    created: &DateTime<FixedOffset>,
    pb: &ProgressBar,
) -> Result<ItemOutcome> {
    let image_url = format!("{}{}", item.base_url, IMAGE_MODIFIER);
    let ext = paths::extension_for_mime(&item.mime_type);
    let image_dest = paths::destination(dir, &item.filename, ext);

    if probe_motion_video(client, &item.base_url).await {
        tracing::debug!("{} has a motion video companion", item.filename);
        let video_url = format!("{}{}", item.base_url, VIDEO_MODIFIER);
        let video_dest = paths::destination(dir, &item.filename, "mp4");
        let image_outcome = fetch_to(client, &image_url, &image_dest, created, pb).await?;
        let video_outcome = fetch_to(client, &video_url, &video_dest, created, pb).await?;
        return Ok(combine(image_outcome, video_outcome));
    }

    fetch_to(client, &image_url, &image_dest, created, pb).await
}

/// Merge the two halves of a live photo into one item outcome.
fn combine(image: ItemOutcome, video: ItemOutcome) -> ItemOutcome {
    use ItemOutcome::*;
    match (image, video) {
        (FailedHttp, _) | (_, FailedHttp) => FailedHttp,
        (Downloaded, _) | (_, Downloaded) => Downloaded,
        _ => SkippedExists,
    }
}

/// Probe the motion-video rendition. Any transport error or non-200 status
/// means plain image.
async fn probe_motion_video(client: &Client, base_url: &str) -> bool {
    let url = format!("{}{}", base_url, VIDEO_MODIFIER);
    match client.get(&url).send().await {
        Ok(response) => response.status() == reqwest::StatusCode::OK,
        Err(e) => {
            tracing::debug!("Motion video probe failed: {}", e);
            false
        }
    }
}

/// Fetch one URL to one path, mapping per-item HTTP failures to an outcome
/// and letting disk errors abort the run.
async fn fetch_to(
    client: &Client,
    url: &str,
    dest: &Path,
    created: &DateTime<FixedOffset>,
    pb: &ProgressBar,
) -> Result<ItemOutcome> {
    match file::download_file(client, url, dest).await {
        Ok(FetchOutcome::Downloaded) => {
            let mtime_path = dest.to_path_buf();
            let ts = created.timestamp();
            if let Err(e) =
                tokio::task::spawn_blocking(move || set_file_mtime(&mtime_path, ts)).await?
            {
                tracing::warn!("Could not set mtime on {}: {}", dest.display(), e);
            }
            pb.suspend(|| tracing::info!("Downloaded {}", dest.display()));
            Ok(ItemOutcome::Downloaded)
        }
        Ok(FetchOutcome::AlreadyExists) => Ok(ItemOutcome::SkippedExists),
        Err(e) if e.is_per_item() => {
            pb.suspend(|| tracing::warn!("{}", e));
            Ok(ItemOutcome::FailedHttp)
        }
        Err(e) => Err(e.into()),
    }
}

fn log_summary(summary: &RunSummary, config: &DownloadConfig, elapsed: Duration) {
    if config.dry_run {
        tracing::info!("── Dry Run Summary ──");
        tracing::info!("  {} items would be downloaded", summary.dry_run);
        tracing::info!(
            "  {} skipped (no date: {}, unsupported type: {})",
            summary.skipped_no_date + summary.skipped_unsupported,
            summary.skipped_no_date,
            summary.skipped_unsupported
        );
        tracing::info!("  destination: {}", config.output.display());
        return;
    }

    tracing::info!("── Summary ──");
    tracing::info!(
        "  {} downloaded, {} already present, {} failed, {} total",
        summary.downloaded,
        summary.skipped_existing,
        summary.failed,
        summary.total()
    );
    tracing::info!(
        "  {} skipped (no date: {}, unsupported type: {})",
        summary.skipped_no_date + summary.skipped_unsupported,
        summary.skipped_no_date,
        summary.skipped_unsupported
    );
    tracing::info!("  elapsed: {}", format_duration(elapsed));
}

fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {:02}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Set a file's modification and access times to the given Unix timestamp.
/// Timestamps before 1970 clamp to the epoch.
fn set_file_mtime(path: &Path, timestamp: i64) -> std::io::Result<()> {
    let time = if timestamp >= 0 {
        UNIX_EPOCH + Duration::from_secs(timestamp as u64)
    } else {
        UNIX_EPOCH
    };
    let times = FileTimes::new().set_modified(time).set_accessed(time);
    let file = std::fs::File::options().write(true).open(path)?;
    file.set_times(times)?;
    Ok(())
}

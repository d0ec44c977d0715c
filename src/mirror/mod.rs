//! Download-and-record workflow.
//!
//! For each platform in order, the documentation page is scraped; for each
//! link in page order one of four things happens:
//!
//! 1. the file is already on disk: skip
//! 2. the store already has (platform, filename): skip, even if the file was
//!    removed since
//! 3. otherwise download it, insert a provenance row, run the sync command,
//!    and flag the row uploaded if the sync succeeded
//!
//! A failed sync is logged and left as is. Because step 2 only looks at
//! whether the file was downloaded, a later run never retries that sync.
//!
//! A platform whose page yields no links stops the whole run: the extraction
//! rules are shared, so the other pages are assumed broken too.

mod outcome;

pub use outcome::{LinkDecision, LinkOutcome, MirrorStats, PlatformOutcome, RunOutcome};

use std::path::Path;

use thiserror::Error;
use tracing::{Instrument, debug, error, info, info_span, warn};
use url::Url;

use crate::download::{DownloadError, HttpClient, artifact_filename};
use crate::layout::{Layout, LayoutError};
use crate::platform::Platform;
use crate::scrape::{LinkExtraction, PageScraper, ScrapeError};
use crate::store::{NewToolchainRecord, ProvenanceStore, StoreError};
use crate::sync::{RemoteDestination, SyncClient};

/// Errors that end a run. None of them is recovered from locally.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A platform and the page that lists its toolchains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformTarget {
    pub platform: Platform,
    pub page_url: Url,
}

/// Everything the workflow touches, passed explicitly.
pub struct MirrorContext<'a> {
    pub layout: &'a Layout,
    pub store: &'a ProvenanceStore,
    pub scraper: &'a PageScraper,
    pub client: &'a HttpClient,
    pub sync: &'a dyn SyncClient,
    pub remote: &'a RemoteDestination,
}

/// Mirrors every target in order, stopping at the first one without links.
///
/// The fatal log line for that platform is emitted here; mapping the
/// outcome to an exit status is left to the caller.
///
/// # Errors
///
/// Returns [`MirrorError`] on any page fetch, download, filesystem, or
/// database failure. Work completed before the failure stays on disk and in
/// the store.
pub async fn run(
    ctx: &MirrorContext<'_>,
    targets: &[PlatformTarget],
) -> Result<RunOutcome, MirrorError> {
    ctx.layout.ensure()?;

    let mut stats = MirrorStats::default();
    for target in targets {
        let span = info_span!("mirror", platform = %target.platform);
        let outcome = mirror_platform(ctx, target).instrument(span.clone()).await?;

        match outcome {
            PlatformOutcome::Mirrored(platform_stats) => stats.merge(&platform_stats),
            PlatformOutcome::NoLinksFound => {
                span.in_scope(|| {
                    error!(
                        fatal = true,
                        page = %target.page_url,
                        "There were no toolchains found for {}! The documentation layout changed and the link extraction needs an update.",
                        target.platform
                    );
                });
                return Ok(RunOutcome::Aborted {
                    platform: target.platform,
                    stats,
                });
            }
        }
    }

    Ok(RunOutcome::Completed(stats))
}

/// Scrapes one platform's page and processes its links.
///
/// # Errors
///
/// Returns [`MirrorError`] on the first failure; later links are not processed.
pub async fn mirror_platform(
    ctx: &MirrorContext<'_>,
    target: &PlatformTarget,
) -> Result<PlatformOutcome, MirrorError> {
    let platform = target.platform;
    let links = match ctx.scraper.fetch_links(&target.page_url).await? {
        LinkExtraction::LinksFound(links) => links,
        LinkExtraction::NoLinksFound => return Ok(PlatformOutcome::NoLinksFound),
    };

    debug!(
        "Downloadable toolchains for {platform}: {}",
        links
            .iter()
            .map(|link| artifact_filename(link).unwrap_or_else(|_| link.to_string()))
            .collect::<Vec<_>>()
            .join(", ")
    );

    ctx.layout.ensure_platform_dir(platform)?;

    let mut stats = MirrorStats::default();
    for link in &links {
        stats.record(mirror_link(ctx, platform, link).await?);
    }

    info!(
        downloaded = stats.downloaded,
        uploaded = stats.uploaded,
        upload_failed = stats.upload_failed,
        skipped = stats.skipped_on_disk + stats.skipped_recorded + stats.skipped_invalid,
        "platform done"
    );
    Ok(PlatformOutcome::Mirrored(stats))
}

/// Decides whether a link needs downloading.
///
/// The disk is checked before the store, so a file present locally but never
/// recorded is skipped without a row being inserted.
///
/// # Errors
///
/// Returns [`StoreError`] if the store lookup fails.
pub async fn decide(
    store: &ProvenanceStore,
    platform: Platform,
    filename: &str,
    path: &Path,
) -> Result<LinkDecision, StoreError> {
    if path.exists() {
        return Ok(LinkDecision::SkipExistsOnDisk);
    }

    if let Some(record) = store.find(platform, filename).await? {
        return Ok(LinkDecision::SkipAlreadyRecorded {
            downloaded_at: record.downloaded_at,
        });
    }

    Ok(LinkDecision::Download)
}

/// Processes one link: skip, or download, record, and sync.
///
/// # Errors
///
/// Returns [`MirrorError`] if the download, the insert, or the upload flag
/// update fails. A failing sync command is not an error.
pub async fn mirror_link(
    ctx: &MirrorContext<'_>,
    platform: Platform,
    link: &Url,
) -> Result<LinkOutcome, MirrorError> {
    let filename = match artifact_filename(link) {
        Ok(filename) => filename,
        Err(e) => {
            warn!(url = %link, error = %e, "skipping link without a usable filename");
            return Ok(LinkOutcome::SkippedInvalid);
        }
    };
    let download_path = ctx.layout.artifact_path(platform, &filename);

    match decide(ctx.store, platform, &filename, &download_path).await? {
        LinkDecision::SkipExistsOnDisk => {
            debug!("Not downloading {filename} because it already exists");
            return Ok(LinkOutcome::SkippedOnDisk);
        }
        LinkDecision::SkipAlreadyRecorded { downloaded_at } => {
            debug!("Not downloading {filename} as it was already downloaded at {downloaded_at}");
            return Ok(LinkOutcome::SkippedRecorded);
        }
        LinkDecision::Download => {}
    }

    info!("Downloading {filename} to {}", download_path.display());
    ctx.client.download_to_path(link, &download_path).await?;

    let path_str = download_path.to_string_lossy();
    let id = ctx
        .store
        .insert(&NewToolchainRecord {
            url: link.as_str(),
            path: &path_str,
            filename: &filename,
            platform,
        })
        .await?;

    let remote_dest = ctx.remote.for_platform(platform);
    info!("Uploading {platform}/{filename} to {remote_dest}");

    if ctx.sync.copy(&download_path, &remote_dest).await {
        ctx.store.mark_uploaded(id).await?;
        Ok(LinkOutcome::Uploaded)
    } else {
        error!("Upload for {platform}/{filename} to {remote_dest} failed!");
        Ok(LinkOutcome::UploadFailed)
    }
}

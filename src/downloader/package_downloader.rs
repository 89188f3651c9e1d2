use crate::config::ResolvedConfig;
use crate::errors::{AppError, AppResult};
use crate::lake::{bronze_filings_dir, checked_package_path, ensure_package_dir};
use crate::models::FilingRecord;
use crate::ui;
use crate::utils::{format_duration, mb_from_bytes, round_two_decimals};
use futures::stream::{self, StreamExt};
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use std::pin::pin;
use std::time::Instant;
use tokio::fs;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

/// Counts reported by [`download_report_packages`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    /// Packages written to the bronze layer
    pub downloaded: usize,
    /// Rows without a `package_url`
    pub skipped: usize,
    /// Rows whose request or write failed
    pub failed: usize,
}

/// Result of fetching one package.
enum PackageOutcome {
    Written { path: PathBuf, bytes: u64 },
    HttpStatus(StatusCode),
}

/// Downloads the report package of every listed filing into the bronze layer.
///
/// Each package lands in
/// `<root>/bronze/filings/<country>/<identifier>/<lang>/<period_end>/<filing_id>.zip`,
/// replacing any file already there. Missing directories along that chain are created.
///
/// # Behavior
///
/// - **Skip unpublished**: rows without a `package_url` make no request.
/// - **Per-row failures**: a non-200 status, transport error or write error is logged
///   for that row as soon as it happens and the batch moves on. Rows whose fields would
///   not form a path below `bronze/filings` fail without a request.
/// - **Overwrite**: bodies are streamed to `<filing_id>.zip.part` and renamed over the
///   final file once complete.
/// - **Ordering**: with `concurrent_downloads = 1` rows are fetched one after another in
///   table order. Higher values overlap requests; the resulting layout is the same.
///
/// # Errors
///
/// Returns `IoError` when `<root>/bronze/filings` does not exist (run
/// [`create_directory_tree`](crate::lake::create_directory_tree) first). Row failures
/// are only counted in the returned [`DownloadSummary`].
pub async fn download_report_packages(
    client: &reqwest::Client,
    root: &Path,
    filings: &[FilingRecord],
    config: &ResolvedConfig,
) -> AppResult<DownloadSummary> {
    let filings_dir = bronze_filings_dir(root);
    if !filings_dir.is_dir() {
        return Err(AppError::IoError(format!(
            "Bronze layer not found at {}, bootstrap the data lake first",
            filings_dir.display()
        )));
    }

    let to_download: Vec<(&FilingRecord, &str)> = filings
        .iter()
        .filter_map(|record| record.package_url.as_deref().map(|url| (record, url)))
        .collect();

    let mut summary = DownloadSummary {
        skipped: filings.len() - to_download.len(),
        ..DownloadSummary::default()
    };

    if to_download.is_empty() {
        info!(
            skipped = summary.skipped,
            "No report packages to download"
        );
        return Ok(summary);
    }

    let pb = ui::create_progress_bar(to_download.len() as u64)?;
    info!(
        total = to_download.len(),
        skipped = summary.skipped,
        concurrency = config.concurrent_downloads,
        "Starting package download"
    );

    let start = Instant::now();
    let mut outcomes = pin!(stream::iter(to_download.iter())
        .map(|&(record, package_url)| {
            pb.set_message(format!("{}.zip", record.filing_id));
            async move {
                let outcome = download_package(client, config, root, record, package_url).await;
                (record, package_url, outcome)
            }
        })
        .buffered(config.concurrent_downloads.max(1)));

    // Each row is reported as soon as its download settles, in table order.
    let mut total_bytes = 0u64;
    while let Some((record, package_url, outcome)) = outcomes.next().await {
        pb.inc(1);
        match outcome {
            Ok(PackageOutcome::Written { path, bytes }) => {
                summary.downloaded += 1;
                total_bytes += bytes;
                debug!(
                    filing_id = %record.filing_id,
                    path = %path.display(),
                    bytes = bytes,
                    "Report package written"
                );
            }
            Ok(PackageOutcome::HttpStatus(status)) => {
                summary.failed += 1;
                error!(
                    filing_id = %record.filing_id,
                    package_url = package_url,
                    status = status.as_u16(),
                    "Report package request failed"
                );
            }
            Err(e) => {
                summary.failed += 1;
                error!(
                    filing_id = %record.filing_id,
                    package_url = package_url,
                    error = %e,
                    "Failed to download report package"
                );
            }
        }
    }

    pb.finish_with_message(format!(
        "Downloaded {} package(s), {} failed",
        summary.downloaded, summary.failed
    ));

    info!(
        downloaded = summary.downloaded,
        skipped = summary.skipped,
        failed = summary.failed,
        elapsed = format_duration(start.elapsed()),
        size_mb = round_two_decimals(mb_from_bytes(total_bytes)),
        "Package download completed"
    );

    Ok(summary)
}

/// Fetches one package and writes it below the bronze layer.
async fn download_package(
    client: &reqwest::Client,
    config: &ResolvedConfig,
    root: &Path,
    record: &FilingRecord,
    package_url: &str,
) -> AppResult<PackageOutcome> {
    let file_path = checked_package_path(root, record)?;
    let url = config.package_download_url(package_url);
    let mut response = client.get(&url).send().await.map_err(|e| {
        AppError::NetworkError(format!("Failed to download {}: {e}", record.filing_id))
    })?;

    let status = response.status();
    if status != StatusCode::OK {
        return Ok(PackageOutcome::HttpStatus(status));
    }

    ensure_package_dir(root, record)?;
    let tmp_path = file_path.with_extension("zip.part");

    let written = write_body(&mut response, &tmp_path).await;
    let bytes = match written {
        Ok(bytes) => bytes,
        Err(e) => {
            if let Err(remove_err) = fs::remove_file(&tmp_path).await {
                warn!(
                    file_path = %tmp_path.display(),
                    error = %remove_err,
                    "Failed to remove partial package file"
                );
            }
            return Err(e);
        }
    };

    fs::rename(&tmp_path, &file_path).await.map_err(|e| {
        AppError::IoError(format!(
            "Failed to rename temp file {} to {}: {e}",
            tmp_path.display(),
            file_path.display()
        ))
    })?;

    Ok(PackageOutcome::Written {
        path: file_path,
        bytes,
    })
}

async fn write_body(response: &mut reqwest::Response, tmp_path: &Path) -> AppResult<u64> {
    let mut file = File::create(tmp_path).await.map_err(|e| {
        AppError::IoError(format!(
            "Failed to create temp file {}: {e}",
            tmp_path.display()
        ))
    })?;

    let mut bytes = 0u64;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await.map_err(|e| {
            AppError::IoError(format!(
                "Failed to write to temp file {}: {e}",
                tmp_path.display()
            ))
        })?;
        bytes += chunk.len() as u64;
    }

    file.flush().await?;
    Ok(bytes)
}

//! Download of report packages into the bronze layer.
//!
//! The main entry point is [`download_report_packages`], which consumes the table produced
//! by [`list_filings`](crate::lister::list_filings).

mod package_downloader;

// Re-export public API
pub use package_downloader::{download_report_packages, DownloadSummary};

//! esef-lake library
//!
//! This crate provides the core functionality for the `esef-lake` binary.
//! Keep the crate root minimal: implementation and tests live in their modules.
//!
//! ## Overview
//!
//! The library builds a local "bronze layer" of ESEF report packages from the public
//! XBRL filings API (`filings.xbrl.org`):
//!
//! - [`lister`] - Walks the paginated filings listing of a country into a sorted table
//! - [`downloader`] - Downloads the report package of each listed filing
//! - [`lake`] - Data-lake folders and the paths derived from a filing
//! - [`table`] - Polars/Parquet export of the listing table
//! - [`cli`] - Command-line interface orchestrating listing and download
//! - [`config`] - Pipeline defaults and the TOML configuration file
//! - [`models`] - Listing rows and the API response schema
//! - [`errors`] - Error types used throughout the application
//!
//! ## Example Usage
//!
//! ```no_run
//! use esef_lake::{config::ResolvedConfig, downloader, lake, lister, errors::AppResult};
//!
//! # async fn example() -> AppResult<()> {
//! let config = ResolvedConfig::default();
//! let client = config.http_client()?;
//!
//! // A non-200 answer on the first page yields `None`
//! if let Some(filings) = lister::list_filings(&client, &config, "FI").await? {
//!     lake::create_directory_tree(&config.data_lake_root)?;
//!     downloader::download_report_packages(&client, &config.data_lake_root, &filings, &config)
//!         .await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod downloader;
pub mod errors;
pub mod lake;
pub mod lister;
pub mod models;
pub mod table;
pub mod ui;
pub mod utils;

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_PACKAGE_HOST, DEFAULT_PAGE_SIZE, FILINGS_ENDPOINT,
};
use crate::errors::{AppError, AppResult};
use crate::models::CountryCode;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolved configuration with all values filled in (no Options).
///
/// This struct represents the pipeline defaults and can be deserialized by the TOML
/// loader. All fields have concrete values, making it safe to access directly without unwrapping.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolvedConfig {
    /// Root directory of the data lake (holds `bronze/` and `silver/`)
    pub data_lake_root: PathBuf,
    /// Base URL of the filings listing API
    pub api_base_url: String,
    /// Host prepended to each relative `package_url`
    pub package_host: String,
    /// Records requested per listing page
    pub page_size: usize,

    // Downloads
    /// Number of packages fetched at the same time. 1 keeps table order strictly.
    pub concurrent_downloads: usize,
    /// Per-request timeout in seconds. 0 disables the timeout.
    pub request_timeout_secs: u64,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            data_lake_root: PathBuf::from("data"),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            package_host: DEFAULT_PACKAGE_HOST.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            concurrent_downloads: 1,
            request_timeout_secs: 0,
        }
    }
}

impl ResolvedConfig {
    /// Builds the first listing URL for a country.
    ///
    /// ```
    /// use esef_lake::config::ResolvedConfig;
    ///
    /// let url = ResolvedConfig::default().listing_url("FI");
    /// assert_eq!(
    ///     url,
    ///     "https://filings.xbrl.org/api/filings?include=entity&page[size]=200&filter[country]=FI"
    /// );
    /// ```
    pub fn listing_url(&self, country: &str) -> String {
        format!(
            "{}{}&page[size]={}&filter[country]={}",
            self.api_base_url.trim_end_matches('/'),
            FILINGS_ENDPOINT,
            self.page_size,
            country
        )
    }

    /// Absolute download URL of a package: the package host followed by the relative path.
    pub fn package_download_url(&self, package_url: &str) -> String {
        format!("{}{}", self.package_host.trim_end_matches('/'), package_url)
    }

    /// Builds the HTTP client shared by the lister and the downloader.
    pub fn http_client(&self) -> AppResult<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if self.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(self.request_timeout_secs));
        }
        Ok(builder.build()?)
    }

    fn validate(&self) -> AppResult<()> {
        if self.page_size == 0 {
            return Err(AppError::InvalidInput(
                "Page size must be greater than 0".into(),
            ));
        }
        if self.concurrent_downloads == 0 {
            return Err(AppError::InvalidInput(
                "Concurrent downloads must be greater than 0".into(),
            ));
        }
        url::Url::parse(&self.api_base_url)?;
        url::Url::parse(&self.package_host)?;
        Ok(())
    }
}

/// Configuration that can be loaded from a TOML file.
///
/// Deserializes the required `country` and optional run settings, with the pipeline
/// configuration flattened alongside. Unknown keys are rejected to catch typos.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolvedConfigFile {
    /// ISO-2 country code to list and download
    pub country: String,
    /// Where to export the listing table as Parquet, if anywhere
    #[serde(default)]
    pub table: Option<PathBuf>,
    /// Whether to download packages after listing (defaults to `true`)
    #[serde(default = "default_download")]
    pub download: bool,
    /// Flattened resolved configuration with pipeline defaults
    #[serde(flatten)]
    pub resolved: ResolvedConfig,
}

impl ResolvedConfigFile {
    /// Loads and validates configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the TOML is malformed, `country` is missing or not an
    /// ISO-2 code, unknown keys are present, or `page_size`/`concurrent_downloads` are 0.
    /// Returns `UrlError` if either host is not a valid URL.
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path)?;
        let config: ResolvedConfigFile = toml::from_str(&contents)
            .map_err(|e| AppError::InvalidInput(format!("Failed to parse config: {e}")))?;

        CountryCode::try_from(config.country.as_str())?;
        config.resolved.validate()?;

        Ok(config)
    }

    pub fn country_code(&self) -> AppResult<CountryCode> {
        CountryCode::try_from(self.country.as_str())
    }
}

fn default_download() -> bool {
    true
}

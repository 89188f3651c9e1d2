// Filings API
pub const DEFAULT_API_BASE_URL: &str = "https://filings.xbrl.org";
pub const DEFAULT_PACKAGE_HOST: &str = "https://filings.xbrl.org";
pub const FILINGS_ENDPOINT: &str = "/api/filings?include=entity";
pub const DEFAULT_PAGE_SIZE: usize = 200;

// Data lake layout
pub const BRONZE_DIR: &str = "bronze";
pub const FILINGS_DIR: &str = "filings";
pub const SILVER_DIR: &str = "silver";
pub const PACKAGE_EXTENSION: &str = "zip";

// Input validation
pub const COUNTRY_REGEX_PATTERN: &str = r"^[A-Za-z]{2}$";
pub const COUNTRY_HELP_TEXT: &str = "ISO-2 country code of the filer (e.g. FI, DK, GB)";

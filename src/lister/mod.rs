//! Listing of filings from the XBRL filings API.
//!
//! [`list_filings`] walks the paginated listing for one country and returns a sorted
//! table of [`FilingRecord`](crate::models::FilingRecord) rows.

mod extract;
mod page_fetcher;

// Re-export public API
pub use extract::{extract_filing_data, extract_identifier, extract_lang, sort_filings};
pub use page_fetcher::list_filings;

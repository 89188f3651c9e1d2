//! Listing table export: FilingRecords as a Polars `DataFrame` and as Parquet.

use crate::errors::{AppError, AppResult};
use crate::models::FilingRecord;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use tracing::info;

/// Column order of the exported table.
pub const FILING_COLUMNS: [&str; 9] = [
    "country",
    "identifier",
    "entity_id",
    "lang",
    "period_end",
    "filing_id",
    "package_url",
    "json_url",
    "processed",
];

/// Converts the listing table into a `DataFrame` with one string column per field.
///
/// `package_url` and `processed` are nullable; every other column is always filled.
pub fn filings_to_dataframe(records: &[FilingRecord]) -> AppResult<DataFrame> {
    let len = records.len();
    let mut countries = Vec::with_capacity(len);
    let mut identifiers = Vec::with_capacity(len);
    let mut entity_ids = Vec::with_capacity(len);
    let mut langs = Vec::with_capacity(len);
    let mut period_ends = Vec::with_capacity(len);
    let mut filing_ids = Vec::with_capacity(len);
    let mut package_urls = Vec::with_capacity(len);
    let mut json_urls = Vec::with_capacity(len);
    let mut processed = Vec::with_capacity(len);

    for record in records {
        countries.push(record.country.as_str());
        identifiers.push(record.identifier.as_str());
        entity_ids.push(record.entity_id.as_str());
        langs.push(record.lang.as_str());
        period_ends.push(record.period_end.as_str());
        filing_ids.push(record.filing_id.as_str());
        package_urls.push(record.package_url.as_deref());
        json_urls.push(record.json_url.as_str());
        processed.push(record.processed.as_deref());
    }

    DataFrame::new(vec![
        Series::new(FILING_COLUMNS[0], countries),
        Series::new(FILING_COLUMNS[1], identifiers),
        Series::new(FILING_COLUMNS[2], entity_ids),
        Series::new(FILING_COLUMNS[3], langs),
        Series::new(FILING_COLUMNS[4], period_ends),
        Series::new(FILING_COLUMNS[5], filing_ids),
        Series::new(FILING_COLUMNS[6], package_urls),
        Series::new(FILING_COLUMNS[7], json_urls),
        Series::new(FILING_COLUMNS[8], processed),
    ])
    .map_err(|e| AppError::TableError(format!("Failed to create DataFrame: {e}")))
}

/// Writes the listing table to a Parquet file, creating the parent directory if needed.
pub fn write_filings_parquet(path: &Path, records: &[FilingRecord]) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::IoError(format!(
                "Failed to create directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    let mut df = filings_to_dataframe(records)?;
    let mut file = File::create(path).map_err(|e| {
        AppError::IoError(format!(
            "Failed to create Parquet file {}: {e}",
            path.display()
        ))
    })?;

    ParquetWriter::new(&mut file)
        .finish(&mut df)
        .map_err(|e| AppError::TableError(format!("Failed to write Parquet file: {e}")))?;

    info!(
        path = %path.display(),
        rows = records.len(),
        "Listing table written"
    );
    Ok(())
}

/// Reads a listing table previously written by [`write_filings_parquet`], keeping row order.
///
/// # Errors
///
/// Returns `TableError` when a column is missing, is not a string column, or a required
/// (non-nullable) cell is null.
pub fn read_filings_parquet(path: &Path) -> AppResult<Vec<FilingRecord>> {
    let file = File::open(path).map_err(|e| {
        AppError::IoError(format!("Failed to open Parquet file {}: {e}", path.display()))
    })?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| AppError::TableError(format!("Failed to read Parquet file: {e}")))?;

    let columns = FILING_COLUMNS
        .iter()
        .map(|name| string_column(&df, name))
        .collect::<AppResult<Vec<_>>>()?;

    (0..df.height())
        .map(|row| {
            let required = |col: usize| {
                columns[col][row].clone().ok_or_else(|| {
                    AppError::TableError(format!(
                        "Null value in required column '{}' at row {row}",
                        FILING_COLUMNS[col]
                    ))
                })
            };

            Ok(FilingRecord {
                country: required(0)?,
                identifier: required(1)?,
                entity_id: required(2)?,
                lang: required(3)?,
                period_end: required(4)?,
                filing_id: required(5)?,
                package_url: columns[6][row].clone(),
                json_url: required(7)?,
                processed: columns[8][row].clone(),
            })
        })
        .collect()
}

fn string_column(df: &DataFrame, name: &str) -> AppResult<Vec<Option<String>>> {
    let series = df
        .column(name)
        .map_err(|e| AppError::TableError(format!("Missing column '{name}': {e}")))?;
    let values = series
        .str()
        .map_err(|e| AppError::TableError(format!("Column '{name}' is not a string: {e}")))?;
    Ok(values
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

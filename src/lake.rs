//! Data-lake layout: the bronze/silver directory tree and the paths derived from a filing.

use crate::constants::{BRONZE_DIR, FILINGS_DIR, PACKAGE_EXTENSION, SILVER_DIR};
use crate::errors::{AppError, AppResult};
use crate::models::FilingRecord;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// `<root>/bronze/filings`, the parent of every country folder.
pub fn bronze_filings_dir(root: &Path) -> PathBuf {
    root.join(BRONZE_DIR).join(FILINGS_DIR)
}

/// `<root>/silver`
pub fn silver_dir(root: &Path) -> PathBuf {
    root.join(SILVER_DIR)
}

/// Directory holding the package of a filing:
/// `<root>/bronze/filings/<country>/<identifier>/<lang>/<period_end>`.
pub fn package_dir(root: &Path, record: &FilingRecord) -> PathBuf {
    bronze_filings_dir(root)
        .join(&record.country)
        .join(&record.identifier)
        .join(&record.lang)
        .join(&record.period_end)
}

/// Final location of a filing's package: `package_dir/<filing_id>.zip`.
pub fn package_path(root: &Path, record: &FilingRecord) -> PathBuf {
    package_dir(root, record).join(format!("{}.{PACKAGE_EXTENSION}", record.filing_id))
}

/// Same as [`package_path`], but refuses rows whose fields would not stay a single
/// folder or file name below `bronze/filings` (empty, absolute, `..`, or containing `/`).
pub fn checked_package_path(root: &Path, record: &FilingRecord) -> AppResult<PathBuf> {
    for (field, value) in [
        ("country", &record.country),
        ("identifier", &record.identifier),
        ("lang", &record.lang),
        ("period_end", &record.period_end),
        ("filing_id", &record.filing_id),
    ] {
        let mut components = Path::new(value).components();
        let single_name = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_name || value.contains(['/', '\\']) {
            return Err(AppError::InvalidInput(format!(
                "Filing {} has unusable {field} '{value}' for a package path",
                record.filing_id
            )));
        }
    }
    Ok(package_path(root, record))
}

/// Creates `bronze/`, `bronze/filings/` and `silver/` under an existing data-lake root.
///
/// The root itself is never created: when it is missing a warning is logged and nothing
/// happens. Existing directories are left alone, so the call is idempotent.
///
/// Returns `true` when the tree is in place afterwards.
pub fn create_directory_tree(root: &Path) -> AppResult<bool> {
    if !root.exists() {
        warn!(root = %root.display(), "Specified data lake folder does not exist");
        return Ok(false);
    }

    let candidates = [
        root.join(BRONZE_DIR),
        bronze_filings_dir(root),
        silver_dir(root),
    ];

    for candidate in &candidates {
        if !candidate.exists() {
            fs::create_dir(candidate).map_err(|e| {
                AppError::IoError(format!(
                    "Failed to create directory {}: {e}",
                    candidate.display()
                ))
            })?;
            debug!(dir = %candidate.display(), "Created data lake directory");
        }
    }

    Ok(true)
}

/// Creates the `<country>/<identifier>/<lang>/<period_end>` chain below `bronze/filings`,
/// one component at a time.
///
/// Components that already exist are kept. `bronze/filings` itself must exist.
pub fn ensure_package_dir(root: &Path, record: &FilingRecord) -> AppResult<PathBuf> {
    let mut dir = bronze_filings_dir(root);
    for component in [
        &record.country,
        &record.identifier,
        &record.lang,
        &record.period_end,
    ] {
        dir.push(component);
        if !dir.exists() {
            fs::create_dir(&dir).map_err(|e| {
                AppError::IoError(format!("Failed to create directory {}: {e}", dir.display()))
            })?;
        }
    }
    Ok(dir)
}

/// Lists every downloaded package below `bronze/filings`, sorted by path.
pub fn find_packages(root: &Path) -> AppResult<Vec<PathBuf>> {
    let filings_dir = bronze_filings_dir(root);
    if !filings_dir.exists() {
        return Ok(Vec::new());
    }

    let mut packages = Vec::new();
    for entry in WalkDir::new(&filings_dir).follow_links(false) {
        let entry = entry.map_err(|e| {
            AppError::IoError(format!(
                "Failed to walk directory {}: {e}",
                filings_dir.display()
            ))
        })?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path.extension().and_then(|s| s.to_str()) == Some(PACKAGE_EXTENSION)
        {
            packages.push(path.to_path_buf());
        }
    }

    packages.sort();
    Ok(packages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record() -> FilingRecord {
        FilingRecord {
            country: "FI".to_string(),
            identifier: "743700EPLUWXE25HGM03".to_string(),
            entity_id: "743700EPLUWXE25HGM03".to_string(),
            lang: "fi".to_string(),
            period_end: "2021-12-31".to_string(),
            filing_id: "2541".to_string(),
            package_url: Some("/743700EPLUWXE25HGM03/2021-12-31/ESEF/FI/0/pkg.zip".to_string()),
            json_url: "/743700EPLUWXE25HGM03/2021-12-31/ESEF/FI/0/report-fi.json".to_string(),
            processed: Some("2022-03-01 10:00:00".to_string()),
        }
    }

    #[test]
    fn package_path_follows_layout() {
        let path = package_path(Path::new("/lake"), &record());
        assert_eq!(
            path,
            PathBuf::from("/lake/bronze/filings/FI/743700EPLUWXE25HGM03/fi/2021-12-31/2541.zip")
        );
    }

    #[test]
    fn checked_package_path_accepts_api_shaped_rows() {
        let root = Path::new("/lake");
        assert_eq!(
            checked_package_path(root, &record()).unwrap(),
            package_path(root, &record())
        );
    }

    #[test]
    fn checked_package_path_rejects_escaping_fields() {
        let root = Path::new("/lake");

        let absolute = FilingRecord {
            period_end: "/tmp/escaped".to_string(),
            ..record()
        };
        assert!(checked_package_path(root, &absolute).is_err());

        let parent = FilingRecord {
            lang: "..".to_string(),
            ..record()
        };
        assert!(checked_package_path(root, &parent).is_err());

        let nested = FilingRecord {
            identifier: "a/b".to_string(),
            ..record()
        };
        assert!(checked_package_path(root, &nested).is_err());

        let file_name = FilingRecord {
            filing_id: "../1".to_string(),
            ..record()
        };
        assert!(checked_package_path(root, &file_name).is_err());

        let empty = FilingRecord {
            lang: String::new(),
            ..record()
        };
        assert!(checked_package_path(root, &empty).is_err());
    }

    #[test]
    fn create_directory_tree_missing_root_is_noop() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("absent");

        assert!(!create_directory_tree(&root).unwrap());
        assert!(!root.exists());
    }

    #[test]
    fn create_directory_tree_is_idempotent() {
        let tmp = TempDir::new().unwrap();

        assert!(create_directory_tree(tmp.path()).unwrap());
        assert!(create_directory_tree(tmp.path()).unwrap());
        assert!(bronze_filings_dir(tmp.path()).is_dir());
        assert!(silver_dir(tmp.path()).is_dir());
    }

    #[test]
    fn ensure_package_dir_requires_bootstrapped_tree() {
        let tmp = TempDir::new().unwrap();
        assert!(ensure_package_dir(tmp.path(), &record()).is_err());

        create_directory_tree(tmp.path()).unwrap();
        let dir = ensure_package_dir(tmp.path(), &record()).unwrap();
        assert_eq!(dir, package_dir(tmp.path(), &record()));
        assert!(dir.is_dir());

        // Second call finds every component already present
        assert!(ensure_package_dir(tmp.path(), &record()).is_ok());
    }

    #[test]
    fn find_packages_only_returns_zip_files() {
        let tmp = TempDir::new().unwrap();
        create_directory_tree(tmp.path()).unwrap();
        let dir = ensure_package_dir(tmp.path(), &record()).unwrap();
        fs::write(dir.join("2541.zip"), b"PK").unwrap();
        fs::write(dir.join("2541.zip.part"), b"PK").unwrap();

        let packages = find_packages(tmp.path()).unwrap();
        assert_eq!(packages, vec![dir.join("2541.zip")]);
    }

    #[test]
    fn find_packages_without_tree_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(find_packages(tmp.path()).unwrap().is_empty());
    }
}

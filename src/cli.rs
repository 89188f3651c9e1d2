use crate::config::{ResolvedConfig, ResolvedConfigFile};
use crate::constants::COUNTRY_HELP_TEXT;
use crate::downloader::download_report_packages;
use crate::errors::{AppError, AppResult};
use crate::lake::{create_directory_tree, find_packages};
use crate::lister::list_filings;
use crate::models::{CountryCode, FilingRecord};
use crate::table::{read_filings_parquet, write_filings_parquet};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// CLI metadata constants
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
const APP_ABOUT: &str = env!("CARGO_PKG_DESCRIPTION");

fn root_arg() -> Arg<'static> {
    Arg::new("root")
        .short('r')
        .long("root")
        .help("Root directory of the data lake")
        .default_value("data")
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Set)
}

fn country_arg() -> Arg<'static> {
    Arg::new("country")
        .short('c')
        .long("country")
        .help(COUNTRY_HELP_TEXT)
        .required(true)
        .value_parser(clap::value_parser!(String))
        .action(ArgAction::Set)
}

pub fn build_command() -> Command<'static> {
    Command::new("esef-lake")
        .version(APP_VERSION)
        .author(APP_AUTHOR)
        .about(APP_ABOUT)
        .subcommand(
            Command::new("init")
                .about("Create the bronze/filings and silver folders under an existing root")
                .arg(root_arg()),
        )
        .subcommand(
            Command::new("list")
                .about("List the filings of a country, sorted by period end")
                .arg(country_arg())
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Write the listing table to this Parquet file")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("download")
                .about("List the filings of a country and download their report packages")
                .after_help("Example:\n  esef-lake download -c FI -r data\n  esef-lake download -c FI -r data -t data/silver/fi.parquet -j 4")
                .arg(country_arg())
                .arg(root_arg())
                .arg(
                    Arg::new("table")
                        .short('t')
                        .long("table")
                        .help("Read the listing from this Parquet file instead of the API")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("jobs")
                        .short('j')
                        .long("jobs")
                        .help("Packages downloaded at the same time")
                        .value_parser(clap::value_parser!(usize))
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("inventory")
                .about("Show the report packages already in the bronze layer")
                .arg(root_arg()),
        )
        .subcommand(
            Command::new("toml")
                .about("Run using a TOML configuration file")
                .arg(
                    Arg::new("config")
                        .help("Path to the TOML config file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
}

/// Parses command-line arguments and runs the selected subcommand.
///
/// - `init`: bootstrap the data-lake folders
/// - `list`: list a country's filings, optionally exporting the table
/// - `download`: bootstrap, list (or read an exported table), then download packages
/// - `inventory`: report the packages already downloaded
/// - `toml`: list and download as described by a TOML file
///
/// A listing that answers with a non-200 status is logged and ends the command without
/// downloading anything; it is not reported as an error.
pub async fn cli() -> AppResult<()> {
    let cmd = build_command();
    let mut cmd_for_help = cmd.clone();
    let matches = cmd.get_matches();

    match matches.subcommand() {
        Some(("init", sub)) => {
            create_directory_tree(required_path(sub, "root")?)?;
        }
        Some(("list", sub)) => {
            let country = country_from(sub)?;
            let config = ResolvedConfig::default();
            let output = sub.get_one::<PathBuf>("output").map(PathBuf::as_path);
            run_listing(&config, &country, output).await?;
        }
        Some(("download", sub)) => {
            let country = country_from(sub)?;
            let mut config = ResolvedConfig {
                data_lake_root: required_path(sub, "root")?.to_path_buf(),
                ..ResolvedConfig::default()
            };
            if let Some(&jobs) = sub.get_one::<usize>("jobs") {
                if jobs == 0 {
                    return Err(AppError::InvalidInput(
                        "--jobs must be greater than 0".into(),
                    ));
                }
                config.concurrent_downloads = jobs;
            }
            let table = sub.get_one::<PathBuf>("table").map(PathBuf::as_path);
            run_workflow(&config, &country, table, None, true).await?;
        }
        Some(("inventory", sub)) => {
            print_inventory(required_path(sub, "root")?)?;
        }
        Some(("toml", sub)) => {
            let config_path = sub
                .get_one::<PathBuf>("config")
                .expect("config is required");

            let file_config = ResolvedConfigFile::from_toml_file(config_path)?;
            let country = file_config.country_code()?;
            run_workflow(
                &file_config.resolved,
                &country,
                None,
                file_config.table.as_deref(),
                file_config.download,
            )
            .await?;
        }
        _ => {
            cmd_for_help
                .print_help()
                .map_err(|e| AppError::IoError(format!("Failed to print help: {e}")))?;
        }
    }

    Ok(())
}

fn country_from(sub: &ArgMatches) -> AppResult<CountryCode> {
    let raw = sub
        .get_one::<String>("country")
        .expect("country is required");
    CountryCode::try_from(raw.as_str())
}

fn required_path<'a>(sub: &'a ArgMatches, name: &str) -> AppResult<&'a Path> {
    sub.get_one::<PathBuf>(name)
        .map(PathBuf::as_path)
        .ok_or_else(|| AppError::InvalidInput(format!("Missing --{name}")))
}

/// Lists a country's filings and exports the table when `output` is given.
///
/// Returns `None` when the listing request was rejected.
async fn run_listing(
    config: &ResolvedConfig,
    country: &CountryCode,
    output: Option<&Path>,
) -> AppResult<Option<Vec<FilingRecord>>> {
    let client = config.http_client()?;
    let Some(filings) = list_filings(&client, config, country.as_str()).await? else {
        return Ok(None);
    };

    print_listing_info(country, &filings);
    if let Some(path) = output {
        write_filings_parquet(path, &filings)?;
    }

    Ok(Some(filings))
}

async fn run_workflow(
    config: &ResolvedConfig,
    country: &CountryCode,
    table: Option<&Path>,
    export: Option<&Path>,
    should_download: bool,
) -> AppResult<()> {
    let root = config.data_lake_root.as_path();

    let filings = match table {
        Some(path) => {
            let filings = read_filings_parquet(path)?;
            info!(
                path = %path.display(),
                filings = filings.len(),
                "Listing table loaded"
            );
            filings
        }
        None => match run_listing(config, country, export).await? {
            Some(filings) => filings,
            None => {
                warn!(country = %country, "No listing available, nothing to download");
                return Ok(());
            }
        },
    };

    if !should_download {
        info!("Download disabled, stopping after listing");
        return Ok(());
    }

    if !create_directory_tree(root)? {
        return Err(AppError::InvalidInput(format!(
            "Data lake root {} does not exist",
            root.display()
        )));
    }

    let client = config.http_client()?;
    let summary = download_report_packages(&client, root, &filings, config).await?;

    info!(
        country = %country,
        downloaded = summary.downloaded,
        skipped = summary.skipped,
        failed = summary.failed,
        "All operations completed"
    );

    Ok(())
}

fn print_listing_info(country: &CountryCode, filings: &[FilingRecord]) {
    let with_package = filings.iter().filter(|f| f.package_url.is_some()).count();
    let first = filings.first().map_or("none", |f| f.period_end.as_str());
    let last = filings.last().map_or("none", |f| f.period_end.as_str());
    info!(
        country = %country,
        filings = filings.len(),
        with_package = with_package,
        first_period = first,
        last_period = last,
        "Listing summary"
    );
}

fn print_inventory(root: &Path) -> AppResult<()> {
    let packages = find_packages(root)?;
    for path in &packages {
        info!(package = %path.display(), "Report package");
    }
    info!(root = %root.display(), packages = packages.len(), "Inventory completed");
    Ok(())
}

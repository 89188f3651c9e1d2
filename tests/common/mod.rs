//! Common test utilities for integration tests

use esef_lake::config::ResolvedConfig;
use esef_lake::models::FilingRecord;
use serde_json::{json, Value};
use std::io::{self, Cursor, Write};
use std::sync::{Arc, Mutex};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// In-memory sink for formatted tracing output.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

#[allow(dead_code)]
impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Routes this crate's events on the current thread into a buffer until the guard is dropped.
#[allow(dead_code)]
pub fn capture_logs() -> (LogBuffer, DefaultGuard) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_env_filter(EnvFilter::new("esef_lake=debug"))
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}

/// Pipeline config pointing both the listing API and the package host at a mock server.
#[allow(dead_code)]
pub fn config_for(base_url: &str) -> ResolvedConfig {
    ResolvedConfig {
        api_base_url: base_url.to_string(),
        package_host: base_url.to_string(),
        ..ResolvedConfig::default()
    }
}

/// One filing object as served by `GET /api/filings`.
#[allow(dead_code)]
pub fn filing_json(
    id: &str,
    period_end: &str,
    processed: &str,
    json_url: Option<&str>,
    package_url: Option<&str>,
) -> Value {
    json!({
        "type": "filing",
        "id": id,
        "attributes": {
            "country": "FI",
            "period_end": period_end,
            "processed": processed,
            "json_url": json_url,
            "package_url": package_url,
            "error_count": 0
        },
        "relationships": {
            "entity": { "data": { "type": "entity", "id": format!("entity-{id}") } }
        }
    })
}

/// A listing page body with the given filings and links.
#[allow(dead_code)]
pub fn page_json(data: Vec<Value>, self_link: &str, last: &str, next: Option<&str>) -> String {
    json!({
        "data": data,
        "links": { "self": self_link, "last": last, "next": next }
    })
    .to_string()
}

/// A listing row with a package published under `/packages/<filing_id>.zip`.
#[allow(dead_code)]
pub fn record(filing_id: &str, period_end: &str, with_package: bool) -> FilingRecord {
    FilingRecord {
        country: "FI".to_string(),
        identifier: "743700EPLUWXE25HGM03".to_string(),
        entity_id: "1337".to_string(),
        lang: "fi".to_string(),
        period_end: period_end.to_string(),
        filing_id: filing_id.to_string(),
        package_url: with_package.then(|| format!("/packages/{filing_id}.zip")),
        json_url: format!("/743700EPLUWXE25HGM03/{period_end}/ESEF/FI/0/report-fi.json"),
        processed: Some("2022-03-01 10:00:00".to_string()),
    }
}

/// Builds an in-memory report package with the given files.
#[allow(dead_code)]
pub fn create_test_package(files: &[(&str, &str)]) -> Vec<u8> {
    use zip::write::FileOptions;
    use zip::ZipWriter;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Stored);

    for (name, content) in files {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }

    zip.finish().unwrap().into_inner()
}

//! CLI command implementations
//!
//! Each command loads the configuration, builds the store it names and
//! runs on its own tokio runtime.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::cache::fetch_fresh;
use crate::config::CatalogConfig;
use crate::http_server::{AppState, HttpServer};
use crate::model::{ChapterLayout, Document};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_submission, write_json};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    run_command(Cli::parse_args().command)
}

pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(&config, port),
        Command::Submit { config, input } => submit(&config, input.as_deref()),
        Command::Fetch { config } => fetch(&config),
    }
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))
}

/// Serve the HTTP API until the process is stopped.
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let mut config = CatalogConfig::load(config_path)?;
    if let Some(port) = port {
        config.http = config.http.on_port(port);
    }
    if config.secret().is_none() {
        return Err(CliError::config_error(
            "submit_secret (or SUBMIT_SECRET) is required to serve",
        ));
    }

    let state = Arc::new(AppState::from_config(&config)?);
    let server = HttpServer::new(config.http.clone(), state);
    info!(
        addr = %server.socket_addr(),
        local = config.is_local(),
        path = %config.data_path(),
        branch = %config.branch,
        "starting catalog server"
    );

    runtime()?.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// One-shot write; prints the receipt.
pub fn submit(config_path: &Path, input: Option<&Path>) -> CliResult<()> {
    let config = CatalogConfig::load(config_path)?;
    let body = read_submission(input)?;
    let state = AppState::from_config(&config)?;

    let receipt = runtime()?.block_on(state.pipeline.submit(&body))?;
    write_json(&receipt)
}

/// Summary of the stored document.
#[derive(Debug, Serialize)]
pub struct DocumentSummary {
    pub ok: bool,
    pub path: String,
    pub version: String,
    pub layout: &'static str,
    pub series: usize,
    pub chapters: usize,
    pub announcements: usize,
}

impl DocumentSummary {
    pub fn of(document: &Document, path: String, version: String) -> Self {
        let chapters = document
            .series
            .iter()
            .map(|s| document.chapters_of(&s.slug).len())
            .sum::<usize>();
        let chapters = match &document.chapters {
            // legacy maps may hold sequences for series not listed
            Some(map) => map.values().map(Vec::len).sum(),
            None => chapters,
        };

        Self {
            ok: true,
            path,
            version,
            layout: match document.layout() {
                ChapterLayout::Legacy => "legacy",
                ChapterLayout::Nested => "nested",
            },
            series: document.series.len(),
            chapters,
            announcements: document.announcements.len(),
        }
    }
}

/// Fetch the document and print its summary.
pub fn fetch(config_path: &Path) -> CliResult<()> {
    let config = CatalogConfig::load(config_path)?;
    let store = config.build_store()?;
    let path = config.data_path();

    let (document, revision) =
        runtime()?.block_on(fetch_fresh(store.as_ref(), &config.branch, &path))?;
    write_json(&DocumentSummary::of(&document, path, revision.version.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn local_config(temp_dir: &TempDir) -> std::path::PathBuf {
        fs::write(
            temp_dir.path().join("data.json"),
            json!({"series": [], "announcements": []}).to_string(),
        )
        .unwrap();

        let config_path = temp_dir.path().join("catalogd.json");
        let config = json!({ "local_root": temp_dir.path().to_string_lossy() });
        fs::write(&config_path, config.to_string()).unwrap();
        config_path
    }

    #[test]
    fn test_summary_counts_both_layouts() {
        let nested: Document = serde_json::from_value(json!({
            "series": [{"slug": "a", "chapters": [{"id": "a-001"}, {"id": "a-002"}]}]
        }))
        .unwrap();
        let summary = DocumentSummary::of(&nested, "data.json".into(), "v".into());
        assert_eq!(summary.layout, "nested");
        assert_eq!(summary.chapters, 2);

        let legacy: Document = serde_json::from_value(json!({
            "series": [], "chapters": {"orphan": [{"id": "c1"}]}
        }))
        .unwrap();
        assert_eq!(DocumentSummary::of(&legacy, "d".into(), "v".into()).chapters, 1);
    }

    #[test]
    fn test_submit_in_local_mode() {
        if std::env::var("GH_REPO").is_ok() {
            return;
        }
        let temp_dir = TempDir::new().unwrap();
        let config_path = local_config(&temp_dir);
        let input = temp_dir.path().join("body.json");
        fs::write(
            &input,
            json!({"type": "series", "slug": "a", "mode": "direct", "data": {"title": "A"}}).to_string(),
        )
        .unwrap();

        submit(&config_path, Some(&input)).unwrap();

        let stored = Document::from_slice(&fs::read(temp_dir.path().join("data.json")).unwrap()).unwrap();
        assert_eq!(stored.series[0].slug, "a");
    }

    #[test]
    fn test_serve_requires_secret() {
        if std::env::var("SUBMIT_SECRET").is_ok() {
            return;
        }
        let temp_dir = TempDir::new().unwrap();
        let config_path = local_config(&temp_dir);
        assert!(serve(&config_path, None).is_err());
    }
}

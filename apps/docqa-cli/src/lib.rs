//! Shared start-up for the docqa binaries.

use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::EnvFilter;

use docqa_core::config::{Config, Settings};
use docqa_text::SearchService;

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    config.settings()
}

/// A service indexed over every readable document under `dir`.
pub fn open_service(settings: &Settings, dir: &Path) -> anyhow::Result<SearchService> {
    let service = SearchService::new(settings);
    if !dir.exists() {
        info!(dir = %dir.display(), "documents directory missing, starting empty");
        return Ok(service);
    }
    let report = service.load_directory(dir)?;
    info!(loaded = report.loaded, skipped = report.skipped, "documents indexed");
    Ok(service)
}

pub fn progress(len: u64, unit: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let template = format!("{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {unit} {{msg}}");
    if let Ok(style) = ProgressStyle::default_bar().template(&template) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

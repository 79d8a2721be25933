//! Locating and loading the built book's configuration and search payload.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use zettel_core::{Config, SearchPayload};

pub fn load_config(config_path: &Path) -> Result<Config> {
    Config::load_or_default(config_path).context("Failed to load configuration")
}

/// Payload path: the `--index` override, else `search.index` under the output dir
pub fn payload_path(config: &Config, index: Option<&Path>) -> PathBuf {
    match index {
        Some(path) => path.to_path_buf(),
        None => config.index_path(),
    }
}

/// Site root: the `--site` override, else `paths.output`
pub fn site_root(config: &Config, site: Option<&Path>) -> PathBuf {
    match site {
        Some(path) => path.to_path_buf(),
        None => config.output_dir(),
    }
}

/// Load the payload, exiting with a hint when it has not been built yet
pub fn load_payload(path: &Path) -> Result<SearchPayload> {
    if !path.exists() {
        eprintln!(
            "❌ Search payload not found at {:?}. Build the book first or pass --index.",
            path
        );
        std::process::exit(1);
    }

    SearchPayload::load(path).with_context(|| format!("Failed to load search payload {:?}", path))
}

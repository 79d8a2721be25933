//! Validate the search payload against the built site and emit diagnostics.

use crate::{agent, book};
use anyhow::{bail, Result};
use std::path::Path;
use zettel_core::DiagnosticSeverity;

/// Run the build-time record checks; fails when any error is found
pub fn check_payload(
    config_path: &Path,
    index: Option<&Path>,
    site: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = book::load_config(config_path)?;
    let index_path = book::payload_path(&config, index);
    let payload = book::load_payload(&index_path)?;

    let root = book::site_root(&config, site);
    let site_root = if root.is_dir() {
        Some(root)
    } else if site.is_some() {
        bail!("Site root {:?} is not a directory", root);
    } else {
        tracing::warn!(
            "Site root {:?} not found; skipping page and anchor checks",
            root
        );
        None
    };

    let diagnostics = payload.validate(site_root.as_deref());
    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == DiagnosticSeverity::Error)
        .count();
    let warnings = diagnostics
        .iter()
        .filter(|d| d.severity == DiagnosticSeverity::Warning)
        .count();

    if json {
        let summary = agent::envelope(
            "check.summary",
            agent::CheckData {
                index: index_path.display().to_string(),
                site: site_root.as_ref().map(|p| p.display().to_string()),
                records: payload.documents.len(),
                errors,
                warnings,
                diagnostics,
            },
        );
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Check complete: {} records, {} errors, {} warnings",
            payload.documents.len(),
            errors,
            warnings
        );
        for diag in &diagnostics {
            let doc = diag
                .doc_ref
                .as_deref()
                .map(|s| format!(" [{}]", s))
                .unwrap_or_default();
            println!("- {:?} {}{}: {}", diag.severity, diag.code, doc, diag.message);
            if let Some(ctx) = &diag.context {
                println!("  context: {}", ctx);
            }
        }
    }

    if errors > 0 {
        bail!("{} validation error(s) in {:?}", errors, index_path);
    }
    Ok(())
}

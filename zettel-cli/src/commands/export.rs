//! Move records between the payload script and plain JSON.

use crate::book;
use anyhow::{bail, Context, Result};
use std::fs;
use std::io::{stdout, BufWriter, Write};
use std::path::Path;
use zettel_core::{IndexedDocument, SearchPayload};

/// Print the payload's records as a pretty JSON array.
pub fn export_records(config_path: &Path, index: Option<&Path>) -> Result<()> {
    let config = book::load_config(config_path)?;
    let payload = book::load_payload(&book::payload_path(&config, index))?;

    let mut writer = BufWriter::new(stdout().lock());
    serde_json::to_writer_pretty(&mut writer, &payload.documents)
        .context("Failed to serialize records")?;
    writeln!(writer)?;
    writer.flush()?;

    tracing::debug!("Exported {} records", payload.documents.len());
    Ok(())
}

/// Write a payload script from a JSON array of records.
///
/// Records are checked before anything is written; a set with duplicate or
/// empty identifiers is refused.
pub fn pack_records(
    config_path: &Path,
    records: &Path,
    style: &str,
    out: Option<&Path>,
) -> Result<()> {
    let config = book::load_config(config_path)?;

    let json = fs::read_to_string(records)
        .with_context(|| format!("Failed to read records {:?}", records))?;
    let documents: Vec<IndexedDocument> = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse records {:?}", records))?;

    let mut payload = SearchPayload::new(documents);
    payload.style = Some(style.to_string());

    let diagnostics = payload.validate(None);
    for diag in diagnostics.iter().filter(|d| !d.is_error()) {
        tracing::warn!("{}: {}", diag.code, diag.message);
    }
    let errors: Vec<_> = diagnostics.iter().filter(|d| d.is_error()).collect();
    if !errors.is_empty() {
        for diag in &errors {
            eprintln!("- {}: {}", diag.code, diag.message);
        }
        bail!("Refusing to write a payload with {} invalid record(s)", errors.len());
    }

    payload
        .build_index()
        .context("Records do not form a valid index")?;

    let out_path = book::payload_path(&config, out);
    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output dir {:?}", parent))?;
        }
    }
    fs::write(&out_path, payload.render())
        .with_context(|| format!("Failed to write payload {:?}", out_path))?;

    tracing::info!(
        "Wrote {} records to {:?}",
        payload.documents.len(),
        out_path
    );
    Ok(())
}

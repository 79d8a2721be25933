//! Dark-theme script: print it, or install it into a built site.

use crate::book;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;
use zettel_core::{inject_script_tag, theme_script, Injection};

pub fn print_theme_script() -> Result<()> {
    print!("{}", theme_script());
    Ok(())
}

/// Write the script into the site and reference it from every HTML page
pub fn install_theme(config_path: &Path, site: Option<&Path>, no_inject: bool) -> Result<()> {
    let config = book::load_config(config_path)?;
    let root = book::site_root(&config, site);
    if !root.is_dir() {
        bail!("Site root {:?} is not a directory", root);
    }

    let script_path = root.join(&config.theme.script);
    if let Some(parent) = script_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    fs::write(&script_path, theme_script())
        .with_context(|| format!("Failed to write theme script {:?}", script_path))?;
    tracing::info!("Wrote theme script to {:?}", script_path);

    if no_inject || !config.theme.inject {
        return Ok(());
    }

    let src = config.theme_script_src();
    let mut inserted = 0;
    let mut present = 0;
    let mut headless = 0;

    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || !is_html(path) {
            continue;
        }

        let relative = path
            .strip_prefix(&root)
            .with_context(|| format!("Page {:?} is outside {:?}", path, root))?;
        let depth = relative.components().count().saturating_sub(1);
        let page_src = format!("{}{}", "../".repeat(depth), src);

        let html =
            fs::read_to_string(path).with_context(|| format!("Failed to read page {:?}", path))?;
        match inject_script_tag(&html, &page_src) {
            Injection::Inserted(page) => {
                fs::write(path, page)
                    .with_context(|| format!("Failed to write page {:?}", path))?;
                tracing::debug!("Injected theme script into {:?}", relative);
                inserted += 1;
            }
            Injection::AlreadyPresent => present += 1,
            Injection::NoHead => {
                tracing::debug!("No <head> in {:?}; left untouched", relative);
                headless += 1;
            }
        }
    }

    if headless > 0 {
        tracing::warn!("{} pages have no <head> and were skipped", headless);
    }
    tracing::info!(
        "Theme script referenced from {} pages ({} newly injected)",
        inserted + present,
        inserted
    );
    Ok(())
}

fn is_html(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm")
    )
}

//! Search command implementation
use crate::{agent, book};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use zettel_core::search::body_excerpt;
use zettel_core::{IndexedDocument, SearchHit, SearchPayload};

/// Bytes of body text kept on each side of the first match
const EXCERPT_RADIUS: usize = 60;

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub limit: Option<usize>,
    pub json: bool,
    pub types: Vec<String>,
    pub index: Option<PathBuf>,
}

/// Build the book's index from its payload and run one query
pub fn search_book(config_path: &Path, query: &str, opts: SearchOptions) -> Result<()> {
    let config = book::load_config(config_path)?;
    let payload = book::load_payload(&book::payload_path(&config, opts.index.as_deref()))?;
    let index = payload
        .build_index()
        .context("Failed to build search index")?;

    let hits = index
        .search(query)
        .with_context(|| format!("Invalid query '{}'", query))?;
    let results = resolve_hits(&payload, &hits, &opts.types);
    let limit = opts.limit.unwrap_or(config.search.limit);
    tracing::debug!(
        "Query '{}' matched {} records ({} after filters)",
        query,
        hits.len(),
        results.len()
    );

    if opts.json {
        let json_results = results
            .iter()
            .take(limit)
            .map(|(hit, doc)| {
                agent::SearchResult::new(
                    hit,
                    doc,
                    body_excerpt(&doc.body, &hit.matches, EXCERPT_RADIUS),
                )
            })
            .collect();

        let payload = agent::envelope(
            "search.results",
            agent::SearchData {
                query: query.to_string(),
                style: payload.style().to_string(),
                limit,
                total: results.len(),
                results: json_results,
            },
        );

        let json = serde_json::to_string_pretty(&payload)?;
        println!("{json}");
        return Ok(());
    }

    if results.is_empty() {
        println!("No results found for '{}'", query);
        return Ok(());
    }

    println!("\n🔍 Found {} results for '{}':\n", results.len(), query);
    let shown = &results[..results.len().min(limit)];
    if payload.style() == "textbook" {
        print_grouped(&payload, shown);
    } else {
        for (hit, doc) in shown {
            print_search_result(hit, doc);
        }
    }

    if results.len() > limit {
        println!("\n  ... and {} more results", results.len() - limit);
    }

    Ok(())
}

/// Pair each hit with its record, dropping records outside the type filter
pub fn resolve_hits<'a>(
    payload: &'a SearchPayload,
    hits: &'a [SearchHit],
    types: &[String],
) -> Vec<(&'a SearchHit, &'a IndexedDocument)> {
    let type_filter: HashSet<String> = types.iter().map(|t| t.to_lowercase()).collect();
    let records = payload.by_ref();

    hits.iter()
        .filter_map(|hit| {
            let doc = *records.get(&hit.doc_ref)?;
            if !type_filter.is_empty() && !type_filter.contains(&doc.doc_type.to_lowercase()) {
                return None;
            }
            Some((hit, doc))
        })
        .collect()
}

fn print_search_result(hit: &SearchHit, doc: &IndexedDocument) {
    // Format:
    // [Definition] Definition 1.2.1 Metric Space
    //   sec-metric.html#def-metric
    //   … a **metric** on a set X is a function …
    //

    println!("[{}] {}", doc.doc_type, doc.display_label());
    println!("  {}", doc.url);
    println!("  {}", body_excerpt(&doc.body, &hit.matches, EXCERPT_RADIUS));
    println!();
}

/// Textbook layout: hits grouped under the page they live on, pages in
/// order of their best hit
fn print_grouped(payload: &SearchPayload, results: &[(&SearchHit, &IndexedDocument)]) {
    let mut pages: Vec<(&str, Vec<(&SearchHit, &IndexedDocument)>)> = Vec::new();
    for &(hit, doc) in results {
        match pages.iter().position(|(page, _)| *page == doc.page()) {
            Some(i) => pages[i].1.push((hit, doc)),
            None => pages.push((doc.page(), vec![(hit, doc)])),
        }
    }

    for (page, group) in pages {
        let heading = payload
            .documents
            .iter()
            .find(|d| d.url == page)
            .map(|d| d.display_label())
            .unwrap_or_else(|| page.to_string());
        println!("{}", heading);
        println!("  {}", page);
        for (hit, doc) in group {
            println!("  - {}  ({})", doc.display_label(), doc.url);
            println!(
                "    {}",
                body_excerpt(&doc.body, &hit.matches, EXCERPT_RADIUS)
            );
        }
        println!();
    }
}

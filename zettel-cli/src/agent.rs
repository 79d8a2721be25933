//! Shared JSON schema helpers for machine-consumable command output.

use serde::Serialize;
use zettel_core::search::MatchData;
use zettel_core::{Diagnostic, IndexedDocument, SearchHit};

pub const SCHEMA_VERSION: &str = "2026-10-zettel-v1";

/// Standard envelope for machine-consumable responses.
#[derive(Serialize)]
pub struct Envelope<T> {
    pub schema_version: &'static str,
    pub kind: &'static str,
    pub data: T,
}

pub fn envelope<T>(kind: &'static str, data: T) -> Envelope<T> {
    Envelope {
        schema_version: SCHEMA_VERSION,
        kind,
        data,
    }
}

#[derive(Serialize)]
pub struct SearchResult {
    pub id: String,
    pub level: u32,
    pub url: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub number: String,
    pub title: String,
    pub label: String,
    pub excerpt: String,
    pub score: f64,
    pub matches: MatchData,
}

impl SearchResult {
    pub fn new(hit: &SearchHit, doc: &IndexedDocument, excerpt: String) -> Self {
        Self {
            id: doc.id.to_string(),
            level: doc.level.get(),
            url: doc.url.clone(),
            doc_type: doc.doc_type.clone(),
            number: doc.number.clone(),
            title: doc.title.clone(),
            label: doc.display_label(),
            excerpt,
            score: hit.score,
            matches: hit.matches.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct SearchData {
    pub query: String,
    pub style: String,
    pub limit: usize,
    pub total: usize,
    pub results: Vec<SearchResult>,
}

#[derive(Serialize)]
pub struct CheckData {
    pub index: String,
    pub site: Option<String>,
    pub records: usize,
    pub errors: usize,
    pub warnings: usize,
    pub diagnostics: Vec<Diagnostic>,
}

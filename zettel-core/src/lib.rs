//! # zettel-core
//!
//! Core library for the zettel search and theme tooling.
//!
//! This crate reads and writes the generated search payload of a PreTeXt
//! book, builds and queries the full-text index over its records, and
//! provides the dark-theme forcing logic together with the script that
//! carries it into the built pages.

pub mod config;
pub mod models;
pub mod payload;
pub mod search;
pub mod theme;

pub use config::Config;
pub use models::{Diagnostic, DiagnosticSeverity};
pub use payload::{IndexSchema, PayloadError, SearchPayload};
pub use search::{IndexBuilder, IndexError, Query, QueryParseError, SearchHit, SearchIndex};
pub use theme::{force_dark, inject_script_tag, theme_script, Injection};
pub use zettel_types::{DocRef, IndexedDocument, Level};

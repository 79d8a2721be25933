//! The generated search payload (`lunr-pretext-search-index.js`).
//!
//! The book build writes a script holding the search style, the ordered
//! record array and one index-build call naming the ref field, the
//! searchable fields and the metadata whitelist. This module reads that
//! script back into typed records, re-emits it in the same layout, and
//! performs the build call through [`IndexBuilder`].

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;
use zettel_types::{DocRef, IndexedDocument};

use crate::models::Diagnostic;
use crate::search::{FieldSpec, IndexBuilder, IndexError, SearchIndex, POSITION_METADATA};

pub const STYLE_VAR: &str = "ptx_lunr_search_style";
pub const DOCS_VAR: &str = "ptx_lunr_docs";
pub const INDEX_VAR: &str = "ptx_lunr_idx";

pub const DEFAULT_STYLE: &str = "textbook";

static STYLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"var\s+ptx_lunr_search_style\s*=\s*"([^"]*)""#).unwrap());
static DOCS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"var\s+ptx_lunr_docs\s*=\s*").unwrap());
static BUILD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"lunr\s*\(\s*function").unwrap());
static REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"this\.ref\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap());
static FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"this\.field\(\s*['"]([^'"]+)['"]\s*(?:,\s*\{\s*boost\s*:\s*([0-9]+(?:\.[0-9]+)?)\s*\}\s*)?\)"#,
    )
    .unwrap()
});
static WHITELIST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"this\.metadataWhitelist\s*=\s*\[([^\]]*)\]").unwrap());
static HTML_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\sid\s*=\s*["']([^"']+)["']"#).unwrap());

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("Failed to read search payload: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("search payload has no `var ptx_lunr_docs = [...]` record array")]
    MissingDocs,

    #[error("Failed to parse document records: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("search payload has no index build call with a ref field")]
    MissingBuildCall,

    #[error("Failed to build search index: {0}")]
    Index(#[from] IndexError),
}

/// Field configuration declared by the build call
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSchema {
    pub ref_field: String,
    pub fields: Vec<FieldSpec>,
    pub metadata_whitelist: Vec<String>,
}

impl Default for IndexSchema {
    fn default() -> Self {
        Self {
            ref_field: "id".to_string(),
            fields: vec![
                FieldSpec {
                    name: "title".to_string(),
                    boost: 1.0,
                },
                FieldSpec {
                    name: "body".to_string(),
                    boost: 1.0,
                },
            ],
            metadata_whitelist: vec![POSITION_METADATA.to_string()],
        }
    }
}

impl IndexSchema {
    /// Builder with this schema registered and no documents yet
    pub fn builder(&self) -> IndexBuilder {
        self.fields.iter().fold(
            IndexBuilder::new()
                .ref_field(&self.ref_field)
                .metadata_whitelist(self.metadata_whitelist.iter().cloned()),
            |builder, spec| builder.field_with_boost(&spec.name, spec.boost),
        )
    }

    fn parse(source: &str) -> Result<Self, PayloadError> {
        if !BUILD_RE.is_match(source) {
            return Err(PayloadError::MissingBuildCall);
        }
        let ref_field = REF_RE
            .captures(source)
            .map(|c| c[1].to_string())
            .ok_or(PayloadError::MissingBuildCall)?;

        let fields = FIELD_RE
            .captures_iter(source)
            .map(|c| FieldSpec {
                name: c[1].to_string(),
                boost: c
                    .get(2)
                    .and_then(|b| b.as_str().parse().ok())
                    .unwrap_or(1.0),
            })
            .collect();

        let metadata_whitelist = WHITELIST_RE
            .captures(source)
            .map(|c| {
                c[1].split(',')
                    .map(|item| item.trim().trim_matches(&['\'', '"'][..]))
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            ref_field,
            fields,
            metadata_whitelist,
        })
    }

    fn render(&self, out: &mut String) {
        out.push_str(&format!("var {INDEX_VAR} = lunr(function () {{\n"));
        out.push_str(&format!("  this.ref('{}')\n", self.ref_field));
        for spec in &self.fields {
            if spec.boost == 1.0 {
                out.push_str(&format!("  this.field('{}')\n", spec.name));
            } else {
                out.push_str(&format!(
                    "  this.field('{}', {{ boost: {} }})\n",
                    spec.name, spec.boost
                ));
            }
        }
        if !self.metadata_whitelist.is_empty() {
            let keys: Vec<String> = self
                .metadata_whitelist
                .iter()
                .map(|k| format!("'{}'", k))
                .collect();
            out.push_str(&format!(
                "  this.metadataWhitelist = [{}]\n",
                keys.join(", ")
            ));
        }
        out.push('\n');
        out.push_str(&format!("  {DOCS_VAR}.forEach(function (doc) {{\n"));
        out.push_str("    this.add(doc)\n");
        out.push_str("  }, this)\n");
        out.push_str("})\n");
    }
}

/// Records plus the build configuration of one generated payload
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPayload {
    pub style: Option<String>,
    pub documents: Vec<IndexedDocument>,
    pub schema: IndexSchema,
}

impl SearchPayload {
    pub fn new(documents: Vec<IndexedDocument>) -> Self {
        Self {
            style: Some(DEFAULT_STYLE.to_string()),
            documents,
            schema: IndexSchema::default(),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PayloadError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        let payload = Self::parse(&source)?;
        tracing::debug!(
            "Loaded {} records from {:?}",
            payload.documents.len(),
            path
        );
        Ok(payload)
    }

    pub fn parse(source: &str) -> Result<Self, PayloadError> {
        let style = STYLE_RE.captures(source).map(|c| c[1].to_string());

        let docs_at = DOCS_RE
            .find(source)
            .ok_or(PayloadError::MissingDocs)?
            .end();
        let documents = serde_json::Deserializer::from_str(&source[docs_at..])
            .into_iter::<Vec<IndexedDocument>>()
            .next()
            .ok_or(PayloadError::MissingDocs)??;

        let schema = IndexSchema::parse(source)?;

        Ok(Self {
            style,
            documents,
            schema,
        })
    }

    /// Search style, falling back to the toolchain default
    pub fn style(&self) -> &str {
        self.style.as_deref().unwrap_or(DEFAULT_STYLE)
    }

    /// Lookup table from reference to record
    pub fn by_ref(&self) -> HashMap<&DocRef, &IndexedDocument> {
        self.documents.iter().map(|d| (&d.id, d)).collect()
    }

    /// Run the one-time index build over the records in order
    pub fn build_index(&self) -> Result<SearchIndex, PayloadError> {
        let mut builder = self.schema.builder();
        builder.add_all(&self.documents)?;
        Ok(builder.build())
    }

    /// Re-emit the payload script in the layout the book build produces
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(style) = &self.style {
            out.push_str(&format!("var {STYLE_VAR} = {};\n", js_string(style)));
        }
        out.push_str(&format!("var {DOCS_VAR} = [\n"));
        let records: Vec<String> = self.documents.iter().map(render_record).collect();
        out.push_str(&records.join(",\n"));
        if !records.is_empty() {
            out.push('\n');
        }
        out.push_str("]\n\n");
        self.schema.render(&mut out);
        out
    }

    /// Check record invariants, and page/anchor existence when a site root is given
    pub fn validate(&self, site_root: Option<&Path>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut pages = PageCache::default();
        let mut previous_level: Option<u32> = None;

        for doc in &self.documents {
            let id = doc.id.as_str();
            if id.trim().is_empty() {
                diagnostics.push(
                    Diagnostic::error("empty-id", "record has an empty identifier")
                        .with_context(doc.url.clone()),
                );
            } else if !seen.insert(id) {
                diagnostics.push(
                    Diagnostic::error("duplicate-id", format!("identifier '{}' is not unique", id))
                        .for_doc(id),
                );
            }

            let level = doc.level.get();
            if let Some(prev) = previous_level {
                if level > prev.saturating_add(1) {
                    diagnostics.push(
                        Diagnostic::warning(
                            "level-jump",
                            format!("level {} follows level {}", level, prev),
                        )
                        .for_doc(id),
                    );
                }
            }
            previous_level = Some(level);

            if doc.url.trim().is_empty() {
                diagnostics.push(Diagnostic::error("empty-url", "record has no URL").for_doc(id));
                continue;
            }

            let Some(root) = site_root else {
                continue;
            };
            if is_external(&doc.url) {
                continue;
            }

            match pages.anchors(root, doc.page()) {
                None => diagnostics.push(
                    Diagnostic::error("missing-page", format!("page '{}' does not exist", doc.page()))
                        .for_doc(id)
                        .with_context(doc.url.clone()),
                ),
                Some(anchors) => {
                    if let Some(anchor) = doc.anchor() {
                        if !anchors.contains(anchor) {
                            diagnostics.push(
                                Diagnostic::error(
                                    "missing-anchor",
                                    format!("page '{}' has no element with id '{}'", doc.page(), anchor),
                                )
                                .for_doc(id)
                                .with_context(doc.url.clone()),
                            );
                        }
                    }
                }
            }
        }

        diagnostics
    }
}

fn is_external(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://") || url.starts_with("//")
}

/// Element ids per page, read lazily from the built site
#[derive(Default)]
struct PageCache {
    pages: HashMap<String, Option<HashSet<String>>>,
}

impl PageCache {
    fn anchors(&mut self, root: &Path, page: &str) -> Option<&HashSet<String>> {
        self.pages
            .entry(page.to_string())
            .or_insert_with(|| {
                let path = root.join(page.trim_start_matches('/'));
                let html = fs::read_to_string(&path).ok()?;
                Some(
                    HTML_ID_RE
                        .captures_iter(&html)
                        .map(|c| c[1].to_string())
                        .collect(),
                )
            })
            .as_ref()
    }
}

/// JSON string literal with `/` escaped, as the book build writes it
fn js_string(value: &str) -> String {
    // serde_json never emits '/' inside an escape sequence
    serde_json::Value::String(value.to_string())
        .to_string()
        .replace('/', "\\/")
}

fn render_record(doc: &IndexedDocument) -> String {
    let level = doc.level.to_string();
    let fields = [
        ("id", doc.id.as_str()),
        ("level", level.as_str()),
        ("url", doc.url.as_str()),
        ("type", doc.doc_type.as_str()),
        ("number", doc.number.as_str()),
        ("title", doc.title.as_str()),
        ("body", doc.body.as_str()),
    ];
    let lines: Vec<String> = fields
        .iter()
        .map(|(key, value)| format!("  \"{}\": {}", key, js_string(value)))
        .collect();
    format!("{{\n{}\n}}", lines.join(",\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use zettel_types::Level;

    const SAMPLE: &str = r#"var ptx_lunr_search_style = "textbook";
var ptx_lunr_docs = [
{
  "id": "sec-topology-intro",
  "level": "1",
  "url": "sec-topology-intro.html",
  "type": "Section",
  "number": "1.1",
  "title": "Introduction to Topology",
  "body": " Introduction to Topology  open sets union "
},
{
  "id": "def-topological-space",
  "level": "2",
  "url": "sec-topology-intro.html#def-topological-space",
  "type": "Definition",
  "number": "1.1.1",
  "title": "Topological Space.",
  "body": " Topological Space  see https:\/\/example.org "
}
]

var ptx_lunr_idx = lunr(function () {
  this.ref('id')
  this.field('title')
  this.field('body')
  this.metadataWhitelist = ['position']

  ptx_lunr_docs.forEach(function (doc) {
    this.add(doc)
  }, this)
})
"#;

    fn record(id: &str, level: u32, url: &str) -> IndexedDocument {
        IndexedDocument {
            id: DocRef::new(id),
            level: Level::new(level).unwrap(),
            url: url.to_string(),
            doc_type: "Section".into(),
            number: String::new(),
            title: String::new(),
            body: String::new(),
        }
    }

    #[test]
    fn test_parse_sample() {
        let payload = SearchPayload::parse(SAMPLE).unwrap();
        assert_eq!(payload.style(), "textbook");
        assert_eq!(payload.documents.len(), 2);
        assert_eq!(payload.documents[1].level.get(), 2);
        assert_eq!(payload.documents[1].anchor(), Some("def-topological-space"));
        assert!(payload.documents[1].body.contains("https://example.org"));
        assert_eq!(payload.schema, IndexSchema::default());
    }

    #[test]
    fn test_render_reproduces_layout() {
        let payload = SearchPayload::parse(SAMPLE).unwrap();
        assert_eq!(payload.render(), SAMPLE);
    }

    #[test]
    fn test_boosted_fields_round_trip() {
        let mut payload = SearchPayload::new(vec![record("a", 1, "a.html")]);
        payload.schema.fields[0].boost = 10.0;
        let rendered = payload.render();
        assert!(rendered.contains("this.field('title', { boost: 10 })"));
        assert_eq!(SearchPayload::parse(&rendered).unwrap(), payload);
    }

    #[test]
    fn test_missing_parts_are_errors() {
        assert!(matches!(
            SearchPayload::parse("var x = 1;"),
            Err(PayloadError::MissingDocs)
        ));
        assert!(matches!(
            SearchPayload::parse("var ptx_lunr_docs = [{\"id\": 3}]"),
            Err(PayloadError::ParseError(_))
        ));
        assert!(matches!(
            SearchPayload::parse("var ptx_lunr_docs = []\n"),
            Err(PayloadError::MissingBuildCall)
        ));
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        let source = SAMPLE.replace("\"level\": \"2\"", "\"level\": \"0\"");
        assert!(matches!(
            SearchPayload::parse(&source),
            Err(PayloadError::ParseError(_))
        ));
    }

    #[test]
    fn test_build_index_uses_declared_schema() {
        let payload = SearchPayload::parse(SAMPLE).unwrap();
        let index = payload.build_index().unwrap();
        assert_eq!(index.ref_field(), "id");
        assert_eq!(index.field_names(), vec!["title", "body"]);
        let hits = index.search("union").unwrap();
        assert_eq!(hits[0].doc_ref.as_str(), "sec-topology-intro");
    }

    #[test]
    fn test_duplicate_ids_fail_index_build_and_validation() {
        let payload = SearchPayload::new(vec![record("a", 1, "a.html"), record("a", 1, "b.html")]);
        assert!(matches!(
            payload.build_index(),
            Err(PayloadError::Index(IndexError::DuplicateRef(_)))
        ));
        let diagnostics = payload.validate(None);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, "duplicate-id");
    }

    #[test]
    fn test_validate_against_site() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.html"),
            r#"<html><body><section id="sec-a"><p id="a-1">x</p></section></body></html>"#,
        )
        .unwrap();

        let payload = SearchPayload::new(vec![
            record("sec-a", 1, "a.html"),
            record("a-1", 2, "a.html#a-1"),
            record("a-2", 2, "a.html#a-2"),
            record("b", 1, "b.html"),
            record("c", 3, "https://example.org/c"),
        ]);

        let codes: Vec<String> = payload
            .validate(Some(dir.path()))
            .into_iter()
            .map(|d| d.code)
            .collect();
        assert_eq!(codes, vec!["missing-anchor", "missing-page", "level-jump"]);
    }

    #[test]
    fn test_extreme_levels_do_not_overflow() {
        let payload = SearchPayload::new(vec![
            record("deep", u32::MAX, "a.html"),
            record("top", 1, "b.html"),
        ]);
        assert!(payload.validate(None).is_empty());

        let payload = SearchPayload::new(vec![
            record("top", 1, "b.html"),
            record("deep", u32::MAX, "a.html"),
        ]);
        let codes: Vec<String> = payload.validate(None).into_iter().map(|d| d.code).collect();
        assert_eq!(codes, vec!["level-jump"]);
    }

    #[test]
    fn test_only_id_attributes_count_as_anchors() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.html"),
            "<html><body><div data-id=\"x\"></div>\n<p\nID='y'>y</p></body></html>",
        )
        .unwrap();

        let payload = SearchPayload::new(vec![
            record("x", 1, "a.html#x"),
            record("y", 1, "a.html#y"),
        ]);
        let diagnostics = payload.validate(Some(dir.path()));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, "missing-anchor");
        assert_eq!(diagnostics[0].doc_ref.as_deref(), Some("x"));
    }
}

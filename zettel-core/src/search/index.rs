//! Inverted index construction and querying.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use thiserror::Error;
use zettel_types::{DocRef, IndexedDocument};

use super::pipeline::{self, Position};
use super::query::{Clause, Presence, Query, QueryParseError};

pub const DEFAULT_K1: f64 = 1.2;
pub const DEFAULT_B: f64 = 0.75;

/// Metadata key that keeps token positions in match data
pub const POSITION_METADATA: &str = "position";

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("document has no '{0}' field to use as its reference")]
    MissingRef(String),

    #[error("duplicate document reference '{0}'")]
    DuplicateRef(String),

    #[error("invalid query: {0}")]
    Query(#[from] QueryParseError),
}

/// Anything the builder can pull named text fields out of
pub trait Indexable {
    fn field_text(&self, name: &str) -> Option<&str>;
}

impl Indexable for IndexedDocument {
    fn field_text(&self, name: &str) -> Option<&str> {
        self.field(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: String,
    pub boost: f64,
}

/// Matched index term -> field -> token positions
pub type MatchData = BTreeMap<String, BTreeMap<String, Vec<Position>>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    #[serde(rename = "ref")]
    pub doc_ref: DocRef,
    pub score: f64,
    pub matches: MatchData,
}

#[derive(Debug, Default)]
struct FieldEntry {
    terms: BTreeMap<String, Vec<Position>>,
    length: usize,
}

/// Registers fields, accepts documents, and builds a [`SearchIndex`]
#[derive(Debug)]
pub struct IndexBuilder {
    ref_field: String,
    fields: Vec<FieldSpec>,
    metadata_whitelist: Vec<String>,
    k1: f64,
    b: f64,
    refs: Vec<DocRef>,
    ref_lookup: HashMap<DocRef, usize>,
    // docs[doc][field]
    docs: Vec<Vec<FieldEntry>>,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self {
            ref_field: "id".to_string(),
            fields: Vec::new(),
            metadata_whitelist: Vec::new(),
            k1: DEFAULT_K1,
            b: DEFAULT_B,
            refs: Vec::new(),
            ref_lookup: HashMap::new(),
            docs: Vec::new(),
        }
    }

    /// Field whose value uniquely identifies each document
    pub fn ref_field(mut self, name: impl Into<String>) -> Self {
        self.ref_field = name.into();
        self
    }

    /// Register a searchable text field
    pub fn field(self, name: impl Into<String>) -> Self {
        self.field_with_boost(name, 1.0)
    }

    pub fn field_with_boost(mut self, name: impl Into<String>, boost: f64) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            boost,
        });
        // Documents added before this call have nothing in the new field
        for doc in &mut self.docs {
            doc.push(FieldEntry::default());
        }
        self
    }

    /// Metadata kept in match data (only `position` is recorded)
    pub fn metadata_whitelist<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata_whitelist = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn add<D: Indexable + ?Sized>(&mut self, doc: &D) -> Result<(), IndexError> {
        let doc_ref = doc
            .field_text(&self.ref_field)
            .map(DocRef::from)
            .ok_or_else(|| IndexError::MissingRef(self.ref_field.clone()))?;

        if self.ref_lookup.contains_key(&doc_ref) {
            return Err(IndexError::DuplicateRef(doc_ref.0));
        }

        let entries = self
            .fields
            .iter()
            .map(|spec| {
                let mut entry = FieldEntry::default();
                let tokens = pipeline::index_terms(doc.field_text(&spec.name).unwrap_or(""));
                entry.length = tokens.len();
                for token in tokens {
                    entry
                        .terms
                        .entry(token.text)
                        .or_default()
                        .push(token.position);
                }
                entry
            })
            .collect();

        self.ref_lookup.insert(doc_ref.clone(), self.refs.len());
        self.refs.push(doc_ref);
        self.docs.push(entries);
        Ok(())
    }

    pub fn add_all<'a, D, I>(&mut self, docs: I) -> Result<(), IndexError>
    where
        D: Indexable + 'a,
        I: IntoIterator<Item = &'a D>,
    {
        for doc in docs {
            self.add(doc)?;
        }
        Ok(())
    }

    pub fn build(self) -> SearchIndex {
        let doc_count = self.refs.len();
        let field_count = self.fields.len();
        let keep_positions = self
            .metadata_whitelist
            .iter()
            .any(|key| key == POSITION_METADATA);

        let mut vocabulary: BTreeMap<String, TermEntry> = BTreeMap::new();
        for (doc, entries) in self.docs.iter().enumerate() {
            for (field, entry) in entries.iter().enumerate() {
                for (term, positions) in &entry.terms {
                    let term_entry = vocabulary.entry(term.clone()).or_insert_with(|| TermEntry {
                        index: 0,
                        postings: vec![BTreeMap::new(); field_count],
                    });
                    let kept = if keep_positions {
                        positions.clone()
                    } else {
                        Vec::new()
                    };
                    term_entry.postings[field].insert(doc, kept);
                }
            }
        }
        for (index, entry) in vocabulary.values_mut().enumerate() {
            entry.index = index;
        }

        let avg_lengths: Vec<f64> = (0..field_count)
            .map(|field| {
                if doc_count == 0 {
                    return 0.0;
                }
                let total: usize = self.docs.iter().map(|doc| doc[field].length).sum();
                total as f64 / doc_count as f64
            })
            .collect();

        let mut idf_cache: HashMap<&str, f64> = HashMap::new();
        let mut field_vectors = vec![Vec::with_capacity(doc_count); field_count];
        for entries in &self.docs {
            for (field, entry) in entries.iter().enumerate() {
                let mut vector = BTreeMap::new();
                for (term, positions) in &entry.terms {
                    let Some(term_entry) = vocabulary.get(term) else {
                        continue;
                    };
                    let term_idf = *idf_cache
                        .entry(term.as_str())
                        .or_insert_with(|| idf(term_entry, doc_count));
                    let tf = positions.len() as f64;
                    let norm = 1.0 - self.b + self.b * (entry.length as f64 / avg_lengths[field]);
                    let score = term_idf * ((self.k1 + 1.0) * tf) / (self.k1 * norm + tf)
                        * self.fields[field].boost;
                    vector.insert(term_entry.index, (score * 1000.0).round() / 1000.0);
                }
                field_vectors[field].push(vector);
            }
        }

        tracing::debug!(
            documents = doc_count,
            terms = vocabulary.len(),
            "Built search index"
        );

        SearchIndex {
            ref_field: self.ref_field,
            fields: self.fields,
            refs: self.refs,
            vocabulary,
            field_vectors,
        }
    }
}

#[derive(Debug, Clone)]
struct TermEntry {
    index: usize,
    // postings[field]: doc -> positions
    postings: Vec<BTreeMap<usize, Vec<Position>>>,
}

fn idf(entry: &TermEntry, doc_count: usize) -> f64 {
    let with_term: usize = entry.postings.iter().map(BTreeMap::len).sum();
    let x = (doc_count as f64 - with_term as f64 + 0.5) / (with_term as f64 + 0.5);
    (1.0 + x.abs()).ln()
}

/// Immutable inverted index over a fixed document set
#[derive(Debug, Clone)]
pub struct SearchIndex {
    ref_field: String,
    fields: Vec<FieldSpec>,
    refs: Vec<DocRef>,
    vocabulary: BTreeMap<String, TermEntry>,
    // field_vectors[field][doc]: term index -> weight
    field_vectors: Vec<Vec<BTreeMap<usize, f64>>>,
}

impl SearchIndex {
    pub fn ref_field(&self) -> &str {
        &self.ref_field
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Indexed terms in sorted order
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.vocabulary.keys().map(String::as_str)
    }

    /// Parse and run a query string
    pub fn search(&self, query: &str) -> Result<Vec<SearchHit>, QueryParseError> {
        let parsed = Query::parse(query, &self.field_names())?;
        Ok(self.query(&parsed))
    }

    /// Run a parsed query; hits are ordered by score, then by insertion order
    pub fn query(&self, query: &Query) -> Vec<SearchHit> {
        let mut query_vectors: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); self.fields.len()];
        let mut matches: BTreeMap<usize, MatchData> = BTreeMap::new();
        let mut field_hits: BTreeSet<(usize, usize)> = BTreeSet::new();
        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        let mut required: Option<BTreeSet<usize>> = None;
        let mut prohibited: BTreeSet<usize> = BTreeSet::new();

        for clause in &query.clauses {
            let field_ids: Vec<usize> = clause
                .fields
                .iter()
                .filter_map(|name| self.fields.iter().position(|f| &f.name == name))
                .collect();
            let mut clause_matches = BTreeSet::new();

            for term in self.expand(clause) {
                let entry = &self.vocabulary[term];
                for &field in &field_ids {
                    let postings = &entry.postings[field];
                    match clause.presence {
                        Presence::Prohibited => {
                            prohibited.extend(postings.keys().copied());
                            continue;
                        }
                        Presence::Required => clause_matches.extend(postings.keys().copied()),
                        Presence::Optional => {}
                    }

                    *query_vectors[field].entry(entry.index).or_insert(0.0) += clause.boost;

                    if !seen.insert((entry.index, field)) {
                        continue;
                    }
                    let field_name = &self.fields[field].name;
                    for (&doc, positions) in postings {
                        matches
                            .entry(doc)
                            .or_default()
                            .entry(term.to_string())
                            .or_default()
                            .entry(field_name.clone())
                            .or_default()
                            .extend(positions.iter().copied());
                        field_hits.insert((doc, field));
                    }
                }
            }

            if clause.presence == Presence::Required {
                required = Some(match required {
                    None => clause_matches,
                    Some(previous) => previous.intersection(&clause_matches).copied().collect(),
                });
            }
        }

        let admitted = |doc: &usize| {
            !prohibited.contains(doc) && required.as_ref().map_or(true, |r| r.contains(doc))
        };

        let mut scores: BTreeMap<usize, f64> = BTreeMap::new();
        for &(doc, field) in field_hits.iter().filter(|(doc, _)| admitted(doc)) {
            let score = similarity(&query_vectors[field], &self.field_vectors[field][doc]);
            *scores.entry(doc).or_insert(0.0) += score;
        }

        if query.is_negated() {
            for doc in (0..self.refs.len()).filter(|doc| admitted(doc)) {
                scores.entry(doc).or_insert(0.0);
            }
        }

        let mut ranked: Vec<(usize, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        ranked
            .into_iter()
            .map(|(doc, score)| SearchHit {
                doc_ref: self.refs[doc].clone(),
                score,
                matches: matches.remove(&doc).unwrap_or_default(),
            })
            .collect()
    }

    /// Index terms a clause stands for
    fn expand(&self, clause: &Clause) -> Vec<&str> {
        if clause.has_wildcard() {
            return self
                .terms()
                .filter(|term| glob_match(&clause.term, term))
                .collect();
        }

        let Some(term) = pipeline::query_term(&clause.term) else {
            return Vec::new();
        };

        if clause.edit_distance > 0 {
            let limit = clause.edit_distance as usize;
            return self
                .terms()
                .filter(|candidate| strsim::levenshtein(&term, candidate) <= limit)
                .collect();
        }

        self.vocabulary
            .get_key_value(&term)
            .map(|(key, _)| vec![key.as_str()])
            .unwrap_or_default()
    }
}

/// Dot product normalised by the query vector's magnitude
fn similarity(query: &BTreeMap<usize, f64>, field: &BTreeMap<usize, f64>) -> f64 {
    let magnitude = query.values().map(|w| w * w).sum::<f64>().sqrt();
    if magnitude == 0.0 {
        return 0.0;
    }
    let dot: f64 = query
        .iter()
        .filter_map(|(index, weight)| field.get(index).map(|value| weight * value))
        .sum();
    dot / magnitude
}

fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    let first = parts[0];
    let last = parts[parts.len() - 1];

    if parts.len() == 1 {
        return pattern == text;
    }
    if text.len() < first.len() + last.len() || !text.starts_with(first) || !text.ends_with(last)
    {
        return false;
    }

    let mut rest = &text[first.len()..text.len() - last.len()];
    for middle in &parts[1..parts.len() - 1] {
        match rest.find(middle) {
            Some(at) => rest = &rest[at + middle.len()..],
            None => return false,
        }
    }
    true
}

use std::collections::HashSet;
use zettel_core::{SearchPayload, SearchIndex};

const FIXTURE: &str = include_str!("fixtures/lunr-pretext-search-index.js");

fn load() -> SearchPayload {
    SearchPayload::parse(FIXTURE).expect("fixture parses")
}

fn top_refs(index: &SearchIndex, query: &str, n: usize) -> Vec<String> {
    index
        .search(query)
        .expect("query parses")
        .into_iter()
        .take(n)
        .map(|hit| hit.doc_ref.0)
        .collect()
}

#[test]
fn fixture_parses_with_unique_ids() {
    let payload = load();
    assert_eq!(payload.style(), "textbook");
    assert_eq!(payload.documents.len(), 49);

    let ids: HashSet<&str> = payload.documents.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids.len(), payload.documents.len());
    assert!(payload.validate(None).iter().all(|d| !d.is_error()));
}

#[test]
fn fixture_renders_byte_for_byte() {
    assert_eq!(load().render(), FIXTURE);
}

#[test]
fn fixture_index_answers_queries() {
    let index = load().build_index().expect("index builds");

    assert_eq!(
        top_refs(&index, "cauchy", 1),
        vec!["def-cauchy-sequence".to_string()]
    );
    assert!(top_refs(&index, "topology", 5).contains(&"sec-topology-intro".to_string()));
    assert!(index.search("homeomorphism").unwrap().is_empty());
}

#[test]
fn fixture_index_is_deterministic() {
    let payload = load();
    let first = payload.build_index().unwrap();
    let second = payload.build_index().unwrap();

    for query in ["metric space", "continuous function", "+git -pages", "seq*", "topolgy~1"] {
        assert_eq!(first.search(query).unwrap(), second.search(query).unwrap());
    }
}

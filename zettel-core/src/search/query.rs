//! Query string parsing.
//!
//! Syntax, per whitespace-separated clause:
//!
//! - `+term` must be present, `-term` must be absent
//! - `title:term` restricts the clause to one field
//! - `*` anywhere in the term is a wildcard over the vocabulary
//! - `term~N` matches terms within edit distance `N`
//! - `term^N` multiplies the clause weight by `N`
//!
//! Hyphens inside a term separate clauses, as they do in indexed text.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryParseError {
    #[error("unknown field '{field}' (searchable fields: {known})")]
    UnknownField { field: String, known: String },

    #[error("expected a term after '{0}'")]
    MissingTerm(String),

    #[error("invalid edit distance in '{0}'")]
    InvalidEditDistance(String),

    #[error("invalid boost in '{0}'")]
    InvalidBoost(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Presence {
    #[default]
    Optional,
    Required,
    Prohibited,
}

/// One parsed term of a query
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// Lowercased term text, before the search pipeline runs
    pub term: String,
    pub fields: Vec<String>,
    pub presence: Presence,
    pub boost: f64,
    pub edit_distance: u32,
}

impl Clause {
    pub fn has_wildcard(&self) -> bool {
        self.term.contains('*')
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    pub clauses: Vec<Clause>,
}

impl Query {
    /// True when every clause is prohibited, in which case every other document matches
    pub fn is_negated(&self) -> bool {
        !self.clauses.is_empty()
            && self
                .clauses
                .iter()
                .all(|c| c.presence == Presence::Prohibited)
    }

    pub fn parse(input: &str, fields: &[String]) -> Result<Self, QueryParseError> {
        let mut clauses = Vec::new();
        for chunk in input.split_whitespace() {
            parse_chunk(chunk, fields, &mut clauses)?;
        }
        Ok(Query { clauses })
    }
}

fn parse_chunk(
    chunk: &str,
    fields: &[String],
    clauses: &mut Vec<Clause>,
) -> Result<(), QueryParseError> {
    let (presence, rest) = match chunk.as_bytes()[0] {
        b'+' => (Presence::Required, &chunk[1..]),
        b'-' => (Presence::Prohibited, &chunk[1..]),
        _ => (Presence::Optional, chunk),
    };

    let (scope, rest) = match rest.split_once(':') {
        Some((field, term)) => {
            if !fields.iter().any(|f| f == field) {
                return Err(QueryParseError::UnknownField {
                    field: field.to_string(),
                    known: fields.join(", "),
                });
            }
            (vec![field.to_string()], term)
        }
        None => (fields.to_vec(), rest),
    };

    let mut first = true;
    for part in rest.split('-').filter(|p| !p.is_empty()) {
        let mut clause = parse_term(part)?;
        clause.fields = scope.clone();
        // Presence binds to the first piece only
        if first {
            clause.presence = presence;
            first = false;
        }
        clauses.push(clause);
    }

    if first {
        return Err(QueryParseError::MissingTerm(chunk.to_string()));
    }

    Ok(())
}

fn parse_term(part: &str) -> Result<Clause, QueryParseError> {
    let modifiers_at = part.find(&['~', '^'][..]).unwrap_or(part.len());
    let term = &part[..modifiers_at];
    if term.is_empty() {
        return Err(QueryParseError::MissingTerm(part.to_string()));
    }

    let mut clause = Clause {
        term: term.to_lowercase(),
        fields: Vec::new(),
        presence: Presence::Optional,
        boost: 1.0,
        edit_distance: 0,
    };

    let mut modifiers = &part[modifiers_at..];
    while let Some(marker) = modifiers.chars().next() {
        let body = &modifiers[1..];
        let end = body.find(&['~', '^'][..]).unwrap_or(body.len());
        let value = &body[..end];
        match marker {
            '~' => {
                clause.edit_distance = value
                    .parse()
                    .map_err(|_| QueryParseError::InvalidEditDistance(part.to_string()))?;
            }
            _ => {
                clause.boost = value
                    .parse::<f64>()
                    .ok()
                    .filter(|b| b.is_finite() && *b >= 0.0)
                    .ok_or_else(|| QueryParseError::InvalidBoost(part.to_string()))?;
            }
        }
        modifiers = &body[end..];
    }

    Ok(clause)
}

//! Full-text search over indexed document records.
//!
//! The index is built once from an ordered record sequence and never
//! mutated afterwards; rebuilding from the same sequence answers every
//! query identically.

pub mod highlight;
pub mod index;
pub mod pipeline;
pub mod query;
pub mod stemmer;

pub use highlight::{body_excerpt, excerpt, field_positions};
pub use index::{
    FieldSpec, IndexBuilder, IndexError, Indexable, MatchData, SearchHit, SearchIndex,
    POSITION_METADATA,
};
pub use pipeline::Position;
pub use query::{Clause, Presence, Query, QueryParseError};

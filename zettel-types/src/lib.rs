//! Shared types for zettel
//!
//! This crate provides the record type that the search payload is made of,
//! along with the small newtypes used for its identifier and outline level.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::num::NonZeroU32;

/// Unique reference key of an indexed document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocRef(pub String);

impl DocRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocRef {
    fn from(id: &str) -> Self {
        DocRef(id.to_string())
    }
}

impl From<String> for DocRef {
    fn from(id: String) -> Self {
        DocRef(id)
    }
}

/// Depth of a record in the document outline (1 = page level)
///
/// The generated payload stores levels as decimal strings (`"1"`); numbers
/// are accepted on read as well. Zero is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Level(NonZeroU32);

impl Level {
    pub fn new(depth: u32) -> Option<Self> {
        NonZeroU32::new(depth).map(Level)
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        let depth = match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text
                .trim()
                .parse::<u64>()
                .map_err(|_| de::Error::custom(format!("invalid level {:?}", text)))?,
            Raw::Number(n) => n,
        };

        u32::try_from(depth)
            .ok()
            .and_then(Level::new)
            .ok_or_else(|| de::Error::custom(format!("level must be positive, got {}", depth)))
    }
}

/// One searchable unit of the built book (page, section or sub-element)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub id: DocRef,
    pub level: Level,
    /// Page URL, optionally with a `#fragment` for sub-page anchors
    pub url: String,
    /// Free-text classification ("Section", "Definition", "Example", ...)
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Dotted outline position; empty for unnumbered matter
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub title: String,
    /// Flattened plain text, used for relevance only
    #[serde(default)]
    pub body: String,
}

impl IndexedDocument {
    /// URL of the page the record lives on, without any fragment
    pub fn page(&self) -> &str {
        self.url.split('#').next().unwrap_or(&self.url)
    }

    /// Anchor within the page, if the URL carries one
    pub fn anchor(&self) -> Option<&str> {
        self.url
            .split_once('#')
            .map(|(_, fragment)| fragment)
            .filter(|fragment| !fragment.is_empty())
    }

    /// Human-readable label: type, number and title with empty parts skipped
    pub fn display_label(&self) -> String {
        [
            self.doc_type.trim(),
            self.number.trim(),
            self.title.trim(),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
    }

    /// Value of a named field as searchable text
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "id" => Some(self.id.as_str()),
            "url" => Some(&self.url),
            "type" => Some(&self.doc_type),
            "number" => Some(&self.number),
            "title" => Some(&self.title),
            "body" => Some(&self.body),
            _ => None,
        }
    }
}

//! Record types the in-memory evaluator filters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tag attached to a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTag {
    /// Structured identifier (a UUID in practice).
    pub id: String,

    /// Display name, e.g. "Cooking".
    pub name: String,
}

impl DocumentTag {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Anything the evaluator can match a query against.
///
/// Implement this for your own row type to filter it without copying into
/// [`Document`].
pub trait SearchRecord {
    fn name(&self) -> &str;
    fn content(&self) -> &str;
    fn tags(&self) -> &[DocumentTag];
    fn created_at(&self) -> DateTime<Utc>;
}

/// A plain in-memory document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub name: String,
    pub content: String,

    #[serde(default)]
    pub tags: Vec<DocumentTag>,

    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            content: content.into(),
            tags: Vec::new(),
            created_at,
        }
    }

    /// Builder-style tag attachment.
    pub fn with_tag(mut self, tag: DocumentTag) -> Self {
        self.tags.push(tag);
        self
    }
}

impl SearchRecord for Document {
    fn name(&self) -> &str {
        &self.name
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn tags(&self) -> &[DocumentTag] {
        &self.tags
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

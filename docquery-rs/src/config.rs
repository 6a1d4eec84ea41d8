//! Search configuration: the relational schema the SQL compiler targets.

use crate::error::{QueryError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

// Plain SQL identifiers only; names are interpolated into generated SQL.
static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Top-level configuration, usually read from a `docquery.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Table and column names used by the SQL compiler.
    pub sql: SqlSchema,
}

impl SearchConfig {
    /// Load and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&raw)?;
        tracing::debug!(path = %path.display(), "loaded search config");
        Ok(config)
    }

    /// Parse and validate a config from TOML text. Missing keys take defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: SearchConfig = toml::from_str(raw)?;
        config.sql.validate()?;
        Ok(config)
    }
}

/// Names of the tables and columns the compiled SQL refers to.
///
/// The documents table is always aliased `d` in generated SQL. Its
/// `created_at` column holds Unix milliseconds (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlSchema {
    pub documents_table: String,
    pub document_id_column: String,
    pub document_scope_column: String,
    pub created_at_column: String,

    /// FTS5 virtual table indexing the searchable text.
    pub fts_table: String,
    /// Unindexed FTS column holding the owning document id.
    pub fts_document_id_column: String,
    /// Indexed FTS column holding the scope id of the document.
    pub fts_scope_column: String,
    pub fts_name_column: String,
    pub fts_content_column: String,

    pub tags_table: String,
    pub tag_id_column: String,
    /// Column holding the tag name as produced by `normalize_tag_name`.
    pub tag_name_column: String,
    pub tag_scope_column: String,

    pub document_tags_table: String,
    pub document_tags_document_column: String,
    pub document_tags_tag_column: String,
}

impl Default for SqlSchema {
    fn default() -> Self {
        Self {
            documents_table: "documents".to_string(),
            document_id_column: "id".to_string(),
            document_scope_column: "organization_id".to_string(),
            created_at_column: "created_at".to_string(),
            fts_table: "documents_fts".to_string(),
            fts_document_id_column: "document_id".to_string(),
            fts_scope_column: "organization_id".to_string(),
            fts_name_column: "name".to_string(),
            fts_content_column: "content".to_string(),
            tags_table: "tags".to_string(),
            tag_id_column: "id".to_string(),
            tag_name_column: "normalized_name".to_string(),
            tag_scope_column: "organization_id".to_string(),
            document_tags_table: "document_tags".to_string(),
            document_tags_document_column: "document_id".to_string(),
            document_tags_tag_column: "tag_id".to_string(),
        }
    }
}

impl SqlSchema {
    /// Check that every configured name is a plain SQL identifier.
    pub fn validate(&self) -> Result<()> {
        for (setting, value) in self.settings() {
            if !IDENTIFIER.is_match(value) {
                return Err(QueryError::InvalidIdentifier {
                    setting: setting.to_string(),
                    value: value.to_string(),
                });
            }
        }
        if self.fts_name_column == self.fts_content_column {
            return Err(QueryError::Config(
                "fts_name_column and fts_content_column must differ".to_string(),
            ));
        }
        Ok(())
    }

    fn settings(&self) -> [(&'static str, &str); 16] {
        [
            ("documents_table", self.documents_table.as_str()),
            ("document_id_column", self.document_id_column.as_str()),
            ("document_scope_column", self.document_scope_column.as_str()),
            ("created_at_column", self.created_at_column.as_str()),
            ("fts_table", self.fts_table.as_str()),
            ("fts_document_id_column", self.fts_document_id_column.as_str()),
            ("fts_scope_column", self.fts_scope_column.as_str()),
            ("fts_name_column", self.fts_name_column.as_str()),
            ("fts_content_column", self.fts_content_column.as_str()),
            ("tags_table", self.tags_table.as_str()),
            ("tag_id_column", self.tag_id_column.as_str()),
            ("tag_name_column", self.tag_name_column.as_str()),
            ("tag_scope_column", self.tag_scope_column.as_str()),
            ("document_tags_table", self.document_tags_table.as_str()),
            ("document_tags_document_column", self.document_tags_document_column.as_str()),
            ("document_tags_tag_column", self.document_tags_tag_column.as_str()),
        ]
    }
}

//! Docquery - a search query language for document stores.
//!
//! # Overview
//!
//! A query such as `tag:cooking -"brown butter" created:>=2024-02-01` is
//! parsed into an [`Expression`] tree, which can then be:
//! - evaluated in memory against any [`SearchRecord`]
//! - compiled into a parameterized SQLite (FTS5) `WHERE` fragment, restricted
//!   to one tenant scope, together with the [`Issue`]s found along the way
//!
//! Parsing never fails. Invalid clauses never match in either backend.
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use docquery::{Document, DocumentTag, SqlCompiler, filter_by_query, parse_query};
//!
//! let docs = vec![
//!     Document::new("doc_1", "Sunday breakfast", "Fluffy pancakes.", Utc.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).unwrap())
//!         .with_tag(DocumentTag::new("3f2b8c1e-9d4a-4b7e-8c6f-1a2b3c4d5e6f", "cooking")),
//! ];
//!
//! let hits = filter_by_query(&docs, "tag:cooking pancakes");
//! assert_eq!(hits.len(), 1);
//!
//! let statement = SqlCompiler::default().statement(&parse_query("tag:cooking pancakes"), "org_1");
//! assert!(statement.issues.is_empty());
//! assert_eq!(statement.sql.matches('?').count(), statement.params.len());
//! ```

pub mod config;
pub mod error;
pub mod search;
pub mod types;

// Re-export main types at crate root
pub use config::{SearchConfig, SqlSchema};
pub use error::{QueryError, Result};
pub use search::{
    CompiledQuery, Expression, Field, Issue, IssueCode, Operator, SearchStatement, SqlCompiler,
    SqlFragment, SqlParam, filter_by_query, filter_records, parse_query,
};
pub use types::*;

//! Query language: tokenizer, parser, and the two evaluation backends.

pub mod filter;
pub mod lexer;
pub mod matcher;
pub mod parser;
pub mod sql;
pub mod types;

pub use filter::{canonical_identifier, normalize_tag_name, parse_date_value, sanitize_fulltext};
pub use lexer::{Token, tokenize};
pub use matcher::{Predicate, filter_by_query, filter_records, matches};
pub use parser::{parse, parse_query};
pub use sql::{CompiledQuery, SearchStatement, SqlCompiler, SqlFragment, SqlParam};
pub use types::*;

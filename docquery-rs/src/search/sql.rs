//! Compile an `Expression` into a parameterized SQLite boolean expression.
//!
//! Text leaves become FTS5 `MATCH` sub-queries, tag leaves become
//! membership sub-queries, date leaves compare the `created_at` column
//! (Unix milliseconds). Every leaf is restricted to the caller's scope id.
//!
//! Invalid clauses compile to `0` and leave an [`Issue`] behind; nothing
//! invalid ever compiles to something that could match.

use crate::config::{SearchConfig, SqlSchema};
use crate::error::Result;
use crate::search::filter::{FilterTarget, resolve_filter, sanitize_fulltext, start_of_day};
use crate::search::parser::parse_query;
use crate::search::types::{Expression, Issue};
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Alias of the documents table in every generated statement.
pub const DOCUMENT_ALIAS: &str = "d";

const ALWAYS_TRUE: &str = "1";
const ALWAYS_FALSE: &str = "0";

/// A bound parameter for a `?` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlParam {
    Text(String),
    Integer(i64),
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(value.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        SqlParam::Text(value)
    }
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        SqlParam::Integer(value)
    }
}

/// A boolean SQL expression and its parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl SqlFragment {
    pub fn new(sql: impl Into<String>, params: Vec<SqlParam>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    pub fn always_true() -> Self {
        Self::new(ALWAYS_TRUE, Vec::new())
    }

    pub fn always_false() -> Self {
        Self::new(ALWAYS_FALSE, Vec::new())
    }

    pub fn is_always_false(&self) -> bool {
        self.sql == ALWAYS_FALSE
    }

    pub fn is_always_true(&self) -> bool {
        self.sql == ALWAYS_TRUE
    }
}

/// Result of compiling one expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledQuery {
    pub fragment: SqlFragment,
    /// Problems found, left to right, depth first.
    pub issues: Vec<Issue>,
}

/// A complete `SELECT` of matching document ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStatement {
    pub sql: String,
    pub params: Vec<SqlParam>,
    pub issues: Vec<Issue>,
}

// ============================================================================
// Compiler
// ============================================================================

/// Lowers expressions against a fixed schema.
#[derive(Debug, Clone, Default)]
pub struct SqlCompiler {
    schema: SqlSchema,
}

impl SqlCompiler {
    /// Create a compiler for a custom schema. Fails on unsafe identifiers.
    pub fn new(schema: SqlSchema) -> Result<Self> {
        schema.validate()?;
        Ok(Self { schema })
    }

    /// Create a compiler from a loaded [`SearchConfig`].
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        Self::new(config.sql.clone())
    }

    pub fn schema(&self) -> &SqlSchema {
        &self.schema
    }

    /// Compile `expr` into a boolean fragment over the documents table
    /// (aliased `d`), restricted to `scope_id`.
    pub fn compile(&self, expr: &Expression, scope_id: &str) -> CompiledQuery {
        if scope_id.trim().is_empty() {
            tracing::warn!("compiling search query with a blank scope id");
        }
        let mut lowering = Lowering {
            schema: &self.schema,
            scope: scope_id,
            issues: Vec::new(),
        };
        let lowered = lowering.lower(expr);
        CompiledQuery {
            fragment: lowered.fragment,
            issues: lowering.issues,
        }
    }

    /// Parse and compile a query string.
    pub fn compile_query(&self, query: &str, scope_id: &str) -> CompiledQuery {
        self.compile(&parse_query(query), scope_id)
    }

    /// Build a full statement selecting the ids of matching documents.
    ///
    /// The documents themselves are also restricted to the scope, so a
    /// negated leaf cannot reach rows of another scope.
    pub fn statement(&self, expr: &Expression, scope_id: &str) -> SearchStatement {
        let compiled = self.compile(expr, scope_id);
        let s = &self.schema;
        let sql = format!(
            "SELECT {d}.{id} FROM {table} AS {d} WHERE {d}.{scope} = ? AND ({fragment})",
            d = DOCUMENT_ALIAS,
            id = s.document_id_column,
            table = s.documents_table,
            scope = s.document_scope_column,
            fragment = compiled.fragment.sql,
        );
        let mut params = Vec::with_capacity(compiled.fragment.params.len() + 1);
        params.push(SqlParam::from(scope_id));
        params.extend(compiled.fragment.params);
        SearchStatement {
            sql,
            params,
            issues: compiled.issues,
        }
    }
}

/// Compile with the default schema.
pub fn compile(expr: &Expression, scope_id: &str) -> CompiledQuery {
    SqlCompiler::default().compile(expr, scope_id)
}

// ============================================================================
// Lowering
// ============================================================================

struct Lowering<'a> {
    schema: &'a SqlSchema,
    scope: &'a str,
    issues: Vec<Issue>,
}

struct Lowered {
    fragment: SqlFragment,
    /// An issue was raised somewhere inside.
    degraded: bool,
}

impl Lowered {
    fn clean(fragment: SqlFragment) -> Self {
        Self {
            fragment,
            degraded: false,
        }
    }
}

impl Lowering<'_> {
    fn lower(&mut self, expr: &Expression) -> Lowered {
        match expr {
            Expression::Empty => Lowered::clean(SqlFragment::always_true()),
            Expression::Text { value } => {
                let columns = [
                    self.schema.fts_name_column.as_str(),
                    self.schema.fts_content_column.as_str(),
                ];
                Lowered::clean(self.fulltext(&columns, value))
            }
            Expression::Filter {
                field,
                operator,
                value,
            } => match resolve_filter(*field, *operator, value) {
                Ok(target) => Lowered::clean(self.lower_target(target)),
                Err(issue) => self.reject(issue),
            },
            Expression::And { operands } => self.lower_list(operands, "AND"),
            Expression::Or { operands } => self.lower_list(operands, "OR"),
            Expression::Not { .. } => {
                // Chains are folded by parity so depth never drives recursion
                let (negations, base) = expr.peel_negations();
                if *base == Expression::Empty {
                    return self.reject(Issue::empty_not_operand());
                }
                let inner = self.lower(base);
                if inner.degraded {
                    // Negating a rejected clause must not turn it into a match-all
                    return Lowered {
                        fragment: SqlFragment::always_false(),
                        degraded: true,
                    };
                }
                if negations % 2 == 0 {
                    return inner;
                }
                Lowered::clean(SqlFragment::new(
                    format!("NOT ({})", inner.fragment.sql),
                    inner.fragment.params,
                ))
            }
        }
    }

    fn lower_list(&mut self, operands: &[Expression], joiner: &str) -> Lowered {
        if operands.is_empty() {
            return self.reject(Issue::unsupported_expression(&format!(
                "{} with no operands",
                joiner
            )));
        }

        let mut parts = Vec::with_capacity(operands.len());
        let mut params = Vec::new();
        let mut degraded = false;
        for operand in operands {
            let lowered = self.lower(operand);
            degraded |= lowered.degraded;
            parts.push(lowered.fragment.sql);
            params.extend(lowered.fragment.params);
        }

        let sql = if parts.len() == 1 {
            parts.remove(0)
        } else {
            format!("({})", parts.join(&format!(" {} ", joiner)))
        };
        Lowered {
            fragment: SqlFragment::new(sql, params),
            degraded,
        }
    }

    fn lower_target(&self, target: FilterTarget) -> SqlFragment {
        let s = self.schema;
        match target {
            FilterTarget::Name(value) => self.fulltext(&[s.fts_name_column.as_str()], &value),
            FilterTarget::Content(value) => {
                self.fulltext(&[s.fts_content_column.as_str()], &value)
            }
            FilterTarget::Tag {
                normalized_name,
                id,
            } => {
                let name_match = format!("t.{} = ?", s.tag_name_column);
                match id {
                    Some(id) => self.tag_membership(
                        Some(&format!("(lower(t.{}) = ? OR {})", s.tag_id_column, name_match)),
                        vec![SqlParam::from(id), SqlParam::from(normalized_name)],
                    ),
                    None => {
                        self.tag_membership(Some(&name_match), vec![SqlParam::from(normalized_name)])
                    }
                }
            }
            FilterTarget::HasTags => self.tag_membership(None, Vec::new()),
            FilterTarget::CreatedOn(day) => {
                let (start, end) = day_bounds(day);
                SqlFragment::new(
                    format!(
                        "({d}.{scope} = ? AND {d}.{col} >= ? AND {d}.{col} < ?)",
                        d = DOCUMENT_ALIAS,
                        scope = s.document_scope_column,
                        col = s.created_at_column,
                    ),
                    vec![SqlParam::from(self.scope), start.into(), end.into()],
                )
            }
            FilterTarget::CreatedCompare { operator, at } => SqlFragment::new(
                format!(
                    "({d}.{scope} = ? AND {d}.{col} {op} ?)",
                    d = DOCUMENT_ALIAS,
                    scope = s.document_scope_column,
                    col = s.created_at_column,
                    op = operator.as_str(),
                ),
                vec![SqlParam::from(self.scope), at.timestamp_millis().into()],
            ),
        }
    }

    /// `(d.scope = ? AND d.id IN (<fts sub-query>))` with a prefix MATCH
    /// expression.
    ///
    /// The FTS scope phrase only narrows the index scan: the tokenizer splits
    /// `org_1` and `org-1` into the same tokens. The exact column comparison
    /// is what keeps the leaf inside the scope.
    fn fulltext(&self, columns: &[&str], value: &str) -> SqlFragment {
        let (Some(scope), Some(value)) = (sanitize_fulltext(self.scope), sanitize_fulltext(value))
        else {
            return SqlFragment::always_false();
        };
        let s = self.schema;
        let sql = format!(
            "({d}.{scope} = ? AND {d}.{id} IN (SELECT {fts_id} FROM {fts} WHERE {fts} MATCH ?))",
            d = DOCUMENT_ALIAS,
            scope = s.document_scope_column,
            id = s.document_id_column,
            fts_id = s.fts_document_id_column,
            fts = s.fts_table,
        );
        let query = format!(
            "{}:\"{}\" {{{}}}:\"{}\"*",
            s.fts_scope_column,
            scope,
            columns.join(" "),
            value
        );
        SqlFragment::new(sql, vec![SqlParam::from(self.scope), SqlParam::Text(query)])
    }

    /// `d.id IN (<documents tagged in scope [and matching condition]>)`.
    fn tag_membership(&self, condition: Option<&str>, extra: Vec<SqlParam>) -> SqlFragment {
        let s = self.schema;
        let mut sql = format!(
            "{d}.{id} IN (SELECT dt.{dt_doc} FROM {dt_table} AS dt JOIN {tags} AS t ON t.{tag_id} = dt.{dt_tag} WHERE t.{tag_scope} = ?",
            d = DOCUMENT_ALIAS,
            id = s.document_id_column,
            dt_doc = s.document_tags_document_column,
            dt_table = s.document_tags_table,
            tags = s.tags_table,
            tag_id = s.tag_id_column,
            dt_tag = s.document_tags_tag_column,
            tag_scope = s.tag_scope_column,
        );
        if let Some(condition) = condition {
            sql.push_str(" AND ");
            sql.push_str(condition);
        }
        sql.push(')');

        let mut params = vec![SqlParam::from(self.scope)];
        params.extend(extra);
        SqlFragment::new(sql, params)
    }

    fn reject(&mut self, issue: Issue) -> Lowered {
        tracing::debug!(code = %issue.code, message = %issue.message, "search clause compiled to always-false");
        self.issues.push(issue);
        Lowered {
            fragment: SqlFragment::always_false(),
            degraded: true,
        }
    }
}

/// Half-open millisecond range `[start, end)` covering one UTC day.
fn day_bounds(day: NaiveDate) -> (i64, i64) {
    let start: DateTime<Utc> = start_of_day(day);
    let end = day
        .checked_add_days(Days::new(1))
        .map(start_of_day)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    (start.timestamp_millis(), end.timestamp_millis())
}

// ============================================================================
// Tests
// ============================================================================

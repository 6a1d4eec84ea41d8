//! In-memory evaluation: compile an `Expression` into a predicate over records.
//!
//! Invalid clauses never match. A negation over an invalid clause doesn't
//! match either, so both backends fail closed in the same places.

use crate::search::filter::{FilterTarget, normalize_tag_name, resolve_filter, sanitize_fulltext};
use crate::search::parser::parse_query;
use crate::search::types::{Expression, Operator};
use crate::types::SearchRecord;

type Test = Box<dyn Fn(&dyn SearchRecord) -> bool + Send + Sync>;

/// A compiled query, reusable across any number of records.
pub struct Predicate {
    test: Test,
    /// Some clause inside was invalid and replaced by `false`.
    degraded: bool,
}

impl Predicate {
    fn new(test: impl Fn(&dyn SearchRecord) -> bool + Send + Sync + 'static) -> Self {
        Self {
            test: Box::new(test),
            degraded: false,
        }
    }

    fn always(result: bool) -> Self {
        Self::new(move |_| result)
    }

    /// Always-false stand-in for an invalid clause.
    fn rejected() -> Self {
        Self::always(false).with_degraded(true)
    }

    fn with_degraded(mut self, degraded: bool) -> Self {
        self.degraded = degraded;
        self
    }

    /// Test one record.
    pub fn matches<R: SearchRecord>(&self, record: &R) -> bool {
        (self.test)(record)
    }

    /// Whether any clause was invalid and will never match.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }
}

impl std::fmt::Debug for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predicate")
            .field("degraded", &self.degraded)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Compilation
// ============================================================================

/// Compile an expression into a reusable predicate.
pub fn compile(expr: &Expression) -> Predicate {
    match expr {
        Expression::Empty => Predicate::always(true),
        Expression::Text { value } => {
            let Some(needle) = fold_needle(value) else {
                return Predicate::always(false);
            };
            // Checked per field so a match can't span the name/content boundary
            Predicate::new(move |r| {
                contains_folded(r.name(), &needle) || contains_folded(r.content(), &needle)
            })
        }
        Expression::Filter {
            field,
            operator,
            value,
        } => match resolve_filter(*field, *operator, value) {
            Ok(target) => compile_target(target),
            Err(_) => Predicate::rejected(),
        },
        Expression::And { operands } => {
            if operands.is_empty() {
                return Predicate::rejected();
            }
            let children: Vec<Predicate> = operands.iter().map(compile).collect();
            let degraded = children.iter().any(|p| p.degraded);
            Predicate::new(move |r| children.iter().all(|p| (p.test)(r))).with_degraded(degraded)
        }
        Expression::Or { operands } => {
            if operands.is_empty() {
                return Predicate::rejected();
            }
            let children: Vec<Predicate> = operands.iter().map(compile).collect();
            let degraded = children.iter().any(|p| p.degraded);
            Predicate::new(move |r| children.iter().any(|p| (p.test)(r))).with_degraded(degraded)
        }
        Expression::Not { .. } => {
            let (negations, base) = expr.peel_negations();
            if *base == Expression::Empty {
                return Predicate::rejected();
            }
            let inner = compile(base);
            if inner.degraded {
                return Predicate::rejected();
            }
            if negations % 2 == 0 {
                return inner;
            }
            Predicate::new(move |r| !(inner.test)(r))
        }
    }
}

fn compile_target(target: FilterTarget) -> Predicate {
    match target {
        FilterTarget::Tag {
            normalized_name,
            id,
        } => Predicate::new(move |r| {
            r.tags().iter().any(|tag| {
                id.as_deref().is_some_and(|id| tag.id.to_lowercase() == id)
                    || normalize_tag_name(&tag.name) == normalized_name
            })
        }),
        FilterTarget::Name(value) => match fold_needle(&value) {
            Some(needle) => Predicate::new(move |r| contains_folded(r.name(), &needle)),
            None => Predicate::always(false),
        },
        FilterTarget::Content(value) => match fold_needle(&value) {
            Some(needle) => Predicate::new(move |r| contains_folded(r.content(), &needle)),
            None => Predicate::always(false),
        },
        FilterTarget::CreatedOn(day) => {
            Predicate::new(move |r| r.created_at().date_naive() == day)
        }
        FilterTarget::CreatedCompare { operator, at } => Predicate::new(move |r| {
            let created = r.created_at();
            match operator {
                Operator::Lt => created < at,
                Operator::Lte => created <= at,
                Operator::Gt => created > at,
                Operator::Gte => created >= at,
                Operator::Eq => created == at,
            }
        }),
        FilterTarget::HasTags => Predicate::new(|r| !r.tags().is_empty()),
    }
}

/// Sanitized, lowercased search term; `None` if nothing searchable is left.
fn fold_needle(value: &str) -> Option<String> {
    sanitize_fulltext(value).map(|v| v.to_lowercase())
}

/// Case-insensitive substring test; `needle` is already lowercased.
fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

// ============================================================================
// Public API
// ============================================================================

/// Whether a single record matches an expression.
pub fn matches<R: SearchRecord>(record: &R, expr: &Expression) -> bool {
    compile(expr).matches(record)
}

/// Keep the records matching `expr`, in their original order.
pub fn filter_records<'a, R: SearchRecord>(records: &'a [R], expr: &Expression) -> Vec<&'a R> {
    let predicate = compile(expr);
    records.iter().filter(|r| predicate.matches(*r)).collect()
}

/// Parse `query` and keep the matching records, in their original order.
pub fn filter_by_query<'a, R: SearchRecord>(records: &'a [R], query: &str) -> Vec<&'a R> {
    filter_records(records, &parse_query(query))
}

// ============================================================================
// Tests
// ============================================================================

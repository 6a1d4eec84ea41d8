//! Query AST and diagnostic types shared by every backend.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed search query.
///
/// Built once by the parser and then handed, unchanged, to either the
/// in-memory evaluator or the SQL compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum Expression {
    /// Matches everything (blank query).
    Empty,
    /// Bare search term, matched against name and content.
    Text { value: String },
    /// `field:operator value`.
    Filter {
        field: Field,
        operator: Operator,
        value: String,
    },
    /// All operands must match.
    And { operands: Vec<Expression> },
    /// At least one operand must match.
    Or { operands: Vec<Expression> },
    /// The operand must not match.
    Not { operand: Box<Expression> },
}

impl Expression {
    pub fn text(value: impl Into<String>) -> Self {
        Expression::Text {
            value: value.into(),
        }
    }

    pub fn filter(field: Field, operator: Operator, value: impl Into<String>) -> Self {
        Expression::Filter {
            field,
            operator,
            value: value.into(),
        }
    }

    pub fn negate(operand: Expression) -> Self {
        Expression::Not {
            operand: Box::new(operand),
        }
    }

    /// Strip consecutive `Not` wrappers, returning how many there were and
    /// the expression underneath.
    pub fn peel_negations(&self) -> (usize, &Expression) {
        let mut negations = 0;
        let mut expr = self;
        while let Expression::Not { operand } = expr {
            negations += 1;
            expr = operand;
        }
        (negations, expr)
    }
}

/// Filterable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Tag,
    Name,
    Content,
    Created,
    Has,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Tag,
        Field::Name,
        Field::Content,
        Field::Created,
        Field::Has,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Tag => "tag",
            Field::Name => "name",
            Field::Content => "content",
            Field::Created => "created",
            Field::Has => "has",
        }
    }

    /// Case-insensitive lookup of a field name as typed in a query.
    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(name))
    }

    /// The per-field operator table.
    pub fn supports(self, operator: Operator) -> bool {
        match self {
            Field::Tag | Field::Name | Field::Content | Field::Has => {
                matches!(operator, Operator::Eq)
            }
            Field::Created => match operator {
                Operator::Eq | Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte => true,
            },
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison operator of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable machine-readable issue codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    UnsupportedFilterOperator,
    UnsupportedExpressionType,
    UnsupportedHasValue,
    InvalidDateFormat,
    EmptyNotOperand,
}

impl IssueCode {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueCode::UnsupportedFilterOperator => "UNSUPPORTED_FILTER_OPERATOR",
            IssueCode::UnsupportedExpressionType => "UNSUPPORTED_EXPRESSION_TYPE",
            IssueCode::UnsupportedHasValue => "UNSUPPORTED_HAS_VALUE",
            IssueCode::InvalidDateFormat => "INVALID_DATE_FORMAT",
            IssueCode::EmptyNotOperand => "EMPTY_NOT_OPERAND",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal problem with one clause of a query.
///
/// The clause it describes has been replaced by an always-false match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub message: String,
    pub code: IssueCode,
}

impl Issue {
    pub fn new(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }

    pub fn unsupported_operator(field: Field, operator: Operator) -> Self {
        Self::new(
            IssueCode::UnsupportedFilterOperator,
            format!("Operator \"{}\" is not supported for field \"{}\"", operator, field),
        )
    }

    pub fn invalid_date(value: &str) -> Self {
        Self::new(
            IssueCode::InvalidDateFormat,
            format!("Invalid date \"{}\"; expected YYYY-MM-DD or an RFC 3339 timestamp", value),
        )
    }

    pub fn unsupported_has_value(value: &str) -> Self {
        Self::new(
            IssueCode::UnsupportedHasValue,
            format!("Unsupported value \"{}\" for has:; only has:tags is supported", value),
        )
    }

    pub fn empty_not_operand() -> Self {
        Self::new(IssueCode::EmptyNotOperand, "NOT requires an operand")
    }

    pub fn unsupported_expression(kind: &str) -> Self {
        Self::new(
            IssueCode::UnsupportedExpressionType,
            format!("Unsupported expression: {}", kind),
        )
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

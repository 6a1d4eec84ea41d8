//! Recursive descent parser for search query strings.
//!
//! Grammar (highest binding first):
//! ```text
//! primary  = "(" expr ")" | FIELD | PHRASE | WORD
//! unary    = ("NOT" | "-")* primary      (folded by parity)
//! and_expr = unary ("AND"? unary)*
//! or_expr  = and_expr ("OR" and_expr)*
//! expr     = or_expr
//! ```
//!
//! The parser never fails. Fragments that carry no meaning (dangling
//! keywords, stray `)`, empty phrases, `field:` without a value) are dropped,
//! a dangling `(` closes at end of input, and a query with nothing left
//! parses to [`Expression::Empty`].

use crate::search::lexer::{Token, tokenize};
use crate::search::types::Expression;

// ============================================================================
// Parser
// ============================================================================

/// Groups nested deeper than this are flattened into their parent.
const MAX_GROUP_DEPTH: usize = 64;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Number of currently open groups.
    depth: usize,
}

impl Parser {
    fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last() != Some(&Token::Eof) {
            tokens.push(Token::Eof);
        }
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> &Token {
        // The stream always ends with Eof and we never advance past it.
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if tok != Token::Eof {
            self.pos += 1;
        }
        tok
    }

    fn parse_expr(&mut self) -> Option<Expression> {
        self.parse_or_expr()
    }

    /// or_expr = and_expr ("OR" and_expr)*
    fn parse_or_expr(&mut self) -> Option<Expression> {
        let mut operands = Vec::new();
        operands.extend(self.parse_and_expr());

        while *self.peek() == Token::Or {
            self.advance(); // consume OR
            operands.extend(self.parse_and_expr());
        }

        combine(operands, |operands| Expression::Or { operands })
    }

    /// and_expr = unary ("AND"? unary)*
    fn parse_and_expr(&mut self) -> Option<Expression> {
        let mut operands = Vec::new();

        loop {
            match self.peek() {
                Token::Eof | Token::Or => break,
                Token::RParen if self.depth > 0 => break,
                Token::RParen | Token::And => {
                    // Stray `)` at top level; explicit AND is the default anyway
                    self.advance();
                }
                _ => operands.extend(self.parse_unary()),
            }
        }

        combine(operands, |operands| Expression::And { operands })
    }

    /// unary = ("NOT" | "-")* primary
    fn parse_unary(&mut self) -> Option<Expression> {
        let mut negations = 0;
        while matches!(self.peek(), Token::Not | Token::Minus) {
            self.advance();
            negations += 1;
        }
        // NOT with nothing to negate is dropped
        let expr = self.parse_primary()?;
        // NOT NOT e matches what e matches, so only the parity is kept
        if negations % 2 == 1 {
            Some(Expression::negate(expr))
        } else {
            Some(expr)
        }
    }

    /// primary = "(" expr ")" | FIELD | PHRASE | WORD
    ///
    /// Consumes nothing for tokens that belong to an enclosing rule.
    fn parse_primary(&mut self) -> Option<Expression> {
        match self.peek() {
            Token::LParen if self.depth >= MAX_GROUP_DEPTH => {
                self.advance(); // too deep: read the group's contents inline
                None
            }
            Token::LParen => {
                self.advance(); // consume (
                self.depth += 1;
                let inner = self.parse_expr();
                self.depth -= 1;
                if *self.peek() == Token::RParen {
                    self.advance();
                }
                inner
            }
            Token::Field { .. } => match self.advance() {
                Token::Field {
                    field,
                    operator,
                    value,
                } if !value.trim().is_empty() => Some(Expression::Filter {
                    field,
                    operator,
                    value,
                }),
                _ => None,
            },
            Token::Phrase(_) | Token::Word(_) => match self.advance() {
                Token::Phrase(value) | Token::Word(value) if !value.trim().is_empty() => {
                    Some(Expression::Text { value })
                }
                _ => None,
            },
            Token::Operator(_) => {
                self.advance(); // stray operator
                None
            }
            Token::And | Token::Or | Token::Not | Token::Minus | Token::RParen | Token::Eof => {
                None
            }
        }
    }
}

/// Collapse a list of operands: none → nothing, one → itself, more → `build`.
fn combine(
    mut operands: Vec<Expression>,
    build: impl FnOnce(Vec<Expression>) -> Expression,
) -> Option<Expression> {
    match operands.len() {
        0 => None,
        1 => operands.pop(),
        _ => Some(build(operands)),
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Parse a token stream into an `Expression`.
pub fn parse(tokens: Vec<Token>) -> Expression {
    let mut parser = Parser::new(tokens);
    // At depth 0 every token is either consumed or skipped, so this reads
    // through to Eof.
    parser.parse_expr().unwrap_or(Expression::Empty)
}

/// Parse a search query string into an `Expression`.
pub fn parse_query(input: &str) -> Expression {
    let tokens = tokenize(input);
    tracing::trace!(tokens = tokens.len(), "tokenized search query");
    let expr = parse(tokens);
    tracing::trace!(?expr, "parsed search query");
    expr
}

// ============================================================================
// Tests
// ============================================================================

//! Tokenizer for search query strings.
//!
//! Total: every input produces a token stream ending in [`Token::Eof`].
//! Anything that cannot be classified degrades to a [`Token::Word`].

use crate::search::types::{Field, Operator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A bare term.
    Word(String),
    /// A double-quoted span, quotes removed.
    Phrase(String),
    /// `field:[operator]value`, split into parts. `value` may be empty.
    Field {
        field: Field,
        operator: Operator,
        value: String,
    },
    /// A comparison operator standing on its own.
    Operator(Operator),
    And,
    Or,
    Not,
    /// Leading `-` (negation shorthand).
    Minus,
    LParen,
    RParen,
    Eof,
}

// ============================================================================
// Tokenizer
// ============================================================================

pub fn tokenize(input: &str) -> Vec<Token> {
    let chars: Vec<char> = input.chars().collect();
    let len = chars.len();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < len {
        let ch = chars[i];

        if ch.is_whitespace() {
            i += 1;
            continue;
        }

        if ch == '(' {
            tokens.push(Token::LParen);
            i += 1;
            continue;
        }
        if ch == ')' {
            tokens.push(Token::RParen);
            i += 1;
            continue;
        }

        if ch == '"' {
            let (phrase, next) = read_quoted(&chars, i);
            tokens.push(Token::Phrase(phrase));
            i = next;
            continue;
        }

        // Negation: `-` glued to whatever it negates
        if ch == '-' {
            match chars.get(i + 1) {
                Some(&next) if !next.is_whitespace() && next != ')' => {
                    tokens.push(Token::Minus);
                }
                _ => {} // lone dash
            }
            i += 1;
            continue;
        }

        if let Some((op, width)) = read_operator(&chars, i) {
            tokens.push(Token::Operator(op));
            i += width;
            continue;
        }

        if let Some((token, next)) = read_field(&chars, i) {
            tokens.push(token);
            i = next;
            continue;
        }

        let start = i;
        while i < len && is_word_char(chars[i]) {
            i += 1;
        }
        let word: String = chars[start..i].iter().collect();
        tokens.push(keyword(&word).unwrap_or(Token::Word(word)));
    }

    tokens.push(Token::Eof);
    tokens
}

/// Characters that may appear inside a bare word.
fn is_word_char(ch: char) -> bool {
    !ch.is_whitespace() && ch != '(' && ch != ')' && ch != '"'
}

fn keyword(word: &str) -> Option<Token> {
    if word.eq_ignore_ascii_case("AND") {
        Some(Token::And)
    } else if word.eq_ignore_ascii_case("OR") {
        Some(Token::Or)
    } else if word.eq_ignore_ascii_case("NOT") {
        Some(Token::Not)
    } else {
        None
    }
}

/// Read a quoted span starting at the opening quote. The closing quote is
/// optional at end of input. Returns the inner text and the next index.
fn read_quoted(chars: &[char], start: usize) -> (String, usize) {
    let mut i = start + 1;
    let mut s = String::new();
    while i < chars.len() && chars[i] != '"' {
        s.push(chars[i]);
        i += 1;
    }
    if i < chars.len() {
        i += 1; // closing "
    }
    (s, i)
}

fn read_operator(chars: &[char], i: usize) -> Option<(Operator, usize)> {
    let next_is_eq = chars.get(i + 1) == Some(&'=');
    match chars.get(i)? {
        '<' if next_is_eq => Some((Operator::Lte, 2)),
        '>' if next_is_eq => Some((Operator::Gte, 2)),
        '<' => Some((Operator::Lt, 1)),
        '>' => Some((Operator::Gt, 1)),
        '=' => Some((Operator::Eq, 1)),
        _ => None,
    }
}

/// Try to read `name:[op]value` at `start`. Only known field names qualify;
/// anything else is left for the word reader.
fn read_field(chars: &[char], start: usize) -> Option<(Token, usize)> {
    let mut i = start;
    while i < chars.len() && (chars[i].is_ascii_alphabetic() || chars[i] == '_') {
        i += 1;
    }
    if i == start || chars.get(i) != Some(&':') {
        return None;
    }
    let name: String = chars[start..i].iter().collect();
    let field = Field::from_name(&name)?;
    i += 1; // colon

    let operator = match read_operator(chars, i) {
        Some((op, width)) => {
            i += width;
            op
        }
        None => Operator::Eq,
    };

    let value = if chars.get(i) == Some(&'"') {
        let (quoted, next) = read_quoted(chars, i);
        i = next;
        quoted
    } else {
        let value_start = i;
        while i < chars.len() && is_word_char(chars[i]) {
            i += 1;
        }
        chars[value_start..i].iter().collect()
    };

    Some((
        Token::Field {
            field,
            operator,
            value,
        },
        i,
    ))
}

// ============================================================================
// Tests
// ============================================================================

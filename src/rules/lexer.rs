//! Tokenizer for rule expressions.
use std::fmt;

use crate::error::LexError;

/// A lexical token of the rule language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A category name (`[A-Za-z0-9._-]+`).
    Atom(String),
    /// `||`
    Or,
    /// `&&`
    And,
    /// `!`
    Not,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(name) => f.write_str(name),
            Self::Or => f.write_str("||"),
            Self::And => f.write_str("&&"),
            Self::Not => f.write_str("!"),
            Self::LeftParen => f.write_str("("),
            Self::RightParen => f.write_str(")"),
        }
    }
}

/// A token together with the byte offset it starts at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    /// The token.
    pub token: Token,
    /// Byte offset in the rule text.
    pub position: usize,
}

const fn is_atom_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// Split a rule expression into tokens.
///
/// Whitespace separates tokens and is otherwise dropped.
///
/// # Errors
///
/// Returns a [`LexError`] naming the first character that does not start a
/// valid token (including a lone `|` or `&`).
pub fn tokenize(text: &str) -> Result<Vec<Spanned>, LexError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        if c.is_whitespace() {
            continue;
        }

        let token = if is_atom_char(c) {
            let mut end = position + c.len_utf8();
            while let Some(&(i, next)) = chars.peek() {
                if !is_atom_char(next) {
                    break;
                }
                end = i + next.len_utf8();
                chars.next();
            }
            Token::Atom(text.get(position..end).unwrap_or_default().to_string())
        } else {
            match c {
                '|' | '&' => {
                    if chars.next_if(|&(_, next)| next == c).is_none() {
                        return Err(LexError {
                            text: text.to_string(),
                            position,
                            character: c,
                        });
                    }
                    if c == '|' { Token::Or } else { Token::And }
                }
                '!' => Token::Not,
                '(' => Token::LeftParen,
                ')' => Token::RightParen,
                _ => {
                    return Err(LexError {
                        text: text.to_string(),
                        position,
                        character: c,
                    });
                }
            }
        };

        tokens.push(Spanned { token, position });
    }

    Ok(tokens)
}

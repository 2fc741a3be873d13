//! Precedence-climbing parser and the [`Rule`] type.
use std::fmt;

use super::lexer::{Spanned, Token, tokenize};
use super::node::ConditionNode;
use crate::categories::CategorySet;
use crate::error::{ParseError, RuleError};

/// Binding power of `||`.
const OR_BP: u8 = 10;
/// Binding power of `&&`.
const AND_BP: u8 = 15;
/// Binding power of two adjacent atoms (implicit "or").
const ADJACENT_BP: u8 = 25;
/// Right binding power of prefix `!`: it takes exactly one primary.
const NOT_BP: u8 = 100;

/// Left binding power of a token in infix position.
const fn left_bp(token: &Token) -> u8 {
    match token {
        Token::Atom(_) => ADJACENT_BP,
        Token::And => AND_BP,
        Token::Or => OR_BP,
        Token::Not | Token::LeftParen | Token::RightParen => 0,
    }
}

struct Parser<'a> {
    text: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
}

impl<'a> Parser<'a> {
    const fn new(text: &'a str, tokens: Vec<Spanned>) -> Self {
        Self {
            text,
            tokens,
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let spanned = self.tokens.get(self.pos).cloned();
        if spanned.is_some() {
            self.pos += 1;
        }
        spanned
    }

    fn unexpected(&self, spanned: &Spanned) -> ParseError {
        match spanned.token {
            Token::RightParen => ParseError::UnmatchedClose {
                text: self.text.to_string(),
                position: spanned.position,
            },
            _ => ParseError::UnexpectedToken {
                text: self.text.to_string(),
                token: spanned.token.to_string(),
                position: spanned.position,
            },
        }
    }

    /// Parse the whole token stream as one expression.
    fn parse(mut self) -> Result<ConditionNode, ParseError> {
        if self.tokens.is_empty() {
            return Err(ParseError::Empty {
                text: self.text.to_string(),
            });
        }
        let node = self.expression(0)?;
        if let Some(trailing) = self.peek() {
            return Err(self.unexpected(trailing));
        }
        Ok(node)
    }

    fn expression(&mut self, right_bp: u8) -> Result<ConditionNode, ParseError> {
        let Some(first) = self.advance() else {
            return Err(ParseError::UnexpectedEnd {
                text: self.text.to_string(),
            });
        };
        let mut left = self.prefix(first)?;

        while let Some(next) = self.peek()
            && right_bp < left_bp(&next.token)
        {
            let Some(operator) = self.advance() else {
                break;
            };
            left = self.infix(operator, left)?;
        }

        Ok(left)
    }

    fn prefix(&mut self, spanned: Spanned) -> Result<ConditionNode, ParseError> {
        match &spanned.token {
            Token::Atom(name) => Ok(ConditionNode::Atom(name.clone())),
            Token::Not => Ok(ConditionNode::negate(self.expression(NOT_BP)?)),
            Token::LeftParen => {
                let inner = self.expression(0)?;
                match self.advance() {
                    Some(Spanned {
                        token: Token::RightParen,
                        ..
                    }) => Ok(inner),
                    Some(other) => Err(self.unexpected(&other)),
                    None => Err(ParseError::UnmatchedOpen {
                        text: self.text.to_string(),
                        position: spanned.position,
                    }),
                }
            }
            Token::And | Token::Or | Token::RightParen => Err(self.unexpected(&spanned)),
        }
    }

    fn infix(
        &mut self,
        spanned: Spanned,
        left: ConditionNode,
    ) -> Result<ConditionNode, ParseError> {
        match &spanned.token {
            Token::Atom(name) => Ok(ConditionNode::Or(vec![
                left,
                ConditionNode::atom(name.as_str()),
            ])),
            Token::And => Ok(ConditionNode::And(vec![left, self.expression(AND_BP)?])),
            Token::Or => Ok(ConditionNode::Or(vec![left, self.expression(OR_BP)?])),
            Token::Not | Token::LeftParen | Token::RightParen => Err(self.unexpected(&spanned)),
        }
    }
}

/// A parsed rule: the original expression text and its condition tree.
///
/// Operators, tightest first: prefix `!` (applies to the next atom or
/// parenthesized group), implicit adjacency (`a b` means `a || b`), `&&`,
/// then `||`.
///
/// # Examples
///
/// ```
/// use uconf_cli::categories::CategorySet;
/// use uconf_cli::rules::Rule;
///
/// let rule = Rule::parse("web db && !staging").unwrap();
/// let active: CategorySet = ["db"].into_iter().collect();
/// assert!(rule.test(&active));
/// assert_eq!(rule.to_string(), "(web || db) && ! staging");
/// ```
#[derive(Debug, Clone)]
pub struct Rule {
    text: String,
    node: ConditionNode,
}

impl Rule {
    /// Parse a rule expression.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Lex`] for characters outside the rule language and
    /// [`RuleError::Parse`] for empty expressions, dangling operators or
    /// unbalanced parentheses.
    pub fn parse(text: &str) -> Result<Self, RuleError> {
        let tokens = tokenize(text)?;
        let node = Parser::new(text, tokens).parse()?.simplify();
        Ok(Self {
            text: text.to_string(),
            node,
        })
    }

    /// Test whether a set of categories satisfies this rule.
    #[must_use]
    pub fn test(&self, categories: &CategorySet) -> bool {
        self.node.eval(categories)
    }

    /// The expression text this rule was parsed from.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The simplified condition tree.
    #[must_use]
    pub const fn node(&self) -> &ConditionNode {
        &self.node
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl Eq for Rule {}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.node.fmt(f)
    }
}

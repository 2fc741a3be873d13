//! Domain-specific error types for the uconf engines.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! The rule engine, the template renderer and the backport merger return
//! typed errors, while command handlers at the CLI boundary convert them to
//! [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! RuleError                       # rule text that cannot be parsed
//! ├── Lex(LexError)
//! └── Parse(ParseError)
//! BackportError
//! ├── Render(RenderError)         # template rendering failures
//! │   ├── Block(BlockError)       # unbalanced or unknown block commands
//! │   ├── Rule { source: RuleError }
//! │   └── Io { source: io::Error }
//! └── Alignment(AlignmentError)
//! CommandTableError
//! ```
//!
//! Every error is terminal for the file being processed: callers must discard
//! any output produced before the error surfaced.

use std::path::PathBuf;

use thiserror::Error;

use crate::template::BlockKind;

/// An unrecognized character in a rule expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid character {character:?} at position {position} in rule '{text}'")]
pub struct LexError {
    /// Full text of the rule being tokenized.
    pub text: String,
    /// Byte offset of the offending character.
    pub position: usize,
    /// The offending character.
    pub character: char,
}

/// A malformed boolean expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The rule contains no tokens at all.
    #[error("Empty rule '{text}'")]
    Empty {
        /// Full text of the rule.
        text: String,
    },

    /// The input ended where an operand was expected.
    #[error("Unexpected end of rule '{text}': expected an operand")]
    UnexpectedEnd {
        /// Full text of the rule.
        text: String,
    },

    /// A token appeared where it cannot be used.
    #[error("Unexpected token '{token}' at position {position} in rule '{text}'")]
    UnexpectedToken {
        /// Full text of the rule.
        text: String,
        /// Text of the offending token.
        token: String,
        /// Byte offset of the offending token.
        position: usize,
    },

    /// A `(` was never closed.
    #[error("Unmatched '(' at position {position} in rule '{text}'")]
    UnmatchedOpen {
        /// Full text of the rule.
        text: String,
        /// Byte offset of the unclosed parenthesis.
        position: usize,
    },

    /// A `)` has no matching `(`.
    #[error("Unmatched ')' at position {position} in rule '{text}'")]
    UnmatchedClose {
        /// Full text of the rule.
        text: String,
        /// Byte offset of the stray parenthesis.
        position: usize,
    },
}

/// Errors returned by [`Rule::parse`](crate::rules::Rule::parse).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// Tokenizing failed.
    #[error(transparent)]
    Lex(#[from] LexError),

    /// Parsing the token stream failed.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Unbalanced, mismatched or unknown block control.
///
/// Line numbers are 1-based source line numbers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    /// A closing or continuation command with no block open.
    #[error("Line {line}: '{command}' outside of any block")]
    NotInBlock {
        /// Line of the offending command.
        line: usize,
        /// Name of the offending command.
        command: String,
    },

    /// The innermost open block is not of the kind the command closes.
    #[error(
        "Line {line}: '{command}' expects an open '{expected}' block, \
         but the '{found}' block from line {start_line} is still open"
    )]
    KindMismatch {
        /// Line of the offending command.
        line: usize,
        /// Name of the offending command.
        command: String,
        /// Block kind the command needs.
        expected: BlockKind,
        /// Block kind actually open.
        found: BlockKind,
        /// Line where the open block started.
        start_line: usize,
    },

    /// A command that takes no argument was given one.
    #[error("Line {line}: command '{command}' takes no argument, got '{args}'")]
    UnexpectedArgument {
        /// Line of the offending command.
        line: usize,
        /// Name of the offending command.
        command: String,
        /// The rejected argument text.
        args: String,
    },

    /// A `with`/`withfile` argument is not of the form `name=value`.
    #[error("Line {line}: invalid '{command}' argument '{args}', expected name=value")]
    InvalidWithArgument {
        /// Line of the offending command.
        line: usize,
        /// Name of the offending command.
        command: String,
        /// The rejected argument text.
        args: String,
    },

    /// `endwith <name>` closed a block that does not bind `name`.
    #[error(
        "Line {line}: closing 'with' block from line {start_line} \
         with unbound variable '{name}'"
    )]
    WithMismatch {
        /// Line of the `endwith` command.
        line: usize,
        /// Variable named by `endwith`.
        name: String,
        /// Line where the closed block started.
        start_line: usize,
    },

    /// A directive names a command missing from the command table.
    #[error("Line {line}: unknown command '{name}' (known: {known})")]
    UnknownCommand {
        /// Line of the directive.
        line: usize,
        /// The unknown command name.
        name: String,
        /// Comma-separated list of registered commands.
        known: String,
    },
}

impl BlockError {
    /// Return the 1-based source line the error was raised on.
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::NotInBlock { line, .. }
            | Self::KindMismatch { line, .. }
            | Self::UnexpectedArgument { line, .. }
            | Self::InvalidWithArgument { line, .. }
            | Self::WithMismatch { line, .. }
            | Self::UnknownCommand { line, .. } => *line,
        }
    }
}

/// Errors raised while rendering a template.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Block control error.
    #[error(transparent)]
    Block(#[from] BlockError),

    /// An `if`/`elif` condition could not be parsed.
    #[error("Line {line}: {source}")]
    Rule {
        /// Line of the condition.
        line: usize,
        /// Underlying rule error.
        source: RuleError,
    },

    /// A `withfile` path could not be read.
    #[error("Line {line}: reading {}: {source}", .path.display())]
    Io {
        /// Line of the `withfile` command.
        line: usize,
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl RenderError {
    /// Return the 1-based source line the error was raised on.
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::Block(e) => e.line(),
            Self::Rule { line, .. } | Self::Io { line, .. } => *line,
        }
    }
}

/// The diff opcode stream does not line up with the source's published lines.
///
/// This signals a bug in the alignment or the renderer, not bad user input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlignmentError {
    /// The opcode stream ran out before the published lines did.
    #[error("Line {line}: no diff opcode left for published line")]
    MissingOpcode {
        /// Source line with no opcode.
        line: usize,
    },

    /// An `equal` opcode refers to text that differs from the rendered line.
    #[error("Line {line}: diff expected {expected:?}, rendered {found:?}")]
    MismatchedLine {
        /// Source line being matched.
        line: usize,
        /// Text carried by the opcode.
        expected: String,
        /// Text rendered from the source.
        found: String,
    },

    /// An opcode other than `insert` remained after the source was exhausted.
    #[error("Unexpected trailing diff opcode {op}")]
    TrailingOpcode {
        /// Description of the remaining opcode.
        op: String,
    },
}

/// Errors returned by [`backport`](crate::backport::backport).
#[derive(Error, Debug)]
pub enum BackportError {
    /// One of the two render passes failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Alignment invariant violated.
    #[error(transparent)]
    Alignment(#[from] AlignmentError),
}

/// Errors raised while assembling a [`CommandTable`](crate::template::CommandTable).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandTableError {
    /// Two commands claim the same name.
    #[error("Duplicate command '{name}'")]
    Duplicate {
        /// The contested name.
        name: String,
    },
}

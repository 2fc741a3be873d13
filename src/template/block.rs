//! Nested conditional/variable scopes of a render pass.
use std::collections::HashMap;
use std::fmt;

use crate::error::BlockError;

/// The kind of an open block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Opened by `if`, continued by `elif`/`else`, closed by `endif`.
    If,
    /// Opened by `with`/`withfile`, closed by `endwith`.
    With,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::If => f.write_str("if"),
            Self::With => f.write_str("with"),
        }
    }
}

/// One open scope on the [`BlockStack`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// What opened the block.
    pub kind: BlockKind,
    /// Whether lines inside this block may be rendered.
    pub published: bool,
    /// For `If` blocks: whether this branch or an earlier branch of the same
    /// `if`/`elif`/`else` chain was selected.
    pub branch_taken: bool,
    /// Placeholder bindings introduced by the block (`With` blocks only).
    pub context: HashMap<String, String>,
    /// 1-based source line of the opening command.
    pub start_line: usize,
}

impl Block {
    /// A branch of an `if` chain.
    #[must_use]
    pub fn conditional(published: bool, branch_taken: bool, start_line: usize) -> Self {
        Self {
            kind: BlockKind::If,
            published,
            branch_taken: branch_taken || published,
            context: HashMap::new(),
            start_line,
        }
    }

    /// A variable scope binding `name` to `value`.
    #[must_use]
    pub fn binding(name: impl Into<String>, value: impl Into<String>, start_line: usize) -> Self {
        Self {
            kind: BlockKind::With,
            published: true,
            branch_taken: false,
            context: HashMap::from([(name.into(), value.into())]),
            start_line,
        }
    }
}

/// Stack of open blocks, innermost last.
///
/// Owned by exactly one render pass and rebuilt from scratch for each pass.
#[derive(Debug, Default)]
pub struct BlockStack {
    blocks: Vec<Block>,
}

impl BlockStack {
    /// Create an empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    /// Number of open blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Return `true` when no block is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The innermost open block.
    #[must_use]
    pub fn innermost(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// Whether every open block is published (vacuously true when empty).
    #[must_use]
    pub fn published(&self) -> bool {
        self.blocks.iter().all(|b| b.published)
    }

    /// Resolve a placeholder name against the overlay of every block's
    /// bindings, innermost binding first.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.blocks
            .iter()
            .rev()
            .find_map(|b| b.context.get(name))
            .map(String::as_str)
    }

    /// Open a new block.
    pub fn enter(&mut self, block: Block) {
        tracing::trace!(
            kind = %block.kind,
            published = block.published,
            start_line = block.start_line,
            depth = self.blocks.len() + 1,
            "enter block"
        );
        self.blocks.push(block);
    }

    /// Close the innermost block, which must be of the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::NotInBlock`] when the stack is empty and
    /// [`BlockError::KindMismatch`] when the innermost block is of another
    /// kind. The stack is left untouched on error.
    pub fn leave(
        &mut self,
        kind: BlockKind,
        command: &str,
        line: usize,
    ) -> Result<Block, BlockError> {
        let Some(innermost) = self.blocks.last() else {
            return Err(BlockError::NotInBlock {
                line,
                command: command.to_string(),
            });
        };
        if innermost.kind != kind {
            return Err(BlockError::KindMismatch {
                line,
                command: command.to_string(),
                expected: kind,
                found: innermost.kind,
                start_line: innermost.start_line,
            });
        }
        let block = self.blocks.pop().ok_or_else(|| BlockError::NotInBlock {
            line,
            command: command.to_string(),
        })?;
        tracing::trace!(%kind, start_line = block.start_line, line, "leave block");
        Ok(block)
    }
}

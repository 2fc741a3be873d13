//! Block commands and the name-to-handler table.
//!
//! A command line (`#@name args`) is routed by name to a [`Command`]
//! implementation registered in a [`CommandTable`]. The built-in table
//! holds [`IfCommand`] and [`WithCommand`]; embedders may register more.
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use super::block::{Block, BlockKind};
use super::renderer::{RenderConfig, RenderState};
use crate::error::{BlockError, CommandTableError, RenderError};
use crate::rules::Rule;

/// A handler for one or more directive command names.
pub trait Command: Send + Sync {
    /// Names this handler answers to.
    fn names(&self) -> &[&str];

    /// Execute the command `name` with its raw argument text.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] that aborts the render.
    fn handle(
        &self,
        name: &str,
        args: &str,
        state: &mut RenderState,
        config: &RenderConfig,
    ) -> Result<(), RenderError>;
}

/// `if`, `elif`, `else` and `endif`.
#[derive(Debug, Default, Clone, Copy)]
pub struct IfCommand;

impl IfCommand {
    fn evaluate(args: &str, line: usize, config: &RenderConfig) -> Result<bool, RenderError> {
        let rule = Rule::parse(args).map_err(|source| RenderError::Rule { line, source })?;
        let result = rule.test(config.categories());
        tracing::debug!(line, rule = %rule, result, "evaluate condition");
        Ok(result)
    }
}

fn reject_args(name: &str, args: &str, line: usize) -> Result<(), BlockError> {
    if args.trim().is_empty() {
        Ok(())
    } else {
        Err(BlockError::UnexpectedArgument {
            line,
            command: name.to_string(),
            args: args.to_string(),
        })
    }
}

impl Command for IfCommand {
    fn names(&self) -> &[&str] {
        &["if", "elif", "else", "endif"]
    }

    fn handle(
        &self,
        name: &str,
        args: &str,
        state: &mut RenderState,
        config: &RenderConfig,
    ) -> Result<(), RenderError> {
        let line = state.line();
        match name {
            "if" => {
                let published = Self::evaluate(args, line, config)?;
                state.enter(Block::conditional(published, false, line));
            }
            "elif" => {
                let previous = state.leave(BlockKind::If, name)?;
                let published = if previous.branch_taken {
                    false
                } else {
                    Self::evaluate(args, line, config)?
                };
                state.enter(Block::conditional(published, previous.branch_taken, line));
            }
            "else" => {
                reject_args(name, args, line)?;
                let previous = state.leave(BlockKind::If, name)?;
                state.enter(Block::conditional(
                    !previous.branch_taken,
                    previous.branch_taken,
                    line,
                ));
            }
            "endif" => {
                reject_args(name, args, line)?;
                state.leave(BlockKind::If, name)?;
            }
            _ => return Err(unhandled(name, line, self.names()).into()),
        }
        Ok(())
    }
}

/// `with`, `withfile` and `endwith`.
///
/// Bindings are made whenever the command line is reached, including inside
/// an unpublished `if` branch, so `withfile` reads its file in that case too.
#[derive(Debug, Default, Clone, Copy)]
pub struct WithCommand;

impl WithCommand {
    /// Split `name=value`, where `name` is a non-empty run of word characters.
    fn binding<'a>(name: &str, args: &'a str, line: usize) -> Result<(&'a str, &'a str), BlockError> {
        args.split_once('=')
            .filter(|(var, _)| {
                !var.is_empty() && var.chars().all(|c| c.is_alphanumeric() || c == '_')
            })
            .ok_or_else(|| BlockError::InvalidWithArgument {
                line,
                command: name.to_string(),
                args: args.to_string(),
            })
    }
}

impl Command for WithCommand {
    fn names(&self) -> &[&str] {
        &["with", "withfile", "endwith"]
    }

    fn handle(
        &self,
        name: &str,
        args: &str,
        state: &mut RenderState,
        config: &RenderConfig,
    ) -> Result<(), RenderError> {
        let line = state.line();
        match name {
            "with" => {
                let (var, value) = Self::binding(name, args, line)?;
                state.enter(Block::binding(var, value, line));
            }
            "withfile" => {
                let (var, path) = Self::binding(name, args, line)?;
                let path = PathBuf::from(path);
                let value = config
                    .fs()
                    .read_one_line(&path)
                    .map_err(|source| RenderError::Io { line, path, source })?;
                state.enter(Block::binding(var, value.trim(), line));
            }
            "endwith" => {
                let block = state.leave(BlockKind::With, name)?;
                let var = args.trim();
                if !var.is_empty() && !block.context.contains_key(var) {
                    return Err(BlockError::WithMismatch {
                        line,
                        name: var.to_string(),
                        start_line: block.start_line,
                    }
                    .into());
                }
            }
            _ => return Err(unhandled(name, line, self.names()).into()),
        }
        Ok(())
    }
}

fn unhandled(name: &str, line: usize, known: &[&str]) -> BlockError {
    BlockError::UnknownCommand {
        line,
        name: name.to_string(),
        known: known.join(", "),
    }
}

/// Static mapping from command name to handler.
#[derive(Clone)]
pub struct CommandTable {
    handlers: BTreeMap<String, Arc<dyn Command>>,
}

impl CommandTable {
    /// A table with no commands at all.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// The default table: `if`, `elif`, `else`, `endif`, `with`,
    /// `withfile` and `endwith`.
    #[must_use]
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        let builtins: [Arc<dyn Command>; 2] = [Arc::new(IfCommand), Arc::new(WithCommand)];
        for command in builtins {
            for name in command.names() {
                table.handlers.insert((*name).to_string(), Arc::clone(&command));
            }
        }
        table
    }

    /// Register an additional command under all of its names.
    ///
    /// # Errors
    ///
    /// Returns [`CommandTableError::Duplicate`] if any of its names is
    /// already registered; the table is left unchanged in that case.
    pub fn register(&mut self, command: impl Command + 'static) -> Result<(), CommandTableError> {
        if let Some(name) = command
            .names()
            .iter()
            .find(|name| self.handlers.contains_key(**name))
        {
            return Err(CommandTableError::Duplicate {
                name: (*name).to_string(),
            });
        }
        let command: Arc<dyn Command> = Arc::new(command);
        for name in command.names() {
            self.handlers.insert((*name).to_string(), Arc::clone(&command));
        }
        Ok(())
    }

    /// Look up the handler for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.handlers.get(name).map(AsRef::as_ref)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for CommandTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

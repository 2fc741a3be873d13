//! The line-oriented render pass.
use std::fmt;
use std::sync::Arc;

use super::block::{Block, BlockKind, BlockStack};
use super::commands::CommandTable;
use super::directive::{self, Directive};
use crate::categories::CategorySet;
use crate::error::{BlockError, RenderError};
use crate::fs::{FileSystem, OsFileSystem};

/// One source line and what it renders to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Line {
    /// Rendered text, or `None` when the line is hidden.
    pub output: Option<String>,
    /// The untouched source line.
    pub original: String,
}

/// Everything a render pass depends on, passed in explicitly.
#[derive(Clone)]
pub struct RenderConfig {
    categories: CategorySet,
    commands: CommandTable,
    fs: Arc<dyn FileSystem>,
}

impl RenderConfig {
    /// Configuration with the built-in commands and the real filesystem.
    #[must_use]
    pub fn new(categories: CategorySet) -> Self {
        Self {
            categories,
            commands: CommandTable::builtin(),
            fs: Arc::new(OsFileSystem),
        }
    }

    /// Replace the command table.
    #[must_use]
    pub fn with_commands(mut self, commands: CommandTable) -> Self {
        self.commands = commands;
        self
    }

    /// Replace the filesystem used by `withfile`.
    #[must_use]
    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Active categories.
    #[must_use]
    pub const fn categories(&self) -> &CategorySet {
        &self.categories
    }

    /// Registered commands.
    #[must_use]
    pub const fn commands(&self) -> &CommandTable {
        &self.commands
    }

    /// Filesystem collaborator.
    #[must_use]
    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    /// Start a fresh render pass over `source`.
    pub fn renderer<I>(&self, source: I) -> Renderer<'_, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Renderer {
            config: self,
            source: source.into_iter(),
            state: RenderState::default(),
            done: false,
        }
    }

    /// Render `source` and keep only the visible lines.
    ///
    /// ```
    /// use uconf_cli::categories::CategorySet;
    /// use uconf_cli::template::RenderConfig;
    ///
    /// let source = ["#@if web", "listen 80", "#@else", "listen 8080", "#@endif"];
    /// let web = RenderConfig::new(CategorySet::parse_list("web"));
    /// assert_eq!(web.render(source).unwrap(), ["listen 80"]);
    /// let bare = RenderConfig::new(CategorySet::new());
    /// assert_eq!(bare.render(source).unwrap(), ["listen 8080"]);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns the first [`RenderError`] encountered; nothing rendered
    /// before it is returned.
    pub fn render<I>(&self, source: I) -> Result<Vec<String>, RenderError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.renderer(source)
            .filter_map(|line| line.map(|l| l.output).transpose())
            .collect()
    }
}

impl fmt::Debug for RenderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderConfig")
            .field("categories", &self.categories)
            .field("commands", &self.commands)
            .finish_non_exhaustive()
    }
}

/// Mutable state of one render pass, handed to commands.
#[derive(Debug, Default)]
pub struct RenderState {
    stack: BlockStack,
    line: usize,
}

impl RenderState {
    /// 1-based number of the line being rendered.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// The open blocks.
    #[must_use]
    pub const fn stack(&self) -> &BlockStack {
        &self.stack
    }

    /// Open a block.
    pub fn enter(&mut self, block: Block) {
        self.stack.enter(block);
    }

    /// Close the innermost block on behalf of `command`.
    ///
    /// # Errors
    ///
    /// See [`BlockStack::leave`].
    pub fn leave(&mut self, kind: BlockKind, command: &str) -> Result<Block, BlockError> {
        self.stack.leave(kind, command, self.line)
    }
}

/// Lazy render pass yielding one [`Line`] per source line.
///
/// Iteration stops after the first error. A renderer cannot be restarted;
/// call [`RenderConfig::renderer`] again for another pass.
pub struct Renderer<'a, I> {
    config: &'a RenderConfig,
    source: I,
    state: RenderState,
    done: bool,
}

impl<I> Renderer<'_, I> {
    fn render_line(&mut self, line: &str) -> Result<Option<String>, RenderError> {
        match directive::parse(line) {
            Some(Directive::Comment) => Ok(None),
            Some(Directive::Escaped(text)) => Ok(Some(text)),
            Some(Directive::Command { name, args }) => {
                self.dispatch(name, args)?;
                Ok(None)
            }
            None if self.state.stack.published() => Ok(Some(directive::substitute(line, |name| {
                self.state.stack.lookup(name)
            }))),
            None => Ok(None),
        }
    }

    fn dispatch(&mut self, name: &str, args: &str) -> Result<(), RenderError> {
        let config = self.config;
        let line = self.state.line;
        let Some(command) = config.commands().get(name) else {
            return Err(BlockError::UnknownCommand {
                line,
                name: name.to_string(),
                known: config.commands().names().collect::<Vec<_>>().join(", "),
            }
            .into());
        };
        tracing::debug!(line, command = name, args, "dispatch");
        command.handle(name, args, &mut self.state, config)
    }
}

impl<I> Iterator for Renderer<'_, I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = Result<Line, RenderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let Some(source) = self.source.next() else {
            self.done = true;
            if let Some(block) = self.state.stack.innermost() {
                tracing::warn!(
                    kind = %block.kind,
                    start_line = block.start_line,
                    "block still open at end of input"
                );
            }
            return None;
        };

        let original = source.as_ref().to_string();
        self.state.line += 1;
        match self.render_line(&original) {
            Ok(output) => Some(Ok(Line { output, original })),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<I> fmt::Debug for Renderer<'_, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("state", &self.state)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::fs::MockFileSystem;
    use crate::template::Command;
    use std::io;
    use std::path::Path;

    fn config(categories: &str) -> RenderConfig {
        RenderConfig::new(CategorySet::parse_list(categories))
    }

    fn render(source: &[&str], categories: &str) -> Vec<String> {
        config(categories).render(source).unwrap()
    }

    fn render_err(source: &[&str], categories: &str) -> RenderError {
        config(categories).render(source).unwrap_err()
    }

    // -----------------------------------------------------------------------
    // Content and directive lines
    // -----------------------------------------------------------------------

    #[test]
    fn plain_lines_pass_through() {
        assert_eq!(render(&["a", "", "b @ c"], ""), ["a", "", "b @ c"]);
    }

    #[test]
    fn comments_are_dropped() {
        assert_eq!(render(&["#@# note", "a", "!@#"], ""), ["a"]);
    }

    #[test]
    fn escaped_line_renders_literally() {
        assert_eq!(render(&["#@@if web", "\"@@@@x@@"], ""), ["#@if web", "\"@@@x@@"]);
    }

    #[test]
    fn escaped_line_is_emitted_in_unpublished_block() {
        assert_eq!(render(&["#@if web", "#@@literal", "#@endif"], ""), ["#@literal"]);
        assert_eq!(render(&["#@if web", "#@@literal", "#@endif"], "web"), ["#@literal"]);
    }

    #[test]
    fn every_line_is_reported() {
        let cfg = config("");
        let lines: Vec<Line> = cfg
            .renderer(["#@if web", "a", "#@endif", "b"])
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            lines,
            [
                Line {
                    output: None,
                    original: "#@if web".to_string()
                },
                Line {
                    output: None,
                    original: "a".to_string()
                },
                Line {
                    output: None,
                    original: "#@endif".to_string()
                },
                Line {
                    output: Some("b".to_string()),
                    original: "b".to_string()
                },
            ]
        );
    }

    // -----------------------------------------------------------------------
    // if / elif / else
    // -----------------------------------------------------------------------

    const CHAIN: [&str; 7] = [
        "#@if a",
        "A",
        "#@elif b",
        "B",
        "#@else",
        "OTHER",
        "#@endif",
    ];

    #[test]
    fn if_else_selects_branch() {
        let source = ["#@if web", "listen 80", "#@else", "listen 8080", "#@endif"];
        assert_eq!(render(&source, "web"), ["listen 80"]);
        assert_eq!(render(&source, ""), ["listen 8080"]);
    }

    #[test]
    fn first_matching_branch_wins() {
        assert_eq!(render(&CHAIN, "a,b"), ["A"]);
        assert_eq!(render(&CHAIN, "a"), ["A"]);
        assert_eq!(render(&CHAIN, "b"), ["B"]);
        assert_eq!(render(&CHAIN, ""), ["OTHER"]);
    }

    #[test]
    fn nested_blocks_require_every_level() {
        let source = ["#@if a", "#@if b", "AB", "#@else", "A", "#@endif", "#@endif"];
        assert_eq!(render(&source, "a,b"), ["AB"]);
        assert_eq!(render(&source, "a"), ["A"]);
        assert!(render(&source, "b").is_empty());
    }

    #[test]
    fn precedence_in_conditions() {
        let source = ["#@if a b && c", "yes", "#@endif"];
        assert_eq!(render(&source, "a,c"), ["yes"]);
        assert!(render(&source, "a").is_empty());
    }

    #[test]
    fn bad_condition_reports_line() {
        let err = render_err(&["x", "#@if (a"], "");
        assert!(matches!(
            err,
            RenderError::Rule {
                line: 2,
                source: crate::error::RuleError::Parse(ParseError::UnmatchedOpen { .. })
            }
        ));
    }

    #[test]
    fn bad_condition_in_unpublished_branch_still_fails() {
        let err = render_err(&["#@if a", "#@elif", "#@endif"], "");
        assert_eq!(err.line(), 2);
    }

    // -----------------------------------------------------------------------
    // Block balance
    // -----------------------------------------------------------------------

    #[test]
    fn else_without_if_fails() {
        let err = render_err(&["#@else"], "");
        assert!(matches!(
            err,
            RenderError::Block(BlockError::NotInBlock { line: 1, .. })
        ));
    }

    #[test]
    fn extra_endif_fails_on_second() {
        let err = render_err(&["#@if x", "#@endif", "#@endif"], "x");
        assert!(matches!(
            err,
            RenderError::Block(BlockError::NotInBlock { line: 3, .. })
        ));
    }

    #[test]
    fn endif_closing_with_block_fails() {
        let err = render_err(&["#@if x", "#@with a=1", "#@endif"], "x");
        assert_eq!(
            err.to_string(),
            "Line 3: 'endif' expects an open 'if' block, \
             but the 'with' block from line 2 is still open"
        );
    }

    #[test]
    fn else_and_endif_take_no_argument() {
        let err = render_err(&["#@if x", "#@else x"], "");
        assert!(matches!(
            err,
            RenderError::Block(BlockError::UnexpectedArgument { line: 2, .. })
        ));
        let err = render_err(&["#@if x", "#@endif x"], "");
        assert!(matches!(
            err,
            RenderError::Block(BlockError::UnexpectedArgument { line: 2, .. })
        ));
    }

    #[test]
    fn unknown_command_fails() {
        let err = render_err(&["a", "#@include other"], "");
        assert_eq!(
            err.to_string(),
            "Line 2: unknown command 'include' \
             (known: elif, else, endif, endwith, if, with, withfile)"
        );
    }

    #[test]
    fn renderer_stops_after_error() {
        let cfg = config("");
        let mut renderer = cfg.renderer(["#@endif", "a"]);
        assert!(renderer.next().unwrap().is_err());
        assert!(renderer.next().is_none());
    }

    #[test]
    fn unclosed_block_is_not_an_error() {
        assert_eq!(render(&["#@if x", "a"], "x"), ["a"]);
    }

    // -----------------------------------------------------------------------
    // with / withfile / endwith
    // -----------------------------------------------------------------------

    #[test]
    fn with_binds_until_endwith() {
        let source = [
            "#@with port=8080",
            "port @@port@@",
            "#@endwith",
            "port @@port@@",
        ];
        assert_eq!(render(&source, ""), ["port 8080", "port @@port@@"]);
    }

    #[test]
    fn inner_with_shadows_outer() {
        let source = [
            "#@with v=outer",
            "#@with v=inner",
            "@@v@@",
            "#@endwith v",
            "@@v@@",
            "#@endwith",
        ];
        assert_eq!(render(&source, ""), ["inner", "outer"]);
    }

    #[test]
    fn substituted_directive_text_stays_literal() {
        let source = ["#@with cmd=#@endif", "@@cmd@@", "#@endwith"];
        assert_eq!(render(&source, ""), ["#@endif"]);
    }

    #[test]
    fn endwith_name_must_be_bound() {
        let err = render_err(&["#@with a=1", "#@endwith b"], "");
        assert_eq!(
            err.to_string(),
            "Line 2: closing 'with' block from line 1 with unbound variable 'b'"
        );
    }

    #[test]
    fn with_requires_name_value() {
        let err = render_err(&["#@with nothing"], "");
        assert!(matches!(
            err,
            RenderError::Block(BlockError::InvalidWithArgument { line: 1, .. })
        ));
    }

    #[test]
    fn withfile_reads_and_trims_through_fs() {
        let mut fs = MockFileSystem::new();
        fs.expect_read_one_line()
            .withf(|path| path == Path::new("/secrets/db"))
            .times(1)
            .returning(|_| Ok("  hunter2 ".to_string()));
        let cfg = config("").with_fs(Arc::new(fs));

        let out = cfg
            .render(["#@withfile pw=/secrets/db", "password=@@pw@@", "#@endwith pw"])
            .unwrap();
        assert_eq!(out, ["password=hunter2"]);
    }

    #[test]
    fn withfile_read_failure_reports_path_and_line() {
        let mut fs = MockFileSystem::new();
        fs.expect_read_one_line()
            .returning(|_| Err(io::Error::from(io::ErrorKind::NotFound)));
        let cfg = config("").with_fs(Arc::new(fs));

        let err = cfg.render(["a", "#@withfile pw=/missing"]).unwrap_err();
        match err {
            RenderError::Io { line, path, .. } => {
                assert_eq!(line, 2);
                assert_eq!(path, Path::new("/missing"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn with_inside_unpublished_branch_is_still_checked() {
        let err = render_err(&["#@if never", "#@with broken", "#@endif"], "");
        assert!(matches!(
            err,
            RenderError::Block(BlockError::InvalidWithArgument { line: 2, .. })
        ));
    }

    #[test]
    fn withfile_inside_unpublished_branch_still_reads() {
        let mut fs = MockFileSystem::new();
        fs.expect_read_one_line()
            .times(1)
            .returning(|_| Ok("v".to_string()));
        let cfg = config("").with_fs(Arc::new(fs));

        let out = cfg
            .render([
                "#@if never",
                "#@withfile v=/secret",
                "@@v@@",
                "#@endwith",
                "#@endif",
                "done",
            ])
            .unwrap();
        assert_eq!(out, ["done"]);
    }

    // -----------------------------------------------------------------------
    // Custom commands
    // -----------------------------------------------------------------------

    #[derive(Debug)]
    struct Banner;

    impl Command for Banner {
        fn names(&self) -> &[&str] {
            &["banner"]
        }

        fn handle(
            &self,
            _name: &str,
            args: &str,
            state: &mut RenderState,
            _config: &RenderConfig,
        ) -> Result<(), RenderError> {
            state.enter(Block::binding("banner", args, state.line()));
            Ok(())
        }
    }

    #[test]
    fn registered_command_is_dispatched() {
        let mut commands = CommandTable::builtin();
        commands.register(Banner).unwrap();
        let cfg = config("").with_commands(commands);

        let out = cfg
            .render(["#@banner hello world", "@@banner@@", "#@endwith"])
            .unwrap();
        assert_eq!(out, ["hello world"]);
    }

    #[test]
    fn passes_are_independent() {
        let cfg = config("");
        let source = ["#@with a=1", "@@a@@"];
        assert_eq!(cfg.render(source).unwrap(), ["1"]);
        assert_eq!(cfg.render(["@@a@@"]).unwrap(), ["@@a@@"]);
    }
}

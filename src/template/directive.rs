//! Directive-line syntax: classification, placeholder filling and escaping.
//!
//! A line is a directive when it starts with one of `"`, `!` or `#`
//! immediately followed by `@` and at least one more character. The
//! leading character lets directives hide in the comment syntax of the
//! file being templated (vim, Xresources, shell, ...).
//!
//! ```text
//! #@# a comment, never rendered
//! #@@literal    rendered as "#@literal"
//! #@if web      a command named "if" with arguments "web"
//! ```

/// Characters that may start a directive.
const PREFIX_CHARS: [char; 3] = ['"', '!', '#'];

/// Placeholder delimiter.
const PLACEHOLDER: &str = "@@";

/// A classified directive line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive<'a> {
    /// `X@#...`: dropped from the output.
    Comment,
    /// `X@@...`: emitted with the doubled `@` collapsed.
    Escaped(String),
    /// `X@name args`: dispatched to the command table.
    Command {
        /// Command name.
        name: &'a str,
        /// Everything after the first space, or `""`.
        args: &'a str,
    },
}

/// Return the two-character directive prefix of `line`, if it has one.
fn prefix(line: &str) -> Option<&str> {
    let mut chars = line.chars();
    let first = chars.next()?;
    if PREFIX_CHARS.contains(&first) && chars.next() == Some('@') {
        line.get(..2)
    } else {
        None
    }
}

/// Classify a source line.
///
/// Returns `None` for ordinary content lines.
///
/// ```
/// use uconf_cli::template::directive::{Directive, parse};
///
/// assert_eq!(parse("#@# note"), Some(Directive::Comment));
/// assert_eq!(parse("\"@@x"), Some(Directive::Escaped("\"@x".to_string())));
/// assert_eq!(parse("!@if a b"), Some(Directive::Command { name: "if", args: "a b" }));
/// assert_eq!(parse("#@"), None);
/// assert_eq!(parse("plain"), None);
/// ```
#[must_use]
pub fn parse(line: &str) -> Option<Directive<'_>> {
    let prefix = prefix(line)?;
    let rest = line.get(prefix.len()..).filter(|rest| !rest.is_empty())?;

    if rest.starts_with('#') {
        Some(Directive::Comment)
    } else if let Some(literal) = rest.strip_prefix('@') {
        Some(Directive::Escaped(format!("{prefix}{literal}")))
    } else {
        let (name, args) = rest.split_once(' ').unwrap_or((rest, ""));
        Some(Directive::Command { name, args })
    }
}

/// Escape a rendered line so it is read back as literal text.
///
/// Lines that look like directives get their `@` doubled; other lines are
/// returned unchanged.
///
/// ```
/// use uconf_cli::template::directive::escape;
///
/// assert_eq!(escape("#@if web"), "#@@if web");
/// assert_eq!(escape("listen 80"), "listen 80");
/// ```
#[must_use]
pub fn escape(output: &str) -> String {
    match prefix(output) {
        Some(prefix) => format!(
            "{prefix}@{}",
            output.get(prefix.len()..).unwrap_or_default()
        ),
        None => output.to_string(),
    }
}

/// Replace every bound `@@name@@` placeholder in `line`.
///
/// `lookup` resolves a name to its value; unresolved placeholders are left
/// untouched. Substituted values are never scanned again.
///
/// ```
/// use uconf_cli::template::directive::substitute;
///
/// let filled = substitute("port @@port@@ @@host@@", |name| (name == "port").then_some("80"));
/// assert_eq!(filled, "port 80 @@host@@");
/// ```
pub fn substitute<'v>(line: &str, lookup: impl Fn(&str) -> Option<&'v str>) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    while let Some((before, after_open)) = rest.split_once(PLACEHOLDER) {
        out.push_str(before);
        let resolved = after_open
            .split_once(PLACEHOLDER)
            .and_then(|(name, after_close)| lookup(name).map(|value| (value, after_close)));

        match resolved {
            Some((value, after_close)) => {
                out.push_str(value);
                rest = after_close;
            }
            None => {
                out.push_str(PLACEHOLDER);
                rest = after_open;
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // parse
    // -----------------------------------------------------------------------

    #[test]
    fn every_prefix_character_is_accepted() {
        for line in ["\"@endif", "!@endif", "#@endif"] {
            assert_eq!(
                parse(line),
                Some(Directive::Command {
                    name: "endif",
                    args: ""
                }),
                "{line}"
            );
        }
    }

    #[test]
    fn other_prefixes_are_content() {
        assert_eq!(parse("//@if web"), None);
        assert_eq!(parse(" #@if web"), None);
        assert_eq!(parse("#if web"), None);
        assert_eq!(parse(""), None);
        assert_eq!(parse("#"), None);
    }

    #[test]
    fn comment_wins_over_command() {
        assert_eq!(parse("#@#if web"), Some(Directive::Comment));
        assert_eq!(parse("!@#"), Some(Directive::Comment));
    }

    #[test]
    fn escaped_line_collapses_one_at() {
        assert_eq!(
            parse("#@@@@var@@"),
            Some(Directive::Escaped("#@@@var@@".to_string()))
        );
        assert_eq!(parse("#@@"), Some(Directive::Escaped("#@".to_string())));
    }

    #[test]
    fn command_splits_on_first_space_only() {
        assert_eq!(
            parse("#@with motd=hello  world"),
            Some(Directive::Command {
                name: "with",
                args: "motd=hello  world"
            })
        );
        assert_eq!(
            parse("#@else "),
            Some(Directive::Command {
                name: "else",
                args: ""
            })
        );
    }

    #[test]
    fn multibyte_content_is_not_a_directive() {
        assert_eq!(parse("é@if"), None);
        assert_eq!(parse("#é"), None);
    }

    // -----------------------------------------------------------------------
    // escape
    // -----------------------------------------------------------------------

    #[test]
    fn escape_round_trips_through_parse() {
        for text in ["#@if web", "!@#", "\"@@x", "#@"] {
            let escaped = escape(text);
            assert_eq!(
                parse(&escaped),
                Some(Directive::Escaped(text.to_string())),
                "{text}"
            );
        }
    }

    // -----------------------------------------------------------------------
    // substitute
    // -----------------------------------------------------------------------

    fn lookup_port(name: &str) -> Option<&'static str> {
        match name {
            "port" => Some("8080"),
            "hook" => Some("@@port@@"),
            _ => None,
        }
    }

    #[test]
    fn substitute_replaces_every_occurrence() {
        assert_eq!(
            substitute("@@port@@:@@port@@", lookup_port),
            "8080:8080"
        );
    }

    #[test]
    fn substitute_leaves_unbound_names() {
        assert_eq!(
            substitute("@@host@@:@@port@@", lookup_port),
            "@@host@@:8080"
        );
        assert_eq!(substitute("a@@b", lookup_port), "a@@b");
        assert_eq!(substitute("@@@@port@@", lookup_port), "@@8080");
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        assert_eq!(substitute("@@hook@@", lookup_port), "@@port@@");
    }
}

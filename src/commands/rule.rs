//! Command: parse a rule and test it against the active categories.
use std::io::{self, Write as _};

use anyhow::{Context as _, Result};

use crate::cli::{GlobalOpts, RuleOpts};
use crate::config::Settings;
use crate::logging::Logger;
use crate::rules::Rule;

/// Run the rule command.
///
/// Prints the normalized rule, then `true` or `false`.
///
/// # Errors
///
/// Returns an error if the settings cannot be loaded or the rule does not
/// parse.
pub fn run(global: &GlobalOpts, opts: &RuleOpts, log: &Logger) -> Result<()> {
    let categories = Settings::resolve(global)?.category_set();
    log.debug(&format!("categories: {categories}"));
    let rule = Rule::parse(&opts.expr).with_context(|| format!("parsing rule {:?}", opts.expr))?;
    let mut out = io::stdout().lock();
    writeln!(out, "{rule}")?;
    writeln!(out, "{}", rule.test(&categories))?;
    Ok(())
}

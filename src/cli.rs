//! Command-line definitions.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI entry point for the uconf templating tool.
#[derive(Parser, Debug)]
#[command(
    name = "uconf",
    about = "Render category-driven configuration templates and backport edits",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Active categories (comma separated, repeatable)
    #[arg(short, long, global = true, value_delimiter = ',')]
    pub categories: Vec<String>,

    /// Settings file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the template sources [default: .]
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Directory holding the rendered files
    #[arg(long, global = true)]
    pub target: Option<PathBuf>,

    /// Preview changes without writing
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Process files sequentially (parallel is enabled by default)
    #[arg(long = "no-parallel", global = true, action = clap::ArgAction::SetFalse)]
    pub parallel: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render sources from the root into the target directory
    Build(FilesOpts),
    /// Fold edits of rendered files back into their sources
    Back(FilesOpts),
    /// Show what `build` would change in the target directory
    Diff(FilesOpts),
    /// Show what `back` would change in the sources
    Backdiff(FilesOpts),
    /// Parse a rule and test it against the active categories
    Rule(RuleOpts),
    /// Print version information
    Version,
}

/// Options for the file-processing subcommands.
#[derive(Parser, Debug, Clone)]
pub struct FilesOpts {
    /// Files to process, relative to the root and target directories
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Options for the `rule` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct RuleOpts {
    /// Rule expression, e.g. "web && !staging"
    pub expr: String,
}

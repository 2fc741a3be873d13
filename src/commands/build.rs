//! Command: render template sources into the target directory.
use std::path::Path;

use anyhow::{Context as _, Result};

use super::{Workspace, process_files, update_file};
use crate::cli::{FilesOpts, GlobalOpts};
use crate::logging::{FileStatus, Logger};

/// Run the build command.
///
/// # Errors
///
/// Returns an error if the workspace cannot be resolved or any file fails
/// to render or write.
pub fn run(global: &GlobalOpts, opts: &FilesOpts, log: &Logger) -> Result<()> {
    let ws = Workspace::init(global, log)?;
    log.stage(&format!("Building {} file(s)", opts.files.len()));
    process_files(&opts.files, &ws, log, |file| build_file(&ws, log, file))
}

/// Render one source and write it to the target directory if it changed.
///
/// # Errors
///
/// Returns an error if the source cannot be read or rendered, or the
/// target cannot be read or written.
pub fn build_file(ws: &Workspace, log: &Logger, file: &Path) -> Result<FileStatus> {
    let source = ws.read_source(file)?;
    let rendered = ws
        .render
        .render(&source)
        .with_context(|| format!("rendering {}", ws.source_path(file).display()))?;
    let current = ws.read_target(file)?;
    update_file(ws, log, &ws.target_path(file), current.as_deref(), &rendered)
}

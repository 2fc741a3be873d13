//! Command: fold edits of rendered files back into their sources.
use std::path::Path;

use anyhow::{Context as _, Result, bail};

use super::{Workspace, process_files, update_file};
use crate::backport::backport;
use crate::cli::{FilesOpts, GlobalOpts};
use crate::logging::{FileStatus, Logger};

/// Run the back command.
///
/// # Errors
///
/// Returns an error if the workspace cannot be resolved or any file fails
/// to backport.
pub fn run(global: &GlobalOpts, opts: &FilesOpts, log: &Logger) -> Result<()> {
    let ws = Workspace::init(global, log)?;
    log.stage(&format!("Backporting {} file(s)", opts.files.len()));
    process_files(&opts.files, &ws, log, |file| back_file(&ws, log, file))
}

/// Compute the source that would reproduce the current rendered file.
///
/// Returns the source as read and the backported source.
///
/// # Errors
///
/// Returns an error if either file cannot be read, the rendered file does
/// not exist, or the edits cannot be aligned with the source.
pub fn backported(ws: &Workspace, file: &Path) -> Result<(Vec<String>, Vec<String>)> {
    let source = ws.read_source(file)?;
    let Some(edited) = ws.read_target(file)? else {
        bail!("{} has not been built", ws.target_path(file).display());
    };
    let merged = backport(&ws.render, &source, &edited)
        .with_context(|| format!("backporting {}", ws.target_path(file).display()))?;
    Ok((source, merged))
}

/// Backport one rendered file into its source.
///
/// # Errors
///
/// See [`backported`]; also fails if the source cannot be written.
pub fn back_file(ws: &Workspace, log: &Logger, file: &Path) -> Result<FileStatus> {
    let (source, merged) = backported(ws, file)?;
    update_file(ws, log, &ws.source_path(file), Some(source.as_slice()), &merged)
}

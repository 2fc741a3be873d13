//! Commands: preview `build` and `back` as unified diffs.
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use super::back::backported;
use super::{Workspace, finish, map_files};
use crate::cli::{FilesOpts, GlobalOpts};
use crate::diff::unified_diff;
use crate::logging::{FileStatus, Logger};

/// Show how `build` would change the target directory.
///
/// # Errors
///
/// Returns an error if the workspace cannot be resolved or any file fails.
pub fn run(global: &GlobalOpts, opts: &FilesOpts, log: &Logger) -> Result<()> {
    let ws = Workspace::init(global, log)?;
    log.stage(&format!("Diffing {} file(s)", opts.files.len()));
    print_diffs(&opts.files, &ws, log, |file| build_diff(&ws, file))
}

/// Show how `back` would change the sources.
///
/// # Errors
///
/// Returns an error if the workspace cannot be resolved or any file fails.
pub fn run_back(global: &GlobalOpts, opts: &FilesOpts, log: &Logger) -> Result<()> {
    let ws = Workspace::init(global, log)?;
    log.stage(&format!("Diffing {} source(s)", opts.files.len()));
    print_diffs(&opts.files, &ws, log, |file| back_diff(&ws, file))
}

/// Diff between the installed file (empty if missing) and its fresh render.
///
/// # Errors
///
/// Returns an error if the source cannot be read or rendered.
pub fn build_diff(ws: &Workspace, file: &Path) -> Result<String> {
    let source = ws.read_source(file)?;
    let planned = ws
        .render
        .render(&source)
        .with_context(|| format!("rendering {}", ws.source_path(file).display()))?;
    let installed = ws.read_target(file)?.unwrap_or_default();
    let name = ws.target_path(file).display().to_string();
    Ok(unified_diff(&installed, &planned, &name, &name))
}

/// Diff between the current source and its backported version.
///
/// # Errors
///
/// See [`backported`].
pub fn back_diff(ws: &Workspace, file: &Path) -> Result<String> {
    let (source, merged) = backported(ws, file)?;
    let name = ws.source_path(file).display().to_string();
    Ok(unified_diff(&source, &merged, &name, &name))
}

fn print_diffs<F>(files: &[PathBuf], ws: &Workspace, log: &Logger, work: F) -> Result<()>
where
    F: Fn(&Path) -> Result<String> + Sync + Send,
{
    let diffs = map_files(files, ws.parallel, work);
    let mut out = io::stdout().lock();
    let mut outcomes = Vec::with_capacity(diffs.len());
    for (file, diff) in diffs {
        let status = match diff {
            Ok(text) if text.is_empty() => Ok(FileStatus::Unchanged),
            Ok(text) => out
                .write_all(text.as_bytes())
                .map(|()| FileStatus::DryRun)
                .context("writing diff to stdout"),
            Err(e) => Err(e),
        };
        outcomes.push((file, status));
    }
    drop(out);
    finish(outcomes, log)
}

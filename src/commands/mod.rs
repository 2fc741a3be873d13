//! Top-level subcommand orchestration.
//!
//! The file commands (`build`, `back`, `diff`, `backdiff`) share a
//! [`Workspace`] built from the settings and run their per-file work through
//! [`process_files`], which fans out over the rayon pool unless
//! `--no-parallel` is given.
pub mod back;
pub mod build;
pub mod diff;
pub mod rule;
pub mod version;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use rayon::prelude::*;

use crate::cli::GlobalOpts;
use crate::config::Settings;
use crate::logging::{FileStatus, Logger};
use crate::template::RenderConfig;

/// Shared state for the file-processing commands.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Render configuration for the active categories.
    pub render: RenderConfig,
    /// Directory holding the template sources.
    pub root: PathBuf,
    /// Directory holding the rendered files.
    pub target: PathBuf,
    /// Report what would be written instead of writing it.
    pub dry_run: bool,
    /// Process files on the rayon pool.
    pub parallel: bool,
}

impl Workspace {
    /// Resolve settings and command-line options into a workspace.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file cannot be loaded or no target
    /// directory is configured.
    pub fn init(global: &GlobalOpts, log: &Logger) -> Result<Self> {
        let settings = Settings::resolve(global)?;
        let Some(target) = settings.target.clone() else {
            bail!("no target directory: pass --target or set `target` in the settings file");
        };
        let categories = settings.category_set();
        if categories.is_empty() {
            log.warn("no active categories: only unconditional and fallback branches render");
        }
        log.debug(&format!("categories: {categories}"));
        log.debug(&format!("root: {}", settings.root_dir().display()));
        log.debug(&format!("target: {}", target.display()));
        Ok(Self {
            render: RenderConfig::new(categories),
            root: settings.root_dir(),
            target,
            dry_run: global.dry_run,
            parallel: global.parallel,
        })
    }

    /// Path of `file` under the source root.
    #[must_use]
    pub fn source_path(&self, file: &Path) -> PathBuf {
        self.root.join(file)
    }

    /// Path of `file` under the target directory.
    #[must_use]
    pub fn target_path(&self, file: &Path) -> PathBuf {
        self.target.join(file)
    }

    /// Read a template source.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read_source(&self, file: &Path) -> Result<Vec<String>> {
        let path = self.source_path(file);
        self.render
            .fs()
            .read_lines(&path)
            .with_context(|| format!("reading {}", path.display()))
    }

    /// Read a rendered file, or `None` if it has not been written yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn read_target(&self, file: &Path) -> Result<Option<Vec<String>>> {
        let path = self.target_path(file);
        match self.render.fs().read_lines(&path) {
            Ok(lines) => Ok(Some(lines)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }
}

/// Write `lines` to `path`, one per line with a trailing newline, creating
/// the parent directory if needed.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file cannot
/// be written.
pub fn write_lines<S: AsRef<str>>(path: &Path, lines: &[S]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    let content: String = lines
        .iter()
        .flat_map(|line| [line.as_ref(), "\n"])
        .collect();
    std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))
}

/// Run `work` on every file and collect the results in input order.
///
/// Files are processed on the rayon pool when `parallel` is set.
#[must_use]
pub fn map_files<'a, T, F>(
    files: &'a [PathBuf],
    parallel: bool,
    work: F,
) -> Vec<(&'a Path, Result<T>)>
where
    T: Send,
    F: Fn(&Path) -> Result<T> + Sync + Send,
{
    let run = |file: &'a PathBuf| (file.as_path(), work(file.as_path()));
    if parallel {
        files.par_iter().map(run).collect()
    } else {
        files.iter().map(run).collect()
    }
}

/// Record one status per file, print the summary, and fail if any file did.
///
/// # Errors
///
/// Returns an error naming the number of failed files.
pub fn finish(outcomes: Vec<(&Path, Result<FileStatus>)>, log: &Logger) -> Result<()> {
    for (file, outcome) in outcomes {
        let name = file.display().to_string();
        match outcome {
            Ok(status) => log.record_file(&name, status, None),
            Err(e) => {
                let message = format!("{e:#}");
                log.error(&format!("{name}: {message}"));
                log.record_file(&name, FileStatus::Failed, Some(&message));
            }
        }
    }
    log.print_summary();

    let failed = log.failure_count();
    if failed > 0 {
        bail!("{failed} file(s) failed");
    }
    Ok(())
}

/// Run `work` over `files` and finish with the summary.
///
/// # Errors
///
/// Returns an error if any file fails.
pub fn process_files<F>(files: &[PathBuf], ws: &Workspace, log: &Logger, work: F) -> Result<()>
where
    F: Fn(&Path) -> Result<FileStatus> + Sync + Send,
{
    finish(map_files(files, ws.parallel, work), log)
}

/// Write `lines` to `path` unless they already match `current`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn update_file<S: AsRef<str>>(
    ws: &Workspace,
    log: &Logger,
    path: &Path,
    current: Option<&[String]>,
    lines: &[S],
) -> Result<FileStatus> {
    let unchanged = current.is_some_and(|current| {
        current.len() == lines.len()
            && current.iter().zip(lines).all(|(a, b)| a == b.as_ref())
    });
    if unchanged {
        log.debug(&format!("{} is up to date", path.display()));
        return Ok(FileStatus::Unchanged);
    }
    if ws.dry_run {
        log.dry_run(&format!("would write {}", path.display()));
        return Ok(FileStatus::DryRun);
    }
    write_lines(path, lines)?;
    log.info(&format!("wrote {}", path.display()));
    Ok(FileStatus::Ok)
}

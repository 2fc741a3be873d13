//! Per-file results collected for the run summary.

/// Outcome of processing one file.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// File name relative to the source or target root.
    pub name: String,
    /// Final status of the file.
    pub status: FileStatus,
    /// Optional detail message (e.g., the error description).
    pub message: Option<String>,
}

/// Status of a processed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// The file was written.
    Ok,
    /// The output already matched; nothing was written.
    Unchanged,
    /// Dry-run mode; the change was computed but not written.
    DryRun,
    /// Rendering, backporting or I/O failed.
    Failed,
}

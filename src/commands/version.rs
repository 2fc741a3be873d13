//! Command: print version information.
use std::io::Write as _;

/// Version string, overridable at build time through `UCONF_VERSION`.
#[must_use]
pub fn version() -> &'static str {
    option_env!("UCONF_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the uconf version to stdout.
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn run() -> std::io::Result<()> {
    writeln!(std::io::stdout().lock(), "uconf {}", version())
}

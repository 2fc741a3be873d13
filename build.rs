use std::process::Command;

/// Short hash of the checked-out commit, if this is a git work tree.
fn git_commit() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!hash.is_empty()).then_some(hash)
}

fn main() {
    // An explicit UCONF_VERSION wins; local builds get `<pkg>+<commit>`.
    let version = std::env::var("UCONF_VERSION").ok().or_else(|| {
        let pkg = std::env::var("CARGO_PKG_VERSION").ok()?;
        git_commit().map(|hash| format!("{pkg}+{hash}"))
    });
    if let Some(version) = version {
        println!("cargo:rustc-env=UCONF_VERSION={version}");
    }

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-env-changed=UCONF_VERSION");
}

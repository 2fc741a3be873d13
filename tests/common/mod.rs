// Shared helpers for integration tests.
//
// Provides a temporary directory holding a template root (`src/`) and a
// target directory (`out/`), plus a fluent builder so each test can set up
// its files without repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use uconf_cli::categories::CategorySet;
use uconf_cli::commands::Workspace;
use uconf_cli::template::RenderConfig;

/// A source exercising `if`/`elif`/`else` and a `with` binding.
pub const NGINX: &str = "\
# nginx
#@if web
listen 80;
#@elif db
listen 5432;
#@else
listen 8080;
#@endif
#@with host=example.org
server_name @@host@@;
#@endwith
";

/// An isolated root/target pair backed by a [`tempfile::TempDir`].
pub struct IntegrationTestContext {
    /// Temporary directory containing `src/` and `out/`.
    pub dir: tempfile::TempDir,
    categories: String,
    dry_run: bool,
}

impl IntegrationTestContext {
    /// Create a context with empty root and target directories.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(dir.path().join("src")).expect("create src dir");
        std::fs::create_dir_all(dir.path().join("out")).expect("create out dir");
        Self {
            dir,
            categories: String::new(),
            dry_run: false,
        }
    }

    /// Template root.
    pub fn root(&self) -> PathBuf {
        self.dir.path().join("src")
    }

    /// Target directory.
    pub fn target(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    /// Workspace over this context, processing files sequentially.
    pub fn workspace(&self) -> Workspace {
        Workspace {
            render: RenderConfig::new(CategorySet::parse_list(&self.categories)),
            root: self.root(),
            target: self.target(),
            dry_run: self.dry_run,
            parallel: false,
        }
    }

    /// Contents of `name` under the template root.
    pub fn read_source(&self, name: &str) -> String {
        std::fs::read_to_string(self.root().join(name)).expect("read source")
    }

    /// Contents of `name` under the target directory.
    pub fn read_target(&self, name: &str) -> String {
        std::fs::read_to_string(self.target().join(name)).expect("read target")
    }

    /// Overwrite `name` under the target directory.
    pub fn edit_target(&self, name: &str, content: &str) {
        write(&self.target().join(name), content);
    }

    /// Whether `name` exists under the target directory.
    pub fn target_exists(&self, name: &str) -> bool {
        self.target().join(name).exists()
    }
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dir");
    }
    std::fs::write(path, content).expect("write file");
}

/// Fluent builder for [`IntegrationTestContext`].
pub struct TestContextBuilder {
    ctx: IntegrationTestContext,
}

impl TestContextBuilder {
    /// Begin building a new context.
    pub fn new() -> Self {
        Self {
            ctx: IntegrationTestContext::new(),
        }
    }

    /// Activate a comma or space separated list of categories.
    pub fn with_categories(mut self, categories: &str) -> Self {
        self.ctx.categories = categories.to_string();
        self
    }

    /// Preview instead of writing.
    pub fn dry_run(mut self) -> Self {
        self.ctx.dry_run = true;
        self
    }

    /// Write a template source under the root.
    pub fn with_source(self, name: &str, content: &str) -> Self {
        write(&self.ctx.root().join(name), content);
        self
    }

    /// Write a file under the target directory.
    pub fn with_target(self, name: &str, content: &str) -> Self {
        write(&self.ctx.target().join(name), content);
        self
    }

    /// Finish building and return the configured context.
    pub fn build(self) -> IntegrationTestContext {
        self.ctx
    }
}

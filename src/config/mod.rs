//! Settings file and command-line resolution.
pub mod toml_loader;

use anyhow::{Context as _, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::categories::CategorySet;
use crate::cli::GlobalOpts;

/// Contents of an optional `--config` TOML file.
///
/// ```toml
/// categories = ["web", "eu-west"]
/// root = "templates"
/// target = "/etc"
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Active categories.
    pub categories: Vec<String>,
    /// Directory holding the template sources.
    pub root: Option<PathBuf>,
    /// Directory holding the rendered files.
    pub target: Option<PathBuf>,
}

impl Settings {
    /// Load settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, or invalid.
    pub fn load(path: &Path) -> Result<Self> {
        toml_loader::load_config(path)
    }

    /// Load the `--config` file, if any, and apply the command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file cannot be loaded.
    pub fn resolve(global: &GlobalOpts) -> Result<Self> {
        let settings = match &global.config {
            Some(path) => Self::load(path)
                .with_context(|| format!("loading settings from {}", path.display()))?,
            None => Self::default(),
        };
        Ok(settings.with_overrides(global))
    }

    /// Apply command-line values: `root`/`target` replace the file's,
    /// categories are added to the file's.
    #[must_use]
    pub fn with_overrides(mut self, global: &GlobalOpts) -> Self {
        self.categories.extend(global.categories.iter().cloned());
        if let Some(root) = &global.root {
            self.root = Some(root.clone());
        }
        if let Some(target) = &global.target {
            self.target = Some(target.clone());
        }
        self
    }

    /// The active categories as a set; entries may themselves be comma or
    /// space separated lists.
    #[must_use]
    pub fn category_set(&self) -> CategorySet {
        let mut set = CategorySet::new();
        for entry in &self.categories {
            set.extend(CategorySet::parse_list(entry).iter().map(str::to_string));
        }
        set
    }

    /// The source directory, defaulting to the current directory.
    #[must_use]
    pub fn root_dir(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}
